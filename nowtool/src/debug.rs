use nowlib::protocol::serialize::{Serializer, SerializerVec, SerializerWrap};
use nowlib::protocol::{AirFrame, FrameParse, FrameSerialize, HostFrame, ParseResult};
use nowlib::{ClientBuffer, FrameError, ReadError};

/// Which side wrote a frame, as recorded in a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ClientDirection {
    Device = 0,
    Host = 1,
}

impl ClientDirection {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Device),
            1 => Some(Self::Host),
            _ => None,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct DebugClientArgs {
    /// Print frames as they pass (repeat to show raw bytes).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,
    /// Append every raw frame to this file, for `parse-dump`.
    #[arg(long)]
    dump: Option<String>,
}

type DumpFile = SerializerWrap<nowlib::FromStd<std::fs::File>>;

/// A host client that can trace and record everything it sees.
pub struct DebugClient<F> {
    args: DebugClientArgs,
    client: nowlib::ClientStd<F>,
    dump: Option<DumpFile>,
}

impl DebugClientArgs {
    pub fn wrap<F>(&self, client: nowlib::ClientStd<F>) -> anyhow::Result<DebugClient<F>> {
        let mut dump = None;
        if let Some(ref path) = self.dump {
            dump = Some(SerializerWrap::new(nowlib::FromStd::new(
                std::fs::File::options()
                    .create(true)
                    .append(true)
                    .open(path)?,
            )));
        }

        Ok(DebugClient {
            args: self.clone(),
            client,
            dump,
        })
    }
}

fn record(dump: &mut DumpFile, direction: ClientDirection, raw: &[u8]) -> std::io::Result<()> {
    dump.write_u8(direction as u8)?;
    dump.write_bytes(&(raw.len() as u16).to_le_bytes())?;
    dump.write_bytes(raw)?;
    std::io::Write::flush(dump.inner_mut())
}

impl<F> DebugClient<F> {
    pub fn read<'a, M>(&'a mut self) -> Result<ParseResult<&'a [u8], M>, ReadError<std::io::Error>>
    where
        M: FrameParse<'a> + std::fmt::Debug,
        F: std::io::Read,
    {
        // two-step read, to grab the buffer to look into
        self.client.read_into_buffer()?;
        // only make a copy of the data if we need it later
        let data = (self.args.debug >= 2 || self.dump.is_some())
            .then(|| self.client.buffer().data().to_owned());
        let res = self.client.parse();

        if let (Some(data), Some(range)) = (data, res.range()) {
            let raw = &data[range.clone()];

            if let Some(ref mut dump) = self.dump {
                record(dump, ClientDirection::Device, raw)?;
            }

            if self.args.debug >= 2 {
                eprintln!("<<< raw frame:");
                crate::hexdump::ehexdump_prefix("<<<   ", raw);
            }
        }

        if self.args.debug >= 1 {
            match res {
                ParseResult::Ok(_, ref m) => {
                    eprintln!("<<< {:?}", m);
                    eprintln!();
                }
                ParseResult::ParseErr(_, body, ref e) => {
                    eprintln!("!!! parse error: {:?}", e.code);
                    crate::hexdump::ehexdump_prefix("!!!   ", body);
                    eprintln!();
                }
                ParseResult::None => {}
            }
        }
        Ok(res)
    }

    /// Read a frame heard by the bridge.
    #[allow(clippy::type_complexity)]
    pub fn read_air(
        &mut self,
    ) -> Result<ParseResult<&[u8], AirFrame<&[u8]>>, ReadError<std::io::Error>>
    where
        F: std::io::Read,
    {
        self.read()
    }

    /// Write a frame to the bridge.
    pub fn write<M>(&mut self, frame: &M) -> Result<(), FrameError<std::io::Error>>
    where
        F: std::io::Write,
        M: FrameSerialize + std::fmt::Debug,
    {
        if self.args.debug >= 2 || self.dump.is_some() {
            let mut ser = SerializerVec::new();
            frame.frame(&mut ser).map_err(|e| match e {
                FrameError::TooLong(len) => FrameError::TooLong(len),
                FrameError::Io(e) => match e {},
            })?;
            let raw = ser.done();

            if let Some(ref mut dump) = self.dump {
                record(dump, ClientDirection::Host, &raw)?;
            }

            if self.args.debug >= 2 {
                eprintln!(">>> raw frame:");
                crate::hexdump::ehexdump_prefix(">>>   ", &raw);
            }
        }
        if self.args.debug >= 1 {
            eprintln!(">>> {:?}", frame);
            eprintln!();
        }
        self.client.write(frame)
    }

    /// Broadcast one payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), FrameError<std::io::Error>>
    where
        F: std::io::Write,
    {
        self.write(&HostFrame::new(payload))
    }
}
