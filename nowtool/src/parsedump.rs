use nowlib::protocol::{self, AirFrame, HostFrame, ParseResult};

use crate::debug::ClientDirection;

#[derive(clap::Args, Debug)]
pub struct ParseDumpOpts {
    dump: String,
}

impl crate::ToolRun for ParseDumpOpts {
    fn run(&self) -> anyhow::Result<()> {
        let rawdata = std::fs::read(&self.dump)?;
        for record in records(&rawdata) {
            let (direction, frameraw) = record?;
            match direction {
                ClientDirection::Device => println!("device -> host, {} bytes", frameraw.len()),
                ClientDirection::Host => println!("host -> device, {} bytes", frameraw.len()),
            }
            println!();

            match describe_frame(direction, frameraw) {
                Ok(s) => {
                    println!("{}", s);
                    println!();
                }
                Err(e) => {
                    println!("Unparsed frame:");
                    crate::hexdump::hexdump(frameraw);
                    println!();
                    anyhow::bail!(e);
                }
            }
        }
        Ok(())
    }
}

/// Split a dump into `[direction u8][len le u16][raw frame]` records.
fn records(mut raw: &[u8]) -> impl Iterator<Item = anyhow::Result<(ClientDirection, &[u8])>> {
    std::iter::from_fn(move || {
        if raw.len() < 3 {
            return None;
        }
        let len = u16::from_le_bytes([raw[1], raw[2]]) as usize;
        let record = match (ClientDirection::from_u8(raw[0]), raw.get(3..3 + len)) {
            (Some(dir), Some(frame)) => Ok((dir, frame)),
            (None, _) => Err(anyhow::anyhow!("bad direction byte {:#x}", raw[0])),
            (_, None) => Err(anyhow::anyhow!("dump truncated inside a record")),
        };

        // stop after an error
        raw = if record.is_ok() { &raw[3 + len..] } else { &[] };
        Some(record)
    })
}

fn describe_frame(direction: ClientDirection, data: &[u8]) -> anyhow::Result<String> {
    let (consumed, desc) = match direction {
        ClientDirection::Device => {
            let (consumed, res) = protocol::parse::<AirFrame<&[u8]>>(data);
            (consumed, res.map(|f| format!("{:?}", f)))
        }
        ClientDirection::Host => {
            let (consumed, res) = protocol::parse::<HostFrame<&[u8]>>(data);
            (consumed, res.map(|f| format!("{:?}", f)))
        }
    };
    anyhow::ensure!(consumed == data.len(), "Frame parser left leftover data.");

    match desc {
        ParseResult::Ok(_, s) => Ok(s),
        ParseResult::ParseErr(_, _, e) => anyhow::bail!("Frame parse error: {:?}", e.code),
        ParseResult::None => anyhow::bail!("Frame parser found no frames."),
    }
}
