use nowlib::protocol::ParseResult;

#[derive(clap::Args, Debug)]
pub struct ListenOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    debug: crate::debug::DebugClientArgs,

    /// Stop after this many messages.
    #[arg(short = 'n', long)]
    count: Option<usize>,
}

impl crate::ToolRun for ListenOpts {
    fn run(&self) -> anyhow::Result<()> {
        let port = self.port.open()?;
        let mut client = self.debug.wrap(nowlib::ClientStd::new_std(port))?;

        let mut heard = 0;
        while self.count.map(|n| heard < n).unwrap_or(true) {
            match client.read_air() {
                Ok(ParseResult::Ok(_, frame)) => {
                    println!(
                        "{}: {}",
                        frame.sender,
                        crate::common::describe(frame.payload)
                    );
                    heard += 1;
                }
                Ok(ParseResult::ParseErr(_, body, _)) => {
                    log::warn!("skipping malformed frame of {} bytes", body.len());
                }
                Ok(ParseResult::None) => {}
                Err(e) if crate::common::is_timeout(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}
