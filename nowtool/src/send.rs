#[derive(clap::Args, Debug)]
pub struct SendOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    debug: crate::debug::DebugClientArgs,

    /// Message to broadcast, at most 250 bytes.
    message: String,
    /// Read the message as hex digits instead of text.
    #[arg(short = 'x', long)]
    hex: bool,
}

impl crate::ToolRun for SendOpts {
    fn run(&self) -> anyhow::Result<()> {
        let payload = crate::common::parse_payload(&self.message, self.hex)?;

        let port = self.port.open()?;
        let mut client = self.debug.wrap(nowlib::ClientStd::new_std(port))?;
        client.send(&payload)?;

        log::info!("sent {} bytes", payload.len());
        Ok(())
    }
}
