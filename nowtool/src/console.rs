use rustyline::{error::ReadlineError, DefaultEditor, ExternalPrinter};

use nowlib::protocol::{HostFrame, ParseResult};

#[derive(clap::Args, Debug)]
pub struct ConsoleOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    debug: crate::debug::DebugClientArgs,
}

impl crate::ToolRun for ConsoleOpts {
    fn run(&self) -> anyhow::Result<()> {
        let port = self.port.open()?;
        let writer = port.try_clone()?;

        let mut reader = self.debug.wrap(nowlib::ClientStd::new_std(port))?;
        // debug and dump only see the reading side
        let mut writer: nowlib::ClientStd<_> = nowlib::ClientStd::new_std(writer);

        let mut rl = DefaultEditor::new()?;
        let mut printer = rl.create_external_printer()?;

        std::thread::scope(|s| {
            let reader = s.spawn(move || -> anyhow::Result<()> {
                loop {
                    match reader.read_air() {
                        Ok(ParseResult::Ok(_, frame)) => {
                            printer.print(format!(
                                "{}: {}\n",
                                frame.sender,
                                crate::common::describe(frame.payload)
                            ))?;
                        }
                        Ok(ParseResult::ParseErr(_, _, ref e)) => {
                            printer.print(format!("!!! parse error: {:?}\n", e.code))?;
                        }
                        Ok(ParseResult::None) => {}
                        Err(e) if crate::common::is_timeout(&e) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            });

            loop {
                if reader.is_finished() {
                    reader
                        .join()
                        .map_err(|_| anyhow::anyhow!("reader thread panicked"))??;
                    anyhow::bail!("reader thread stopped");
                }

                match rl.readline("> ") {
                    Ok(line) => {
                        rl.add_history_entry(&line)?;
                        match crate::common::parse_payload(&line, false) {
                            Ok(payload) => {
                                writer.write(&HostFrame::new(&payload))?;
                                log::debug!("sent {} bytes", payload.len());
                            }
                            Err(e) => eprintln!("{}", e),
                        }
                    }

                    Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                        std::process::exit(0);
                    }

                    Err(e) => Err(e)?,
                };
            }
        })
    }
}
