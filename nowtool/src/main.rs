use clap::{Parser, Subcommand};

mod common;
mod console;
mod debug;
mod hexdump;
mod listen;
mod parsedump;
mod send;
mod simulate;

trait ToolRun {
    fn run(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Talk to a serial to ESP-NOW broadcast bridge.
#[derive(Parser, Debug)]
#[command(version, about)]
struct ToolOptions {
    /// Log more (repeat for even more).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: ToolCommand,
}

#[derive(Subcommand, Debug)]
enum ToolCommand {
    /// Broadcast one message.
    Send(send::SendOpts),
    /// Print every message heard by the bridge.
    Listen(listen::ListenOpts),
    /// Interactive broadcast console.
    Console(console::ConsoleOpts),
    /// Simulate a group of bridges over TCP.
    Simulate(simulate::SimulateOpts),
    /// Decode a dump written with --dump.
    ParseDump(parsedump::ParseDumpOpts),
}

impl ToolRun for ToolCommand {
    fn run(&self) -> anyhow::Result<()> {
        use ToolCommand::*;
        match self {
            Send(o) => o.run(),
            Listen(o) => o.run(),
            Console(o) => o.run(),
            Simulate(o) => o.run(),
            ParseDump(o) => o.run(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opts = ToolOptions::parse();

    let level = match opts.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    opts.command.run()
}
