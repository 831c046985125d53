//! mramflash - Everspin MR25Hxx SPI MRAM tool
//!
//! Attaches MR25Hxx chips over a bus backend, registers them by name and
//! reads, writes or zero-fills them through the registry.
//!
//! # Architecture
//!
//! Every command runs in a [`Session`](session::Session):
//! 1. The target (a programmer string or a board file) is resolved into
//!    device specs
//! 2. Each device is attached and registered under its logical name
//! 3. The command opens the device by name and works through the handle
//! 4. Devices are detached, and emulator images are saved back

mod backend;
mod board;
mod cli;
mod commands;
mod session;

use clap::Parser;
use cli::{Cli, Commands};
use session::{DeviceSpec, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG still overrides the -v level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let result = run(cli.command);

    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Info { target } => with_session(&target, |session, name| {
            commands::run_info(session, name)
        }),
        Commands::Read {
            target,
            output,
            offset,
            length,
        } => with_session(&target, |session, name| {
            commands::run_read(session, name, &output, offset, length)
        }),
        Commands::Write {
            target,
            input,
            offset,
            verify,
        } => with_session(&target, |session, name| {
            commands::run_write(session, name, &input, offset, verify)
        }),
        Commands::Erase {
            target,
            offset,
            length,
        } => with_session(&target, |session, name| {
            commands::run_erase(session, name, offset, length)
        }),
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Attach the target devices, run `f` on the selected one and detach
///
/// Detach runs even when `f` fails. Images are only saved after a clean
/// detach.
fn with_session<F>(target: &cli::TargetArgs, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&Session, &str) -> Result<(), Box<dyn std::error::Error>>,
{
    let specs = DeviceSpec::from_target(target)?;
    let session = Session::open(&specs)?;

    let result = f(&session, &target.device);
    let closed = session.close();

    result.and(closed)
}
