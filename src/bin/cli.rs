//! RateCache Control Shell
//!
//! Operator shell that starts, stops and inspects a `ratecache-server`
//! process and clears its cache.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use ratecache::args::ServerArgs;
use ratecache::control::{ControlShell, ProcessLauncher};
use tracing_subscriber::{fmt, EnvFilter};

/// RateCache control shell
#[derive(Parser, Debug)]
#[command(name = "ratecache-ctl")]
#[command(about = "Control shell for the RateCache server")]
#[command(version)]
struct Args {
    /// Server binary to launch (defaults to ratecache-server next to this one)
    #[arg(long)]
    server_bin: Option<PathBuf>,

    #[command(flatten)]
    server: ServerArgs,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.server.to_config();

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let launcher = match args.server_bin {
        Some(path) => ProcessLauncher::new(path),
        None => match ProcessLauncher::sibling() {
            Ok(launcher) => launcher,
            Err(e) => {
                eprintln!("Cannot locate server binary: {}", e);
                std::process::exit(1);
            }
        },
    };

    let mut shell = ControlShell::new(config, Box::new(launcher));

    // Never leave an orphaned server behind on Ctrl+C
    let interrupt = shell.interrupt_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupt.force_stop();
        std::process::exit(0);
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let stdin = io::stdin();
    if let Err(e) = shell.run(stdin.lock(), io::stdout()) {
        eprintln!("Shell error: {}", e);
        std::process::exit(1);
    }
}
