#![warn(missing_docs)]
//! # aviator-remote binary
//!
//! Console front-end: reads commands from stdin and prints session updates.

use std::io::BufRead;
use std::process::ExitCode;

use aviator_app::command::COMMAND_HELP;
use aviator_app::{ClientConfig, UserCommand, app_version, console, parse_command, runtime};
use clap::Parser;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Remote launcher client.
#[derive(Debug, Parser)]
#[command(name = "aviator-remote", version = app_version())]
struct Cli {
    /// Server origin, e.g. `http://desk.local:8000`. Overrides `AVIATOR_ORIGIN`.
    #[arg(long)]
    origin: Option<String>,
}

/// CLI entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(origin) = cli.origin {
        config = config.with_origin(origin);
    }

    println!("aviator-remote {}", app_version());
    println!("{COMMAND_HELP}");

    let (command_tx, command_rx) = tokio::sync::mpsc::unbounded_channel();
    std::thread::spawn(move || read_commands(command_tx));

    let printer = |update: &aviator_app::SessionUpdate| {
        for line in console::describe(update) {
            println!("{line}");
        }
    };

    match runtime::run(&config, command_rx, printer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("client failed: {error}");
            eprintln!("aviator-remote: {error}");
            ExitCode::FAILURE
        }
    }
}

fn read_commands(commands: UnboundedSender<UserCommand>) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!("stdin read failed: {error}");
                return;
            }
        };
        match parse_command(&line) {
            Ok(Some(command)) => {
                if commands.send(command).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(error) => println!("{error}. {COMMAND_HELP}"),
        }
    }
}
