//! Serial Calculator Client
//!
//! Relays arithmetic expressions typed at the console to a microcontroller
//! (e.g. an Arduino running the calculator sketch) over a serial port, prints
//! the computed result and records every exchange in a log file.
//!
//! # Usage
//!
//! ```bash
//! # Ask for the port interactively, log to Berechnung.txt
//! serial-calc
//!
//! # Port given up front, custom log file
//! serial-calc --port COM3 --log rechnungen.txt
//!
//! # Give up on a silent device after two seconds
//! serial-calc -p ttyACM0 --timeout-ms 2000
//!
//! # Read defaults from a settings file
//! serial-calc --config serial-calc.toml
//! ```
//!
//! Type `beenden` to end the session.

mod config;
mod error;
mod serial;
mod session;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::info;
use std::io;
use std::path::PathBuf;

use config::{Overrides, SessionOptions, Settings};
use error::SessionError;
use serial::{PortConfig, SerialConnection};
use session::{prompt_port_name, ExchangeLog, SessionRunner};

/// Serial Calculator Client
///
/// Sends each expression to the calculator at 9600 8N1 and logs the results
#[derive(Parser)]
#[command(name = "serial-calc")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Relay arithmetic expressions to a serial calculator device")]
struct Cli {
    /// Serial port (e.g., COM3, ttyUSB0); asked for when omitted
    #[arg(short, long)]
    port: Option<String>,

    /// Exchange log file [default: Berechnung.txt]
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read timeout in milliseconds (default: wait for the reply indefinitely)
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Prefix log lines with a timestamp
    #[arg(long)]
    timestamps: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port.clone(),
            log_file: self.log.clone(),
            read_timeout_ms: self.timeout_ms,
            log_timestamps: self.timestamps,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings = match cli.config {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let options = SessionOptions::resolve(settings, cli.overrides());

    // Connection and log are dropped inside run_session before we exit
    if let Err(e) = run_session(&options) {
        eprintln!("{} {}", "[ERROR]".red().bold(), e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}

fn run_session(options: &SessionOptions) -> Result<(), SessionError> {
    let mut input = io::stdin().lock();
    let mut output = io::stdout();

    let port_name = match options.port {
        Some(ref port) => port.clone(),
        None => prompt_port_name(&mut input, &mut output)?.unwrap_or_default(),
    };

    let port_config = PortConfig::new(&port_name).with_read_timeout(options.read_timeout);
    let mut connection = SerialConnection::open(port_config)?;
    let settings = connection.configure()?;
    info!(
        "Connected to {} at {}",
        connection.config().port_name,
        settings
    );

    let log = ExchangeLog::create(&options.log_file, options.log_timestamps)?;
    info!("Exchange log: {}", log.path().display());

    let exchanges = SessionRunner::new(connection, log, input, output).run()?;
    info!("Session ended after {} exchanges", exchanges);
    Ok(())
}
