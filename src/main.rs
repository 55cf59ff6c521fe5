//! UART-TABS command-line front end
//! Opens one tab per serial port, prints the active tab's output, and reads
//! commands and lines to send from stdin

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};
use uart_tabs::core::matching_zones;
use uart_tabs::serial::parse_baud;
use uart_tabs::session::PortOpener;
use uart_tabs::shell::PortLister;
use uart_tabs::{
    list_ports, AppConfig, Reply, SerialConfig, SerialPort, Shell, TabManager, APP_TITLE,
};

const DEFAULT_CONFIG_FILE: &str = "uart-tabs.json";

/// Tabbed serial log viewer
#[derive(Parser)]
#[command(name = "uart-tabs")]
#[command(version)]
#[command(about = "Monitor several serial ports at once, with optional per-line timestamps")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List detected serial ports
    List,

    /// List time zone names, optionally filtered
    Zones {
        /// Case-insensitive substring to match
        filter: Option<String>,
    },

    /// Open tabs and monitor ports interactively
    Monitor {
        /// Ports to open (default: from config, else every detected port)
        ports: Vec<String>,

        /// Baud rate for every tab
        #[arg(short, long, value_parser = baud_arg)]
        baud: Option<u32>,

        /// Prefix received lines with timestamps
        #[arg(short, long)]
        timestamps: bool,

        /// Time zone for timestamps (IANA name or "local")
        #[arg(long)]
        tz: Option<String>,

        /// Log every tab into this directory
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Open tabs without connecting
        #[arg(long)]
        no_connect: bool,
    },
}

fn baud_arg(text: &str) -> std::result::Result<u32, String> {
    parse_baud(text).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List => {
            let ports = list_ports()?;
            if ports.is_empty() {
                eprintln!("No serial ports detected.");
            }
            for port in ports {
                println!("{}", port);
            }
            Ok(())
        }
        Commands::Zones { filter } => {
            for zone in matching_zones(filter.as_deref().unwrap_or("")) {
                println!("{}", zone);
            }
            Ok(())
        }
        Commands::Monitor {
            ports,
            baud,
            timestamps,
            tz,
            log,
            no_connect,
        } => {
            let mut config = AppConfig::load_or_default(&cli.config)?;
            if !ports.is_empty() {
                config.ports = ports;
            }
            if let Some(baud) = baud {
                config.baud_rate = baud;
            }
            if timestamps {
                config.timestamp_enabled = true;
            }
            if let Some(tz) = tz {
                config.time_zone = tz;
            }
            let log_everything = log.is_some();
            if log.is_some() {
                config.log_dir = log;
            }

            monitor(config, !no_connect, log_everything).await
        }
    }
}

async fn monitor(config: AppConfig, connect: bool, log_everything: bool) -> Result<()> {
    let settings = config.manager_settings()?;
    tracing::info!(
        "{} {}: timestamps {}, zone {}, {} baud",
        APP_TITLE,
        uart_tabs::VERSION,
        if settings.timestamp_enabled { "on" } else { "off" },
        settings.time_zone,
        settings.default_baud
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let opener: PortOpener<SerialPort> =
        Box::new(|name: &str, serial_config: &SerialConfig| {
            SerialPort::open(name, serial_config.clone())
        });
    let lister: PortLister = Box::new(list_ports);
    let manager = TabManager::new(settings, opener, tx);
    let mut shell = Shell::new(manager, lister).with_log_dir(config.log_dir.clone());

    show(shell.open_ports(&config.ports, connect))?;
    if log_everything {
        show(shell.log_all())?;
    }
    eprintln!("{}: type :help for commands", APP_TITLE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let quit = tokio::select! {
            line = lines.next_line(), if stdin_open => match read_input(line) {
                Input::Line(line) => show(shell.execute(&line).await)?,
                Input::Skipped(notice) => show(vec![Reply::Notice(notice)])?,
                Input::Closed => {
                    // Keep monitoring until Ctrl-C
                    stdin_open = false;
                    false
                }
            },
            Some(event) = rx.recv() => show(shell.handle_event(event))?,
            _ = tokio::signal::ctrl_c() => true,
        };

        if quit {
            break;
        }
    }

    shell.shutdown();
    tracing::info!("Exiting");
    Ok(())
}

/// One result from the stdin line reader, sorted by what the loop does next
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Skipped(String),
    Closed,
}

fn read_input(line: io::Result<Option<String>>) -> Input {
    match line {
        Ok(Some(line)) => Input::Line(line),
        Ok(None) => {
            tracing::debug!("stdin closed");
            Input::Closed
        }
        // A line that is not UTF-8 is skipped; the reader has already consumed it
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Input::Skipped(format!("Ignored input line: {}", e))
        }
        Err(e) => {
            tracing::warn!("Reading stdin failed: {}", e);
            Input::Closed
        }
    }
}

/// Print replies; returns true when the shell asked to quit
fn show(replies: Vec<Reply>) -> io::Result<bool> {
    let mut stdout = io::stdout().lock();
    let mut quit = false;

    for reply in replies {
        match reply {
            Reply::Output(text) => stdout.write_all(text.as_bytes())?,
            Reply::Info(text) => writeln!(stdout, "{}", text)?,
            Reply::Notice(text) => eprintln!("{}: {}", APP_TITLE, text),
            Reply::Quit => quit = true,
        }
    }
    stdout.flush()?;
    Ok(quit)
}
