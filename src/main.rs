use clap::{Parser, Subcommand};
use com_monitor::config::{Config, ConfigLoader};
use com_monitor::logging::init_logging;
use com_monitor::{
    enumerate_ports, lookup_error_code, run_all_diagnostics, select_port, AppError, AppResult,
    CancelToken, DiagnosticEngine, DiagnosticKind, DiagnosticReport, PortInfo, SystemPortOpener,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "com-monitor",
    version,
    about = "Serial port diagnostics: status, loopback and stress tests.",
    long_about = "Enumerates the serial ports on this machine, explains why a port can or cannot be opened, and verifies data integrity with loopback and timed stress tests. Loopback and stress tests need a loopback plug (TX wired to RX)."
)]
struct Cli {
    /// Configuration file to use instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log level filter (overrides the configured level, not RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports present on this machine.
    List,
    /// Open a port once and report its status. Prompts for a port when none is given.
    Status {
        /// 1-based index from `list`, device path, or configured alias.
        port: Option<String>,
    },
    /// Write a payload and check that the same bytes come back.
    Loopback {
        port: String,
        /// Text to send instead of the configured payload.
        #[arg(long)]
        payload: Option<String>,
    },
    /// Exchange blocks for a fixed time and count mismatches.
    Stress {
        port: String,
        /// Duration in seconds instead of the configured one.
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Report the status of every enumerated port.
    RunAll,
    /// Describe a numeric error code.
    Lookup {
        #[arg(allow_negative_numbers = true)]
        code: i64,
    },
    /// Write the effective configuration to a file.
    InitConfig {
        /// Destination; the per-user config file when omitted.
        path: Option<PathBuf>,
    },
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    match init_logging(&config.logging, cli.log_level.as_deref()) {
        Ok(Some(path)) => info!(path = %path.display(), "COMMonitor started"),
        Ok(None) => info!("COMMonitor started"),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code() as u8);
        }
    }

    match run(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            warn!(error = %e, "exiting with error");
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> AppResult<Config> {
    let loader = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader.into_config())
}

/// Run the selected command. `Ok(false)` means a port was unhealthy.
async fn run(cli: Cli, config: Config) -> AppResult<bool> {
    let json = cli.json;

    match cli.command {
        Command::List => {
            let ports = enumerate_ports()?;
            if json {
                print_json(&ports)?;
            } else {
                print_port_list(&ports);
            }
            Ok(!ports.is_empty())
        }
        Command::Status { port } => {
            let target = match port {
                Some(selection) => resolve_target(&config, &selection)?,
                None => match prompt_for_port()? {
                    Some(port) => port,
                    None => return Ok(false),
                },
            };
            run_one(&config, None, target, DiagnosticKind::Status, json).await
        }
        Command::Loopback { port, payload } => {
            let target = resolve_target(&config, &port)?;
            run_one(&config, payload, target, DiagnosticKind::Loopback, json).await
        }
        Command::Stress { port, duration } => {
            let target = resolve_target(&config, &port)?;
            let duration = match duration {
                Some(0) => {
                    return Err(AppError::InvalidArgument(
                        "duration must be at least one second".into(),
                    ))
                }
                Some(secs) => Duration::from_secs(secs),
                None => config.diagnostics.stress_duration(),
            };
            run_one(&config, None, target, DiagnosticKind::Stress { duration }, json).await
        }
        Command::RunAll => run_all(&config, json).await,
        Command::Lookup { code } => {
            let table = config.error_code_table()?;
            let description = lookup_error_code(code, &table);
            if json {
                print_json(&serde_json::json!({ "code": code, "description": description }))?;
            } else {
                println!("{code}: {description}");
            }
            Ok(true)
        }
        Command::InitConfig { path } => {
            let path = path
                .or_else(com_monitor::config::get_default_config_path)
                .ok_or(AppError::Config(com_monitor::ConfigError::NoPath))?;
            ConfigLoader::with_defaults().save_to(&path)?;
            println!("Configuration written to {}", path.display());
            Ok(true)
        }
    }
}

fn build_engine(
    config: &Config,
    payload: Option<String>,
    cancel: CancelToken,
) -> AppResult<DiagnosticEngine<SystemPortOpener>> {
    let mut settings = config.engine_settings()?;
    if let Some(payload) = payload {
        if payload.is_empty() {
            return Err(AppError::InvalidArgument("payload must not be empty".into()));
        }
        settings.loopback_payload = payload.into_bytes();
    }
    Ok(DiagnosticEngine::new(SystemPortOpener, settings).with_cancel(cancel))
}

/// Trip `cancel` on Ctrl-C so a running stress test stops at its next block.
///
/// Only installed for diagnostics that watch the token; elsewhere Ctrl-C keeps
/// its default behaviour and ends the process. Returns whether it was installed.
fn watch_interrupt(kind: &DiagnosticKind, cancel: CancelToken) -> bool {
    if !kind.is_cancellable() {
        return false;
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current block");
            cancel.cancel();
        }
    });
    true
}

async fn run_one(
    config: &Config,
    payload: Option<String>,
    port: PortInfo,
    kind: DiagnosticKind,
    json: bool,
) -> AppResult<bool> {
    let cancel = CancelToken::new();
    let engine = build_engine(config, payload, cancel.clone())?;
    watch_interrupt(&kind, cancel);

    let report = tokio::task::spawn_blocking(move || kind.run(&engine, &port))
        .await
        .map_err(|e| AppError::Task(e.to_string()))?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(report.is_healthy())
}

async fn run_all(config: &Config, json: bool) -> AppResult<bool> {
    let ports = enumerate_ports()?;
    if ports.is_empty() {
        warn!("No Serial Ports Detected");
        return Err(AppError::NoPorts);
    }
    if !json {
        print_port_list(&ports);
    }

    let engine = build_engine(config, None, CancelToken::new())?;

    let results = tokio::task::spawn_blocking(move || run_all_diagnostics(&engine, &ports))
        .await
        .map_err(|e| AppError::Task(e.to_string()))?;

    let healthy = results.iter().all(|(_, status)| status.category.is_ready());
    if json {
        #[derive(Serialize)]
        struct Entry<'a> {
            port: &'a PortInfo,
            status: &'a com_monitor::PortStatus,
        }
        let entries: Vec<_> = results
            .iter()
            .map(|(port, status)| Entry { port, status })
            .collect();
        print_json(&entries)?;
    } else {
        for (port, status) in &results {
            println!("Port {} is {}.", port.name, status);
        }
    }
    Ok(healthy)
}

/// Resolve an alias, list index, or device path to a port.
fn resolve_target(config: &Config, selection: &str) -> AppResult<PortInfo> {
    let selection = config.serial.resolve_port(selection);
    let ports = enumerate_ports().unwrap_or_else(|e| {
        warn!(error = %e, "port enumeration failed");
        Vec::new()
    });
    select_port(&ports, &selection).ok_or(AppError::InvalidSelection(selection))
}

/// List ports and ask for one by number until a valid choice is made.
///
/// Returns `None` when there are no ports or stdin is closed.
fn prompt_for_port() -> AppResult<Option<PortInfo>> {
    let ports = enumerate_ports()?;
    print_port_list(&ports);
    if ports.is_empty() {
        println!("Exiting the application as no ports were detected.");
        return Ok(None);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Select a port by number to check its status: ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        let chosen = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| ports.get(i));
        match chosen {
            Some(port) => return Ok(Some(port.clone())),
            None => {
                println!("Invalid selection. Please enter a valid port number.");
                warn!("Invalid selection made by user.");
            }
        }
    }
}

fn print_port_list(ports: &[PortInfo]) {
    if ports.is_empty() {
        println!("No Serial Ports Detected");
        warn!("No Serial Ports Detected");
        return;
    }
    println!("{} Ports found:", ports.len());
    for (i, port) in ports.iter().enumerate() {
        println!("{}. {}", i + 1, port);
    }
}

fn print_report(report: &DiagnosticReport) {
    match report {
        DiagnosticReport::Status { port, status } => {
            println!("Port {} is {}.", port.name, status);
            if let Some(n) = status.sample_len {
                println!("Data received: {n} bytes");
            }
        }
        DiagnosticReport::Test(result) => println!("{result}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
