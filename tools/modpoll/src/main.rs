//! modpoll - register verification for VoltageEMS device bring-up
//!
//! Reads every row of a CSV plan from a Modbus TCP target, decodes the values
//! and prints an OK/WARN/FAIL line per register.

mod console;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use voltage_verify::report::{EXIT_CONNECT_FAILED, EXIT_FAILURES};
use voltage_verify::{
    load_plan, ByteEndian, ModbusTcpTransport, Overrides, PollOrchestrator, ResultRecord,
    VerifyConfig, WordOrder,
};

#[derive(Parser)]
#[command(name = "modpoll")]
#[command(about = "Verify Modbus TCP registers against a CSV plan")]
#[command(long_about = "Verify Modbus TCP registers against a CSV plan

Every option may also come from a YAML file (--config) or from MODPOLL_*
environment variables; command line values win.

Examples:
  modpoll --host 192.168.199.72
  modpoll --host 192.168.199.72 --endian big --wordorder little --json out.json
  modpoll --host 10.0.0.5 --csv plan.csv --only-slave 200 --only-group meter")]
#[command(version)]
struct Cli {
    /// Modbus TCP host/IP
    #[arg(long)]
    host: Option<String>,

    /// Modbus TCP port [default: 502]
    #[arg(long)]
    port: Option<u16>,

    /// CSV plan file [default: modpoll_verify_gen24.csv]
    #[arg(long = "csv", value_name = "FILE")]
    plan: Option<PathBuf>,

    /// Socket timeout in seconds [default: 3.0]
    #[arg(long)]
    timeout: Option<f64>,

    /// Retries per read on error [default: 1]
    #[arg(long)]
    retries: Option<u32>,

    /// Delay between retries in seconds [default: 0.3]
    #[arg(long = "retry-delay")]
    retry_delay: Option<f64>,

    /// Byte order within 16-bit words [default: big]
    #[arg(long, value_enum)]
    endian: Option<ByteEndian>,

    /// Word order for 32-bit values [default: big]
    #[arg(long = "wordorder", value_enum)]
    word_order: Option<WordOrder>,

    /// Write results to this JSON file
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Only read this slave id (0 = all)
    #[arg(long = "only-slave")]
    only_slave: Option<u8>,

    /// Only read rows whose group contains this (case-insensitive)
    #[arg(long = "only-group")]
    only_group: Option<String>,

    /// YAML configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            plan: self.plan.clone(),
            timeout: self.timeout,
            retries: self.retries,
            retry_delay: self.retry_delay,
            endian: self.endian,
            word_order: self.word_order,
            only_slave: self.only_slave,
            only_group: self.only_group.clone(),
            json: self.json.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.verbose, !cli.no_color);

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "ERROR:".red(), e);
            ExitCode::from(EXIT_FAILURES)
        },
    }
}

async fn run(cli: &Cli) -> Result<u8> {
    let config = VerifyConfig::load_with(cli.config.as_deref(), &cli.overrides())
        .context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config);

    execute(&config).await
}

/// Load the plan, connect and poll; returns the process exit code
async fn execute(config: &VerifyConfig) -> Result<u8> {
    let plan = load_plan(&config.plan)
        .with_context(|| format!("Failed to load plan {}", config.plan.display()))?;

    let target = config.target();
    let transport =
        match ModbusTcpTransport::connect(&config.host, config.port, config.timeout_duration())
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                error!("could not connect to {}: {}", target, e);
                return Ok(EXIT_CONNECT_FAILED);
            },
        };

    let orchestrator = PollOrchestrator::new(config.poll_settings());
    let mut printer = |record: &ResultRecord| console::print_record(record);
    let summary = orchestrator
        .run_session(&plan, transport, &mut printer)
        .await;

    println!();
    println!("{}", console::summary_line(&summary.summary));

    if let Some(path) = &config.json {
        summary
            .write_json(path)
            .with_context(|| format!("Failed to write JSON report {}", path.display()))?;
        println!("Wrote JSON report: {}", path.display());
    }

    Ok(summary.exit_code())
}
