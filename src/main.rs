//! MockServer control-plane client - CLI Entry Point

use anyhow::Result;
use clap::{Parser, Subcommand};
use mockserver_control::{ClientConfig, ControlPlaneClient, Protocol, Scenario};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mockserver-control",
    about = "Control-plane client for MockServer - expectations and verifications",
    version
)]
struct Args {
    /// Path to client configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base address of the mock server (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    base_url: Option<String>,

    /// Speak the count/exact verification protocol
    #[arg(long, conflicts_with = "threshold")]
    legacy: bool,

    /// Speak the atLeast/atMost verification protocol
    #[arg(long)]
    threshold: bool,

    /// Per-call timeout in milliseconds (overrides the config file)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a scenario's expectations and run its verifications
    Apply { scenario: PathBuf },
    /// Validate a scenario file and exit
    Validate { scenario: PathBuf },
    /// Remove all expectations and recorded requests
    Reset,
    /// Remove expectations and requests matching a path
    Clear { path: String },
    /// Print the requests received on a path
    Requests { path: String },
    /// Print the expectations active on a path
    Expectations { path: String },
    /// Ask the server to dump its state to its log
    Dump,
    /// Print the sample scenario and exit
    PrintScenario,
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let protocol_flag = if args.legacy {
        Some(Protocol::legacy())
    } else if args.threshold {
        Some(Protocol::threshold())
    } else {
        None
    };

    let mut config = match (&args.config, &args.base_url, protocol_flag) {
        (Some(path), _, _) => {
            info!(path = ?path, "Loading configuration");
            ClientConfig::from_file(path)?
        }
        (None, Some(base_url), Some(protocol)) => ClientConfig::new(base_url, protocol),
        (None, None, _) => anyhow::bail!("No configuration: pass --config or --base-url"),
        (None, Some(_), None) => {
            anyhow::bail!("Protocol not selected: pass --legacy or --threshold")
        }
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(protocol) = protocol_flag {
        config.protocol.count_encoding = protocol.count_encoding;
        config.protocol.expectation_query = protocol.expectation_query;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Commands that never talk to the server
    match &args.command {
        Command::PrintScenario => {
            let sample = include_str!("../demos/default-scenario.yaml");
            println!("{}", sample);
            return Ok(());
        }
        Command::Validate { scenario } => {
            let scenario = Scenario::from_file(scenario)?;
            println!(
                "Scenario is valid ({} expectations, {} verifications, {} sequences)",
                scenario.expectations.len(),
                scenario.verifications.len(),
                scenario.sequences.len()
            );
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&args)?;
    let client = ControlPlaneClient::new(&config)?;
    info!(base_url = %client.base_url(), "Connected to mock server control plane");

    match args.command {
        Command::Apply { scenario } => {
            let scenario = Scenario::from_file(&scenario)?;
            let report = scenario.apply(&client).await?;
            println!(
                "Applied {} expectations, passed {} verifications and {} sequences",
                report.expectations, report.verifications, report.sequences
            );
        }
        Command::Reset => client.reset_all().await?,
        Command::Clear { path } => client.clear(&path).await?,
        Command::Requests { path } => {
            let requests = client.retrieve_requests(&path).await?;
            println!("{}", serde_json::to_string_pretty(&requests)?);
        }
        Command::Expectations { path } => {
            let expectations = client.retrieve_expectations(&path).await?;
            println!("{}", serde_json::to_string_pretty(&expectations)?);
        }
        Command::Dump => client.dump_to_log().await?,
        Command::PrintScenario | Command::Validate { .. } => unreachable!("handled above"),
    }

    Ok(())
}
