use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use wallet_launcher::config_loader::{self, LaunchCliOverrides};
use wallet_launcher::process::{build_wallet_service, WalletStartService};

/// Output format of the launch descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

/// Print the command line that starts the wallet backend server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the launch configuration (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    config: PathBuf,

    /// Base directory for wallet databases (defaults to the configured state_dir)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// API port, overriding the configuration
    #[arg(long)]
    api_port: Option<u16>,

    /// Sync tolerance (e.g. 90s, 5m, "1h 30m"), overriding the configuration
    #[arg(long, value_parser = humantime::parse_duration)]
    sync_tolerance: Option<Duration>,

    /// Output format of the launch descriptor
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn render(service: &WalletStartService, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(service)
            .wrap_err("Failed to serialize launch descriptor as JSON")?,
        OutputFormat::Yaml => serde_yaml::to_string(service)
            .wrap_err("Failed to serialize launch descriptor as YAML")?,
    };
    Ok(rendered)
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Logs go to stderr, stdout carries only the descriptor
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = config_loader::load_config(&args.config)?;
    config_loader::apply_overrides(
        &mut config,
        &LaunchCliOverrides {
            api_port: args.api_port,
            sync_tolerance: args.sync_tolerance,
        },
    )?;

    let base_dir = args.base_dir.unwrap_or_else(|| config.state_dir.clone());
    info!("Base directory: {:?}", base_dir);

    let service = build_wallet_service(&base_dir, &config)
        .wrap_err("Failed to build wallet launch descriptor")?;

    if let Some(logs) = &config.child_process_log_files {
        info!("Supervisor should write node output to {:?}", logs.node);
        info!("Supervisor should write wallet output to {:?}", logs.wallet);
    }
    if !config.install_signal_handlers() {
        info!("Signal handlers disabled; the supervisor must stop the wallet explicitly");
    }

    info!(
        "Wallet API will listen on port {} ({:?} to stop)",
        service.api_port,
        service.shutdown_method()
    );

    println!("{}", render(&service, args.format)?);
    Ok(())
}
