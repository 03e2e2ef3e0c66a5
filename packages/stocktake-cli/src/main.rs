//! Stocktake CLI - network sweep and asset registration for inventory teams
//!
//! This binary drives the discovery pipeline:
//! - Sweep a target range for live hosts
//! - Fingerprint each host best-effort
//! - Skip devices the inventory already knows
//! - Register the rest with sequential asset IDs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;
use stocktake_core::{
    AuthScheme, InventoryClient, RetryPolicy, SweepOptions, SweepRunner, config,
};

#[derive(Parser)]
#[command(name = "stocktake")]
#[command(version)]
#[command(about = "Network asset discovery and inventory registration")]
#[command(long_about = "
Stocktake sweeps a network range, fingerprints the live hosts, and
registers anything the inventory does not already know, assigning each
new device the next sequential asset ID for its type.

Quick start:
  1. Preview a sweep:   stocktake sweep --target 10.27.16.0/24 --dry-run
  2. Register for real: stocktake sweep --target 10.27.16.0/24
  3. Show settings:     stocktake config

Logs go to stderr; stdout stays clean for --dry-run --json output.
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep a target range and register unknown devices
    Sweep {
        /// Single IP, range (a-b), or CIDR (e.g. 10.27.16.0/24)
        #[arg(short, long)]
        target: String,

        /// Inventory API root, no trailing slash (e.g. http://inventory:4000)
        #[arg(long)]
        api_url: Option<String>,

        /// Do not POST; just log (and optionally print) discovered assets
        #[arg(long)]
        dry_run: bool,

        /// With --dry-run, print the prepared records as a JSON array on stdout
        #[arg(long)]
        json: bool,

        /// Bearer token for the API (Authorization: Bearer ...)
        #[arg(long)]
        bearer: Option<String>,

        /// HTTP Basic username
        #[arg(long)]
        basic_user: Option<String>,

        /// HTTP Basic password
        #[arg(long)]
        basic_pass: Option<String>,

        /// Skip the remote management query
        #[arg(long)]
        skip_management: bool,

        /// Skip ARP MAC resolution
        #[arg(long)]
        skip_arp: bool,

        /// Skip OS detection
        #[arg(long)]
        skip_os: bool,

        /// Seconds to pause between registrations (protects a single-writer store)
        #[arg(long, default_value_t = 0.35)]
        throttle: f64,

        /// Limit the number of hosts processed (0 = no limit)
        #[arg(long, default_value_t = 0)]
        max_hosts: usize,

        /// Offline discovery: no dedup-cache load, no next-ID calls
        #[arg(long)]
        no_api: bool,
    },

    /// Show configuration paths and settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs on stderr; stdout is reserved for machine-readable output
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("stocktake={log_level},stocktake_core={log_level}").into()
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Sweep {
            target,
            api_url,
            dry_run,
            json,
            bearer,
            basic_user,
            basic_pass,
            skip_management,
            skip_arp,
            skip_os,
            throttle,
            max_hosts,
            no_api,
        } => {
            cmd_sweep(SweepArgs {
                target,
                api_url,
                dry_run,
                json,
                bearer,
                basic_user,
                basic_pass,
                skip_management,
                skip_arp,
                skip_os,
                throttle,
                max_hosts,
                no_api,
            })
            .await
        }
        Commands::Config => cmd_config(),
    }
}

struct SweepArgs {
    target: String,
    api_url: Option<String>,
    dry_run: bool,
    json: bool,
    bearer: Option<String>,
    basic_user: Option<String>,
    basic_pass: Option<String>,
    skip_management: bool,
    skip_arp: bool,
    skip_os: bool,
    throttle: f64,
    max_hosts: usize,
    no_api: bool,
}

async fn cmd_sweep(args: SweepArgs) -> Result<()> {
    let settings = config::load_config();

    if args.no_api && !args.dry_run {
        tracing::warn!(
            "--no-api without --dry-run: nothing can be registered, every host will be reported as failed"
        );
    }

    let client = if args.no_api {
        None
    } else {
        let api_url = args.api_url.unwrap_or(settings.api_url);
        let auth = AuthScheme::from_parts(
            args.bearer.or(settings.bearer),
            args.basic_user,
            args.basic_pass,
        );
        Some(InventoryClient::new(&api_url, auth)?)
    };

    let options = SweepOptions {
        target: args.target,
        dry_run: args.dry_run,
        skip_management: args.skip_management,
        skip_arp: args.skip_arp,
        skip_os: args.skip_os,
        throttle: Duration::from_secs_f64(args.throttle.max(0.0)),
        max_hosts: args.max_hosts,
        retry: RetryPolicy::default(),
    };

    let runner = SweepRunner::new(options, client, settings.management).await;
    let summary = runner.run().await?;

    if args.dry_run && args.json {
        println!("{}", serde_json::to_string(&summary.prepared)?);
    }

    Ok(())
}

fn cmd_config() -> Result<()> {
    let settings = config::load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file:      {}", config::config_file_path_string());
    println!("API endpoint:     {} (from {})", settings.api_url, settings.source);
    println!(
        "Bearer token:     {}",
        if settings.bearer.is_some() { "configured" } else { "not set" }
    );
    println!(
        "Management creds: {}",
        if settings.management.is_some() { "configured" } else { "not set" }
    );
    println!();
    println!("Environment variables:");
    println!("  STOCKTAKE_API_URL       - Override the inventory API endpoint");
    println!("  STOCKTAKE_MGMT_USER     - Remote management username");
    println!("  STOCKTAKE_MGMT_PASSWORD - Remote management password");
    println!();
    println!("Example config.toml:");
    println!();
    println!("{}", config::example_config());

    Ok(())
}
