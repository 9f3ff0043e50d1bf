use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use importgate::config::ImportGateConfig;
use importgate::ratelimit::ImportRateLimiter;
use importgate::store::RedisWindowStore;

/// Import rate limit gate for the wallet transaction import pipeline.
#[derive(Parser)]
#[command(name = "importgate", version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Store connection URL, overriding the configuration file
    #[arg(long)]
    store_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an import attempt without consuming quota
    Check(ImportArgs),
    /// Evaluate an import attempt and record it if allowed
    Record(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// User performing the import
    #[arg(long)]
    user: String,

    /// Client address the request arrived from
    #[arg(long)]
    ip: String,

    /// Wallet receiving the imported transactions
    #[arg(long)]
    wallet: String,

    /// Print the decision as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; the decision goes to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => ImportGateConfig::from_file(path)?,
        None => ImportGateConfig::default(),
    };
    if let Some(url) = cli.store_url {
        config.store.url = url;
    }
    info!(store_url = %config.store.url, "Configuration loaded");

    let store = Arc::new(RedisWindowStore::connect(&config.store.url).await?);
    let limiter = ImportRateLimiter::new(store, config.limits.to_rate_limit_config()?);

    let (args, record) = match &cli.command {
        Command::Check(args) => (args, false),
        Command::Record(args) => (args, true),
    };

    let result = limiter
        .check_rate_limit(&args.user, &args.ip, &args.wallet)
        .await?;

    // Record only what was actually admitted.
    if record && result.allowed {
        limiter
            .increment_counters(&args.user, &args.ip, &args.wallet)
            .await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.allowed {
        println!(
            "allowed: {} of {} imports left in the {} window",
            result.remaining, result.limit, result.limit_type
        );
    } else {
        println!(
            "denied: {} (retry in {}s)",
            result.error_message.as_deref().unwrap_or("rate limited"),
            result.retry_after_secs
        );
    }

    if !result.allowed {
        std::process::exit(1);
    }

    Ok(())
}
