//! Settlement CLI
//!
//! Recomputes one settlement month from the command line and prints the run
//! summary as JSON. Scheduling is external; this binary is the operator /
//! cron trigger.
//!
//! ```bash
//! # Recompute November 2025
//! royalty-settle --month 2025-11
//!
//! # Against a specific database
//! royalty-settle --month 2025-11 --database-path /data/settle.db
//!
//! # With a config file
//! royalty-settle --month 2025-11 --config /etc/royalty-settle.toml
//! ```

use std::path::PathBuf;

use clap::Parser;
use royalty_settle::{db, Config, SettlementEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "royalty-settle")]
#[command(about = "Monthly editorial revenue-share settlement")]
struct Args {
    /// Settlement month to recompute (YYYY-MM)
    #[arg(short, long, env = "SETTLE_MONTH")]
    month: String,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config)
    #[arg(long, env = "SETTLE_DATABASE_PATH")]
    database_path: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("royalty_settle=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(path) = args.database_path {
        config.database_path = path;
    }

    let pool = db::open(&config.database_path)?;
    let engine = SettlementEngine::new(pool, &config);
    let summary = engine.recompute_month(&args.month)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
