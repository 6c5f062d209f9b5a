//! IOU command-line client
//!
//! Usage:
//!   iou users
//!   iou owed 0xabc...
//!   iou last-active 0xabc...
//!   iou summary 0xabc...
//!   iou add --from 0xabc... 0xdef... 25
//!
//! Connection settings come from `--config FILE` (TOML) and the `IOU_*`
//! environment variables, which take precedence.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use iou_ledger::{Identity, RpcLedger};
use iou_settlement::{Config, IouClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "iou")]
#[command(about = "Record and query IOUs on a shared ledger")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(long, short, env = "IOU_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every participant
    Users,

    /// Total a user currently owes
    Owed {
        /// Account address
        user: Identity,
    },

    /// Time of a user's latest IOU
    LastActive {
        /// Account address
        user: Identity,
    },

    /// Total owed and last activity in one pass
    Summary {
        /// Account address
        user: Identity,
    },

    /// Record an IOU, netting any cycle it closes
    Add {
        /// Account taking on the debt (must be unlocked on the node)
        #[arg(long)]
        from: Identity,

        /// Account being owed
        creditor: Identity,

        /// Amount owed
        amount: u32,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            config.apply_env()?;
            config
        }
        None => Config::from_env()?,
    };
    Ok(config)
}

fn format_time(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let ledger = RpcLedger::new(config.ledger.clone()).context("Failed to create ledger client")?;
    let contract = ledger.contract();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let client = IouClient::new(Arc::new(ledger), contract, &config).with_cancellation(cancel);

    match args.command {
        Command::Users => {
            let users = client.get_users().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                for user in &users {
                    println!("{}", user);
                }
            }
        }

        Command::Owed { user } => {
            let total = client.get_total_owed(&user).await?;
            println!("{}", total);
        }

        Command::LastActive { user } => match client.get_last_active(&user).await? {
            Some(timestamp) if args.json => println!("{}", timestamp),
            Some(timestamp) => println!("{}", format_time(timestamp)),
            None if args.json => println!("null"),
            None => println!("never"),
        },

        Command::Summary { user } => {
            let summary = client.get_summary(&user).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("user:        {}", summary.user);
                println!("total owed:  {}", summary.total_owed);
                println!(
                    "last active: {}",
                    summary.last_active.map(format_time).unwrap_or_else(|| "never".to_string())
                );
            }
        }

        Command::Add {
            from,
            creditor,
            amount,
        } => {
            let outcome = client.add_iou(&from, &creditor, amount).await.map_err(|e| {
                if e.is_rejection() {
                    anyhow::anyhow!("Ledger rejected the IOU: {}", e)
                } else if e.is_connectivity() {
                    anyhow::anyhow!("Could not reach the ledger: {}", e)
                } else {
                    anyhow::Error::new(e)
                }
            })?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "Recorded in block {} (tx {}), netted {}",
                    outcome.receipt.block_number,
                    outcome.receipt.transaction_hash,
                    outcome.request.net_amount
                );
            }
        }
    }

    Ok(())
}
