mod api;
mod dashboard;
mod monitor;
mod tracking;
mod util;
pub mod accounting;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::accounting::{FileStateStore, StateStore};
use crate::monitor::{stats::DashboardStats, Monitor};
use crate::util::timestamp::now_ms;

#[derive(Parser, Debug)]
#[command(author, version, about = "DUCO Tracker - headless account dashboard", long_about = None)]
struct Cli {
    /// DUCO REST API base URL
    #[arg(long, env = "DUCO_API", default_value = "https://server.duinocoin.com")]
    api: String,

    /// Seconds between polls
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 10)]
    interval: u64,

    /// Seconds before a request to the API is given up
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,

    /// Directory holding tracking state (JSON)
    #[arg(long, env = "DUCO_STORE", default_value = "store")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the account, track mined earnings and show the dashboard
    Watch {
        /// Account name (defaults to the last user)
        user: Option<String>,
    },
    /// Fetch the account document once and print it
    Snapshot { user: String },
    /// Print stored tracking state without contacting the server
    Status {
        /// Account name (defaults to the last user)
        user: Option<String>,
    },
    /// Forget the remembered user
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log = cli.log.clone(); // avoid moving cli
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log))
        .init();

    match cli.command {
        Commands::Watch { ref user } => {
            let user = user.clone();
            cmd_watch(&cli, user).await?
        }
        Commands::Snapshot { ref user } => cmd_snapshot(&cli, user).await?,
        Commands::Status { ref user } => cmd_status(&cli, user.clone())?,
        Commands::Logout => cmd_logout(&cli)?,
    }

    Ok(())
}

fn resolve_user(store: &FileStateStore, user: Option<String>) -> anyhow::Result<String> {
    let user = match user {
        Some(u) => Some(u),
        None => store.last_user()?,
    };
    user.map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .context("no user given and none remembered; pass one, e.g. `watch <USER>`")
}

async fn cmd_watch(cli: &Cli, user: Option<String>) -> anyhow::Result<()> {
    let store = FileStateStore::new(&cli.store)?;
    let user = resolve_user(&store, user)?;
    let client = api::DucoClient::new(cli.api.clone(), Duration::from_secs(cli.timeout.max(1)))?;

    let (tx, rx) = tokio::sync::watch::channel(DashboardStats::new(&user));
    let dash = tokio::spawn(dashboard::launch_dashboard(rx));

    let monitor = Monitor::new(client, store, Duration::from_secs(cli.interval.max(1)))
        .with_stats(tx);
    let result = monitor.run_loop(&user).await;

    // dropping the monitor closes the channel and ends the dashboard
    drop(monitor);
    let _ = dash.await;
    result
}

async fn cmd_snapshot(cli: &Cli, user: &str) -> anyhow::Result<()> {
    let client = api::DucoClient::new(cli.api.clone(), Duration::from_secs(cli.timeout.max(1)))?;
    let data = client.get_user(user).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn cmd_status(cli: &Cli, user: Option<String>) -> anyhow::Result<()> {
    let store = FileStateStore::new(&cli.store)?;
    let user = resolve_user(&store, user)?;

    match store.load(&user) {
        Some(state) => {
            let now = now_ms();
            println!("account            : {}", user);
            println!("mined since start  : {}", state.cumulative_mined);
            println!("last balance       : {}", state.last_observed_balance);
            println!("known transactions : {}", state.known_transactions.len());
            println!("samples (24h)      : {}", tracking::window::prune(state.samples.clone(), now).len());
            println!(
                "est. daily         : {}",
                state
                    .estimated_daily_rate(now)
                    .map(|v| format!("{:.4}", v))
                    .unwrap_or_else(|| "n/a".into())
            );
        }
        None => println!("no tracking state for {}", user),
    }
    Ok(())
}

fn cmd_logout(cli: &Cli) -> anyhow::Result<()> {
    let store = FileStateStore::new(&cli.store)?;
    store.forget_user()?;
    tracing::info!("remembered user cleared");
    Ok(())
}
