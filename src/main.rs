use anyhow::Context;
use broadcaster::Broadcaster;
use chrono::Utc;
use clap::{Parser, Subcommand};
use configuration::{Settings, SettingsOverrides};
use core_types::{AccountId, ConnectionStatus, Diagnostics, MarketPosition};
use rust_decimal_macros::dec;
use snapshot::{PositionView, Snapshot};
use source::{SimulatedSource, StateSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use transport::{Transport, WebhookTransport};

mod simulation;

/// How long `simulate` waits for an in-flight cycle after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The main entry point for the Tradecast broadcaster.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // TRADECAST_* variables may come from a .env file; it is optional.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Flags are applied before validation so they can correct a bad file value.
    let settings = configuration::load_config_with_overrides(cli.config.as_deref(), &cli.overrides)
        .context("Failed to load configuration")?;

    let _log_guard = configuration::logging::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Simulate(args) => handle_simulate(args, settings).await,
        Commands::SendTest => handle_send_test(settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Broadcasts coalesced account snapshots to a webhook consumer.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (default: ./tradecast.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingsOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Broadcast a simulated paper account whose price follows a random walk.
    Simulate(SimulateArgs),
    /// Post one sample snapshot to the configured endpoint and report the outcome.
    SendTest,
}

#[derive(Parser)]
struct SimulateArgs {
    /// Name of the simulated account.
    #[arg(long, default_value = "Sim101")]
    account: String,

    /// Milliseconds between bursts of simulated market updates.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    duration_secs: Option<u64>,
}

// ==============================================================================
// Simulate Command Logic
// ==============================================================================

async fn handle_simulate(args: SimulateArgs, settings: Settings) -> anyhow::Result<()> {
    let source = Arc::new(SimulatedSource::new());
    let account = AccountId::new(args.account);
    let entry = dec!(5925.50);
    source.add_account(
        account.clone(),
        ConnectionStatus::Connected,
        simulation::paper_account(entry),
    );

    let broadcaster = Broadcaster::from_settings(
        &settings,
        source.clone() as Arc<dyn StateSource>,
        Diagnostics::tracing_only(),
    )
    .context("Failed to create the broadcaster")?;

    tracing::info!(
        endpoint = %settings.transport.endpoint_url,
        delay_ms = settings.throttle.delay_ms,
        account = %account,
        "Starting simulation."
    );
    broadcaster.start();

    let mut feed = simulation::RandomWalkFeed::new(Arc::clone(&source), account, entry);
    let run_for = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = feed.run(Duration::from_millis(args.tick_ms)) => {
            result.context("Simulated market feed failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, shutting down.");
        }
        _ = run_for => {
            tracing::info!("Simulation time elapsed.");
        }
    }

    broadcaster.stop();
    if tokio::time::timeout(SHUTDOWN_GRACE, broadcaster.wait_idle()).await.is_err() {
        tracing::warn!("A broadcast cycle was still running at shutdown.");
    }
    tracing::info!(
        cycles = broadcaster.coalescer().completed_cycles(),
        "Simulation finished."
    );
    Ok(())
}

// ==============================================================================
// Send-Test Command Logic
// ==============================================================================

/// The snapshot a dashboard developer can expect to see rendered.
fn sample_snapshot() -> Snapshot {
    Snapshot {
        timestamp: Utc::now(),
        account: AccountId::new("TestAccount123"),
        balance: dec!(50000.00),
        realized: dec!(1250.75),
        unrealized: dec!(-125.50),
        positions: vec![PositionView {
            instrument: "ES 03-25".to_string(),
            symbol: "ES".to_string(),
            market_position: MarketPosition::Long,
            quantity: 2,
            average_price: dec!(5925.50),
            unrealized: dec!(-125.50),
            current_price: dec!(5863.25),
        }],
        working_orders: Vec::new(),
    }
}

async fn handle_send_test(settings: Settings) -> anyhow::Result<()> {
    let transport = WebhookTransport::new(&settings.transport, Diagnostics::tracing_only())
        .context("Failed to create the webhook transport")?;
    let snapshot = sample_snapshot();

    println!("Sending test snapshot to {}", transport.endpoint());
    let payload = snapshot.to_json()?;
    println!("{}", String::from_utf8_lossy(&payload));

    transport
        .send(&snapshot)
        .await
        .context("Test snapshot was not accepted")?;
    println!("Test snapshot delivered.");
    Ok(())
}
