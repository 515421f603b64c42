//! Veloz - real-time transaction-cost estimation.
//!
//! Streams one instrument's order book and prints a cost estimate per
//! update until interrupted.

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use veloz_engine::{AppConfig, EngineEvent, EngineState, Session};
use veloz_registry::MarketClient;

/// Veloz transaction-cost estimator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VELOZ_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Print live spot instruments and exit
    #[arg(long)]
    list_instruments: bool,

    /// Instrument to stream, overriding the config
    #[arg(short, long)]
    instrument: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // TLS provider must be installed before any WS connection
    veloz_ws::init_crypto();

    let args = Args::parse();

    let config_path = AppConfig::resolve_path(args.config);
    let mut config = AppConfig::from_file(&config_path)?;
    if let Some(instrument) = args.instrument {
        config.order.instrument = instrument;
        config.validate()?;
    }

    veloz_telemetry::init_logging(config.telemetry.log_level.as_deref())?;
    info!(
        config_path = %config_path,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Veloz"
    );

    if args.list_instruments {
        let client = MarketClient::new(config.rest_url.clone())?;
        for inst_id in client.fetch_instruments("SPOT").await? {
            println!("{inst_id}");
        }
        return Ok(());
    }

    let state = EngineState::from_config(&config)?;
    let session = Session::new(state, config.session_config())?;
    let mut events = session.subscribe();
    let handle = session.spawn();
    info!(
        session_id = %handle.id(),
        instrument = %config.order.instrument,
        notional = %config.order.notional_usd,
        "Session running"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                handle.stop();
                break;
            }
            event = events.recv() => match event {
                Ok(event) => print_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Consumer lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.join().await?;

    // Every sender is gone after join; print what the session emitted while stopping.
    loop {
        match events.recv().await {
            Ok(event) => print_event(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Consumer lagged, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn print_event(event: EngineEvent) {
    match event {
        EngineEvent::Tick(tick) => println!("{tick}"),
        EngineEvent::Connectivity { connected, .. } => {
            println!("{}", if connected { "Connected" } else { "Disconnected" });
        }
        EngineEvent::Latency(report) => println!("{report}\n"),
    }
}
