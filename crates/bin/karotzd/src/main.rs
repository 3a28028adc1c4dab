//! # karotzd — device-control daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (TOML file + env overrides)
//! - Initialise tracing
//! - Construct the hardware gateway (bus socket or virtual)
//! - Restore persisted marker/session state
//! - Start the background stale-marker sweep
//! - Build the axum router and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use karotz_adapter_homeauto::HttpNotifier;
use karotz_adapter_http_axum::{AppState, create_router};
use karotz_adapter_hwbus::{BusConfig, BusGateway};
use karotz_adapter_statefs::{FsRecordingStore, FsStateStore};
use karotz_adapter_virtual::VirtualGateway;
use karotz_app::dispatcher::ActionDispatcher;
use karotz_app::lock_manager::LockManager;
use karotz_app::notifications::NotificationFanout;
use karotz_app::ports::HardwareGateway;
use karotz_app::rfid_machine::{RfidMachine, RfidSettings};

use config::{Config, HardwareMode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    match config.hardware.mode {
        HardwareMode::Virtual => {
            tracing::info!("running without hardware (virtual gateway)");
            serve(VirtualGateway::new(), config).await
        }
        HardwareMode::Bus => {
            let gateway = BusGateway::new(BusConfig {
                socket_path: config.hardware.socket_path.clone(),
                sound_dir: config.hardware.sound_dir.clone(),
                call_timeout: Duration::from_millis(config.hardware.call_timeout_ms),
                wait_timeout: config.play_watch(),
            });
            serve(gateway, config).await
        }
    }
}

async fn serve<H>(gateway: H, config: Config) -> Result<(), Box<dyn std::error::Error>>
where
    H: HardwareGateway + 'static,
{
    let data_dir = &config.state.data_dir;
    tokio::fs::create_dir_all(data_dir.join("rfid")).await?;

    let locks = Arc::new(LockManager::new(
        FsStateStore::new(data_dir.join("state.json")),
        config.staleness(),
    ));
    if let Err(err) = locks.restore().await {
        tracing::warn!(error = %err, "could not restore persisted state, starting empty");
    }

    let notifier = HttpNotifier::new(config.notify_timeout())?;
    let fanout = NotificationFanout::new(notifier, config.notify.targets.clone());
    tracing::info!(targets = config.notify.targets.len(), "notification targets loaded");

    let gateway = Arc::new(gateway);
    let dispatcher = ActionDispatcher::new(
        Arc::clone(&gateway),
        Arc::clone(&locks),
        fanout.clone(),
        config.play_watch(),
    );
    let rfid = RfidMachine::new(
        Arc::clone(&gateway),
        Arc::clone(&locks),
        FsRecordingStore::new(data_dir.join("rfid")),
        fanout,
        RfidSettings {
            max_record: Duration::from_secs(config.rfid.max_record_secs),
            max_play: Duration::from_secs(config.rfid.max_play_secs),
            completion_cue: config.rfid.completion_cue.clone(),
        },
    );

    {
        let locks = Arc::clone(&locks);
        let interval = config.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                locks.sweep_stale().await;
            }
        });
    }

    let app = create_router(AppState { dispatcher, rfid });
    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "karotzd listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
        } else {
            std::future::pending::<()>().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutting down");
}
