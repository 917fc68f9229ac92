//! Open Wallet Monitor Daemon
//!
//! A headless monitoring surface for a cryptocurrency wallet: connects to a
//! wallet bridge, polls the risk-analysis service for the active address,
//! and surfaces newly arrived risk alerts.

mod config;
mod demo;
mod portfolio;
mod render;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::ConfigLoader;
use owm_core::events::{
    SessionEvent, SessionEventReceiver, alert_notification_channel, session_event_channel,
    sync_failure_channel,
};
use owm_core::processors::{AlertSynchronizer, SessionError, WalletSession};
use owm_core::provider::{RpcWalletProvider, WalletProvider};
use owm_core::source::{AlertSource, HttpAlertSource};
use owm_sdk::client::RiskApiClient;
use shutdown::spawn_shutdown_listener;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Open Wallet Monitor - headless cross-chain wallet risk monitor
#[derive(Parser, Debug)]
#[command(name = "owm-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./owm-config.toml")]
    config: PathBuf,

    /// Override the wallet bridge JSON-RPC endpoint
    #[arg(long)]
    bridge_url: Option<Url>,

    /// Override the risk-analysis API root URL
    #[arg(long)]
    api_url: Option<Url>,

    /// Run against generated data, without a bridge or a backend
    #[arg(long, default_value = "false")]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    tracing::info!("Starting owm-daemon v{}", env!("CARGO_PKG_VERSION"));

    let loader = ConfigLoader::new(
        &args.config,
        args.bridge_url.clone(),
        args.api_url.clone(),
        args.demo,
    );
    let config = loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    // Shutdown plumbing: every long-running task selects on the receiver.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = spawn_shutdown_listener(shutdown_tx);

    // Event channels
    let (session_tx, session_rx) = session_event_channel();
    let (notification_tx, notification_rx) = alert_notification_channel();
    let (failure_tx, failure_rx) = sync_failure_channel();

    // Wallet provider
    let mut watcher_task = None;
    let provider: Arc<dyn WalletProvider> = if args.demo {
        tracing::info!("Demo mode: using generated wallet and alert data");
        Arc::new(demo::DemoWalletProvider::new())
    } else {
        let rpc = RpcWalletProvider::new(config.bridge_endpoint.clone())
            .with_accounts_poll(config.accounts_poll);
        watcher_task = Some(rpc.spawn_accounts_watcher(shutdown_rx.clone()));
        Arc::new(rpc)
    };

    // Alert source. The API client is kept around for portfolio snapshots.
    let mut api_client = None;
    let source: Arc<dyn AlertSource> = if args.demo {
        Arc::new(demo::DemoAlertSource::new())
    } else {
        let base_url = config
            .api_base_url
            .clone()
            .context("api.base_url is required outside demo mode")?;
        let client = RiskApiClient::new(base_url, config.api_key.clone());
        api_client = Some(client.clone());
        Arc::new(HttpAlertSource::new(client))
    };

    // Session and synchronizer
    let session = Arc::new(WalletSession::new(Arc::clone(&provider), session_tx));
    let subscription = provider.subscribe_account_changes();
    let session_task = tokio::spawn(Arc::clone(&session).run(shutdown_rx.clone(), subscription));

    let synchronizer = Arc::new(
        AlertSynchronizer::new(source, notification_tx, failure_tx)
            .with_poll_interval(config.poll_interval),
    );

    // Presentation sink
    let render_task = tokio::spawn(render::run_render_loop(
        shutdown_rx.clone(),
        notification_rx,
        failure_rx,
        session.state().clone(),
        synchronizer.recent_alerts().clone(),
    ));

    // Driver: key alert polling to the session's active address.
    let driver_task = tokio::spawn(run_sync_driver(
        shutdown_rx.clone(),
        session_rx,
        Arc::clone(&session),
        Arc::clone(&synchronizer),
        api_client,
    ));

    // Bring the session up: restore a prior authorization, else prompt once.
    session.restore().await;
    if !session.snapshot().await.is_connected() {
        match session.connect().await {
            Ok(()) => {}
            Err(SessionError::ProviderUnavailable) => {
                tracing::warn!("no wallet provider available, monitoring stays idle");
            }
            Err(SessionError::UserRejected) => {
                tracing::warn!("connection request rejected, monitoring stays idle");
            }
            Err(err) => tracing::warn!(error = %err, "wallet connection failed"),
        }
    }

    // Wait for the shutdown signal.
    let mut shutdown_wait = shutdown_rx.clone();
    while !*shutdown_wait.borrow() {
        if shutdown_wait.changed().await.is_err() {
            break;
        }
    }

    synchronizer.stop().await;
    let _ = driver_task.await;
    let _ = render_task.await;
    let _ = session_task.await;
    if let Some(task) = watcher_task {
        let _ = task.await;
    }
    signal_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Map session lifecycle events onto the synchronizer: alert polling is
/// keyed to the active address and stops whenever the session loses it.
/// Each (re)connect also kicks off a one-shot portfolio snapshot.
async fn run_sync_driver(
    mut shutdown_rx: watch::Receiver<bool>,
    mut session_rx: SessionEventReceiver,
    session: Arc<WalletSession>,
    synchronizer: Arc<AlertSynchronizer>,
    api_client: Option<RiskApiClient>,
) {
    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }

            event = session_rx.recv() => {
                match event {
                    Some(SessionEvent::Connected { address, .. }) => {
                        spawn_snapshot(&api_client, &address);
                        synchronizer.start(address).await;
                    }
                    Some(SessionEvent::AccountChanged { address }) => {
                        // The session keeps the old reading on a switch;
                        // fetch the new account's balance ourselves.
                        tokio::spawn({
                            let session = Arc::clone(&session);
                            async move { session.refresh_balance().await }
                        });
                        spawn_snapshot(&api_client, &address);
                        synchronizer.start(address).await;
                    }
                    Some(SessionEvent::Disconnected) => synchronizer.stop().await,
                    Some(SessionEvent::BalanceUpdated { .. }) => {}
                    None => break,
                }
            }
        }
    }
}

fn spawn_snapshot(api_client: &Option<RiskApiClient>, address: &str) {
    if let Some(client) = api_client {
        tokio::spawn(portfolio::log_snapshot(
            client.clone(),
            address.to_string(),
        ));
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
