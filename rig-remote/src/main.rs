//! Remote Rig Control
//!
//! A headless application that connects to a remote Hamlib `rigctld`
//! daemon, logs radio state as it changes, and runs a pass-through proxy so
//! local rigctld tools can reach the same radio.

mod cli;
mod settings;
mod tuning;

use anyhow::Context;
use clap::Parser;
use rig_client::{ClientEvent, ConnectionStatus, RigClient};
use rig_protocol::{level, RadioSnapshot};
use rig_proxy::PassthroughProxy;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Args;
use settings::Settings;
use tuning::{format_mhz, level_percent, Band, Filter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "rigremote=debug,rig_client=debug,rig_proxy=debug,rig_protocol=debug"
    } else {
        "rigremote=info,rig_client=info,rig_proxy=info,rig_protocol=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rigremote");

    let mut settings = Settings::load();
    args.apply(&mut settings);
    if args.save {
        let path = settings.save().map_err(anyhow::Error::msg)?;
        info!("Saved settings to {}", path.display());
    }

    let client = RigClient::spawn(settings.client_config());
    tokio::spawn(log_events(client.subscribe()));

    client
        .connect(settings.host.clone(), settings.rigctld_port)
        .await
        .with_context(|| {
            format!(
                "Could not connect to rigctld at {}:{}",
                settings.host, settings.rigctld_port
            )
        })?;

    apply_presets(&client, &args).await;

    let mut proxy = if settings.proxy_enabled {
        let proxy = PassthroughProxy::start(settings.proxy_config())
            .await
            .context("Could not start proxy")?;
        info!(
            "Proxy ready: point local tools at 127.0.0.1:{}",
            proxy.local_port()
        );
        Some(proxy)
    } else {
        None
    };

    let mut ticker = tokio::time::interval(settings.poll_interval());
    let mut last: Option<RadioSnapshot> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if client.status().status != ConnectionStatus::Connected {
                    continue;
                }
                match client.refresh_snapshot().await {
                    Ok(snapshot) => {
                        if last.as_ref() != Some(&snapshot) {
                            log_snapshot(&snapshot);
                            last = Some(snapshot);
                        }
                    }
                    Err(e) => warn!("Refresh failed: {}", e),
                }
                if let Some(proxy) = &proxy {
                    debug!("Proxy pairs active: {}", proxy.active_pairs());
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for ctrl-c")?;
                info!("Shutting down");
                break;
            }
        }
    }

    if let Some(proxy) = proxy.take() {
        proxy.shutdown().await;
    }
    client.disconnect().await;
    client.shutdown().await;

    Ok(())
}

/// Tune to any band or filter preset given on the command line
async fn apply_presets(client: &RigClient, args: &Args) {
    if let Some(band) = args.band {
        match client.set_frequency(band.preset_hz()).await {
            Ok(()) => info!("Tuned to {} ({} MHz)", band, format_mhz(band.preset_hz())),
            Err(e) => warn!("Could not tune to {}: {}", band, e),
        }
    }

    if let Some(filter) = args.filter {
        let result = async {
            let current = client.get_mode().await?;
            client
                .set_mode(current.mode, filter.preset_passband_hz())
                .await
        }
        .await;
        match result {
            Ok(()) => info!("Selected {} filter", filter),
            Err(e) => warn!("Could not select {} filter: {}", filter, e),
        }
    }
}

fn log_snapshot(snapshot: &RadioSnapshot) {
    let percent = |name: &str| {
        snapshot
            .level(name)
            .map(|v| level_percent(v).to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    info!(
        "{} MHz [{}] {} {} ({} Hz){} | RF gain {} | SQL {} | RF power {}",
        format_mhz(snapshot.frequency_hz),
        Band::from_frequency(snapshot.frequency_hz),
        snapshot.mode,
        Filter::from_passband(snapshot.passband_hz),
        snapshot.passband_hz,
        if snapshot.ptt { " TX" } else { "" },
        percent(level::RF_GAIN),
        percent(level::SQUELCH),
        percent(level::RF_POWER),
    );
}

async fn log_events(mut events: broadcast::Receiver<ClientEvent>) {
    loop {
        match events.recv().await {
            Ok(ClientEvent::Status(update)) => match update.status {
                ConnectionStatus::Error | ConnectionStatus::Failed => {
                    warn!("Connection {}: {}", update.status, update.message)
                }
                _ => info!("Connection {}: {}", update.status, update.message),
            },
            Ok(ClientEvent::Data(text)) => debug!("rigctld: {:?}", text),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!("Event log skipped {} events", n)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
