//! CO₂ marquee monitor for Raspberry Pi class hosts.
//!
//! Polls an MH-Z19 (or a simulated sensor), animates the effect of the
//! current concentration on a 128x32 monochrome panel (previewed in the
//! terminal) and serves the latest reading as JSON over HTTP.
//!
//! ```text
//! ppm-monitor [settings.toml]
//! ```
//!
//! `RUST_LOG` controls log output (default `info`). Ctrl-C stops every loop
//! at its next suspension point.

mod address;
mod http;
mod panel;
mod sensor;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use embassy_time::Instant;
use log::{info, warn};
use ppm_core::{MarqueeRenderer, ReadingPublisher, SensorPoller, SharedState, Shutdown};
use static_cell::StaticCell;
use tokio::net::TcpListener;

use crate::address::UdpAddressSource;
use crate::panel::Panel;
use crate::sensor::HostSensor;
use crate::settings::Settings;

static STATE: StaticCell<SharedState> = StaticCell::new();
static SHUTDOWN: Shutdown = Shutdown::new();

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref())?;
    let effects = settings
        .monitor
        .validate()
        .map_err(|e| anyhow!("invalid settings: {e}"))?;
    info!(
        "{} effect bands, display {}x{}",
        effects.len(),
        settings.monitor.display.width,
        settings.monitor.display.height
    );

    let state: &'static SharedState = STATE.init(SharedState::new(Instant::now()));

    let listener = TcpListener::bind(("0.0.0.0", settings.http.port))
        .await
        .with_context(|| format!("binding HTTP port {}", settings.http.port))?;
    let sensor = HostSensor::open(&settings.sensor).await?;

    let mut poller = SensorPoller::new(sensor, UdpAddressSource::new(), state, &settings.monitor);
    let mut renderer = MarqueeRenderer::new(
        Panel::new(settings.panel),
        state,
        &effects,
        &settings.monitor,
    );

    tokio::join!(
        poller.run(&SHUTDOWN),
        renderer.run(&SHUTDOWN),
        http::serve(listener, ReadingPublisher::new(state), &SHUTDOWN),
        shutdown_on_ctrl_c(),
    );

    info!("ppm-monitor stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => SHUTDOWN.request(),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C: {}", e);
            SHUTDOWN.wait().await;
        }
    }
}
