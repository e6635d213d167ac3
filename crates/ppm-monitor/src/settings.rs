//! Host settings loaded from an optional TOML file.
//!
//! Every table and field is optional. A missing file argument runs the
//! monitor with the simulated sensor and the terminal preview.
//!
//! ```toml
//! poll_interval_ms = 100
//!
//! [display]
//! suppress = false
//!
//! [http]
//! port = 8080
//!
//! [sensor]
//! kind = "mhz19"
//! device = "/dev/serial0"
//!
//! [[effects]]
//! threshold = 0
//! description = "Fresh"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use ppm_core::MonitorConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { port: 80 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Synthetic readings, no hardware needed
    #[default]
    Simulated,
    /// MH-Z19 on a serial tty
    Mhz19,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub kind: SensorKind,
    /// Serial device, already configured for 9600 8N1 raw mode
    pub device: String,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            kind: SensorKind::default(),
            device: "/dev/serial0".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    /// Half-block preview on the controlling terminal
    #[default]
    Terminal,
    /// Frames are only logged
    Headless,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub monitor: MonitorConfig,
    pub http: HttpSettings,
    pub sensor: SensorSettings,
    pub panel: PanelKind,
}

impl Settings {
    /// Load settings from `path`, or use the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No settings file given, using defaults");
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
