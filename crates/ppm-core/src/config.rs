//! Startup configuration for the monitor loops
//!
//! Every field has a default matching the reference device (MH-Z19 polled
//! every 100 ms, 128x32 SSD1306, 30 ms marquee frames), so an empty
//! configuration file is valid.

extern crate alloc;

use alloc::vec::Vec;
use embassy_time::Duration;
use serde::Deserialize;
use thiserror_no_std::Error;

use crate::effects::{DEFAULT_EFFECTS, EffectBand, EffectTable};
use crate::status_view::{CHAR_WIDTH_PX, status_view_height};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("effect table is empty")]
    EmptyEffects,
    #[error("first effect threshold must be 0, found {0}")]
    FirstThresholdNotZero(u32),
    #[error("effect thresholds must ascend, found {previous} followed by {next}")]
    UnorderedEffects { previous: u32, next: u32 },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("display {width}x{height} cannot fit the status view")]
    DisplayTooSmall { width: u32, height: u32 },
}

/// Geometry and power state of the monochrome display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// Keep the panel blank even when the network is up
    pub suppress: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 32,
            suppress: false,
        }
    }
}

/// Timing, layout and classification settings shared by the poller and the
/// renderer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between successful sensor polls
    pub poll_interval_ms: u64,
    /// Delay before retrying after a failed sensor read
    pub retry_delay_ms: u64,
    /// Delay after each pushed marquee frame
    pub frame_interval_ms: u64,
    /// Number of frames the marquee holds at offset 0
    pub dwell_frames: u8,
    /// Blank characters appended to a description before it wraps
    pub marquee_padding: usize,
    /// How long after a change the trend arrow stays visible
    pub trend_window_secs: u64,
    /// Cadence of blank frames while the display is suppressed or offline
    pub blank_interval_ms: u64,
    pub display: DisplayConfig,
    pub effects: Vec<EffectBand>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            retry_delay_ms: 1000,
            frame_interval_ms: 30,
            dwell_frames: 5,
            marquee_padding: 5,
            trend_window_secs: 30,
            blank_interval_ms: 5000,
            display: DisplayConfig::default(),
            effects: DEFAULT_EFFECTS.to_vec(),
        }
    }
}

impl MonitorConfig {
    /// Check intervals and display geometry, and build the effect table.
    pub fn validate(&self) -> Result<EffectTable, ConfigError> {
        let intervals = [
            ("poll_interval_ms", self.poll_interval_ms),
            ("retry_delay_ms", self.retry_delay_ms),
            ("frame_interval_ms", self.frame_interval_ms),
            ("blank_interval_ms", self.blank_interval_ms),
            ("dwell_frames", u64::from(self.dwell_frames)),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroInterval(*name));
        }

        let DisplayConfig { width, height, .. } = self.display;
        if width < CHAR_WIDTH_PX || height < status_view_height() {
            return Err(ConfigError::DisplayTooSmall { width, height });
        }

        EffectTable::new(self.effects.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn trend_window(&self) -> Duration {
        Duration::from_secs(self.trend_window_secs)
    }

    pub fn blank_interval(&self) -> Duration {
        Duration::from_millis(self.blank_interval_ms)
    }

    /// Number of marquee characters that fit across the display
    pub fn marquee_columns(&self) -> usize {
        (self.display.width / CHAR_WIDTH_PX) as usize
    }
}
