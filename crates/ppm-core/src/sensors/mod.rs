//! Sensor trait, readings and errors

pub mod mhz19;

pub use mhz19::Mhz19Sensor;

use embassy_time::Instant;
use serde::Serialize;
use thiserror_no_std::Error;

/// A single poll of the CO₂ sensor.
///
/// Serializes to the key-value payload served over HTTP. Only the
/// concentration is mandatory; the MH-Z19 also reports its raw
/// temperature, status and calibration bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    /// CO₂ concentration in ppm
    #[serde(rename = "co2")]
    pub concentration: u32,
    /// Temperature in °C
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i16>,
    /// Raw temperature byte (°C + 40)
    #[serde(rename = "TT", skip_serializing_if = "Option::is_none")]
    pub tt: Option<u8>,
    /// Status byte
    #[serde(rename = "SS", skip_serializing_if = "Option::is_none")]
    pub ss: Option<u8>,
    /// Calibration word
    #[serde(rename = "UhUl", skip_serializing_if = "Option::is_none")]
    pub uh_ul: Option<u16>,
    /// When the reading was taken
    #[serde(skip)]
    pub captured_at: Instant,
}

impl Reading {
    /// A reading carrying only a concentration.
    pub const fn new(concentration: u32, captured_at: Instant) -> Self {
        Self {
            concentration,
            temperature: None,
            tt: None,
            ss: None,
            uh_ul: None,
            captured_at,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: timed out waiting to {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: malformed response: {details}")]
    MalformedResponse {
        sensor: &'static str,
        details: &'static str,
    },
}

/// Trait for CO₂ sensors polled by [`crate::poller::SensorPoller`].
pub trait Sensor {
    /// Take a fresh reading.
    fn read(&mut self) -> impl Future<Output = Result<Reading, SensorError>>;
}
