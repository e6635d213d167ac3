//! Host-side sensors: a synthetic CO₂ source and an MH-Z19 on a serial tty.

use std::fmt;
use std::io;

use anyhow::{Context, Result};
use embassy_time::Instant;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use log::info;
use ppm_core::sensors::Mhz19Sensor;
use ppm_core::{Reading, Sensor, SensorError};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::settings::{SensorKind, SensorSettings};

/// Simulated readings only move every few seconds, like a real room.
const SIMULATION_STEP_SECS: u64 = 5;

/// Generates a slow CO₂ wave between roughly 200 and 1600 ppm, crossing the
/// 350 and 1000 ppm bands of the default effect table.
pub struct SimulatedSensor {
    started_at: Instant,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    fn ppm_at(elapsed_secs: u64) -> u32 {
        let t = (elapsed_secs / SIMULATION_STEP_SECS * SIMULATION_STEP_SECS) as f64;
        let ppm = 900.0 + 650.0 * (t / 240.0).sin() + 40.0 * (t / 35.0).cos();
        ppm.round().max(0.0) as u32
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensor for SimulatedSensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        Ok(Reading::new(Self::ppm_at(elapsed), now))
    }
}

#[derive(Debug)]
pub struct TtyError(io::Error);

impl fmt::Display for TtyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for TtyError {}

impl embedded_io_async::Error for TtyError {
    fn kind(&self) -> ErrorKind {
        match self.0.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::TimedOut => ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => ErrorKind::Interrupted,
            io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => ErrorKind::InvalidData,
            io::ErrorKind::WriteZero => ErrorKind::WriteZero,
            _ => ErrorKind::Other,
        }
    }
}

/// Serial tty opened as a plain file.
///
/// The line discipline is not touched; configure the port first, e.g.
/// `stty -F /dev/serial0 9600 raw -echo`.
pub struct TtyPort {
    file: File,
}

impl TtyPort {
    pub async fn open(device: &str) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(device).await?;
        Ok(Self { file })
    }
}

impl ErrorType for TtyPort {
    type Error = TtyError;
}

impl Read for TtyPort {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.file.read(buf).await.map_err(TtyError)
    }
}

impl Write for TtyPort {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.file.write(buf).await.map_err(TtyError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.file.flush().await.map_err(TtyError)
    }
}

/// Sensor selected by the settings file.
pub enum HostSensor {
    Simulated(SimulatedSensor),
    Mhz19(Mhz19Sensor<TtyPort>),
}

impl HostSensor {
    pub async fn open(settings: &SensorSettings) -> Result<Self> {
        match settings.kind {
            SensorKind::Simulated => {
                info!("Using simulated CO2 sensor");
                Ok(Self::Simulated(SimulatedSensor::new()))
            }
            SensorKind::Mhz19 => {
                let port = TtyPort::open(&settings.device)
                    .await
                    .with_context(|| format!("opening MH-Z19 serial port {}", settings.device))?;
                info!("Using MH-Z19 on {}", settings.device);
                Ok(Self::Mhz19(Mhz19Sensor::new(port)))
            }
        }
    }
}

impl Sensor for HostSensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        match self {
            Self::Simulated(sensor) => sensor.read().await,
            Self::Mhz19(sensor) => sensor.read().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_holds_value_within_a_step() {
        assert_eq!(SimulatedSensor::ppm_at(10), SimulatedSensor::ppm_at(14));
    }

    #[test]
    fn test_simulation_crosses_default_bands() {
        let values: Vec<u32> = (0..1_600).step_by(5).map(SimulatedSensor::ppm_at).collect();
        assert!(values.iter().any(|&ppm| ppm < 350));
        assert!(values.iter().any(|&ppm| (350..1000).contains(&ppm)));
        assert!(values.iter().any(|&ppm| ppm >= 1000));
    }

    #[test]
    fn test_tty_error_kind_mapping() {
        use embedded_io_async::Error as _;

        let error = TtyError(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(error.kind(), ErrorKind::TimedOut);
        let error = TtyError(io::Error::other("framing"));
        assert_eq!(error.kind(), ErrorKind::Other);
    }
}
