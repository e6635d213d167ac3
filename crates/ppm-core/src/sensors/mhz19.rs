//! Winsen MH-Z19 NDIR CO₂ sensor over UART
//!
//! The sensor speaks a fixed 9-byte frame protocol at 9600 baud:
//!
//! - request:  `FF 01 86 00 00 00 00 00 CS`
//! - response: `FF 86 HH LL TT SS Uh Ul CS`
//!
//! where `CS` is the two's complement of the sum of bytes 1 to 7,
//! `HH LL` is the concentration in ppm and `TT` is the temperature + 40 °C.

use embassy_time::{Duration, Instant, with_timeout};
use embedded_io_async::{Read, Write};
use log::{error, warn};

use super::{Reading, Sensor, SensorError};

const SENSOR: &str = "MH-Z19";

/// Length of every request and response frame
pub const FRAME_LEN: usize = 9;

const START_BYTE: u8 = 0xFF;
const SENSOR_NUMBER: u8 = 0x01;
const CMD_READ_CO2: u8 = 0x86;
const TEMPERATURE_OFFSET: i16 = 40;

/// Bytes dropped while looking for a response header before giving up
const MAX_SKIPPED_BYTES: usize = 2 * FRAME_LEN;

/// Time allowed for a full request/response exchange.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Checksum over bytes 1..=7 of a frame.
pub const fn checksum(frame: &[u8; FRAME_LEN]) -> u8 {
    let mut sum: u8 = 0;
    let mut i = 1;
    while i < FRAME_LEN - 1 {
        sum = sum.wrapping_add(frame[i]);
        i += 1;
    }
    (!sum).wrapping_add(1)
}

const fn command(cmd: u8) -> [u8; FRAME_LEN] {
    let mut frame = [START_BYTE, SENSOR_NUMBER, cmd, 0, 0, 0, 0, 0, 0];
    frame[FRAME_LEN - 1] = checksum(&frame);
    frame
}

/// "Read gas concentration" request frame
pub const READ_CO2_COMMAND: [u8; FRAME_LEN] = command(CMD_READ_CO2);

/// Decoded response to [`READ_CO2_COMMAND`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub co2_ppm: u16,
    pub temperature_raw: u8,
    pub status: u8,
    pub calibration: u16,
}

impl Measurement {
    /// Decode and verify a response frame.
    pub fn decode(frame: &[u8; FRAME_LEN]) -> Result<Self, SensorError> {
        if frame[0] != START_BYTE {
            return Err(SensorError::MalformedResponse {
                sensor: SENSOR,
                details: "missing start byte",
            });
        }
        if frame[1] != CMD_READ_CO2 {
            return Err(SensorError::MalformedResponse {
                sensor: SENSOR,
                details: "response is not a concentration reply",
            });
        }
        if frame[FRAME_LEN - 1] != checksum(frame) {
            return Err(SensorError::MalformedResponse {
                sensor: SENSOR,
                details: "checksum mismatch",
            });
        }

        Ok(Self {
            co2_ppm: u16::from_be_bytes([frame[2], frame[3]]),
            temperature_raw: frame[4],
            status: frame[5],
            calibration: u16::from_be_bytes([frame[6], frame[7]]),
        })
    }

    pub fn temperature_celsius(&self) -> i16 {
        i16::from(self.temperature_raw) - TEMPERATURE_OFFSET
    }

    pub fn into_reading(self, captured_at: Instant) -> Reading {
        Reading {
            temperature: Some(self.temperature_celsius()),
            tt: Some(self.temperature_raw),
            ss: Some(self.status),
            uh_ul: Some(self.calibration),
            ..Reading::new(u32::from(self.co2_ppm), captured_at)
        }
    }
}

/// MH-Z19 driver over any async byte stream (UART, USB-serial, tty).
pub struct Mhz19Sensor<P> {
    port: P,
    timeout: Duration,
}

impl<P: Read + Write> Mhz19Sensor<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Give the underlying port back.
    pub fn release(self) -> P {
        self.port
    }

    async fn exchange(&mut self) -> Result<[u8; FRAME_LEN], SensorError> {
        self.port.write_all(&READ_CO2_COMMAND).await.map_err(|e| {
            error!("MH-Z19 command write failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "send read command",
                details: "serial write error",
            }
        })?;

        self.port.flush().await.map_err(|e| {
            error!("MH-Z19 command flush failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "send read command",
                details: "serial flush error",
            }
        })?;

        let mut frame = [0u8; FRAME_LEN];
        self.sync_to_header(&mut frame).await?;
        self.port.read_exact(&mut frame[2..]).await.map_err(|e| {
            error!("MH-Z19 response read failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "read response",
                details: "serial read error or short frame",
            }
        })?;

        Ok(frame)
    }

    /// Discard input up to the `FF 86` response header and store the header
    /// in `frame[..2]`.
    ///
    /// Stray bytes, or the tail of a reply whose read was cancelled by a
    /// timeout, would otherwise shift every following frame.
    async fn sync_to_header(&mut self, frame: &mut [u8; FRAME_LEN]) -> Result<(), SensorError> {
        let mut previous = self.read_byte().await?;
        for skipped in 0..MAX_SKIPPED_BYTES {
            let current = self.read_byte().await?;
            if previous == START_BYTE && current == CMD_READ_CO2 {
                if skipped > 0 {
                    warn!("MH-Z19 resynchronised after {} stray bytes", skipped);
                }
                frame[0] = previous;
                frame[1] = current;
                return Ok(());
            }
            previous = current;
        }

        error!("MH-Z19 sent {} bytes without a response header", MAX_SKIPPED_BYTES + 1);
        Err(SensorError::MalformedResponse {
            sensor: SENSOR,
            details: "no response header",
        })
    }

    async fn read_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte).await.map_err(|e| {
            error!("MH-Z19 response read failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "read response",
                details: "serial read error or short frame",
            }
        })?;
        Ok(byte[0])
    }
}

impl<P: Read + Write> Sensor for Mhz19Sensor<P> {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        let frame = with_timeout(self.timeout, self.exchange())
            .await
            .map_err(|_| {
                error!("MH-Z19 did not answer within {} ms", self.timeout.as_millis());
                SensorError::Timeout {
                    sensor: SENSOR,
                    operation: "receive response",
                }
            })??;

        let measurement = Measurement::decode(&frame)?;
        Ok(measurement.into_reading(Instant::now()))
    }
}
