//! Sensor polling loop
//!
//! Polls the sensor at a fixed cadence and publishes each successful reading
//! into [`SharedState`]. The host address is refreshed on every poll so the
//! renderer can fall back to blank frames while the network is down.
//! A failed read keeps the last good reading and retries after a longer
//! delay; it never reaches the other loops.

use embassy_time::Duration;
use log::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::sensors::{Sensor, SensorError};
use crate::shutdown::Shutdown;
use crate::state::{HostAddress, SharedState};

/// Source of the host's primary network address.
pub trait AddressSource {
    /// Current primary outbound address, `None` while offline.
    fn primary_address(&mut self) -> Option<HostAddress>;
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New concentration differs from the previous one
    Changed(u32),
    Unchanged(u32),
    /// Read failed; the previous reading is kept
    Failed(SensorError),
}

pub struct SensorPoller<'a, S, A> {
    sensor: S,
    address: A,
    state: &'a SharedState,
    poll_interval: Duration,
    retry_delay: Duration,
}

impl<'a, S, A> SensorPoller<'a, S, A>
where
    S: Sensor,
    A: AddressSource,
{
    pub fn new(sensor: S, address: A, state: &'a SharedState, config: &MonitorConfig) -> Self {
        Self {
            sensor,
            address,
            state,
            poll_interval: config.poll_interval(),
            retry_delay: config.retry_delay(),
        }
    }

    /// Refresh the address, read the sensor once and publish the result.
    pub async fn poll_once(&mut self) -> PollOutcome {
        self.refresh_address();

        match self.sensor.read().await {
            Ok(reading) => {
                let concentration = reading.concentration;
                if self.state.record(reading) {
                    debug!("CO2 changed to {} ppm", concentration);
                    PollOutcome::Changed(concentration)
                } else {
                    PollOutcome::Unchanged(concentration)
                }
            }
            Err(e) => {
                warn!("Sensor read failed, keeping last reading: {}", e);
                PollOutcome::Failed(e)
            }
        }
    }

    /// Poll until shutdown is requested.
    pub async fn run(&mut self, shutdown: &Shutdown) {
        info!(
            "Poller started: every {} ms, retry after {} ms",
            self.poll_interval.as_millis(),
            self.retry_delay.as_millis()
        );

        while !shutdown.is_requested() {
            let delay = match self.poll_once().await {
                PollOutcome::Failed(_) => self.retry_delay,
                PollOutcome::Changed(_) | PollOutcome::Unchanged(_) => self.poll_interval,
            };
            if !shutdown.sleep(delay).await {
                break;
            }
        }

        info!("Poller stopped");
    }

    /// Give back the sensor and address source.
    pub fn into_parts(self) -> (S, A) {
        (self.sensor, self.address)
    }

    fn refresh_address(&mut self) {
        let current = self.address.primary_address();
        let gained = current.clone();
        match (self.state.set_address(current), gained) {
            (None, Some(address)) => info!("Network up, primary address {}", address),
            (Some(_), None) => info!("Network down, blanking display"),
            (Some(old), Some(new)) if old != new => info!("Primary address changed to {}", new),
            _ => {}
        }
    }
}
