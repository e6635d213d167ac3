//! Shared state between the sensor poller and its readers
//!
//! The latest reading, the trend and the host address live in one container
//! behind a blocking critical-section mutex. The poller updates the reading
//! and the trend inside a single critical section, and readers copy
//! everything out inside a single critical section, so a reader never sees
//! a half-written reading or a trend that disagrees with it. The lock is
//! never held across an `.await`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;

use crate::sensors::Reading;
use crate::trend::TrendState;

/// Longest textual IP address (IPv6 with embedded IPv4)
pub const MAX_ADDRESS_LEN: usize = 46;

/// Host's primary outbound address in textual form
pub type HostAddress = heapless::String<MAX_ADDRESS_LEN>;

/// Consistent copy of the shared state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Most recent successful reading, `None` before the first poll succeeds
    pub reading: Option<Reading>,
    pub trend: TrendState,
    /// Primary network address, `None` while offline
    pub address: Option<HostAddress>,
}

/// State container shared by `&'static` reference between the loops.
///
/// The poller is the only writer.
pub struct SharedState {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Snapshot>>,
}

impl SharedState {
    pub const fn new(started_at: Instant) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Snapshot {
                reading: None,
                trend: TrendState::new(started_at),
                address: None,
            })),
        }
    }

    /// Publish a new reading and feed it to the trend tracker.
    ///
    /// Returns whether the concentration changed.
    pub fn record(&self, reading: Reading) -> bool {
        self.inner.lock(|cell| {
            let mut state = cell.borrow_mut();
            let changed = state
                .trend
                .observe(reading.concentration, reading.captured_at);
            state.reading = Some(reading);
            changed
        })
    }

    /// Replace the host address, returning the previous one.
    pub fn set_address(&self, address: Option<HostAddress>) -> Option<HostAddress> {
        self.inner
            .lock(|cell| core::mem::replace(&mut cell.borrow_mut().address, address))
    }

    /// Copy out the reading, trend and address together.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock(|cell| cell.borrow().clone())
    }

    /// Most recent successful reading.
    pub fn latest(&self) -> Option<Reading> {
        self.inner.lock(|cell| cell.borrow().reading)
    }

    pub fn trend(&self) -> TrendState {
        self.inner.lock(|cell| cell.borrow().trend)
    }

    pub fn has_address(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().address.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_empty() {
        let state = SharedState::new(Instant::from_secs(0));
        assert_eq!(state.latest(), None);
        assert!(!state.has_address());
        assert_eq!(state.trend().last_concentration(), 0);
    }

    #[test]
    fn test_record_overwrites_reading_and_tracks_change() {
        let state = SharedState::new(Instant::from_secs(0));

        assert!(state.record(Reading::new(500, Instant::from_secs(1))));
        assert!(!state.record(Reading::new(500, Instant::from_secs(2))));

        let snapshot = state.snapshot();
        let reading = snapshot.reading.unwrap();
        // The snapshot is replaced even when the value is unchanged.
        assert_eq!(reading.captured_at, Instant::from_secs(2));
        assert_eq!(snapshot.trend.last_change_at(), Instant::from_secs(1));
        assert_eq!(snapshot.trend.last_concentration(), reading.concentration);
    }

    #[test]
    fn test_address_replacement() {
        let state = SharedState::new(Instant::from_secs(0));
        let address: HostAddress = "192.168.1.20".try_into().unwrap();

        assert_eq!(state.set_address(Some(address.clone())), None);
        assert!(state.has_address());
        assert_eq!(state.set_address(None), Some(address));
        assert!(!state.has_address());
    }

    #[test]
    fn test_concurrent_readers_see_consistent_pairs() {
        static STATE: SharedState = SharedState::new(Instant::from_ticks(0));

        let writer = std::thread::spawn(|| {
            for ppm in 1..=2_000u32 {
                STATE.record(Reading::new(ppm, Instant::from_ticks(u64::from(ppm))));
            }
        });

        for _ in 0..2_000 {
            let snapshot = STATE.snapshot();
            if let Some(reading) = snapshot.reading {
                // Every poll changes the value, so the trend must describe
                // exactly the reading stored alongside it.
                assert_eq!(snapshot.trend.last_concentration(), reading.concentration);
                assert_eq!(snapshot.trend.last_change_at(), reading.captured_at);
            }
        }

        writer.join().unwrap();
        assert_eq!(STATE.latest().map(|r| r.concentration), Some(2_000));
    }
}
