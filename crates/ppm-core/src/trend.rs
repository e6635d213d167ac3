//! Trend tracking for the concentration value
//!
//! Records the last distinct concentration, the value it replaced and when
//! the change happened. Only the sensor poller mutates it.

use embassy_time::{Duration, Instant};

/// Direction of the most recent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
}

impl Trend {
    /// Arrow shown next to the current value
    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Rising => "+",
            Self::Falling => "-",
        }
    }
}

/// Last observed change in concentration.
///
/// `last_change_at` only advances when `last_concentration` changes.
/// `previous_concentration` is the value `last_concentration` replaced at
/// that change, which is what the direction is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendState {
    last_concentration: u32,
    previous_concentration: u32,
    last_change_at: Instant,
}

impl TrendState {
    /// Start tracking from a zero concentration at `started_at`.
    pub const fn new(started_at: Instant) -> Self {
        Self {
            last_concentration: 0,
            previous_concentration: 0,
            last_change_at: started_at,
        }
    }

    /// Record a polled concentration.
    ///
    /// Returns `true` and updates the state if the value differs from the
    /// last one; otherwise leaves the state untouched and returns `false`.
    pub fn observe(&mut self, concentration: u32, now: Instant) -> bool {
        if concentration == self.last_concentration {
            return false;
        }

        self.previous_concentration = self.last_concentration;
        self.last_concentration = concentration;
        self.last_change_at = now;
        true
    }

    pub fn last_concentration(&self) -> u32 {
        self.last_concentration
    }

    pub fn previous_concentration(&self) -> u32 {
        self.previous_concentration
    }

    pub fn last_change_at(&self) -> Instant {
        self.last_change_at
    }

    /// Time elapsed between the last change and `now`.
    pub fn since_change(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_change_at)
    }

    /// Whole seconds elapsed between the last change and `now`.
    pub fn seconds_since_change(&self, now: Instant) -> u64 {
        self.since_change(now).as_secs()
    }

    /// Direction of the last change.
    pub fn direction(&self) -> Trend {
        if self.last_concentration > self.previous_concentration {
            Trend::Rising
        } else {
            Trend::Falling
        }
    }

    /// Direction of the last change, if it happened less than `window` before `now`.
    pub fn recent_direction(&self, now: Instant, window: Duration) -> Option<Trend> {
        (self.since_change(now) < window).then(|| self.direction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_value_is_not_a_change() {
        let mut trend = TrendState::new(Instant::from_secs(0));
        let t1 = Instant::from_secs(10);
        let t2 = Instant::from_secs(20);

        assert!(trend.observe(500, t1));
        assert!(!trend.observe(500, t2));
        assert_eq!(trend.last_concentration(), 500);
        assert_eq!(trend.last_change_at(), t1);
    }

    #[test]
    fn test_genuine_change_updates_both_fields() {
        let mut trend = TrendState::new(Instant::from_secs(0));
        let t1 = Instant::from_secs(10);
        let t2 = Instant::from_secs(20);

        trend.observe(500, t1);
        assert!(trend.observe(600, t2));
        assert_eq!(trend.last_concentration(), 600);
        assert_eq!(trend.previous_concentration(), 500);
        assert_eq!(trend.last_change_at(), t2);
    }

    #[test]
    fn test_direction_follows_previous_value() {
        let mut trend = TrendState::new(Instant::from_secs(0));
        trend.observe(500, Instant::from_secs(1));
        trend.observe(600, Instant::from_secs(2));
        assert_eq!(trend.direction(), Trend::Rising);

        trend.observe(450, Instant::from_secs(3));
        assert_eq!(trend.direction(), Trend::Falling);

        // An unchanged poll keeps the direction of the last real change.
        trend.observe(450, Instant::from_secs(4));
        assert_eq!(trend.direction(), Trend::Falling);
    }

    #[test]
    fn test_seconds_since_change() {
        let mut trend = TrendState::new(Instant::from_secs(0));
        trend.observe(700, Instant::from_secs(5));
        assert_eq!(trend.seconds_since_change(Instant::from_millis(47_900)), 42);
        // A render instant older than the change clamps to zero.
        assert_eq!(trend.seconds_since_change(Instant::from_secs(1)), 0);
    }

    #[test]
    fn test_recent_direction_window() {
        let mut trend = TrendState::new(Instant::from_secs(0));
        trend.observe(800, Instant::from_secs(100));
        let window = Duration::from_secs(30);

        assert_eq!(
            trend.recent_direction(Instant::from_secs(129), window),
            Some(Trend::Rising)
        );
        assert_eq!(trend.recent_direction(Instant::from_secs(130), window), None);
    }
}
