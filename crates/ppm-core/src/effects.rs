//! Effect bands for CO₂ concentrations
//!
//! Maps a concentration in ppm to a description of its health and comfort
//! effects. Bands are ordered by ascending threshold and the first band
//! starts at 0 ppm, so every reading falls into exactly one band.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::vec::Vec;
use serde::Deserialize;

use crate::config::ConfigError;

/// A (threshold, description) pair.
///
/// The band applies to every concentration at or above `threshold` up to the
/// next band's threshold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EffectBand {
    /// Minimum concentration in ppm
    pub threshold: u32,
    /// Human readable effect description
    pub description: Cow<'static, str>,
}

impl EffectBand {
    pub const fn new(threshold: u32, description: &'static str) -> Self {
        Self {
            threshold,
            description: Cow::Borrowed(description),
        }
    }
}

/// Built-in effect table used when the configuration does not override it.
pub const DEFAULT_EFFECTS: [EffectBand; 5] = [
    EffectBand::new(0, "Normal background concentration in outdoor ambient air"),
    EffectBand::new(
        350,
        "Concentrations typical of occupied indoor spaces with good air exchange",
    ),
    EffectBand::new(1000, "Complaints of drowsiness and poor air."),
    EffectBand::new(
        2000,
        "Headaches, sleepiness and stagnant, stale, stuffy air. Poor concentration, loss of \
         attention, increased heart rate and slight nausea may also be present.",
    ),
    EffectBand::new(
        5000,
        "Workplace exposure limit (as 8-hour TWA) in most jurisdictions.",
    ),
];

/// Validated, immutable list of effect bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectTable {
    bands: Vec<EffectBand>,
}

impl EffectTable {
    /// Build a table, checking that it is non-empty, starts at 0 and
    /// ascends strictly.
    pub fn new(bands: Vec<EffectBand>) -> Result<Self, ConfigError> {
        let first = bands.first().ok_or(ConfigError::EmptyEffects)?;
        if first.threshold != 0 {
            return Err(ConfigError::FirstThresholdNotZero(first.threshold));
        }

        for pair in bands.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(ConfigError::UnorderedEffects {
                    previous: pair[0].threshold,
                    next: pair[1].threshold,
                });
            }
        }

        Ok(Self { bands })
    }

    /// Index of the band with the greatest threshold not above `concentration`.
    pub fn band_index(&self, concentration: u32) -> usize {
        debug_assert_eq!(self.bands.first().map(|band| band.threshold), Some(0));
        // The zero-threshold first band always matches.
        self.bands
            .iter()
            .rposition(|band| band.threshold <= concentration)
            .unwrap_or(0)
    }

    /// Classify a concentration into its effect band.
    pub fn classify(&self, concentration: u32) -> &EffectBand {
        &self.bands[self.band_index(concentration)]
    }

    /// Band at `index`, as returned by [`EffectTable::band_index`].
    pub fn band(&self, index: usize) -> Option<&EffectBand> {
        self.bands.get(index)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectBand> {
        self.bands.iter()
    }
}

impl Default for EffectTable {
    fn default() -> Self {
        Self {
            bands: DEFAULT_EFFECTS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn description(table: &EffectTable, ppm: u32) -> &str {
        &table.classify(ppm).description
    }

    #[test]
    fn test_classify_lower_edges() {
        let table = EffectTable::default();
        assert!(description(&table, 0).starts_with("Normal background"));
        assert!(description(&table, 349).starts_with("Normal background"));
        assert!(description(&table, 350).starts_with("Concentrations typical of occupied"));
        assert!(description(&table, 999).starts_with("Concentrations typical of occupied"));
        assert!(description(&table, 1000).starts_with("Complaints of drowsiness"));
        assert!(description(&table, 2000).starts_with("Headaches"));
    }

    #[test]
    fn test_classify_has_no_upper_bound() {
        let table = EffectTable::default();
        assert!(description(&table, 5000).starts_with("Workplace exposure limit"));
        assert!(description(&table, 999_999).starts_with("Workplace exposure limit"));
        assert!(description(&table, u32::MAX).starts_with("Workplace exposure limit"));
    }

    #[test]
    fn test_classify_picks_greatest_threshold_at_or_below() {
        let table = EffectTable::default();
        for ppm in [0, 1, 349, 350, 351, 1999, 2000, 4999, 5000, 12_345] {
            let band = table.classify(ppm);
            assert!(band.threshold <= ppm);
            assert!(
                table
                    .iter()
                    .all(|other| other.threshold > ppm || other.threshold <= band.threshold),
                "band {} is not the highest match for {ppm}",
                band.threshold
            );
        }
    }

    #[test]
    fn test_band_index_matches_classify() {
        let table = EffectTable::default();
        assert_eq!(table.band_index(0), 0);
        assert_eq!(table.band_index(350), 1);
        assert_eq!(table.band_index(1500), 2);
        assert_eq!(table.band_index(2500), 3);
        assert_eq!(table.band_index(7000), 4);
        assert_eq!(table.band(4), Some(table.classify(7000)));
    }

    #[test]
    fn test_first_band_catches_low_values() {
        let table = EffectTable::new(vec![EffectBand::new(0, "fresh"), EffectBand::new(600, "stale")])
            .unwrap();
        assert_eq!(table.band_index(0), 0);
        assert_eq!(table.band_index(599), 0);
        assert_eq!(table.classify(u32::MAX).description, "stale");
    }

    #[test]
    fn test_table_rejects_empty() {
        assert_eq!(EffectTable::new(vec![]), Err(ConfigError::EmptyEffects));
    }

    #[test]
    fn test_table_rejects_nonzero_first_threshold() {
        let result = EffectTable::new(vec![EffectBand::new(100, "too high")]);
        assert_eq!(result, Err(ConfigError::FirstThresholdNotZero(100)));
    }

    #[test]
    fn test_table_rejects_unordered_thresholds() {
        let result = EffectTable::new(vec![
            EffectBand::new(0, "a"),
            EffectBand::new(800, "b"),
            EffectBand::new(800, "c"),
        ]);
        assert_eq!(
            result,
            Err(ConfigError::UnorderedEffects {
                previous: 800,
                next: 800
            })
        );
    }
}
