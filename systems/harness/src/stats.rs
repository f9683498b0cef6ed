//! Aggregation of trial distances.

/// Summary statistics over the distances of a batch of trials.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    /// Shortest distance observed.
    pub min: u64,
    /// Longest distance observed.
    pub max: u64,
    /// Arithmetic mean of every sample.
    pub mean: f64,
    /// Number of samples.
    pub count: usize,
}

impl Statistics {
    /// Summarises the samples, or `None` when there are none.
    #[must_use]
    pub fn from_samples(samples: &[u64]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;
        let total: f64 = samples.iter().map(|&sample| sample as f64).sum();

        Some(Self {
            min,
            max,
            mean: total / samples.len() as f64,
            count: samples.len(),
        })
    }

    /// Value halfway between the extremes.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }
}

/// Acceptable range around an expected distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EfficiencyBand {
    /// Expected distance.
    pub target: f64,
    /// Allowed deviation as a fraction of the target.
    pub tolerance: f64,
}

impl EfficiencyBand {
    /// Creates a band of `target ± target × tolerance`.
    #[must_use]
    pub const fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }

    /// Lowest accepted value.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.target - self.target * self.tolerance
    }

    /// Highest accepted value.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.target + self.target * self.tolerance
    }

    /// Reports whether `value` lies within the band, bounds included.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower()..=self.upper()).contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::{EfficiencyBand, Statistics};
    use approx::assert_relative_eq;

    #[test]
    fn statistics_track_extremes_and_mean() {
        let stats = Statistics::from_samples(&[48_100, 47_200, 46_900, 48_400]).expect("samples");
        assert_eq!(stats.min, 46_900);
        assert_eq!(stats.max, 48_400);
        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.mean, 47_650.0);
        assert_relative_eq!(stats.midpoint(), 47_650.0);
    }

    #[test]
    fn no_samples_no_statistics() {
        assert_eq!(Statistics::from_samples(&[]), None);
    }

    #[test]
    fn band_includes_its_bounds() {
        let band = EfficiencyBand::new(48_000.0, 0.2);
        assert_relative_eq!(band.lower(), 38_400.0);
        assert_relative_eq!(band.upper(), 57_600.0);
        assert!(band.contains(38_400.0));
        assert!(band.contains(57_600.0));
        assert!(!band.contains(57_601.0));
        assert!(!band.contains(f64::NAN));
    }
}
