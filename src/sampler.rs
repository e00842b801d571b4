use rand::Rng;
use serde::Deserialize;

use crate::error::StatsError;

/// Percentage of requests (0–100) whose metrics are persisted and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub struct SampleRate(u8);

impl SampleRate {
    pub const NEVER: Self = Self(0);
    pub const ALWAYS: Self = Self(100);

    pub fn new(percent: u8) -> Result<Self, StatsError> {
        if percent > 100 {
            return Err(StatsError::Config(format!(
                "sample_rate must be between 0 and 100, got {percent}"
            )));
        }
        Ok(Self(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SampleRate {
    type Error = StatsError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self(10)
    }
}

/// One independent Bernoulli trial with probability `rate / 100`.
pub fn should_sample<R: Rng + ?Sized>(rate: SampleRate, rng: &mut R) -> bool {
    rng.gen_range(0u8..100) < rate.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hits(rate: SampleRate, trials: u32, seed: u64) -> u32 {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..trials).filter(|_| should_sample(rate, &mut rng)).count() as u32
    }

    #[test]
    fn zero_never_samples() {
        assert_eq!(hits(SampleRate::NEVER, 50_000, 1), 0);
    }

    #[test]
    fn hundred_always_samples() {
        assert_eq!(hits(SampleRate::ALWAYS, 50_000, 2), 50_000);
    }

    #[test]
    fn ten_percent_frequency() {
        let rate = SampleRate::new(10).unwrap();
        let n = 100_000;
        let freq = hits(rate, n, 42) as f64 / n as f64;
        assert!((freq - 0.10).abs() < 0.01, "observed {freq}");
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(SampleRate::new(101).is_err());
        assert_eq!(SampleRate::new(100).unwrap(), SampleRate::ALWAYS);
        assert!(serde_yaml::from_str::<SampleRate>("250").is_err());
    }
}
