use log::{debug, info};

/// Estimates how many seconds of true time pass per second of tick time.
///
/// The first accepted sample becomes a permanent reference; later samples
/// refine the ratio once they are far enough from it.
pub struct DriftEstimator {
    reference: Option<(u32, u32)>, // (unixtime, tick)
    scale: f64,
    min_span_secs: u32,
    max_span_secs: u32,
}

impl DriftEstimator {
    pub fn new(min_span_secs: u32, max_span_secs: u32) -> Self {
        DriftEstimator {
            reference: None,
            scale: 1.0,
            min_span_secs,
            max_span_secs,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Feed an accepted (unixtime, tick) pair and return the current scale.
    pub fn sample(&mut self, unixtime: u32, tick: u32) -> f64 {
        let (ref_time, ref_tick) = match self.reference {
            Some(r) => r,
            None => {
                info!("Clock reference established at unixtime {}", unixtime);
                self.reference = Some((unixtime, tick));
                return self.scale;
            }
        };

        let span = unixtime.saturating_sub(ref_time);
        if span <= self.min_span_secs || span >= self.max_span_secs {
            return self.scale;
        }

        let tick_secs = tick.wrapping_sub(ref_tick) as f64 / 1000.0;
        if tick_secs > 0.0 {
            self.scale = span as f64 / tick_secs;
            debug!(
                "Drift: {}s true over {:.3}s ticks, scale={:.6} ({:+.1} ppm)",
                span,
                tick_secs,
                self.scale,
                (self.scale - 1.0) * 1_000_000.0
            );
        }
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_reference() {
        let mut drift = DriftEstimator::new(60, 1_209_600);
        assert!(!drift.has_reference());
        assert_eq!(drift.sample(1_000, 0), 1.0);
        assert!(drift.has_reference());
    }

    #[test]
    fn test_scale_needs_minimum_span() {
        let mut drift = DriftEstimator::new(60, 1_209_600);
        drift.sample(1_000, 0);
        // exactly 60 s is not enough
        assert_eq!(drift.sample(1_060, 120_000), 1.0);
        assert_eq!(drift.sample(1_061, 122_000), 0.5);
    }

    #[test]
    fn test_fast_and_slow_oscillator() {
        let mut drift = DriftEstimator::new(60, 1_209_600);
        drift.sample(0, 0);
        let scale = drift.sample(1_000, 999_000);
        assert!((scale - 1_000.0 / 999.0).abs() < 1e-12);
        let scale = drift.sample(2_000, 2_002_000);
        assert!((scale - 2_000.0 / 2_002.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bogus_spans() {
        let mut drift = DriftEstimator::new(60, 1_209_600);
        drift.sample(1_000_000, 0);
        // earlier than the reference
        assert_eq!(drift.sample(10, 100_000), 1.0);
        // beyond the sane window
        assert_eq!(drift.sample(1_000_000 + 1_209_600, 100_000), 1.0);
    }

    #[test]
    fn test_tick_wraparound() {
        let mut drift = DriftEstimator::new(60, 1_209_600);
        drift.sample(0, u32::MAX - 49_999);
        let scale = drift.sample(100, 150_000);
        assert!((scale - 0.5).abs() < 1e-12);
    }
}
