//! Software real-time clock driven by GPS time and a free-running tick counter.
//!
//! Between fixes the clock extrapolates from the last accepted GPS time at
//! the measured drift rate, so it keeps running through dropouts.

mod drift;

pub use self::drift::DriftEstimator;

use crate::calendar::{self, DateTime};
use crate::config::ClockConfig;
use crate::gps::Decoder;
use crate::traits::TickSource;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Baseline {
    unixtime: u32,
    tick: u32,
}

pub struct SoftwareClock<T: TickSource> {
    decoder: Decoder<T>,
    config: ClockConfig,
    drift: DriftEstimator,
    baseline: Option<Baseline>,
    last_seen: Option<u32>,
}

impl<T: TickSource> SoftwareClock<T> {
    pub fn new(ticks: T, config: ClockConfig) -> Self {
        let drift = DriftEstimator::new(config.min_baseline_secs, config.max_baseline_secs);
        SoftwareClock {
            decoder: Decoder::new(ticks),
            config,
            drift,
            baseline: None,
            last_seen: None,
        }
    }

    /// Feed one byte from the GPS stream to the decoder.
    pub fn consume(&mut self, c: u8) -> bool {
        self.decoder.consume(c)
    }

    pub fn decoder(&self) -> &Decoder<T> {
        &self.decoder
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn drift_scale(&self) -> f64 {
        self.drift.scale()
    }

    /// False until a GPS time has been accepted.
    pub fn has_time(&self) -> bool {
        self.baseline.is_some() && self.drift.has_reference()
    }

    fn now(&self) -> u32 {
        self.decoder.ticks().millis()
    }

    /// Current GPS time shifted into the local zone, if the decoder has one.
    fn gps_unixtime(&self) -> Option<u32> {
        if !self.decoder.has_datetime() {
            return None;
        }
        let t = self.decoder.crack_datetime();
        calendar::to_unix(t.year, t.month, t.day, t.hour, t.minute, t.second)?
            .checked_add_signed(self.config.utc_offset_secs)
    }

    // The very first valid reading is adopted; nothing is discarded to prime the clock.
    fn observe(&mut self, unixtime: u32) {
        let advanced = self.last_seen.map_or(true, |prev| unixtime > prev);
        if advanced {
            let tick = self.now();
            if self.baseline.is_none() {
                info!("GPS time acquired: {:?}", calendar::from_unix(unixtime));
            }
            self.baseline = Some(Baseline { unixtime, tick });
            self.drift.sample(unixtime, tick);
        }
        self.last_seen = Some(unixtime);
    }

    /// Refresh from the decoder and return the extrapolated local time.
    ///
    /// Returns [`DateTime::zero`] until the first GPS time is accepted.
    pub fn date_time(&mut self) -> DateTime {
        if let Some(unixtime) = self.gps_unixtime() {
            self.observe(unixtime);
        }

        let now = self.now();
        let scale = self.drift.scale();
        let baseline = match self.baseline.as_mut() {
            Some(b) => b,
            None => return DateTime::zero(),
        };

        // A baseline tick ahead of the counter is a bad read, not a wrap.
        if now.wrapping_sub(baseline.tick) > i32::MAX as u32 {
            baseline.tick = now;
        }

        let elapsed = now.wrapping_sub(baseline.tick);
        if elapsed as f64 * scale >= self.config.max_extrapolation_ms as f64 {
            let step_secs = self.config.rebase_step_secs;
            baseline.tick = baseline
                .tick
                .wrapping_add((step_secs as f64 * 1000.0 / scale) as u32);
            baseline.unixtime = baseline.unixtime.saturating_add(step_secs);
            debug!("Rebased clock by {}s to unixtime {}", step_secs, baseline.unixtime);
        }

        let elapsed = now.wrapping_sub(baseline.tick);
        let extrapolated = (elapsed as f64 / 1000.0 * scale) as u32;
        calendar::from_unix(baseline.unixtime.saturating_add(extrapolated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::test_sentence as sentence;
    use crate::source::ManualTicks;

    const NOON: u32 = 1_718_452_800; // 2024-06-15 12:00:00 UTC

    fn rmc_at(unixtime: u32) -> String {
        let t = calendar::from_unix(unixtime);
        sentence(&format!(
            "GPRMC,{:02}{:02}{:02}.00,A,4807.038,N,01131.000,E,000.0,000.0,{:02}{:02}{:02},,",
            t.hour,
            t.minute,
            t.second,
            t.day,
            t.month,
            t.year % 100
        ))
    }

    fn utc() -> ClockConfig {
        ClockConfig {
            utc_offset_secs: 0,
            ..ClockConfig::default()
        }
    }

    fn feed<T: TickSource>(clock: &mut SoftwareClock<T>, s: &str) -> bool {
        s.bytes().fold(false, |valid, b| clock.consume(b) || valid)
    }

    #[test]
    fn test_zero_before_first_fix() {
        let ticks = ManualTicks::new(1_000);
        let mut clock = SoftwareClock::new(&ticks, utc());
        assert_eq!(clock.date_time(), DateTime::zero());
        assert!(!clock.has_time());

        // GPGGA carries no date, so the clock still has nothing to go on.
        assert!(feed(
            &mut clock,
            &sentence("GPGGA,120000,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,")
        ));
        assert_eq!(clock.date_time(), DateTime::zero());
    }

    #[test]
    fn test_first_fix_then_extrapolates() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ticks = ManualTicks::new(1_000);
        let mut clock = SoftwareClock::new(&ticks, utc());

        assert!(feed(&mut clock, &rmc_at(NOON)));
        let t = clock.date_time();
        assert!(clock.has_time());
        assert_eq!(t.unixtime, NOON);
        assert_eq!((t.year, t.month, t.day, t.hour, t.minute, t.second), (2024, 6, 15, 12, 0, 0));
        assert_eq!(t.day_of_week, 6); // Saturday

        ticks.advance(5_400);
        assert_eq!(clock.date_time().unixtime, NOON + 5);
    }

    #[test]
    fn test_utc_offset_applied() {
        let ticks = ManualTicks::new(0);
        let mut clock = SoftwareClock::new(&ticks, ClockConfig::default());
        feed(&mut clock, &rmc_at(NOON));
        let t = clock.date_time();
        assert_eq!(t.unixtime, NOON + 7 * 3600);
        assert_eq!(t.hour, 19);
    }

    #[test]
    fn test_drift_scale_converges_to_one() {
        let ticks = ManualTicks::new(1_000);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        for i in 1..=9 {
            ticks.advance(10_000);
            feed(&mut clock, &rmc_at(NOON + 10 * i));
            assert_eq!(clock.date_time().unixtime, NOON + 10 * i);
        }
        assert!((clock.drift_scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drift_scale_converges_to_half() {
        let ticks = ManualTicks::new(1_000);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        for i in 1..=8 {
            ticks.advance(20_000);
            feed(&mut clock, &rmc_at(NOON + 10 * i));
            clock.date_time();
        }
        assert!((clock.drift_scale() - 0.5).abs() < 1e-12);

        // No more fixes: 20 s of ticks is 10 s of true time.
        ticks.advance(20_000);
        assert_eq!(clock.date_time().unixtime, NOON + 90);
        ticks.advance(40_000);
        assert_eq!(clock.date_time().unixtime, NOON + 110);
    }

    #[test]
    fn test_stale_repeat_does_not_reset_baseline() {
        let ticks = ManualTicks::new(0);
        let mut clock = SoftwareClock::new(&ticks, utc());
        let s = rmc_at(NOON);
        feed(&mut clock, &s);
        clock.date_time();

        ticks.advance(8_000);
        // Same sentence again: not newer than the last one seen.
        feed(&mut clock, &s);
        assert_eq!(clock.date_time().unixtime, NOON + 8);
    }

    #[test]
    fn test_rebase_keeps_output_continuous() {
        let ticks = ManualTicks::new(0);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        ticks.advance(100_000);
        assert_eq!(clock.date_time().unixtime, NOON + 100);
        let baseline = clock.baseline.unwrap();
        assert_eq!(baseline.unixtime, NOON + 30);
        assert_eq!(baseline.tick, 30_000);

        let mut prev = NOON + 100;
        for _ in 0..300 {
            ticks.advance(1_000);
            let t = clock.date_time().unixtime;
            assert_eq!(t, prev + 1);
            prev = t;
        }
    }

    #[test]
    fn test_counter_behind_baseline_is_clamped() {
        let ticks = ManualTicks::new(50_000);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        ticks.set(40_000);
        assert_eq!(clock.date_time().unixtime, NOON);
        ticks.advance(5_000);
        assert_eq!(clock.date_time().unixtime, NOON + 5);
    }

    #[test]
    fn test_counter_wraparound() {
        let ticks = ManualTicks::new(u32::MAX - 1_999);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        ticks.advance(5_000);
        assert_eq!(clock.date_time().unixtime, NOON + 5);
    }

    #[test]
    fn test_bogus_span_keeps_scale() {
        let ticks = ManualTicks::new(0);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        // 20 days of GPS time in 10 s of ticks is outside the sane window
        ticks.advance(10_000);
        let later = NOON + 20 * 86_400;
        feed(&mut clock, &rmc_at(later));
        assert_eq!(clock.date_time().unixtime, later);
        assert_eq!(clock.drift_scale(), 1.0);
    }

    #[test]
    fn test_survives_gps_dropout() {
        let ticks = ManualTicks::new(0);
        let mut clock = SoftwareClock::new(&ticks, utc());
        feed(&mut clock, &rmc_at(NOON));
        clock.date_time();

        // An hour without fixes, polled once a second
        for _ in 0..3_600 {
            ticks.advance(1_000);
            clock.date_time();
        }
        assert_eq!(clock.date_time().unixtime, NOON + 3_600);
    }
}
