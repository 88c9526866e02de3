use crate::calendar::DateTime;
use crate::clock::SoftwareClock;
use crate::config::{ScheduleConfig, SystemConfig};
use crate::gps::*;
use crate::status::GpsStatus;
use crate::traits::{ByteSource, TickSource};
use anyhow::Result;
use log::{debug, info};

// Bounds one iteration so a chatty receiver can't starve the clock refresh.
const MAX_BYTES_PER_ITERATION: usize = 1024;

pub struct GpsController<T, B>
where
    T: TickSource,
    B: ByteSource,
{
    clock: SoftwareClock<T>,
    source: B,
    schedule: ScheduleConfig,

    // State
    load_on: bool,
    last_time: DateTime,
}

impl<T, B> GpsController<T, B>
where
    T: TickSource,
    B: ByteSource,
{
    pub fn new(ticks: T, source: B, config: &SystemConfig) -> Self {
        GpsController {
            clock: SoftwareClock::new(ticks, config.clock.clone()),
            source,
            schedule: config.schedule.clone(),
            load_on: false,
            last_time: DateTime::zero(),
        }
    }

    pub fn clock(&self) -> &SoftwareClock<T> {
        &self.clock
    }

    pub fn load_on(&self) -> bool {
        self.load_on
    }

    pub fn current_time(&self) -> DateTime {
        self.last_time
    }

    pub fn is_source_exhausted(&self) -> bool {
        self.source.is_exhausted()
    }

    /// Drain available bytes into the decoder, refresh the clock and apply
    /// the schedule. Returns true if any byte was consumed.
    pub fn process_loop_iteration(&mut self) -> Result<bool> {
        let mut consumed = 0;
        let mut read_error = None;
        while consumed < MAX_BYTES_PER_ITERATION {
            let b = match self.source.read_byte() {
                Ok(Some(b)) => b,
                Ok(None) => break,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            };
            consumed += 1;
            if self.clock.consume(b) {
                debug!("Validated sentence ({} so far)", self.clock.decoder().stats().passed_sentences);
            }
        }

        // The clock keeps extrapolating even while the source is failing.
        self.last_time = self.clock.date_time();
        self.apply_schedule();

        match read_error {
            Some(e) => Err(e),
            None => Ok(consumed > 0),
        }
    }

    /// Drop buffered input so the stream can be reopened after a failure or
    /// after it was handed to another consumer. At most the sentence in
    /// flight is lost.
    pub fn resume_source(&mut self) -> Result<()> {
        self.source.reset()?;
        info!("Byte source reset");
        Ok(())
    }

    fn apply_schedule(&mut self) {
        if !self.schedule.auto || !self.clock.has_time() {
            return;
        }
        if let Some(on) = self.schedule.is_active(&self.last_time) {
            if on != self.load_on {
                info!(
                    "Load switched {} at {:02}:{:02}:{:02}",
                    if on { "ON" } else { "OFF" },
                    self.last_time.hour,
                    self.last_time.minute,
                    self.last_time.second
                );
                self.load_on = on;
            }
        }
    }

    pub fn status(&self) -> GpsStatus {
        let gps = self.clock.decoder();
        let (lat, lon, position_age) = gps.f_position();
        let valid = |v: f64, invalid: f64| if v == invalid { None } else { Some(v) };
        let age = |a: u32| if a == GPS_INVALID_AGE { None } else { Some(a) };

        GpsStatus {
            unixtime: self.last_time.unixtime,
            local_time: self
                .last_time
                .to_naive()
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            has_time: self.clock.has_time(),
            drift_scale: self.clock.drift_scale(),
            latitude: valid(lat, GPS_INVALID_F_ANGLE),
            longitude: valid(lon, GPS_INVALID_F_ANGLE),
            altitude_m: valid(gps.f_altitude(), GPS_INVALID_F_ALTITUDE),
            speed_kmph: valid(gps.f_speed_kmph(), GPS_INVALID_F_SPEED),
            course: valid(gps.f_course(), GPS_INVALID_F_ANGLE),
            satellites: (gps.satellites() != GPS_INVALID_SATELLITES).then_some(gps.satellites()),
            hdop: (gps.hdop() != GPS_INVALID_HDOP).then(|| gps.hdop() as f64 / 100.0),
            position_age_ms: age(position_age),
            time_age_ms: age(gps.time_age()),
            load_on: self.load_on,
            stats: gps.stats(),
        }
    }

    pub fn log_status(&self) {
        let stats = self.clock.decoder().stats();
        if !self.clock.has_time() {
            info!(
                "[Status] Waiting for GPS time... ({} chars, {} sentences, {} bad checksums)",
                stats.chars, stats.passed_sentences, stats.failed_checksums
            );
            return;
        }

        let t = &self.last_time;
        let (lat, lon, _) = self.clock.decoder().f_position();
        let position = if lat == GPS_INVALID_F_ANGLE {
            "no position".to_string()
        } else {
            format!("{:.6}, {:.6}", lat, lon)
        };
        info!(
            "[Status] {:04}-{:02}-{:02} {:02}:{:02}:{:02} | {} | Scale: {:.6} | Load: {} | Sentences: {} ok / {} bad",
            t.year,
            t.month,
            t.day,
            t.hour,
            t.minute,
            t.second,
            position,
            self.clock.drift_scale(),
            if self.load_on { "ON" } else { "OFF" },
            stats.passed_sentences,
            stats.failed_checksums
        );
    }
}
