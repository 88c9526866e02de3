use crate::calendar::DateTime;
use crate::config::ScheduleConfig;

impl ScheduleConfig {
    fn on_secs(&self) -> u32 {
        self.hour_on as u32 * 3600 + self.minute_on as u32 * 60
    }

    fn off_secs(&self) -> u32 {
        self.hour_off as u32 * 3600 + self.minute_off as u32 * 60
    }

    /// Whether the load should be on at `now`. The window is `[on, off)` and
    /// wraps past midnight when off is earlier than on.
    ///
    /// Returns None when on and off coincide, which leaves the load untouched.
    pub fn is_active(&self, now: &DateTime) -> Option<bool> {
        let on = self.on_secs();
        let off = self.off_secs();
        if on == off {
            return None;
        }

        let t = now.seconds_of_day();
        Some(if on < off {
            t >= on && t < off
        } else {
            t >= on || t < off
        })
    }
}
