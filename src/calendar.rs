//! Calendar <-> epoch-seconds conversion.
//!
//! Days are counted from 2000-01-01 and shifted onto the Unix epoch with
//! [`Y2K_UNIX_OFFSET`]. Epoch seconds are 32-bit unsigned, so representable
//! dates run from 1970-01-01 to early 2106.

use serde::{Deserialize, Serialize};

/// Seconds between 1970-01-01 and 2000-01-01.
pub const Y2K_UNIX_OFFSET: u32 = 946_684_800;

const SECS_PER_DAY: i64 = 86_400;

/// Broken-down calendar time. `day_of_week` is 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day_of_week: u8,
    pub unixtime: u32,
}

pub fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_year(year: u16) -> i64 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Convert calendar fields to Unix seconds.
///
/// Returns `None` if the result does not fit in `u32` (before 1970 or after 2106).
/// Field ranges are not validated; out-of-range values carry into the next unit.
pub fn to_unix(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<u32> {
    let mut days = day as i64 - 1;
    for m in 1..month {
        days += days_in_month(year, m) as i64;
    }
    if year >= 2000 {
        for y in 2000..year {
            days += days_in_year(y);
        }
    } else {
        for y in year..2000 {
            days -= days_in_year(y);
        }
    }

    let secs = ((days * 24 + hour as i64) * 60 + minute as i64) * 60 + second as i64;
    u32::try_from(Y2K_UNIX_OFFSET as i64 + secs).ok()
}

/// Convert Unix seconds back to calendar fields.
pub fn from_unix(unixtime: u32) -> DateTime {
    let since_y2k = unixtime as i64 - Y2K_UNIX_OFFSET as i64;
    let mut days = since_y2k.div_euclid(SECS_PER_DAY);
    let secs_of_day = since_y2k.rem_euclid(SECS_PER_DAY);

    let mut year: u16 = 2000;
    if days >= 0 {
        while days >= days_in_year(year) {
            days -= days_in_year(year);
            year += 1;
        }
    } else {
        while days < 0 {
            year -= 1;
            days += days_in_year(year);
        }
    }

    let mut month: u8 = 1;
    while month < 12 {
        let len = days_in_month(year, month) as i64;
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    DateTime {
        year,
        month,
        day: (days + 1) as u8,
        hour: (secs_of_day / 3600) as u8,
        minute: (secs_of_day / 60 % 60) as u8,
        second: (secs_of_day % 60) as u8,
        // 1970-01-01 was a Thursday.
        day_of_week: ((unixtime / 86_400 + 4) % 7) as u8,
        unixtime,
    }
}

impl DateTime {
    /// Canonical "no time" value reported before any fix was accepted.
    pub fn zero() -> Self {
        DateTime::default()
    }

    pub fn from_unix(unixtime: u32) -> Self {
        from_unix(unixtime)
    }

    /// Recompute Unix seconds from the calendar fields.
    pub fn to_unix(&self) -> Option<u32> {
        to_unix(self.year, self.month, self.day, self.hour, self.minute, self.second)
    }

    pub fn to_naive(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
    }

    pub fn seconds_of_day(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }
}

pub fn weekday_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Unknown",
    }
}

pub fn month_name(month: u8) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn chrono_unix(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn test_y2k_offset() {
        assert_eq!(to_unix(2000, 1, 1, 0, 0, 0), Some(Y2K_UNIX_OFFSET));
        assert_eq!(Y2K_UNIX_OFFSET as i64, chrono_unix(2000, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_leap_rule() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2004));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2100));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn test_to_unix_matches_chrono() {
        let cases = [
            (2000, 2, 29, 12, 0, 0),
            (2004, 2, 29, 23, 59, 59),
            (2004, 3, 1, 0, 0, 0),
            (2024, 6, 15, 8, 30, 5),
            (2038, 1, 19, 3, 14, 8),
            (2100, 2, 28, 12, 0, 0),
            (2100, 3, 1, 0, 0, 0),
            (1994, 3, 23, 12, 35, 19),
            (1970, 1, 1, 0, 0, 0),
        ];
        for (y, mo, d, h, mi, s) in cases {
            let ours = to_unix(y, mo, d, h, mi, s).unwrap();
            let theirs = chrono_unix(y as i32, mo as u32, d as u32, h as u32, mi as u32, s as u32);
            assert_eq!(ours as i64, theirs, "{}-{}-{} {}:{}:{}", y, mo, d, h, mi, s);
        }
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (2000, 1, 1, 0, 0, 0),
            (2000, 2, 29, 6, 7, 8),
            (2000, 12, 31, 23, 59, 59),
            (2004, 2, 29, 0, 0, 1),
            (2023, 2, 28, 23, 59, 59),
            (2099, 12, 31, 12, 0, 0),
            (2100, 2, 28, 23, 59, 59),
            (2100, 3, 1, 0, 0, 0),
            (1999, 12, 31, 23, 59, 59),
        ];
        for (y, mo, d, h, mi, s) in cases {
            let ut = to_unix(y, mo, d, h, mi, s).unwrap();
            let dt = from_unix(ut);
            assert_eq!(
                (dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second),
                (y, mo, d, h, mi, s)
            );
            assert_eq!(dt.unixtime, ut);
            assert_eq!(dt.to_unix(), Some(ut));
        }
    }

    #[test]
    fn test_no_feb_29_in_2100() {
        let feb28 = to_unix(2100, 2, 28, 0, 0, 0).unwrap();
        let next = from_unix(feb28 + 86_400);
        assert_eq!((next.month, next.day), (3, 1));
    }

    #[test]
    fn test_day_of_week_matches_chrono() {
        for ut in [0u32, Y2K_UNIX_OFFSET, 1_718_440_205, 4_102_444_800] {
            let dt = from_unix(ut);
            let naive = dt.to_naive().unwrap();
            assert_eq!(dt.day_of_week as u32, naive.weekday().num_days_from_sunday());
        }
        // 1970-01-01 was a Thursday
        assert_eq!(weekday_name(from_unix(0).day_of_week), "Thursday");
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(to_unix(1969, 12, 31, 23, 59, 59), None);
        assert_eq!(to_unix(2107, 1, 1, 0, 0, 0), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(month_name(2), "February");
        assert_eq!(month_name(13), "Unknown");
        assert_eq!(weekday_name(0), "Sunday");
        assert_eq!(weekday_name(7), "Unknown");
    }

    #[test]
    fn test_zero_has_no_naive() {
        assert_eq!(DateTime::zero().to_naive(), None);
    }
}
