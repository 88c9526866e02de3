use super::decoder::Decoder;
use super::*;
use crate::traits::TickSource;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_372_795.0;

const DIRECTIONS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];

/// Latched fix values plus the tick at which time and position were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fix {
    pub time: u32,
    pub date: u32,
    pub latitude: i32,
    pub longitude: i32,
    pub altitude: i32,
    pub speed: u32,
    pub course: u32,
    pub hdop: u32,
    pub satellites: u8,
    pub time_fix: Option<u32>,
    pub position_fix: Option<u32>,
}

impl Default for Fix {
    fn default() -> Self {
        Fix {
            time: GPS_INVALID_TIME,
            date: GPS_INVALID_DATE,
            latitude: GPS_INVALID_ANGLE,
            longitude: GPS_INVALID_ANGLE,
            altitude: GPS_INVALID_ALTITUDE,
            speed: GPS_INVALID_SPEED,
            course: GPS_INVALID_COURSE,
            hdop: GPS_INVALID_HDOP,
            satellites: GPS_INVALID_SATELLITES,
            time_fix: None,
            position_fix: None,
        }
    }
}

/// Date and time fields split out of the raw `ddmmyy` / `hhmmsscc` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
    pub age: u32,
}

impl<T: TickSource> Decoder<T> {
    fn age_of(&self, tick: Option<u32>) -> u32 {
        match tick {
            Some(t) => self.ticks.millis().wrapping_sub(t),
            None => GPS_INVALID_AGE,
        }
    }

    pub fn position_age(&self) -> u32 {
        self.age_of(self.fix.position_fix)
    }

    pub fn time_age(&self) -> u32 {
        self.age_of(self.fix.time_fix)
    }

    /// Latitude and longitude in millionths of a degree, plus fix age in ms.
    pub fn position(&self) -> (i32, i32, u32) {
        (self.fix.latitude, self.fix.longitude, self.position_age())
    }

    /// Date as `ddmmyy`, time as `hhmmsscc`, plus fix age in ms.
    pub fn datetime(&self) -> (u32, u32, u32) {
        (self.fix.date, self.fix.time, self.time_age())
    }

    /// Centimeters.
    pub fn altitude(&self) -> i32 {
        self.fix.altitude
    }

    /// Hundredths of a degree.
    pub fn course(&self) -> u32 {
        self.fix.course
    }

    /// Hundredths of a knot.
    pub fn speed(&self) -> u32 {
        self.fix.speed
    }

    pub fn satellites(&self) -> u8 {
        self.fix.satellites
    }

    pub fn hdop(&self) -> u32 {
        self.fix.hdop
    }

    /// True when both date and time have been committed at least once.
    pub fn has_datetime(&self) -> bool {
        self.fix.date != GPS_INVALID_DATE && self.fix.time != GPS_INVALID_TIME
    }

    /// Position in decimal degrees. Both outputs are gated on the latitude sentinel.
    pub fn f_position(&self) -> (f64, f64, u32) {
        let (lat, lon, age) = self.position();
        if lat == GPS_INVALID_ANGLE {
            (GPS_INVALID_F_ANGLE, GPS_INVALID_F_ANGLE, age)
        } else {
            (lat as f64 / 1_000_000.0, lon as f64 / 1_000_000.0, age)
        }
    }

    pub fn crack_datetime(&self) -> GpsDateTime {
        let (date, time, age) = self.datetime();
        let yy = (date % 100) as u16;
        GpsDateTime {
            year: yy + if yy > 80 { 1900 } else { 2000 },
            month: (date / 100 % 100) as u8,
            day: (date / 10_000) as u8,
            hour: (time / 1_000_000) as u8,
            minute: (time / 10_000 % 100) as u8,
            second: (time / 100 % 100) as u8,
            hundredths: (time % 100) as u8,
            age,
        }
    }

    pub fn f_altitude(&self) -> f64 {
        if self.fix.altitude == GPS_INVALID_ALTITUDE {
            GPS_INVALID_F_ALTITUDE
        } else {
            self.fix.altitude as f64 / 100.0
        }
    }

    pub fn f_course(&self) -> f64 {
        if self.fix.course == GPS_INVALID_COURSE {
            GPS_INVALID_F_ANGLE
        } else {
            self.fix.course as f64 / 100.0
        }
    }

    pub fn f_speed_knots(&self) -> f64 {
        if self.fix.speed == GPS_INVALID_SPEED {
            GPS_INVALID_F_SPEED
        } else {
            self.fix.speed as f64 / 100.0
        }
    }

    fn speed_in(&self, per_knot: f64) -> f64 {
        let knots = self.f_speed_knots();
        if knots == GPS_INVALID_F_SPEED {
            GPS_INVALID_F_SPEED
        } else {
            knots * per_knot
        }
    }

    pub fn f_speed_mph(&self) -> f64 {
        self.speed_in(MPH_PER_KNOT)
    }

    pub fn f_speed_mps(&self) -> f64 {
        self.speed_in(MPS_PER_KNOT)
    }

    pub fn f_speed_kmph(&self) -> f64 {
        self.speed_in(KMPH_PER_KNOT)
    }
}

/// Great-circle distance in meters between two positions in decimal degrees.
pub fn distance_between(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let delta = (long1 - long2).to_radians();
    let (sdlong, cdlong) = delta.sin_cos();
    let (slat1, clat1) = lat1.to_radians().sin_cos();
    let (slat2, clat2) = lat2.to_radians().sin_cos();

    let a = clat1 * slat2 - slat1 * clat2 * cdlong;
    let b = clat2 * sdlong;
    let numer = (a * a + b * b).sqrt();
    let denom = slat1 * slat2 + clat1 * clat2 * cdlong;
    numer.atan2(denom) * EARTH_RADIUS_M
}

/// Initial bearing in degrees from position 1 to position 2. North = 0, East = 90.
pub fn course_to(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let dlon = (long2 - long1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a1 = dlon.sin() * lat2.cos();
    let a2 = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let mut bearing = a1.atan2(a2);
    if bearing < 0.0 {
        bearing += std::f64::consts::TAU;
    }
    let deg = bearing.to_degrees();
    if deg >= 360.0 {
        deg - 360.0
    } else {
        deg
    }
}

/// 16-point compass label for a bearing in degrees.
pub fn cardinal(course: f64) -> &'static str {
    let bucket = ((course + 11.25) / 22.5).floor() as i64;
    DIRECTIONS[bucket.rem_euclid(16) as usize]
}
