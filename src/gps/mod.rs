//! Streaming NMEA-0183 decoder for `$GPRMC` and `$GPGGA` sentences.
//!
//! Raw values are fixed-point integers: angles in millionths of a degree,
//! altitude in centimeters, speed in hundredths of a knot, course and HDOP
//! in hundredths. Every field starts at its `GPS_INVALID_*` sentinel.

pub mod decoder;
pub mod fix;

pub use decoder::{Decoder, DecoderStats, TERM_CAPACITY};
pub use fix::{cardinal, course_to, distance_between, GpsDateTime};

pub const GPS_INVALID_AGE: u32 = 0xFFFF_FFFF;
pub const GPS_INVALID_ANGLE: i32 = 999_999_999;
pub const GPS_INVALID_ALTITUDE: i32 = 999_999_999;
pub const GPS_INVALID_DATE: u32 = 0;
pub const GPS_INVALID_TIME: u32 = 0xFFFF_FFFF;
pub const GPS_INVALID_SPEED: u32 = 999_999_999;
pub const GPS_INVALID_COURSE: u32 = GPS_INVALID_ANGLE as u32;
pub const GPS_INVALID_SATELLITES: u8 = 0xFF;
pub const GPS_INVALID_HDOP: u32 = 0xFFFF_FFFF;

pub const GPS_INVALID_F_ANGLE: f64 = 1000.0;
pub const GPS_INVALID_F_ALTITUDE: f64 = 1_000_000.0;
pub const GPS_INVALID_F_SPEED: f64 = -1.0;

pub const MPH_PER_KNOT: f64 = 1.150_779_45;
pub const MPS_PER_KNOT: f64 = 0.514_444_44;
pub const KMPH_PER_KNOT: f64 = 1.852;

/// Frames `body` as a complete sentence with a valid checksum.
#[cfg(test)]
pub(crate) fn test_sentence(body: &str) -> String {
    let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${}*{:02X}\r\n", body, checksum)
}
