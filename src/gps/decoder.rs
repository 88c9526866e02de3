use super::fix::Fix;
use crate::traits::TickSource;
use log::debug;
use serde::{Deserialize, Serialize};

/// Size of the term buffer. One slot is reserved, so terms keep at most
/// `TERM_CAPACITY - 1` bytes and longer terms are truncated.
pub const TERM_CAPACITY: usize = 15;

const GPRMC_TERM: &[u8] = b"GPRMC";
const GPGGA_TERM: &[u8] = b"GPGGA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SentenceType {
    Gprmc,
    Gpgga,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderStats {
    pub chars: u32,
    pub passed_sentences: u32,
    pub failed_checksums: u32,
}

/// Byte-at-a-time NMEA decoder.
///
/// Field values are staged in a pending fix while a sentence is parsed and
/// copied into the live fix only once the checksum matches and the sentence
/// reports a usable fix.
pub struct Decoder<T: TickSource> {
    pub(super) ticks: T,
    pub(super) fix: Fix,
    pending: Fix,

    // Parser state
    term: [u8; TERM_CAPACITY],
    term_offset: usize,
    term_number: u8,
    parity: u8,
    is_checksum_term: bool,
    sentence_type: SentenceType,
    data_good: bool,

    stats: DecoderStats,
}

impl<T: TickSource> Decoder<T> {
    pub fn new(ticks: T) -> Self {
        Decoder {
            ticks,
            fix: Fix::default(),
            pending: Fix::default(),
            term: [0u8; TERM_CAPACITY],
            term_offset: 0,
            term_number: 0,
            parity: 0,
            is_checksum_term: false,
            sentence_type: SentenceType::Other,
            data_good: false,
            stats: DecoderStats::default(),
        }
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Feed one byte. Returns true when this byte completed a sentence that
    /// passed its checksum and carried a good fix.
    pub fn consume(&mut self, c: u8) -> bool {
        self.stats.chars = self.stats.chars.wrapping_add(1);

        match c {
            b',' | b'\r' | b'\n' | b'*' => {
                if c == b',' {
                    self.parity ^= c;
                }
                // term_offset never exceeds TERM_CAPACITY - 1, so every term fits.
                let valid = self.term_complete();
                self.term_number = self.term_number.saturating_add(1);
                self.term_offset = 0;
                self.is_checksum_term = c == b'*';
                valid
            }
            b'$' => {
                self.term_number = 0;
                self.term_offset = 0;
                self.parity = 0;
                self.sentence_type = SentenceType::Other;
                self.is_checksum_term = false;
                self.data_good = false;
                false
            }
            _ => {
                if self.term_offset < TERM_CAPACITY - 1 {
                    self.term[self.term_offset] = c;
                    self.term_offset += 1;
                }
                if !self.is_checksum_term {
                    self.parity ^= c;
                }
                false
            }
        }
    }

    fn term_complete(&mut self) -> bool {
        let buf = self.term;
        let term = &buf[..self.term_offset];

        if self.is_checksum_term {
            return self.finish_sentence(term);
        }

        if self.term_number == 0 {
            self.sentence_type = if term == GPRMC_TERM {
                SentenceType::Gprmc
            } else if term == GPGGA_TERM {
                SentenceType::Gpgga
            } else {
                SentenceType::Other
            };
            return false;
        }

        if self.sentence_type == SentenceType::Other || term.is_empty() {
            return false;
        }

        match (self.sentence_type, self.term_number) {
            (_, 1) => {
                self.pending.time = parse_decimal(term) as u32;
                self.pending.time_fix = Some(self.ticks.millis());
            }
            (SentenceType::Gprmc, 2) => {
                self.data_good = term[0] == b'A';
            }
            (SentenceType::Gprmc, 3) | (SentenceType::Gpgga, 2) => {
                self.pending.latitude = parse_degrees(term);
                self.pending.position_fix = Some(self.ticks.millis());
            }
            (SentenceType::Gprmc, 4) | (SentenceType::Gpgga, 3) => {
                if term[0] == b'S' {
                    self.pending.latitude = self.pending.latitude.wrapping_neg();
                }
            }
            (SentenceType::Gprmc, 5) | (SentenceType::Gpgga, 4) => {
                self.pending.longitude = parse_degrees(term);
            }
            (SentenceType::Gprmc, 6) | (SentenceType::Gpgga, 5) => {
                if term[0] == b'W' {
                    self.pending.longitude = self.pending.longitude.wrapping_neg();
                }
            }
            (SentenceType::Gprmc, 7) => self.pending.speed = parse_decimal(term) as u32,
            (SentenceType::Gprmc, 8) => self.pending.course = parse_decimal(term) as u32,
            (SentenceType::Gprmc, 9) => self.pending.date = parse_uint(term),
            (SentenceType::Gpgga, 6) => {
                self.data_good = term[0] > b'0';
            }
            (SentenceType::Gpgga, 7) => {
                self.pending.satellites = parse_uint(term).min(u8::MAX as u32) as u8;
            }
            (SentenceType::Gpgga, 8) => self.pending.hdop = parse_decimal(term) as u32,
            (SentenceType::Gpgga, 9) => self.pending.altitude = parse_decimal(term),
            _ => {}
        }

        false
    }

    fn finish_sentence(&mut self, term: &[u8]) -> bool {
        let checksum = match parse_hex_byte(term) {
            Some(c) if c == self.parity => c,
            other => {
                self.stats.failed_checksums = self.stats.failed_checksums.wrapping_add(1);
                debug!("Checksum mismatch: got {:?}, computed {:02X}", other, self.parity);
                return false;
            }
        };

        if !self.data_good {
            debug!("Sentence {:?} (checksum {:02X}) reports no fix. Ignoring.", self.sentence_type, checksum);
            return false;
        }

        self.fix.time_fix = self.pending.time_fix;
        self.fix.position_fix = self.pending.position_fix;

        match self.sentence_type {
            SentenceType::Gprmc => {
                self.fix.time = self.pending.time;
                self.fix.date = self.pending.date;
                self.fix.latitude = self.pending.latitude;
                self.fix.longitude = self.pending.longitude;
                self.fix.speed = self.pending.speed;
                self.fix.course = self.pending.course;
            }
            SentenceType::Gpgga => {
                self.fix.altitude = self.pending.altitude;
                self.fix.time = self.pending.time;
                self.fix.latitude = self.pending.latitude;
                self.fix.longitude = self.pending.longitude;
                self.fix.satellites = self.pending.satellites;
                self.fix.hdop = self.pending.hdop;
            }
            SentenceType::Other => {}
        }

        self.stats.passed_sentences = self.stats.passed_sentences.wrapping_add(1);
        debug!(
            "Fix committed from {:?}: time={} lat={} lon={}",
            self.sentence_type, self.fix.time, self.fix.latitude, self.fix.longitude
        );
        true
    }
}

fn is_digit(b: &u8) -> bool {
    b.is_ascii_digit()
}

fn from_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// First two characters of the term as a hex byte.
fn parse_hex_byte(term: &[u8]) -> Option<u8> {
    match term {
        [hi, lo, ..] => Some(from_hex(*hi)? << 4 | from_hex(*lo)?),
        _ => None,
    }
}

/// Leading decimal digits as an integer; stops at the first non-digit.
fn parse_uint(term: &[u8]) -> u32 {
    term.iter()
        .take_while(|b| is_digit(b))
        .fold(0u32, |acc, b| acc.wrapping_mul(10).wrapping_add((b - b'0') as u32))
}

/// `[-]iii[.ff]` scaled by 100, extra fractional digits dropped.
fn parse_decimal(term: &[u8]) -> i32 {
    let (negative, digits) = match term.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, term),
    };

    let mut ret = parse_uint(digits).wrapping_mul(100);
    let int_len = digits.iter().take_while(|b| is_digit(b)).count();
    let frac = &digits[int_len..];
    if frac.first() == Some(&b'.') {
        if let Some(d1) = frac.get(1).filter(|b| is_digit(b)) {
            ret = ret.wrapping_add(10 * (d1 - b'0') as u32);
            if let Some(d2) = frac.get(2).filter(|b| is_digit(b)) {
                ret = ret.wrapping_add((d2 - b'0') as u32);
            }
        }
    }

    let ret = ret as i32;
    if negative {
        ret.wrapping_neg()
    } else {
        ret
    }
}

/// `dddmm.mmmmm` to millionths of a degree, rounding minutes to the nearest millionth.
fn parse_degrees(term: &[u8]) -> i32 {
    let left_of_decimal = parse_uint(term);
    let mut hundred1000ths_of_minute = (left_of_decimal % 100) * 100_000;

    let int_len = term.iter().take_while(|b| is_digit(b)).count();
    if term.get(int_len) == Some(&b'.') {
        let mut mult = 10_000u32;
        for b in term[int_len + 1..].iter().take_while(|b| is_digit(b)) {
            hundred1000ths_of_minute += mult * (b - b'0') as u32;
            mult /= 10;
        }
    }

    (left_of_decimal / 100)
        .wrapping_mul(1_000_000)
        .wrapping_add((hundred1000ths_of_minute + 3) / 6) as i32
}
