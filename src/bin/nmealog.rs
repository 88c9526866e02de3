//! Simple NMEA logger - prints every checksum-validated sentence from stdin

use anyhow::Result;
use nmeaclock::gps::*;
use nmeaclock::source::{ReaderSource, SystemTicks};
use nmeaclock::traits::ByteSource;
use std::io;

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));
    println!("=== NMEA Sentence Logger ===\n");

    let mut source = ReaderSource::new(io::stdin().lock());
    let mut gps = Decoder::new(SystemTicks::new());

    println!(
        "{:>10} {:>12} {:>12} {:>13} {:>9} {:>7} {:>5}",
        "Date", "Time", "Lat", "Lon", "km/h", "Course", "Sats"
    );
    println!("{}", "-".repeat(75));

    loop {
        let b = match source.read_byte()? {
            Some(b) => b,
            None if source.is_exhausted() => break,
            None => continue,
        };
        if !gps.consume(b) {
            continue;
        }

        let t = gps.crack_datetime();
        let date = if gps.has_datetime() {
            format!("{:04}-{:02}-{:02}", t.year, t.month, t.day)
        } else {
            "-".to_string()
        };
        let (lat, lon, _) = gps.f_position();
        let (lat, lon) = if lat == GPS_INVALID_F_ANGLE {
            ("-".to_string(), "-".to_string())
        } else {
            (format!("{:.6}", lat), format!("{:.6}", lon))
        };
        let speed = match gps.f_speed_kmph() {
            s if s == GPS_INVALID_F_SPEED => "-".to_string(),
            s => format!("{:.1}", s),
        };
        let course = match gps.f_course() {
            c if c == GPS_INVALID_F_ANGLE => "-".to_string(),
            c => format!("{:.1} {}", c, cardinal(c)),
        };
        let sats = match gps.satellites() {
            GPS_INVALID_SATELLITES => "-".to_string(),
            n => n.to_string(),
        };

        println!(
            "{:>10} {:02}:{:02}:{:02}.{:02} {:>12} {:>13} {:>9} {:>7} {:>5}",
            date, t.hour, t.minute, t.second, t.hundredths, lat, lon, speed, course, sats
        );
    }

    let stats = gps.stats();
    println!("\n{}", "=".repeat(75));
    println!("Statistics:");
    println!("  Characters:       {}", stats.chars);
    println!("  Valid sentences:  {}", stats.passed_sentences);
    println!("  Failed checksums: {}", stats.failed_checksums);

    println!("\n=== Done ===");
    Ok(())
}
