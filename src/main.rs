use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use nmeaclock::config::SystemConfig;
use nmeaclock::controller::GpsController;
use nmeaclock::source::{ReaderSource, SystemTicks};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// NMEA input (serial device or capture file). Reads stdin if omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print status as JSON lines on stdout instead of logging it
    #[arg(long)]
    json: bool,

    /// Seconds between status reports (overrides the config file)
    #[arg(long)]
    status_interval: Option<u64>,
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn Read>> {
    match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("Failed to open {}", p.display()))?;
            info!("Reading NMEA from {}", p.display());
            Ok(Box::new(file))
        }
        None => {
            info!("Reading NMEA from stdin");
            Ok(Box::new(io::stdin()))
        }
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let args = Args::parse();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut config = match &args.config {
        Some(path) => SystemConfig::load(path)?,
        None => SystemConfig::default(),
    };
    if let Some(secs) = args.status_interval {
        config.status_interval_secs = secs;
    }
    info!(
        "UTC offset {}s, schedule {}",
        config.clock.utc_offset_secs,
        if config.schedule.auto { "auto" } else { "manual" }
    );

    let source = ReaderSource::new(open_input(args.input.as_ref())?);
    let mut controller = GpsController::new(SystemTicks::new(), source, &config);

    let interval = Duration::from_secs(config.status_interval_secs.max(1));
    let mut last_status = Instant::now();

    let report = |controller: &GpsController<SystemTicks, ReaderSource<Box<dyn Read>>>| {
        if args.json {
            match serde_json::to_string(&controller.status()) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize status: {}", e),
            }
        } else {
            controller.log_status();
        }
    };

    while running.load(Ordering::SeqCst) {
        let did_work = match controller.process_loop_iteration() {
            Ok(consumed) => consumed,
            Err(e) => {
                warn!("Error in loop: {:#}", e);
                if let Err(e) = controller.resume_source() {
                    warn!("Failed to reset byte source: {:#}", e);
                }
                thread::sleep(Duration::from_millis(100));
                false
            }
        };

        if last_status.elapsed() >= interval {
            report(&controller);
            last_status = Instant::now();
        }

        if controller.is_source_exhausted() {
            info!("End of input.");
            break;
        }

        if !did_work {
            thread::sleep(Duration::from_millis(1));
        }
    }

    report(&controller);
    info!("Exiting.");
    Ok(())
}
