use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub clock: ClockConfig,
    pub schedule: ScheduleConfig,
    pub status_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub utc_offset_secs: i32,
    pub min_baseline_secs: u32,      // drift scale is only refined past this span
    pub max_baseline_secs: u32,      // spans beyond this are treated as bogus
    pub max_extrapolation_ms: u32,   // rebase once this much scaled time has elapsed
    pub rebase_step_secs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub auto: bool,
    pub hour_on: u8,
    pub minute_on: u8,
    pub hour_off: u8,
    pub minute_off: u8,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            utc_offset_secs: 7 * 3600, // UTC+7
            min_baseline_secs: 60,
            max_baseline_secs: 14 * 24 * 3600,
            max_extrapolation_ms: 60_000,
            rebase_step_secs: 30,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            clock: ClockConfig::default(),
            schedule: ScheduleConfig::default(),
            status_interval_secs: 10,
        }
    }
}

impl SystemConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}
