use crate::gps::DecoderStats;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GpsStatus {
    pub unixtime: u32,
    pub local_time: Option<String>,
    pub has_time: bool,
    pub drift_scale: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_kmph: Option<f64>,
    pub course: Option<f64>,
    pub satellites: Option<u8>,
    pub hdop: Option<f64>,
    pub position_age_ms: Option<u32>,
    pub time_age_ms: Option<u32>,
    pub load_on: bool,
    pub stats: DecoderStats,
}
