pub mod calendar;
pub mod clock;
pub mod config;
pub mod controller;
pub mod gps;
pub mod schedule;
pub mod source;
pub mod status;
pub mod traits;
