// signalboard/src/lib.rs

//! Live-refreshing dashboard over simulated data: twelve fixed "criteria"
//! metrics and three crypto assets (price + volume each), with a rolling
//! CSV-persisted history window and direction-colored line charts.

pub mod colorize;
pub mod config;
pub mod history;
pub mod render;
pub mod schema;
pub mod server;
pub mod simulate;
