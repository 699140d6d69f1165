// signalboard/src/main.rs
//
// Live dashboard for 12 tracked criteria plus 3 crypto assets. Values are
// simulated; history is persisted as CSV and capped to a rolling window.

use anyhow::Result;
use signalboard::config::DashboardConfig;
use signalboard::server;

fn main() -> Result<()> {
    let cfg = DashboardConfig::load_or_default();
    println!("[signalboard] history file: {}", cfg.history_path.display());
    println!("[signalboard] dashboard on http://{}", cfg.listen_addr);
    println!("[signalboard] press ctrl-c to stop");
    server::run(cfg)
}
