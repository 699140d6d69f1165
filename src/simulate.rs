// signalboard/src/simulate.rs
//
// Random data source standing in for real ingestion. One row per tick:
// criteria draw integers in [50, 150), each asset draws a price in
// [20_000, 60_000) and a volume in [1e6, 1e8). The RNG is injected so
// tests can seed it; production passes thread_rng.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::history::Row;
use crate::schema::{ASSETS, CRITERIA};

pub fn next_row<R: Rng>(rng: &mut R, ts: DateTime<Utc>) -> Row {
    let mut values = Vec::with_capacity(CRITERIA.len() + ASSETS.len() * 2);
    for _ in &CRITERIA {
        values.push(rng.gen_range(50..150) as f64);
    }
    for _ in &ASSETS {
        values.push(rng.gen_range(20_000.0..60_000.0));
        values.push(rng.gen_range(1e6..1e8));
    }
    Row { ts, values }
}

/// Synthesized starting window used when no history file exists: `n` rows
/// spaced at the refresh interval, the newest landing exactly on `end`.
pub fn seed_window<R: Rng>(
    rng: &mut R,
    end: DateTime<Utc>,
    interval: Duration,
    n: usize,
) -> Vec<Row> {
    let n = n.max(1);
    (0..n)
        .map(|i| {
            let ts = end - interval * ((n - 1 - i) as i32);
            next_row(rng, ts)
        })
        .collect()
}
