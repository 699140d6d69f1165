// signalboard/src/history.rs
//
// Rolling history window: load-or-init from CSV, append-with-cap, persist
// after every mutation. Persistence failures are logged and swallowed; the
// in-memory table keeps going and the next successful write restores
// durability.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::Rng;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::DashboardConfig;
use crate::schema;
use crate::simulate;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
// Lenient on read: accepts files carrying fractional seconds.
const TS_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub ts: DateTime<Utc>,
    pub values: Vec<f64>,
}

#[derive(Debug)]
pub struct HistoryTable {
    columns: Vec<String>,
    rows: VecDeque<Row>,
    max_history: usize,
    interval: Duration,
    path: PathBuf,
}

impl HistoryTable {
    /// Parse the persisted file if present (keeping only the newest
    /// `max_history` rows), otherwise synthesize an initial window ending at
    /// `now` and write it out. A missing, corrupt, or schema-mismatched file
    /// counts as "no history".
    pub fn load_or_init<R: Rng>(
        cfg: &DashboardConfig,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        let columns = schema::column_order();
        let max_history = cfg.max_history.max(1);
        let interval = cfg.refresh_interval();

        let rows = match load_csv(&cfg.history_path, &columns) {
            Some(mut rows) => {
                if rows.len() > max_history {
                    rows.drain(..rows.len() - max_history);
                }
                rows
            }
            None => simulate::seed_window(rng, now, interval, cfg.init_window),
        };

        let table = Self {
            columns,
            rows: rows.into(),
            max_history,
            interval,
            path: cfg.history_path.clone(),
        };
        table.persist_logged();
        table
    }

    /// Append one row, evict beyond the cap, persist. Rows not strictly
    /// newer than the current newest row are dropped to keep timestamps
    /// strictly increasing.
    pub fn append(&mut self, row: Row) {
        if let Some(last) = self.newest_ts() {
            if row.ts <= last {
                eprintln!(
                    "[history] dropping non-increasing row at {} (newest is {})",
                    row.ts.format(TS_FORMAT),
                    last.format(TS_FORMAT)
                );
                return;
            }
        }
        self.rows.push_back(row);
        while self.rows.len() > self.max_history {
            self.rows.pop_front();
        }
        self.persist_logged();
    }

    /// Append one simulated row if the refresh interval has elapsed since
    /// the newest stored timestamp; otherwise leave the table untouched.
    /// Returns whether a row was appended.
    pub fn refresh<R: Rng>(&mut self, rng: &mut R, now: DateTime<Utc>) -> bool {
        match self.newest_ts() {
            Some(last) if now - last <= self.interval => false,
            _ => {
                self.append(simulate::next_row(rng, now));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn newest_ts(&self) -> Option<DateTime<Utc>> {
        self.rows.back().map(|r| r.ts)
    }

    /// One series (timestamps + values) for a named column.
    pub fn series(&self, column: &str) -> Option<(Vec<DateTime<Utc>>, Vec<f64>)> {
        let idx = self.columns.iter().position(|c| c == column)?;
        let xs = self.rows.iter().map(|r| r.ts).collect();
        let ys = self.rows.iter().map(|r| r.values[idx]).collect();
        Some((xs, ys))
    }

    /// Per-row mean across the 12 criteria columns (the aggregate trace).
    pub fn criteria_mean(&self) -> (Vec<DateTime<Utc>>, Vec<f64>) {
        let n = schema::CRITERIA.len();
        let xs = self.rows.iter().map(|r| r.ts).collect();
        let ys = self
            .rows
            .iter()
            .map(|r| r.values[..n].iter().sum::<f64>() / n as f64)
            .collect();
        (xs, ys)
    }

    fn persist_logged(&self) {
        if let Err(err) = self.persist() {
            eprintln!(
                "[history] failed to persist {} ({err:#}); continuing in memory",
                self.path.display()
            );
        }
    }

    fn persist(&self) -> Result<()> {
        let parent = self.path.parent().context("history path has no parent")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create history dir {:?}", parent))?;

        let tmp = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));
        {
            let mut f =
                File::create(&tmp).with_context(|| format!("create tmp {:?}", tmp))?;
            writeln!(f, "timestamp,{}", self.columns.join(","))?;
            for row in &self.rows {
                write!(f, "{}", row.ts.format(TS_FORMAT))?;
                for v in &row.values {
                    write!(f, ",{v}")?;
                }
                writeln!(f)?;
            }
            let _ = f.sync_all();
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {:?} -> {:?}", tmp, self.path))?;
        Ok(())
    }
}

/// Read the persisted table, reordering value columns into the canonical
/// schema via the header. Malformed or out-of-order lines are skipped; a
/// header missing any schema column makes the whole file unusable.
fn load_csv(path: &Path, columns: &[String]) -> Option<Vec<Row>> {
    let f = File::open(path).ok()?;
    let mut lines = BufReader::new(f).lines();

    let header = lines.next()?.ok()?;
    let names: Vec<&str> = header.split(',').skip(1).map(str::trim).collect();
    let mut order = Vec::with_capacity(columns.len());
    for col in columns {
        order.push(names.iter().position(|n| n == col)?);
    }

    let mut rows: Vec<Row> = Vec::new();
    for line in lines.map_while(|l| l.ok()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < names.len() + 1 {
            continue;
        }
        let Some(ts) = parse_ts(parts[0]) else {
            continue;
        };
        if rows.last().is_some_and(|prev| ts <= prev.ts) {
            continue;
        }
        let mut values = Vec::with_capacity(columns.len());
        for &idx in &order {
            match parts[idx + 1].trim().parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => break,
            }
        }
        if values.len() == columns.len() {
            rows.push(Row { ts, values });
        }
    }

    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), TS_PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
    }

    fn cfg_at(path: PathBuf, max_history: usize, init_window: usize) -> DashboardConfig {
        let mut cfg = DashboardConfig::default();
        cfg.history_path = path;
        cfg.max_history = max_history;
        cfg.init_window = init_window;
        cfg
    }

    fn row(at: DateTime<Utc>, fill: f64) -> Row {
        Row {
            ts: at,
            values: vec![fill; schema::column_order().len()],
        }
    }

    #[test]
    fn missing_file_synthesizes_initial_window() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_at(dir.path().join("history.csv"), 200, 20);
        let mut rng = StdRng::seed_from_u64(3);

        let table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
        assert_eq!(table.len(), 20);
        assert_eq!(table.newest_ts(), Some(ts(0)));
        assert!(cfg.history_path.exists(), "initial window is persisted");
    }

    #[test]
    fn append_never_exceeds_max_history() {
        // Worked example: cap 3, table of 3, one append -> still 3, newest
        // is the appended row, original oldest is gone.
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_at(dir.path().join("history.csv"), 3, 3);
        let mut rng = StdRng::seed_from_u64(0);

        let mut table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
        assert_eq!(table.len(), 3);
        let old_oldest = table.rows().next().unwrap().ts;

        table.append(row(ts(10), 1.0));
        assert_eq!(table.len(), 3);
        assert_eq!(table.newest_ts(), Some(ts(10)));
        assert!(table.rows().all(|r| r.ts != old_oldest));
    }

    #[test]
    fn refresh_is_idempotent_inside_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_at(dir.path().join("history.csv"), 200, 5);
        let mut rng = StdRng::seed_from_u64(11);

        let mut table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
        assert!(table.refresh(&mut rng, ts(6)), "interval elapsed");
        let len_after = table.len();
        let newest = table.newest_ts();

        assert!(!table.refresh(&mut rng, ts(8)), "within the interval");
        assert!(!table.refresh(&mut rng, ts(8)));
        assert_eq!(table.len(), len_after);
        assert_eq!(table.newest_ts(), newest);
    }

    #[test]
    fn non_increasing_rows_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_at(dir.path().join("history.csv"), 10, 2);
        let mut rng = StdRng::seed_from_u64(4);

        let mut table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
        let len = table.len();
        table.append(row(ts(0), 2.0)); // equal to newest
        table.append(row(ts(-5), 2.0)); // older
        assert_eq!(table.len(), len);
    }

    #[test]
    fn roundtrip_preserves_values_and_truncates_to_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut rng = StdRng::seed_from_u64(8);

        let written: Vec<Row> = {
            let cfg = cfg_at(path.clone(), 200, 6);
            let table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
            table.rows().cloned().collect()
        };
        assert_eq!(written.len(), 6);

        // Reload under a smaller cap: same values, only the newest 4 kept.
        let cfg = cfg_at(path, 4, 1);
        let table = HistoryTable::load_or_init(&cfg, &mut rng, ts(100));
        assert_eq!(table.len(), 4);
        for (got, want) in table.rows().zip(&written[2..]) {
            assert_eq!(got.ts, want.ts);
            assert_eq!(got.values, want.values);
        }
    }

    #[test]
    fn corrupt_file_falls_back_to_synthesized_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "garbage\n1,2,3\n").unwrap();

        let cfg = cfg_at(path, 200, 7);
        let mut rng = StdRng::seed_from_u64(2);
        let table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn unwritable_path_keeps_the_in_memory_table() {
        let dir = tempfile::tempdir().unwrap();
        // Parent "dir" is a regular file, so create_dir_all must fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let cfg = cfg_at(blocker.join("history.csv"), 10, 3);

        let mut rng = StdRng::seed_from_u64(6);
        let mut table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));
        assert_eq!(table.len(), 3);
        table.append(row(ts(30), 9.0));
        assert_eq!(table.len(), 4, "append survives persist failure");
        assert_eq!(table.newest_ts(), Some(ts(30)));
    }

    #[test]
    fn criteria_mean_averages_only_the_twelve_criteria() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = cfg_at(dir.path().join("history.csv"), 10, 1);
        let mut rng = StdRng::seed_from_u64(5);
        let mut table = HistoryTable::load_or_init(&cfg, &mut rng, ts(0));

        let mut values = vec![100.0; schema::column_order().len()];
        // Crank the asset columns; they must not move the mean.
        for v in values.iter_mut().skip(12) {
            *v = 1e9;
        }
        table.append(Row { ts: ts(10), values });

        let (_, ys) = table.criteria_mean();
        assert_eq!(ys.last().copied(), Some(100.0));
    }
}
