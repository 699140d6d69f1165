// signalboard/src/server.rs
//
// Single-threaded render loop. The session (table + RNG + config) is owned
// by the loop; every GET / drives one pass: refresh-check, conditional
// append+persist, colorize+render, respond. No locking, no async.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tiny_http::{Header, Method, Response, Server};

use crate::config::DashboardConfig;
use crate::history::HistoryTable;
use crate::render;

pub struct Session {
    cfg: DashboardConfig,
    table: HistoryTable,
    rng: StdRng,
}

#[derive(Serialize)]
struct TableSnapshot<'a> {
    columns: &'a [String],
    rows: Vec<SnapshotRow<'a>>,
}

#[derive(Serialize)]
struct SnapshotRow<'a> {
    timestamp: String,
    values: &'a [f64],
}

impl Session {
    pub fn start(cfg: DashboardConfig, now: DateTime<Utc>) -> Self {
        let mut rng = StdRng::from_entropy();
        let table = HistoryTable::load_or_init(&cfg, &mut rng, now);
        Self { cfg, table, rng }
    }

    /// Route one request. Returns (status, content type, body) so the
    /// handler stays independent of the HTTP plumbing.
    pub fn dispatch(&mut self, url: &str, now: DateTime<Utc>) -> (u16, &'static str, String) {
        let path = url.split('?').next().unwrap_or(url);
        match path {
            "/" => {
                self.table.refresh(&mut self.rng, now);
                (
                    200,
                    "text/html; charset=utf-8",
                    render::page_html(&self.table, &self.cfg),
                )
            }
            "/data.json" => match self.snapshot_json() {
                Ok(body) => (200, "application/json", body),
                Err(err) => (
                    500,
                    "application/json",
                    format!("{{\"error\":\"{err}\"}}"),
                ),
            },
            _ => (404, "application/json", "{\"error\":\"not found\"}".to_string()),
        }
    }

    fn snapshot_json(&self) -> Result<String> {
        let snapshot = TableSnapshot {
            columns: self.table.columns(),
            rows: self
                .table
                .rows()
                .map(|row| SnapshotRow {
                    timestamp: row.ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                    values: &row.values,
                })
                .collect(),
        };
        serde_json::to_string(&snapshot).context("serialize table snapshot")
    }

    #[cfg(test)]
    fn table(&self) -> &HistoryTable {
        &self.table
    }
}

/// Bind, install the ctrl-c flag, then serve until interrupted. Each
/// request is handled inline on this thread.
pub fn run(cfg: DashboardConfig) -> Result<()> {
    let server = Server::http(&cfg.listen_addr)
        .map_err(|err| anyhow!("bind {}: {err}", cfg.listen_addr))?;
    let server = Arc::new(server);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        let server = server.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
            server.unblock();
        })
        .context("install ctrl-c handler")?;
    }

    let mut session = Session::start(cfg, Utc::now());

    for request in server.incoming_requests() {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        if *request.method() != Method::Get {
            let response = Response::from_string("{\"error\":\"not found\"}")
                .with_header(content_type("application/json"))
                .with_status_code(404);
            let _ = request.respond(response);
            continue;
        }
        let (status, ctype, body) = session.dispatch(request.url(), Utc::now());
        let response = Response::from_string(body)
            .with_header(content_type(ctype))
            .with_status_code(status);
        let _ = request.respond(response);
    }

    println!("[signalboard] session closed");
    Ok(())
}

fn content_type(value: &str) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).unwrap()
}
