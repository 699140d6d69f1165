// signalboard/src/config.rs

use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bump when you change config schema.
const CONFIG_VERSION: u32 = 1;

/// Dashboard constants. Fixed at session start; the on-disk config file is
/// the only override surface (no CLI flags).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub version: u32,

    /// Seconds between appended rows; also the page auto-refresh cadence.
    pub refresh_interval_secs: u64,
    /// Rolling cap on retained history rows (oldest evicted first).
    pub max_history: usize,
    /// Rows synthesized when no history file exists yet.
    pub init_window: usize,

    pub listen_addr: String,
    pub history_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            refresh_interval_secs: 5,
            max_history: 200,
            init_window: 20,
            listen_addr: "127.0.0.1:7878".to_string(),
            history_path: default_history_path(),
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::seconds(self.refresh_interval_secs.max(1) as i64)
    }

    /// Load from the platform config dir, falling back to (and writing
    /// back) defaults when the file is missing. A corrupt file is archived
    /// aside so it can be inspected, never silently overwritten.
    pub fn load_or_default() -> Self {
        match default_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(err) => {
                eprintln!("[config] no config dir available ({err}); using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let cfg = Self::default();
            if let Err(err) = cfg.save_to(path) {
                eprintln!("[config] failed to write defaults to {}: {err}", path.display());
            }
            return cfg;
        }
        match read_json::<Self>(path) {
            Ok(mut cfg) => {
                // simple migration hook
                if cfg.version == 0 {
                    cfg.version = CONFIG_VERSION;
                }
                if cfg.history_path.as_os_str().is_empty() {
                    cfg.history_path = default_history_path();
                }
                cfg
            }
            Err(err) => {
                archive_corrupt(path, &err);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("config path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create config dir {:?}", parent))?;
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }
}

fn default_config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "signalboard", "signalboard")
        .context("ProjectDirs::from returned None")?;
    Ok(proj.config_dir().join("config.json"))
}

fn default_history_path() -> PathBuf {
    ProjectDirs::from("com", "signalboard", "signalboard")
        .map(|proj| proj.data_dir().join("history.csv"))
        .unwrap_or_else(|| PathBuf::from("signalboard_history.csv"))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {:?}", path))?;
    let value = serde_json::from_slice::<T>(&bytes).with_context(|| "parse json")?;
    Ok(value)
}

fn archive_corrupt(path: &Path, err: &anyhow::Error) {
    if !path.exists() {
        return;
    }
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let archived = path.with_extension(format!("corrupt.{ts}.json"));
    let _ = fs::rename(path, archived);
    eprintln!("[config] config corrupt; archived. error: {err:?}");
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().context("no parent dir for config path")?;
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    {
        let mut f = fs::File::create(&tmp).with_context(|| format!("create tmp {:?}", tmp))?;
        f.write_all(bytes).with_context(|| "write tmp")?;
        let _ = f.sync_all();
    }

    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}
