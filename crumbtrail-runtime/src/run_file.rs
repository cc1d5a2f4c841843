//! Run files: JSON snapshots of a call forest written to a runs directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::FlushError;
use crate::forest::{CallTreeNode, Window};

pub const RUNS_DIR_ENV: &str = "CRUMBTRAIL_RUNS_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    /// Shared by every file one process writes.
    pub run_id: String,
    pub timestamp_ms: u64,
    pub window: Window,
    pub trees: Vec<CallTreeNode>,
}

impl RunFile {
    pub fn new(window: Window, trees: Vec<CallTreeNode>) -> Self {
        Self {
            run_id: run_id().to_owned(),
            timestamp_ms: timestamp_ms(),
            window,
            trees,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), FlushError> {
        let io_err = |source| FlushError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer(&mut out, self)?;
        out.write_all(b"\n").map_err(io_err)?;
        out.flush().map_err(io_err)
    }
}

fn run_id() -> &'static str {
    static RUN_ID: OnceLock<String> = OnceLock::new();
    RUN_ID.get_or_init(|| format!("{}_{}", std::process::id(), timestamp_ms()))
}

pub(crate) fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// `CRUMBTRAIL_RUNS_DIR` if set, otherwise `~/.crumbtrail/runs`.
pub fn runs_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(RUNS_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".crumbtrail").join("runs"))
}
