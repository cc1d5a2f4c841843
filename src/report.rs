use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crumbtrail_runtime::{render_report, CallTreeNode, RunFile, Window};

use crate::error::Error;

/// Read a run file written by `crumbtrail_runtime::flush`.
pub fn load_run(path: &Path) -> Result<RunFile, Error> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::RunReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|e| Error::InvalidRunData {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn window_name(window: Window) -> &'static str {
    match window {
        Window::LastInterval => "last interval",
        Window::SinceLaunch => "since launch",
    }
}

/// Header line followed by the call-tree report.
pub fn format_run(run: &RunFile) -> String {
    let body = render_report(&run.trees);
    let mut out = format!("run {} ({})\n\n", run.run_id, window_name(run.window));
    if body.is_empty() {
        out.push_str("no timed scopes recorded\n");
    } else {
        out.push_str(&body);
        out.push('\n');
    }
    out
}

/// One call path with its totals, e.g. `function main > block "loop"`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub path: String,
    pub calls: u64,
    pub time_ms: f64,
}

/// Every node of every tree, pre-order, keyed by its full path.
pub fn flatten(trees: &[CallTreeNode]) -> Vec<PathEntry> {
    fn walk(node: &CallTreeNode, prefix: &str, out: &mut Vec<PathEntry>) {
        let path = if prefix.is_empty() {
            node.frame.to_string()
        } else {
            format!("{prefix} > {}", node.frame)
        };
        out.push(PathEntry {
            path: path.clone(),
            calls: node.calls,
            time_ms: node.time_ms,
        });
        for child in &node.children {
            walk(child, &path, out);
        }
    }

    let mut out = Vec::new();
    for tree in trees {
        walk(tree, "", &mut out);
    }
    out
}

/// Time delta per call path between two runs, sorted by path.
pub fn diff_runs(a: &RunFile, b: &RunFile) -> String {
    let a_entries = flatten(&a.trees);
    let b_entries = flatten(&b.trees);
    let by_path = |entries: &[PathEntry]| -> HashMap<String, f64> {
        entries.iter().map(|e| (e.path.clone(), e.time_ms)).collect()
    };
    let a_map = by_path(&a_entries);
    let b_map = by_path(&b_entries);

    let mut paths: Vec<&str> = a_map.keys().chain(b_map.keys()).map(String::as_str).collect();
    paths.sort_unstable();
    paths.dedup();

    let mut out = String::new();
    out.push_str(&format!(
        "{:<60} {:>10} {:>10} {:>10}\n",
        "Path", "Before", "After", "Delta"
    ));
    out.push_str(&format!("{}\n", "-".repeat(93)));

    for path in &paths {
        let before = a_map.get(*path).copied().unwrap_or(0.0);
        let after = b_map.get(*path).copied().unwrap_or(0.0);
        out.push_str(&format!(
            "{:<60} {:>8.1}ms {:>8.1}ms {:>+8.1}ms\n",
            path,
            before,
            after,
            after - before
        ));
    }
    out
}

/// Most recent `<timestamp>.json` in a runs directory.
pub fn latest_run(runs_dir: &Path) -> Result<PathBuf, Error> {
    let entries: Vec<(u64, PathBuf)> = std::fs::read_dir(runs_dir)
        .map_err(|source| Error::RunReadError {
            path: runs_dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                return None;
            }
            let ts: u64 = path.file_stem()?.to_str()?.parse().ok()?;
            Some((ts, path))
        })
        .collect();

    entries
        .into_iter()
        .max_by_key(|(ts, _)| *ts)
        .map(|(_, path)| path)
        .ok_or_else(|| Error::NoRuns(runs_dir.to_path_buf()))
}

fn validate_tag_name(name: &str) -> Result<(), Error> {
    if name.is_empty()
        || name.starts_with('.')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidTagName(format!(
            "invalid tag name '{name}' -- use letters, digits, '-', '_' or '.'"
        )));
    }
    Ok(())
}

/// Point `name` at a run file. Tags are small files holding the run's file name.
pub fn save_tag(tags_dir: &Path, name: &str, run: &Path) -> Result<(), Error> {
    validate_tag_name(name)?;
    let file_name = run
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidTagName(format!("cannot tag {}", run.display())))?;
    std::fs::create_dir_all(tags_dir)?;
    std::fs::write(tags_dir.join(name), file_name)?;
    Ok(())
}

pub fn resolve_tag(tags_dir: &Path, runs_dir: &Path, name: &str) -> Result<PathBuf, Error> {
    validate_tag_name(name)?;
    let not_found = || Error::RunNotFound {
        tag: name.to_owned(),
    };
    let file_name = std::fs::read_to_string(tags_dir.join(name)).map_err(|_| not_found())?;
    let path = runs_dir.join(file_name.trim());
    if path.is_file() {
        Ok(path)
    } else {
        Err(not_found())
    }
}

/// Tags live next to the runs they point into.
pub fn tags_dir_for(runs_dir: &Path) -> PathBuf {
    if let Some(dir) = std::env::var_os("CRUMBTRAIL_TAGS_DIR") {
        return PathBuf::from(dir);
    }
    runs_dir
        .parent()
        .map_or_else(|| runs_dir.join("tags"), |p| p.join("tags"))
}
