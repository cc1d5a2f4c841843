use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no crumbtrail runs found in {} -- call crumbtrail_runtime::flush() in the instrumented program", .0.display())]
    NoRuns(PathBuf),

    #[error("no runs directory -- pass --runs-dir or set CRUMBTRAIL_RUNS_DIR")]
    NoRunsDir,

    #[error("no run found for tag '{tag}' -- run `crumbtrail tag` to create one")]
    RunNotFound { tag: String },

    #[error("failed to read run file {}: {source}", path.display())]
    RunReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid run data in {}: {reason}", path.display())]
    InvalidRunData { path: PathBuf, reason: String },

    #[error("{0}")]
    InvalidTagName(String),

    #[error(transparent)]
    Scope(#[from] crumbtrail_runtime::ScopeError),

    #[error(transparent)]
    Flush(#[from] crumbtrail_runtime::FlushError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
