use std::path::PathBuf;

/// Broken instrumentation nesting or misuse of the thread's engine.
///
/// The engine refuses the offending call and leaves its state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("scope #{found} exited while scope #{expected} is the innermost live scope")]
    NotTop { expected: u64, found: u64 },

    #[error("scope #{0} exited with no live scope")]
    EmptyStack(u64),

    #[error("an engine already recorded events -- call init() before the first scope")]
    AlreadyStarted,

    #[error("configuration already installed -- init() runs once per process")]
    AlreadyConfigured,
}

#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    #[error("no runs directory -- set CRUMBTRAIL_RUNS_DIR or HOME")]
    NoRunsDir,

    #[error("failed to write run file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode run: {0}")]
    Json(#[from] serde_json::Error),
}
