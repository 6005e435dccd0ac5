use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the whole run. Everything else in the pipeline degrades
/// to an absent report section instead of surfacing one of these.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("'{0}' does not exist or is not a directory")]
    InvalidPath(PathBuf),

    #[error("no source files found under '{0}'")]
    NoSourceFiles(PathBuf),

    #[error("git analysis required but unavailable: {0}")]
    GitRequired(#[source] GitError),

    #[error("cannot write export file '{path}': {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Config(String),
}

/// Git-stage failures. Caught at the orchestrator boundary and converted to
/// an absent `git` section unless the caller demanded history up front.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("'{0}' is not a git repository")]
    NotARepository(PathBuf),

    #[error("failed to run git: {0}")]
    GitUnavailable(String),

    #[error("git log failed: {0}")]
    CommandFailed(String),

    #[error("repository has no commits")]
    EmptyHistory,
}

/// Security-stage failures. Always caught; the scan is best-effort.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("{0} is not installed or not on PATH")]
    ToolMissing(String),

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("{tool} failed: {message}")]
    CommandFailed { tool: String, message: String },

    #[error("could not parse scanner output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

/// Language-model client failures. Insight generation never blocks a report.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} is not set")]
    MissingApiKey(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("model API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse model reply: {0}")]
    MalformedReply(String),
}
