//! Error types for the analyzer core.

use thiserror::Error;

/// Errors raised by [`crate::channel::Channel`].
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("channel capacity must be at least 1, got {0}")]
    InvalidArgument(usize),

    /// Kept for fidelity with the channel's documented error contract.
    /// Unreachable in safe Rust: a failing `Vec` allocation aborts the
    /// process rather than returning, so this variant is never constructed.
    #[error("out of memory allocating channel storage")]
    OutOfMemory,

    #[error("get() interrupted by channel shutdown while waiting")]
    ShutdownDuringWait,
}

/// Errors raised while resolving a stage module's five entry points.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to open stage module '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("stage module '{path}' is missing required symbol '{symbol}': {source}")]
    MissingSymbol {
        path: String,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// Top-level error surfaced to the driver, carrying the exit-code mapping
/// from §4.4/§7 of the spec.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("usage error: {message}")]
    Usage { message: String },

    #[error("failed to load stage '{stage_name}': {source}")]
    Load {
        stage_name: String,
        #[source]
        source: LoaderError,
    },

    #[error("stage '{stage_name}' failed to initialize: {message}")]
    Init { stage_name: String, message: String },

    #[error("stage '{stage_name}' was not fully wired before use: {message}")]
    Wire { stage_name: String, message: String },

    #[error("failed to feed input to stage '{stage_name}': {message}")]
    Feed { stage_name: String, message: String },

    #[error("stage '{stage_name}' reported a shutdown error: {message}")]
    Shutdown { stage_name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Maps an error to the process exit code documented in §4.4 and §7:
    /// `1` for everything except stage initialization failure, which is `2`.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Init { .. } => 2,
            _ => 1,
        }
    }
}

pub type ChannelResult<T> = Result<T, ChannelError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
