use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from decoding a binary timeline payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Neither the install directory nor the fallback paths hold both artifacts.
    #[error(
        "decoder artifacts not found: looked in {} and at {} / {}",
        .install_dir.display(),
        .fallback_module.display(),
        .fallback_env_script.display()
    )]
    ArtifactMissing {
        install_dir: PathBuf,
        fallback_module: PathBuf,
        fallback_env_script: PathBuf,
    },

    /// The runtime executable could not be started.
    #[error("failed to launch decoder runtime {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The runtime exited unsuccessfully.
    #[error("decode execution failed ({status}): {stderr}")]
    ExecutionFailed { status: String, stderr: String },

    /// The runtime did not finish within the configured limit.
    #[error("decode execution timed out after {0:?}")]
    Timeout(Duration),

    /// The runtime produced output that is not JSON.
    #[error("decode result malformed: {reason}; output begins with: {excerpt}")]
    ResultMalformed { reason: String, excerpt: String },

    /// The decoder's long-lived resources were already released.
    #[error("decoder has been released")]
    Released,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
