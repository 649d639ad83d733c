use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(String),

    #[error("server answered {status}: {excerpt}")]
    Status { status: u16, excerpt: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to start I/O runtime: {0}")]
    Runtime(#[source] io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced by storage, schema and timeline calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("response is not valid JSON: {reason}; body begins with: {excerpt}")]
    ResponseParse { reason: String, excerpt: String },

    #[error("decode error: {0}")]
    Decode(#[from] stl_decoder::DecodeError),

    #[error("protocol error: {0}")]
    Protocol(#[from] stl_protocol::ProtocolError),

    #[error("unexpected response shape: expected {expected}, found {found}")]
    UnexpectedShape { expected: &'static str, found: String },

    #[error("binary mode requires a decoder")]
    DecoderUnavailable,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(
        "failed to install decoder artifacts ({reason}); download {module_url} and {env_script_url} into {}",
        .dir.display()
    )]
    Install {
        module_url: String,
        env_script_url: String,
        dir: PathBuf,
        reason: String,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;
