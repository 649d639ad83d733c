use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown dialect: {0} (expected v1 or v2)")]
    UnknownDialect(String),

    #[error("unknown value format: {0} (expected number or string)")]
    UnknownFormat(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
