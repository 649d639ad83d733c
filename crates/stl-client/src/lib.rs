//! Blocking client for the storage timeline service.
//!
//! Data is organized as storage → schema → timeline. A [`Storage`] is opened
//! on a base URI; the URI decides once which API dialect every request
//! uses. Reads return JSON values; in binary mode timeline reads ask for
//! the binary encoding and hand it to a [`stl_decoder::Decoder`].
//!
//! ```no_run
//! use stl_client::Storage;
//!
//! let storage = Storage::open("https://storage.example.com", false)?;
//! let timeline = storage.schema("hosts").time_line("cpu");
//! timeline.add_number(0.73, None)?;
//! let values = timeline.all_numbers()?;
//! # Ok::<(), stl_client::ClientError>(())
//! ```
//!
//! TLS certificates and host names are never verified.

pub mod config;
pub mod error;
pub mod install;
pub mod interpret;
pub mod schema;
pub mod storage;
pub mod timeline;
pub mod tls;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, TransportConfig, DEFAULT_USER_AGENT};
pub use error::{ClientError, ClientResult, TransportError, TransportResult};
pub use install::ArtifactInstaller;
pub use interpret::{parse_documents, parse_json, DocumentHook, ResponseInterpreter};
pub use schema::Schema;
pub use storage::Storage;
pub use timeline::Timeline;
pub use transport::{ensure_success, HttpTransport, Transport};

// Re-export the types callers need to configure and inspect a storage.
pub use stl_decoder::{Decoder, DecoderConfig, DecoderKind};
pub use stl_protocol::Dialect;
