//! Binary timeline decoding for the storage timeline client.
//!
//! When a client requests timelines in binary mode, the server answers with
//! an opaque record stream. This crate turns that stream into a JSON value
//! behind the [`Decoder`] trait.
//!
//! # Implementations
//!
//! - [`ProcessDecoder`] -- runs the compiled decoder module in an external
//!   runtime, exchanging data through private scratch files
//! - [`NativeDecoder`] -- reads the record stream in-process
//!
//! # Lifecycle
//!
//! A process decoder persists one launcher script at construction and keeps
//! it until [`Decoder::release`]. Per-call input and output files never
//! outlive the call that created them. Decoder artifacts are located in the
//! installation directory first and the configured fallback paths second.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod launcher;
pub mod native;
pub mod process;
pub mod scratch;
pub mod traits;

pub use artifacts::{
    default_install_dir, source_url, DecoderArtifacts, ENV_SCRIPT_FILE, INSTALL_SUBDIR,
    MODULE_FILE, SOURCE_BASE_URL,
};
pub use config::{DecoderConfig, DecoderKind};
pub use error::{DecodeError, DecodeResult};
pub use native::{NativeDecoder, TimelineRecord};
pub use process::ProcessDecoder;
pub use traits::Decoder;
