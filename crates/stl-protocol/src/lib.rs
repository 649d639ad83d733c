//! Wire dialects for the storage timeline service.
//!
//! A server speaks either the path-based v1 API or the single-endpoint v2
//! API hosted behind the cloud-function gateway. This crate classifies a
//! base URI, and resolves every [`Operation`] into an [`HttpRequest`] from
//! one operation × dialect table.

pub mod codec;
pub mod dialect;
pub mod endpoint;
pub mod error;
pub mod operation;
pub mod request;

pub use codec::FormCodec;
pub use dialect::{host_of, Dialect};
pub use endpoint::{
    params, paths, route_entry, Route, RouteEntry, BINARY_CONTENT_TYPE, FORM_CONTENT_TYPE,
    ROUTES, V2_GATEWAY_SIGNATURE,
};
pub use error::{ProtocolError, ProtocolResult};
pub use operation::{Operation, OperationKind, ValueFormat};
pub use request::{excerpt, HttpRequest, HttpResponse, Method, EXCERPT_CHARS};
