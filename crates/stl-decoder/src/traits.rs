use serde_json::Value;

use crate::error::DecodeResult;

/// Turns a binary timeline payload into its structured JSON form.
///
/// Implementations must satisfy:
/// - A failed call leaves the decoder usable for the next call.
/// - Per-call resources are released before `decode` returns, on every path.
/// - `decode` may be called from several threads at once.
pub trait Decoder: Send + Sync {
    /// Decode one payload.
    fn decode(&self, payload: &[u8]) -> DecodeResult<Value>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Release long-lived resources. Idempotent; later `decode` calls may
    /// fail with [`crate::DecodeError::Released`].
    fn release(&mut self) {}
}
