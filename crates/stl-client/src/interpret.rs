use std::sync::Arc;

use serde_json::Value;
use stl_decoder::Decoder;
use stl_protocol::{excerpt, HttpResponse, EXCERPT_CHARS};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Called with the element index and parse error when a document's `value`
/// field is not valid JSON.
pub type DocumentHook = Arc<dyn Fn(usize, &serde_json::Error) + Send + Sync>;

/// Turns response bodies into JSON values.
///
/// A body goes to the decoder only when binary mode is on and the response
/// declares the binary timeline encoding. Everything else is parsed as
/// UTF-8 JSON, and a parse failure is an error.
pub struct ResponseInterpreter<'a> {
    binary: bool,
    decoder: Option<&'a dyn Decoder>,
}

impl<'a> ResponseInterpreter<'a> {
    pub fn new(binary: bool, decoder: Option<&'a dyn Decoder>) -> Self {
        Self { binary, decoder }
    }

    /// Interpreter for responses that are always plain JSON.
    pub fn plain() -> Self {
        Self::new(false, None)
    }

    pub fn interpret(&self, response: &HttpResponse) -> ClientResult<Value> {
        if self.binary && response.declares_binary() {
            let decoder = self.decoder.ok_or(ClientError::DecoderUnavailable)?;
            debug!(decoder = decoder.name(), bytes = response.body.len(), "decoding binary response");
            return Ok(decoder.decode(&response.body)?);
        }
        parse_json(&response.body)
    }
}

pub fn parse_json(body: &[u8]) -> ClientResult<Value> {
    let failure = |reason: String| ClientError::ResponseParse {
        reason,
        excerpt: excerpt(&String::from_utf8_lossy(body), EXCERPT_CHARS),
    };
    let text = std::str::from_utf8(body).map_err(|e| failure(e.to_string()))?;
    serde_json::from_str(text).map_err(|e| failure(e.to_string()))
}

/// Replace each record's `value` string with the JSON it contains.
///
/// A value that does not parse, is not a string, or is missing becomes
/// `null`. Elements that are not objects are left as they are.
pub fn parse_documents(records: Value, hook: Option<&DocumentHook>) -> ClientResult<Value> {
    let Value::Array(mut items) = records else {
        return Err(ClientError::UnexpectedShape {
            expected: "array of records",
            found: shape_of(&records).to_string(),
        });
    };

    for (index, item) in items.iter_mut().enumerate() {
        let Value::Object(fields) = item else {
            continue;
        };
        let parsed = match fields.get("value") {
            Some(Value::String(text)) => match serde_json::from_str(text) {
                Ok(value) => value,
                Err(e) => {
                    if let Some(hook) = hook {
                        hook(index, &e);
                    }
                    Value::Null
                }
            },
            _ => Value::Null,
        };
        fields.insert("value".to_string(), parsed);
    }
    Ok(Value::Array(items))
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
