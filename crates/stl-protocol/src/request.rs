use serde::{Deserialize, Serialize};

use crate::codec::FormCodec;
use crate::endpoint::BINARY_CONTENT_TYPE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A fully resolved request, ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// URL without its query string.
    pub fn path(&self) -> &str {
        self.url.split_once('?').map(|(p, _)| p).unwrap_or(&self.url)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .split_once('?')
            .map(|(_, q)| FormCodec::decode(q.as_bytes()))
            .unwrap_or_default()
    }

    pub fn body_pairs(&self) -> Vec<(String, String)> {
        self.body
            .as_deref()
            .map(FormCodec::decode)
            .unwrap_or_default()
    }
}

/// Maximum number of characters of an unparsable body kept in an error.
pub const EXCERPT_CHARS: usize = 100;

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// A received response: status, declared content type, raw body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".into()),
            body: body.into(),
        }
    }

    pub fn binary(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(BINARY_CONTENT_TYPE.into()),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Bounded, lossily decoded start of the body for error reports.
    pub fn body_excerpt(&self) -> String {
        excerpt(&String::from_utf8_lossy(&self.body), EXCERPT_CHARS)
    }

    /// Whether the body declares the binary timeline encoding.
    pub fn declares_binary(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(BINARY_CONTENT_TYPE))
    }
}
