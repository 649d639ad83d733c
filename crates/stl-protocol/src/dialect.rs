use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::FormCodec;
use crate::endpoint::{route_entry, Route, BINARY_CONTENT_TYPE, V2_GATEWAY_SIGNATURE};
use crate::error::{ProtocolError, ProtocolResult};
use crate::operation::{Operation, OperationKind};
use crate::request::{HttpRequest, Method};

/// API generation spoken by a storage timeline server.
///
/// `V1` addresses each operation by path (`/timeline/all/numbers`), `V2`
/// exposes a single endpoint and selects the operation with `format` or
/// `action` parameters. The dialect is picked once per base URI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    V1,
    V2,
}

impl Dialect {
    /// Pick the dialect from the host of `uri`.
    pub fn classify(uri: &str) -> Self {
        match host_of(uri) {
            Some(host) if host.to_ascii_lowercase().contains(V2_GATEWAY_SIGNATURE) => Self::V2,
            _ => Self::V1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    pub fn route(&self, kind: OperationKind) -> &'static Route {
        let entry = route_entry(kind);
        match self {
            Self::V1 => &entry.v1,
            Self::V2 => &entry.v2,
        }
    }

    /// Resolve `operation` against `base` into a concrete request.
    ///
    /// Reads and listings carry their parameters in the query string,
    /// writes in a form-encoded body. With `binary` set, timeline reads
    /// announce the binary content type; nothing else ever does.
    pub fn build_request(&self, base: &str, operation: &Operation, binary: bool) -> HttpRequest {
        let route = self.route(operation.kind());
        let base = base.trim_end_matches('/');

        let mut pairs: Vec<(&str, String)> = route
            .selector
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect();
        pairs.extend(operation.params());

        let mut url = format!("{base}{}", route.path);
        let body = match route.method {
            Method::Get => {
                if !pairs.is_empty() {
                    url.push('?');
                    url.push_str(&FormCodec::encode(&pairs));
                }
                None
            }
            Method::Post => Some(FormCodec::encode(&pairs).into_bytes()),
        };

        let mut headers = Vec::new();
        if binary && operation.is_timeline_read() {
            headers.push(("Content-Type".to_string(), BINARY_CONTENT_TYPE.to_string()));
        }

        tracing::trace!(
            dialect = self.name(),
            operation = operation.kind().name(),
            method = route.method.as_str(),
            %url,
            "resolved request"
        );

        HttpRequest {
            method: route.method,
            url,
            headers,
            body,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            _ => Err(ProtocolError::UnknownDialect(s.into())),
        }
    }
}

/// Host portion of a URI: scheme, userinfo, port, path, query and fragment
/// stripped. IPv6 literals keep their brackets.
pub fn host_of(uri: &str) -> Option<&str> {
    let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or(uri);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = if host_port.starts_with('[') {
        host_port.find(']').map(|end| &host_port[..=end])?
    } else {
        host_port.split(':').next()?
    };
    (!host.is_empty()).then_some(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::params;
    use crate::operation::ValueFormat;
    use proptest::prelude::*;

    const V1_BASE: &str = "https://storage.example.com";
    const V2_BASE: &str = "https://europe-west1-demo.cloudfunctions.net/storage";

    fn all_operations(schema: &str, time_line: &str) -> Vec<Operation> {
        vec![
            Operation::StorageList,
            Operation::SchemaList { schema: schema.into() },
            Operation::read_all(schema, time_line, ValueFormat::Number),
            Operation::read_all(schema, time_line, ValueFormat::String),
            Operation::add_number(schema, time_line, 3.5, Some(10)).unwrap(),
            Operation::add_string(schema, time_line, "hello", None),
        ]
    }

    /// Parameters of a request with the dialect selectors removed.
    fn semantic_pairs(req: &HttpRequest) -> Vec<(String, String)> {
        let mut pairs = req.query_pairs();
        pairs.extend(req.body_pairs());
        pairs.retain(|(k, _)| k != params::FORMAT && k != params::ACTION);
        pairs
    }

    #[test]
    fn classify_examples() {
        assert_eq!(Dialect::classify("https://x.cloudfunctions.net/f"), Dialect::V2);
        assert_eq!(Dialect::classify("https://storage.example.com"), Dialect::V1);
        assert_eq!(Dialect::classify("http://localhost:8080/"), Dialect::V1);
        assert_eq!(Dialect::classify("https://X.CloudFunctions.NET/f"), Dialect::V2);
    }

    #[test]
    fn classify_only_looks_at_host() {
        assert_eq!(Dialect::classify("https://example.com/cloudfunctions.net"), Dialect::V1);
        assert_eq!(Dialect::classify("https://example.com/?h=cloudfunctions.net"), Dialect::V1);
    }

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("https://user:pw@host.io:8443/a?b#c"), Some("host.io"));
        assert_eq!(host_of("host.io/path"), Some("host.io"));
        assert_eq!(host_of("http://[::1]:9000/x"), Some("[::1]"));
        assert_eq!(host_of("http:///nohost"), None);
    }

    #[test]
    fn v1_table() {
        let d = Dialect::V1;
        let req = d.build_request(V1_BASE, &Operation::StorageList, false);
        assert_eq!(req.url, "https://storage.example.com/storage/list");
        assert_eq!(req.method, Method::Get);

        let req = d.build_request(V1_BASE, &Operation::SchemaList { schema: "S".into() }, false);
        assert_eq!(req.url, "https://storage.example.com/schema/list?schema=S");

        let req = d.build_request(V1_BASE, &Operation::read_all("S", "T", ValueFormat::Number), false);
        assert_eq!(req.url, "https://storage.example.com/timeline/all/numbers?schema=S&timeLine=T");

        let req = d.build_request(V1_BASE, &Operation::read_all("S", "T", ValueFormat::String), false);
        assert_eq!(req.url, "https://storage.example.com/timeline/all/strings?schema=S&timeLine=T");

        let op = Operation::add_number("S", "T", 7.0, Some(99)).unwrap();
        let req = d.build_request(V1_BASE, &op, false);
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "https://storage.example.com/timeline/add/number");
        assert_eq!(req.body.as_deref(), Some(&b"schema=S&timeLine=T&value=7&time=99"[..]));

        let op = Operation::add_string("S", "T", "v", None);
        let req = d.build_request(V1_BASE, &op, false);
        assert_eq!(req.url, "https://storage.example.com/timeline/add/string");
        assert_eq!(req.body.as_deref(), Some(&b"schema=S&timeLine=T&value=v"[..]));
    }

    #[test]
    fn v2_table() {
        let d = Dialect::V2;
        let req = d.build_request(V2_BASE, &Operation::StorageList, false);
        assert_eq!(req.url, format!("{V2_BASE}?action=storage-list"));

        let req = d.build_request(V2_BASE, &Operation::SchemaList { schema: "S".into() }, false);
        assert_eq!(req.url, format!("{V2_BASE}?action=schema-list&schema=S"));

        let req = d.build_request(V2_BASE, &Operation::read_all("S", "T", ValueFormat::Number), false);
        assert_eq!(req.url, format!("{V2_BASE}?format=number&schema=S&timeLine=T"));

        let req = d.build_request(V2_BASE, &Operation::read_all("S", "T", ValueFormat::String), false);
        assert_eq!(req.url, format!("{V2_BASE}?format=string&schema=S&timeLine=T"));

        let op = Operation::add_number("S", "T", 1.5, None).unwrap();
        let req = d.build_request(V2_BASE, &op, false);
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, V2_BASE);
        assert_eq!(req.body.as_deref(), Some(&b"format=number&schema=S&timeLine=T&value=1.5"[..]));

        let op = Operation::add_string("S", "T", "v", Some(5));
        let req = d.build_request(V2_BASE, &op, false);
        assert_eq!(req.body.as_deref(), Some(&b"format=string&schema=S&timeLine=T&value=v&time=5"[..]));
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        let req = Dialect::V1.build_request("https://h.example//", &Operation::StorageList, false);
        assert_eq!(req.url, "https://h.example/storage/list");
    }

    #[test]
    fn binary_header_only_on_reads() {
        for d in [Dialect::V1, Dialect::V2] {
            for op in all_operations("S", "T") {
                let req = d.build_request(V1_BASE, &op, true);
                let expected = op.is_timeline_read().then_some(BINARY_CONTENT_TYPE);
                assert_eq!(req.header("content-type"), expected, "{d} {:?}", op.kind());

                let plain = d.build_request(V1_BASE, &op, false);
                assert!(plain.headers.is_empty());
            }
        }
    }

    #[test]
    fn dialect_parsing() {
        assert_eq!("V2".parse::<Dialect>().unwrap(), Dialect::V2);
        assert!(matches!("v3".parse::<Dialect>(), Err(ProtocolError::UnknownDialect(_))));
        assert_eq!(Dialect::V1.to_string(), "v1");
    }

    proptest! {
        #[test]
        fn gateway_hosts_are_v2(label in "[a-z0-9-]{1,20}", path in "[a-z0-9/]{0,20}") {
            let uri = format!("https://{label}.cloudfunctions.net/{path}");
            prop_assert_eq!(Dialect::classify(&uri), Dialect::V2);
        }

        #[test]
        fn other_hosts_are_v1(label in "[a-z0-9-]{1,20}", tld in "(com|org|io|net)", port in 1u16..) {
            let uri = format!("https://{label}.example.{tld}:{port}/cloudfunctions.net");
            prop_assert_eq!(Dialect::classify(&uri), Dialect::V1);
        }

        #[test]
        fn dialects_carry_identical_parameters(
            schema in "[a-zA-Z0-9 _&=?/%+-]{1,16}",
            time_line in "[a-zA-Z0-9 _&=?/%+-]{1,16}",
        ) {
            for op in all_operations(&schema, &time_line) {
                let a = Dialect::V1.build_request(V1_BASE, &op, false);
                let b = Dialect::V2.build_request(V2_BASE, &op, false);
                prop_assert_eq!(a.method, b.method);
                prop_assert_eq!(semantic_pairs(&a), semantic_pairs(&b));
                let expected: Vec<(String, String)> = op
                    .params()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                prop_assert_eq!(semantic_pairs(&a), expected);
            }
        }
    }
}
