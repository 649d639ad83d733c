use serde_json::Value;
use stl_protocol::{Operation, ValueFormat};

use crate::error::ClientResult;
use crate::interpret::parse_documents;
use crate::schema::Schema;

/// A named timeline within a schema.
#[derive(Clone, Copy)]
pub struct Timeline<'a> {
    schema: Schema<'a>,
    name: &'a str,
}

impl<'a> Timeline<'a> {
    pub(crate) fn new(schema: Schema<'a>, name: &'a str) -> Self {
        Self { schema, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn schema(&self) -> Schema<'a> {
        self.schema
    }

    pub fn is_binary(&self) -> bool {
        self.schema.is_binary()
    }

    pub fn all_numbers(&self) -> ClientResult<Value> {
        self.read(ValueFormat::Number)
    }

    pub fn all_strings(&self) -> ClientResult<Value> {
        self.read(ValueFormat::String)
    }

    /// String records whose `value` fields hold JSON documents.
    pub fn all_documents(&self) -> ClientResult<Value> {
        let records = self.read(ValueFormat::String)?;
        parse_documents(records, self.schema.storage().document_hook())
    }

    pub fn add_number(&self, value: f64, time: Option<i64>) -> ClientResult<Value> {
        let operation = Operation::add_number(self.schema.name(), self.name, value, time)?;
        self.schema.storage().execute(&operation)
    }

    pub fn add_string(&self, value: &str, time: Option<i64>) -> ClientResult<Value> {
        let operation = Operation::add_string(self.schema.name(), self.name, value, time);
        self.schema.storage().execute(&operation)
    }

    fn read(&self, format: ValueFormat) -> ClientResult<Value> {
        let operation = Operation::read_all(self.schema.name(), self.name, format);
        self.schema.storage().execute(&operation)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ClientError;
    use crate::storage::Storage;
    use crate::testing::{FakeDecoder, MockTransport};
    use serde_json::json;
    use std::sync::Arc;
    use stl_protocol::{HttpResponse, Method, BINARY_CONTENT_TYPE};

    fn plain(uri: &str) -> (Storage, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let storage = Storage::with_parts(uri, false, Box::new(mock.clone()), None).unwrap();
        (storage, mock)
    }

    fn binary(uri: &str, decoder: FakeDecoder) -> (Storage, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let storage =
            Storage::with_parts(uri, true, Box::new(mock.clone()), Some(Box::new(decoder))).unwrap();
        (storage, mock)
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn schema_list_v1_and_v2() {
        let (storage, mock) = plain("http://h");
        mock.respond(HttpResponse::json(r#"["cpu"]"#));
        assert_eq!(storage.schema("hosts").list().unwrap(), json!(["cpu"]));
        assert_eq!(mock.last_request().url, "http://h/schema/list?schema=hosts");

        let (storage, mock) = plain("https://x.cloudfunctions.net/fn");
        mock.respond(HttpResponse::json("[]"));
        storage.schema("hosts").list().unwrap();
        assert_eq!(
            mock.last_request().url,
            "https://x.cloudfunctions.net/fn?action=schema-list&schema=hosts"
        );
    }

    #[test]
    fn all_numbers_v1() {
        let (storage, mock) = plain("http://h");
        mock.respond(HttpResponse::json(r#"[{"time":1,"value":2.5}]"#));

        let values = storage.schema("s").time_line("t").all_numbers().unwrap();
        assert_eq!(values, json!([{ "time": 1, "value": 2.5 }]));
        let request = mock.last_request();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path(), "http://h/timeline/all/numbers");
        assert_eq!(request.query_pairs(), pairs(&[("schema", "s"), ("timeLine", "t")]));
        assert!(request.header("Content-Type").is_none());
    }

    #[test]
    fn all_strings_v2() {
        let (storage, mock) = plain("https://x.cloudfunctions.net/fn");
        mock.respond(HttpResponse::json("[]"));

        storage.schema("s").time_line("t").all_strings().unwrap();
        assert_eq!(
            mock.last_request().query_pairs(),
            pairs(&[("format", "string"), ("schema", "s"), ("timeLine", "t")])
        );
    }

    #[test]
    fn binary_read_announces_encoding_and_decodes() {
        let decoder = FakeDecoder::answering(json!([{ "timestamp": 9, "value": "1" }]));
        let (storage, mock) = binary("http://h", decoder);
        mock.respond(HttpResponse::binary(vec![0, 0, 1]));

        let timeline = storage.schema("s").time_line("t");
        assert!(timeline.is_binary());
        let values = timeline.all_numbers().unwrap();
        assert_eq!(values, json!([{ "timestamp": 9, "value": "1" }]));
        assert_eq!(mock.last_request().header("Content-Type"), Some(BINARY_CONTENT_TYPE));
    }

    #[test]
    fn binary_mode_accepts_plain_json_answer() {
        let (storage, mock) = binary("http://h", FakeDecoder::answering(json!("unused")));
        mock.respond(HttpResponse::json("[1]"));
        assert_eq!(storage.schema("s").time_line("t").all_numbers().unwrap(), json!([1]));
    }

    #[test]
    fn decode_failure_surfaces() {
        let (storage, mock) = binary("http://h", FakeDecoder::failing());
        mock.respond(HttpResponse::binary(vec![1]));
        let err = storage.schema("s").time_line("t").all_strings().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn all_documents_parses_values() {
        let (storage, mock) = plain("http://h");
        mock.respond(HttpResponse::json(
            r#"[{"time":1,"value":"{\"ok\":true}"},{"time":2,"value":"{bad json"}]"#,
        ));

        let docs = storage.schema("s").time_line("t").all_documents().unwrap();
        assert_eq!(
            docs,
            json!([{ "time": 1, "value": { "ok": true } }, { "time": 2, "value": null }])
        );
        assert_eq!(mock.last_request().path(), "http://h/timeline/all/strings");
    }

    #[test]
    fn all_documents_from_decoder_output() {
        let decoder = FakeDecoder::answering(json!([{ "timestamp": 1, "value": "[1,2]" }]));
        let (storage, mock) = binary("http://h", decoder);
        mock.respond(HttpResponse::binary(vec![7]));

        let docs = storage.schema("s").time_line("t").all_documents().unwrap();
        assert_eq!(docs, json!([{ "timestamp": 1, "value": [1, 2] }]));
    }

    #[test]
    fn document_hook_reports_failures() {
        let mock = Arc::new(MockTransport::new());
        let failures = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = failures.clone();
        let storage = Storage::with_parts("http://h", false, Box::new(mock.clone()), None)
            .unwrap()
            .with_document_hook(Arc::new(move |index: usize, _: &serde_json::Error| sink.lock().unwrap().push(index)));
        mock.respond(HttpResponse::json(r#"[{"value":"1"},{"value":"nope"}]"#));

        storage.schema("s").time_line("t").all_documents().unwrap();
        assert_eq!(*failures.lock().unwrap(), vec![1]);
    }

    #[test]
    fn all_documents_rejects_non_array() {
        let (storage, mock) = plain("http://h");
        mock.respond(HttpResponse::json(r#"{"error":"missing"}"#));
        let err = storage.schema("s").time_line("t").all_documents().unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape { .. }));
    }

    #[test]
    fn add_number_v1_posts_form() {
        let (storage, mock) = plain("http://h");
        mock.respond(HttpResponse::json(r#"{"status":"ok"}"#));

        let answer = storage.schema("s").time_line("t").add_number(21.5, Some(1_700_000_000)).unwrap();
        assert_eq!(answer, json!({ "status": "ok" }));
        let request = mock.last_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://h/timeline/add/number");
        assert_eq!(
            request.body_pairs(),
            pairs(&[("schema", "s"), ("timeLine", "t"), ("value", "21.5"), ("time", "1700000000")])
        );
        assert!(request.header("Content-Type").is_none());
    }

    #[test]
    fn add_string_v2_posts_form_with_selector() {
        let (storage, mock) = plain("https://x.cloudfunctions.net/fn");
        mock.respond(HttpResponse::json("{}"));

        storage.schema("s").time_line("t").add_string("hello world", None).unwrap();
        let request = mock.last_request();
        assert_eq!(request.url, "https://x.cloudfunctions.net/fn");
        assert_eq!(
            request.body_pairs(),
            pairs(&[("format", "string"), ("schema", "s"), ("timeLine", "t"), ("value", "hello world")])
        );
    }

    #[test]
    fn add_in_binary_mode_sends_no_content_type() {
        let (storage, mock) = binary("http://h", FakeDecoder::answering(json!(null)));
        mock.respond(HttpResponse::json("{}"));
        storage.schema("s").time_line("t").add_string("v", None).unwrap();
        assert!(mock.last_request().header("Content-Type").is_none());
    }

    #[test]
    fn non_finite_number_rejected_before_sending() {
        let (storage, mock) = plain("http://h");
        let err = storage.schema("s").time_line("t").add_number(f64::NAN, None).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(mock.requests().is_empty());
    }
}
