use serde_json::Value;
use stl_decoder::Decoder;
use stl_protocol::{Dialect, Operation};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::interpret::{parse_json, DocumentHook, ResponseInterpreter};
use crate::schema::Schema;
use crate::transport::{ensure_success, HttpTransport, Transport};

/// A remote storage: the root of the storage → schema → timeline hierarchy.
///
/// The dialect is fixed when the storage is opened. In binary mode the
/// storage owns its decoder; call [`Storage::close`] to release the
/// decoder's long-lived resources.
pub struct Storage {
    uri: String,
    dialect: Dialect,
    binary: bool,
    transport: Box<dyn Transport>,
    decoder: Option<Box<dyn Decoder>>,
    document_hook: Option<DocumentHook>,
}

impl Storage {
    /// Open a storage with default transport and decoder settings.
    pub fn open(uri: &str, binary: bool) -> ClientResult<Self> {
        Self::from_config(&ClientConfig {
            uri: Some(uri.to_string()),
            binary,
            ..Default::default()
        })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let uri = config.require_uri()?;
        let transport = HttpTransport::new(&config.transport)?;
        let decoder = if config.binary {
            Some(config.decoder.build()?)
        } else {
            None
        };
        Self::with_parts(uri, config.binary, Box::new(transport), decoder)
    }

    /// Assemble a storage from explicit parts. Binary mode requires a decoder.
    pub fn with_parts(
        uri: &str,
        binary: bool,
        transport: Box<dyn Transport>,
        decoder: Option<Box<dyn Decoder>>,
    ) -> ClientResult<Self> {
        if binary && decoder.is_none() {
            return Err(ClientError::DecoderUnavailable);
        }
        let uri = uri.trim_end_matches('/').to_string();
        let dialect = Dialect::classify(&uri);
        debug!(%uri, dialect = dialect.name(), binary, "opened storage");
        Ok(Self {
            uri,
            dialect,
            binary,
            transport,
            decoder,
            document_hook: None,
        })
    }

    /// Report documents whose `value` field fails to parse.
    pub fn with_document_hook(mut self, hook: DocumentHook) -> Self {
        self.document_hook = Some(hook);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn decoder(&self) -> Option<&dyn Decoder> {
        self.decoder.as_deref()
    }

    pub fn schema<'a>(&'a self, name: &'a str) -> Schema<'a> {
        Schema::new(self, name)
    }

    /// Names of the schemas held by this storage.
    pub fn list(&self) -> ClientResult<Value> {
        self.execute(&Operation::StorageList)
    }

    /// Release the decoder's long-lived resources. Idempotent.
    pub fn close(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            debug!(decoder = decoder.name(), "releasing decoder");
            decoder.release();
        }
    }

    pub(crate) fn document_hook(&self) -> Option<&DocumentHook> {
        self.document_hook.as_ref()
    }

    pub(crate) fn execute(&self, operation: &Operation) -> ClientResult<Value> {
        let request = self.dialect.build_request(&self.uri, operation, self.binary);
        let response = ensure_success(self.transport.send(&request)?)?;
        if operation.is_listing() {
            return parse_json(&response.body);
        }
        ResponseInterpreter::new(self.binary, self.decoder()).interpret(&response)
    }
}
