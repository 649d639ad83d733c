use serde_json::Value;
use stl_protocol::Operation;

use crate::error::ClientResult;
use crate::storage::Storage;
use crate::timeline::Timeline;

/// A named schema within a storage.
#[derive(Clone, Copy)]
pub struct Schema<'a> {
    storage: &'a Storage,
    name: &'a str,
}

impl<'a> Schema<'a> {
    pub(crate) fn new(storage: &'a Storage, name: &'a str) -> Self {
        Self { storage, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn is_binary(&self) -> bool {
        self.storage.is_binary()
    }

    pub fn storage(&self) -> &'a Storage {
        self.storage
    }

    /// Names of the timelines held by this schema.
    pub fn list(&self) -> ClientResult<Value> {
        self.storage.execute(&Operation::SchemaList {
            schema: self.name.to_string(),
        })
    }

    pub fn time_line(&self, name: &'a str) -> Timeline<'a> {
        Timeline::new(*self, name)
    }
}
