use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::endpoint::params;
use crate::error::{ProtocolError, ProtocolResult};

/// Value format stored in a timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Number,
    String,
}

impl ValueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            _ => Err(ProtocolError::UnknownFormat(s.into())),
        }
    }
}

/// Discriminant of an [`Operation`], used as the route table key.
///
/// The declaration order matches the row order of [`crate::endpoint::ROUTES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    StorageList = 0,
    SchemaList = 1,
    ReadNumbers = 2,
    ReadStrings = 3,
    AddNumber = 4,
    AddString = 5,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        Self::StorageList,
        Self::SchemaList,
        Self::ReadNumbers,
        Self::ReadStrings,
        Self::AddNumber,
        Self::AddString,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::StorageList => "storage-list",
            Self::SchemaList => "schema-list",
            Self::ReadNumbers => "read-numbers",
            Self::ReadStrings => "read-strings",
            Self::AddNumber => "add-number",
            Self::AddString => "add-string",
        }
    }
}

/// A single call against the storage timeline service.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// List the schemas held by a storage.
    StorageList,
    /// List the timelines held by a schema.
    SchemaList { schema: String },
    /// Read every value of a timeline in the given format.
    ReadAll {
        schema: String,
        time_line: String,
        format: ValueFormat,
    },
    /// Append a value to a timeline. `value` is already in wire form.
    Add {
        schema: String,
        time_line: String,
        format: ValueFormat,
        value: String,
        time: Option<i64>,
    },
}

impl Operation {
    pub fn read_all(
        schema: impl Into<String>,
        time_line: impl Into<String>,
        format: ValueFormat,
    ) -> Self {
        Self::ReadAll {
            schema: schema.into(),
            time_line: time_line.into(),
            format,
        }
    }

    /// Build an add-number call. Non-finite values have no wire form.
    pub fn add_number(
        schema: impl Into<String>,
        time_line: impl Into<String>,
        value: f64,
        time: Option<i64>,
    ) -> ProtocolResult<Self> {
        if !value.is_finite() {
            return Err(ProtocolError::InvalidValue {
                field: params::VALUE,
                reason: format!("{value} is not a finite number"),
            });
        }
        Ok(Self::Add {
            schema: schema.into(),
            time_line: time_line.into(),
            format: ValueFormat::Number,
            value: value.to_string(),
            time,
        })
    }

    pub fn add_string(
        schema: impl Into<String>,
        time_line: impl Into<String>,
        value: impl Into<String>,
        time: Option<i64>,
    ) -> Self {
        Self::Add {
            schema: schema.into(),
            time_line: time_line.into(),
            format: ValueFormat::String,
            value: value.into(),
            time,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::StorageList => OperationKind::StorageList,
            Self::SchemaList { .. } => OperationKind::SchemaList,
            Self::ReadAll { format: ValueFormat::Number, .. } => OperationKind::ReadNumbers,
            Self::ReadAll { format: ValueFormat::String, .. } => OperationKind::ReadStrings,
            Self::Add { format: ValueFormat::Number, .. } => OperationKind::AddNumber,
            Self::Add { format: ValueFormat::String, .. } => OperationKind::AddString,
        }
    }

    /// Timeline reads are the only requests that announce binary mode.
    pub fn is_timeline_read(&self) -> bool {
        matches!(self, Self::ReadAll { .. })
    }

    /// Listings are always answered with plain JSON.
    pub fn is_listing(&self) -> bool {
        matches!(self, Self::StorageList | Self::SchemaList { .. })
    }

    /// Semantic parameters, identical for both dialects.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::StorageList => Vec::new(),
            Self::SchemaList { schema } => vec![(params::SCHEMA, schema.clone())],
            Self::ReadAll { schema, time_line, .. } => vec![
                (params::SCHEMA, schema.clone()),
                (params::TIME_LINE, time_line.clone()),
            ],
            Self::Add { schema, time_line, value, time, .. } => {
                let mut pairs = vec![
                    (params::SCHEMA, schema.clone()),
                    (params::TIME_LINE, time_line.clone()),
                    (params::VALUE, value.clone()),
                ];
                if let Some(time) = time {
                    pairs.push((params::TIME, time.to_string()));
                }
                pairs
            }
        }
    }
}
