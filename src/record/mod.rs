//! Record module: the normalized output of one ad
//!
//! - `RecordSchema`: field name → reducer, the declared shape of a record
//! - `FieldNormalizer`: collapses raw fragments and cleans text
//! - `Record` / `Value`: the immutable result

mod normalize;
mod schema;

pub use normalize::FieldNormalizer;
pub use schema::{FieldKind, ReducerKind, RecordSchema, GENERIC_FIELDS};

use serde::Serialize;
use std::collections::BTreeMap;

/// A normalized field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    List(Vec<String>),
}

impl Value {
    /// The empty value of a field kind
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Self::Text(String::new()),
            FieldKind::List => Self::List(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Text(_) => None,
        }
    }
}

/// The final output unit for one ad. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub(crate) fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Text value of `field`, if present and textual
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// List value of `field`, if present and multi-valued
    pub fn list(&self, field: &str) -> Option<&[String]> {
        self.get(field).and_then(Value::as_list)
    }

    /// The detail page this record was extracted from
    pub fn url(&self) -> &str {
        self.text("url").unwrap_or_default()
    }

    /// True when every field other than `url` is empty
    ///
    /// This is what a detail page whose layout did not match produces.
    pub fn is_blank(&self) -> bool {
        self.fields
            .iter()
            .filter(|(name, _)| name.as_str() != "url")
            .all(|(_, value)| value.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
