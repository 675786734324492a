use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// How a field's fragment sequence collapses into its final value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerKind {
    /// First fragment, or the empty string
    First,
    /// All fragments joined with the configured separator
    Join,
    /// The fragment sequence itself (multi-valued fields)
    Identity,
}

impl ReducerKind {
    /// The kind of value this reducer produces
    pub fn output_kind(&self) -> FieldKind {
        match self {
            Self::First | Self::Join => FieldKind::Text,
            Self::Identity => FieldKind::List,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Join => "join",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared value type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    List,
}

/// Fields every ad carries, whatever its category
pub const GENERIC_FIELDS: &[(&str, ReducerKind)] = &[
    ("url", ReducerKind::First),
    ("images", ReducerKind::Identity),
    ("title", ReducerKind::First),
    ("price", ReducerKind::First),
    ("location", ReducerKind::First),
    ("last_updated", ReducerKind::First),
    ("description", ReducerKind::Join),
    ("condition", ReducerKind::First),
];

/// Field name → reducer table describing the records of one ad category
///
/// The schema says what a field is; selector maps say where it is scraped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    fields: BTreeMap<String, ReducerKind>,
}

impl RecordSchema {
    /// The schema shared by all categories
    pub fn generic() -> Self {
        Self {
            fields: GENERIC_FIELDS
                .iter()
                .map(|(name, reducer)| (name.to_string(), *reducer))
                .collect(),
        }
    }

    /// Returns true if `name` is one of [`GENERIC_FIELDS`]
    pub fn is_generic_field(name: &str) -> bool {
        GENERIC_FIELDS.iter().any(|(field, _)| *field == name)
    }

    /// Adds a field, or replaces its reducer if already declared
    pub fn with_field(mut self, name: impl Into<String>, reducer: ReducerKind) -> Self {
        self.fields.insert(name.into(), reducer);
        self
    }

    /// Adds a field with the `first` reducer unless it is already declared
    pub fn with_default_field(mut self, name: impl Into<String>) -> Self {
        self.fields.entry(name.into()).or_insert(ReducerKind::First);
        self
    }

    pub fn reducer(&self, field: &str) -> Option<ReducerKind> {
        self.fields.get(field).copied()
    }

    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.reducer(field).map(|r| r.output_kind())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ReducerKind)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::generic()
    }
}
