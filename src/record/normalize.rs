use crate::extract::RawExtraction;
use crate::record::{ReducerKind, Record, RecordSchema, Value};
use std::collections::BTreeMap;

/// Reduces raw fragment sequences to typed values and cleans their text
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    separator: String,
    strip: Vec<char>,
}

impl FieldNormalizer {
    /// Creates a normalizer
    ///
    /// # Arguments
    ///
    /// * `separator` - Inserted between fragments by `join` reducers
    /// * `strip_characters` - Removed from every value, on top of control characters
    pub fn new(separator: impl Into<String>, strip_characters: &str) -> Self {
        Self {
            separator: separator.into(),
            strip: strip_characters.chars().collect(),
        }
    }

    /// Builds a record from one page's raw extraction
    ///
    /// Every field of `schema` is present in the result; fields with no
    /// fragments get the empty value of their kind. Fields extracted but not
    /// declared in `schema` reduce with `first`.
    pub fn normalize(&self, raw: &RawExtraction, schema: &RecordSchema) -> Record {
        let mut fields = BTreeMap::new();

        for (name, reducer) in schema.iter() {
            let fragments = raw.get(name).unwrap_or(&[]);
            fields.insert(name.to_string(), self.reduce(fragments, reducer));
        }

        for (name, fragments) in raw.iter() {
            if !fields.contains_key(name) {
                tracing::trace!("Field {} not declared in schema, taking first", name);
                fields.insert(name.to_string(), self.reduce(fragments, ReducerKind::First));
            }
        }

        Record::from_fields(fields)
    }

    /// Applies `reducer` to `fragments`, then cleans the result
    pub fn reduce(&self, fragments: &[String], reducer: ReducerKind) -> Value {
        match reducer {
            ReducerKind::First => Value::Text(
                fragments
                    .first()
                    .map(|f| self.clean(f))
                    .unwrap_or_default(),
            ),
            ReducerKind::Join => Value::Text(self.clean(&fragments.join(&self.separator))),
            ReducerKind::Identity => {
                Value::List(fragments.iter().map(|f| self.clean(f)).collect())
            }
        }
    }

    /// Removes configured and control characters, then trims
    ///
    /// Control characters that are whitespace (newlines, tabs) become a
    /// single space so words on either side stay apart.
    pub fn clean(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if self.strip.contains(&c) {
                continue;
            }
            if c.is_control() {
                if c.is_whitespace() && !out.ends_with(' ') {
                    out.push(' ');
                }
                continue;
            }
            out.push(c);
        }
        out.trim().to_string()
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(" ", "")
    }
}
