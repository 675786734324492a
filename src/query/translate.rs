use std::collections::BTreeMap;

/// Static lookup from a human-readable key to the site's internal code
///
/// Unknown keys and absent values both translate to the empty string, which
/// the site reads as "no filter".
///
/// # Examples
///
/// ```
/// use homespace::query::TranslationTable;
///
/// let table = TranslationTable::from_pairs([("shoes", "53")]);
/// assert_eq!(table.translate(Some("shoes")), "53");
/// assert_eq!(table.translate(Some("boats")), "");
/// assert_eq!(table.translate(None), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: BTreeMap<String, String>,
}

impl TranslationTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Translates `key` to its site code
    pub fn translate(&self, key: Option<&str>) -> String {
        match key.map(str::trim) {
            None | Some("") => String::new(),
            Some(key) => match self.entries.get(key) {
                Some(code) => code.clone(),
                None => {
                    tracing::debug!("No translation for '{}', using empty value", key);
                    String::new()
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
