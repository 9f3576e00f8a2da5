//! Field values and merged per-server records.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// A single decoded cell.
///
/// Feeds decoded with a strict schema carry integers for the columns the
/// schema declares numeric; everything else (and every cell in header-driven
/// mode) stays text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    /// Interpret the value as an integer.
    ///
    /// Text is parsed as a base-10 `i64` without trimming.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Text(s) => s.parse().ok(),
        }
    }

    /// Borrow the value as text, formatting integers on demand.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Int(v) => Cow::Owned(v.to_string()),
            FieldValue::Text(s) => Cow::Borrowed(s),
        }
    }

    /// True for an empty text cell. Integers are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// The reconciled fields of one `(group, server)` identity key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MergedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl MergedRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Mutable access to a field by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    /// Store a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// A field as an integer, if present and numeric.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_int)
    }

    /// A field as text; missing fields read as the empty string.
    pub fn text(&self, name: &str) -> Cow<'_, str> {
        self.get(name)
            .map(FieldValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Number of stored fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for MergedRecord
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
