//! Collected field values and per-field errors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw input for one field
///
/// Serializes as a bare string. Deserializing cannot tell the two variants
/// apart and always yields [`FieldValue::Text`]; re-tag with the form's
/// field kinds (as [`crate::FormSession::set_value`] does) when it matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Typed text from a text-like widget
    Text(String),
    /// `value` of the chosen dropdown option
    Selected(String),
}

impl FieldValue {
    /// The raw string, whichever widget produced it
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Text(s) | FieldValue::Selected(s) => s,
        }
    }

    /// Length in Unicode scalar values (`char`s), not bytes or UTF-16 units.
    pub fn len(&self) -> usize {
        self.as_str().chars().count()
    }

    /// True for the empty string
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
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

/// Values keyed by field id. A missing key reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, if one was set
    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.0.get(field_id)
    }

    /// Overwrites any previous value.
    pub fn set(&mut self, field_id: impl Into<String>, value: FieldValue) {
        self.0.insert(field_id.into(), value);
    }

    /// Drop a field's value
    pub fn remove(&mut self, field_id: &str) -> Option<FieldValue> {
        self.0.remove(field_id)
    }

    /// Number of fields with a value
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in field id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Validation messages keyed by field id, for the active section only.
pub type ErrorMap = BTreeMap<String, String>;
