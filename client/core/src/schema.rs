//! Form schema
//!
//! Wire shape returned by the schema fetch call, and the checked [`FormSpec`]
//! the rest of the crate works with. Shape problems are caught here so the
//! validators and the navigator can assume well-formed sections and fields.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Schema shape errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Body is not JSON or does not have the expected shape
    #[error("malformed form document: {0}")]
    Malformed(String),
    /// Zero sections
    #[error("form has no sections")]
    NoSections,
    /// Two fields share an id
    #[error("duplicate field id: {field_id}")]
    DuplicateField {
        /// The repeated id
        field_id: String,
    },
    /// Dropdown declared without an options list
    #[error("dropdown field {field_id} has no options")]
    MissingOptions {
        /// The dropdown's id
        field_id: String,
    },
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Malformed(err.to_string())
    }
}

/// Declared field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Email address
    Email,
    /// Phone number
    Tel,
    /// Calendar date
    Date,
    /// Multi-line text
    Textarea,
    /// Choice from a fixed option list
    Dropdown,
}

impl FieldKind {
    /// Widget used to render this field.
    pub fn widget(&self) -> Widget {
        match self {
            FieldKind::Text => Widget::SingleLine { input_type: "text" },
            FieldKind::Email => Widget::SingleLine { input_type: "email" },
            FieldKind::Tel => Widget::SingleLine { input_type: "tel" },
            FieldKind::Date => Widget::SingleLine { input_type: "date" },
            FieldKind::Textarea => Widget::MultiLine,
            FieldKind::Dropdown => Widget::Select,
        }
    }

    /// Wire name, as in the `type` property
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Date => "date",
            FieldKind::Textarea => "textarea",
            FieldKind::Dropdown => "dropdown",
        }
    }
}

/// Presentation widget for a field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    /// One-line input of the given HTML input type
    SingleLine {
        /// `text`, `email`, `tel` or `date`
        input_type: &'static str,
    },
    /// Free text spanning lines
    MultiLine,
    /// Select with a leading empty "Select" choice
    Select,
}

/// Dropdown option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    /// Stored as the field's value when chosen
    pub value: String,
    /// Shown to the user
    pub label: String,
    /// Test hook for UI automation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_test_id: Option<String>,
}

/// Server-side validation hint. Carried through, not used for messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationHint {
    /// Server-suggested message
    #[serde(default)]
    pub message: Option<String>,
}

/// A single form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Unique across the whole form; keys the value map
    pub field_id: String,
    /// Declared type
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Human label, also used in error messages
    pub label: String,
    /// Input hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Must be non-empty to pass
    pub required: bool,
    /// Test hook for UI automation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_test_id: Option<String>,
    /// Server validation hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationHint>,
    /// Minimum length of an entered value, in chars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    /// Maximum length of an entered value, in chars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Choices of a dropdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

impl FieldSpec {
    /// Options of a dropdown field, empty for every other kind.
    pub fn options(&self) -> &[FieldOption] {
        self.options.as_deref().unwrap_or(&[])
    }

    /// Option with the given value, if any
    pub fn option(&self, value: &str) -> Option<&FieldOption> {
        self.options().iter().find(|o| o.value == value)
    }
}

/// One step of the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    /// Server-assigned id
    pub section_id: i64,
    /// Section heading
    pub title: String,
    /// Text shown under the heading
    pub description: String,
    /// Fields in display order
    pub fields: Vec<FieldSpec>,
}

/// Form document as sent by the schema service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDocument {
    /// Form heading
    pub form_title: String,
    /// Form id
    pub form_id: String,
    /// Form version
    pub version: String,
    /// Sections in order
    pub sections: Vec<SectionSpec>,
}

/// Envelope of the schema fetch response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResponse {
    /// Status text from the service
    pub message: String,
    /// The form itself
    pub form: FormDocument,
}

/// Checked, immutable form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    form_title: String,
    form_id: String,
    version: String,
    sections: Vec<SectionSpec>,
    #[serde(skip)]
    message: String,
}

impl FormSpec {
    /// Parse a fetch response body.
    pub fn from_json(body: &[u8]) -> Result<Self, SchemaError> {
        let response: FormResponse = serde_json::from_slice(body)?;
        Self::from_response(response)
    }

    /// Check a decoded response.
    pub fn from_response(response: FormResponse) -> Result<Self, SchemaError> {
        let FormResponse { message, form } = response;
        Self::from_document(form).map(|spec| Self { message, ..spec })
    }

    /// Check a bare form document.
    pub fn from_document(form: FormDocument) -> Result<Self, SchemaError> {
        if form.sections.is_empty() {
            return Err(SchemaError::NoSections);
        }

        let mut seen = HashSet::new();
        for field in form.sections.iter().flat_map(|s| s.fields.iter()) {
            if !seen.insert(field.field_id.as_str()) {
                return Err(SchemaError::DuplicateField {
                    field_id: field.field_id.clone(),
                });
            }
            if field.kind == FieldKind::Dropdown && field.options.is_none() {
                return Err(SchemaError::MissingOptions {
                    field_id: field.field_id.clone(),
                });
            }
        }

        Ok(Self {
            form_title: form.form_title,
            form_id: form.form_id,
            version: form.version,
            sections: form.sections,
            message: String::new(),
        })
    }

    /// Form heading
    pub fn title(&self) -> &str {
        &self.form_title
    }

    /// Form id
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Form version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Server message from the fetch envelope
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sections in order
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// Always at least one.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Section at a 0-based index
    pub fn section(&self, index: usize) -> Option<&SectionSpec> {
        self.sections.get(index)
    }

    /// Look a field up across all sections.
    pub fn field(&self, field_id: &str) -> Option<&FieldSpec> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.field_id == field_id)
    }
}
