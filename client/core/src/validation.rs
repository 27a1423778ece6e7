//! Field and section validation
//!
//! Rules run in a fixed order and the first failing rule wins:
//! required, then minimum length, then maximum length. Lengths are counted
//! in characters. Results are plain data; nothing here fails.

use crate::schema::{FieldSpec, SectionSpec};
use crate::values::{ErrorMap, FieldValue, FormValues};

/// Validate one value against its field. `None` means the value passes.
pub fn validate_field(field: &FieldSpec, value: Option<&FieldValue>) -> Option<String> {
    let missing = value.map_or(true, FieldValue::is_empty);
    if field.required && missing {
        return Some(format!("{} is required.", field.label));
    }

    // Length rules only apply to a value that was entered.
    let value = value?;
    let len = value.len();

    if let Some(min) = field.min_length {
        if len < min as usize {
            return Some(format!(
                "{} must be at least {} characters.",
                field.label, min
            ));
        }
    }

    if let Some(max) = field.max_length {
        if len > max as usize {
            return Some(format!(
                "{} must be less than {} characters.",
                field.label, max
            ));
        }
    }

    None
}

/// Validate every field of a section. An empty map means the section passes.
pub fn validate_section(section: &SectionSpec, values: &FormValues) -> ErrorMap {
    let errors: ErrorMap = section
        .fields
        .iter()
        .filter_map(|field| {
            validate_field(field, values.get(&field.field_id))
                .map(|message| (field.field_id.clone(), message))
        })
        .collect();

    tracing::debug!(
        section_id = section.section_id,
        errors = errors.len(),
        "validated section"
    );
    errors
}
