//! Check command
//!
//! Runs a saved form document and a set of values through the same
//! section-by-section gate the interactive flow uses, without any network.

use crate::output::OutputFormat;
use anyhow::{bail, Context, Result};
use dynform_client::{ClientError, ErrorMap, FormSession, FormSpec, Identity, Submission};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// First section that did not validate
#[derive(Debug)]
pub struct Stopped {
    pub section_index: usize,
    pub title: String,
    pub errors: ErrorMap,
}

pub fn handle(schema: &Path, values: Option<&Path>, format: OutputFormat) -> Result<()> {
    let body = fs::read(schema).with_context(|| format!("reading {}", schema.display()))?;
    let form = FormSpec::from_json(&body).map_err(ClientError::from)?;

    let values = match values {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("{} must be a JSON object of strings", path.display()))?
        }
        None => BTreeMap::new(),
    };

    match walk(form, values)? {
        Ok(submission) => format.print(&submission),
        Err(stopped) => {
            eprintln!(
                "Section {} \"{}\" did not validate:",
                stopped.section_index + 1,
                stopped.title
            );
            format.print(&stopped.errors)?;
            bail!("{} field(s) failed validation", stopped.errors.len())
        }
    }
}

/// Advance through every section, then submit.
pub fn walk(
    form: FormSpec,
    values: BTreeMap<String, String>,
) -> Result<std::result::Result<Submission, Stopped>> {
    let mut session = FormSession::with_form(Identity::new("offline", "offline"), form);
    for (field_id, value) in values {
        session.set_value(&field_id, value)?;
    }

    loop {
        let result = if session.is_last_section() {
            session.submit().map(Some)
        } else {
            session.next().map(|_| None)
        };

        match result {
            Ok(Some(submission)) => return Ok(Ok(submission)),
            Ok(None) => continue,
            Err(blocked) => {
                let section_index = session.cursor().context("no form loaded")?;
                let title = session
                    .active_section()
                    .map(|s| s.title.clone())
                    .unwrap_or_default();
                return Ok(Err(Stopped {
                    section_index,
                    title,
                    errors: blocked.errors,
                }));
            }
        }
    }
}
