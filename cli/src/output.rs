//! Output formatting

use anyhow::Result;
use clap::ValueEnum;
use dynform_client::{ErrorMap, FormSpec, Submission};
use serde::Serialize;
use std::str::FromStr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Types with a human-readable table rendering
pub trait TableView {
    fn table(&self) -> String;
}

impl OutputFormat {
    pub fn render<T: Serialize + TableView>(&self, data: &T) -> Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Yaml => serde_yaml::to_string(data)?,
            OutputFormat::Table => data.table(),
        })
    }

    pub fn print<T: Serialize + TableView>(&self, data: &T) -> Result<()> {
        println!("{}", self.render(data)?);
        Ok(())
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Field")]
    field_id: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Required")]
    required: &'static str,
    #[tabled(rename = "Length")]
    length: String,
    #[tabled(rename = "Options")]
    options: String,
}

impl TableView for FormSpec {
    fn table(&self) -> String {
        let rows: Vec<FieldRow> = self
            .sections()
            .iter()
            .flat_map(|section| {
                section.fields.iter().map(move |field| FieldRow {
                    section: section.title.clone(),
                    field_id: field.field_id.clone(),
                    kind: field.kind.as_str(),
                    label: field.label.clone(),
                    required: if field.required { "yes" } else { "no" },
                    length: match (field.min_length, field.max_length) {
                        (None, None) => String::new(),
                        (min, max) => format!(
                            "{}..{}",
                            min.map(|m| m.to_string()).unwrap_or_default(),
                            max.map(|m| m.to_string()).unwrap_or_default()
                        ),
                    },
                    options: field
                        .options()
                        .iter()
                        .map(|o| o.value.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        format!(
            "{} ({} v{})\n{}",
            self.title(),
            self.form_id(),
            self.version(),
            table
        )
    }
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Field")]
    field_id: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl TableView for Submission {
    fn table(&self) -> String {
        let rows: Vec<ValueRow> = self
            .values
            .iter()
            .map(|(field_id, value)| ValueRow {
                field_id: field_id.to_string(),
                value: value.as_str().to_string(),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        format!(
            "Submission {} for {} v{} at {}\n{}",
            self.id,
            self.form_id,
            self.version,
            self.submitted_at.to_rfc3339(),
            table
        )
    }
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Field")]
    field_id: String,
    #[tabled(rename = "Error")]
    message: String,
}

impl TableView for ErrorMap {
    fn table(&self) -> String {
        let rows: Vec<ErrorRow> = self
            .iter()
            .map(|(field_id, message)| ErrorRow {
                field_id: field_id.clone(),
                message: message.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }
}
