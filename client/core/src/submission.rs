//! Completed form submissions

use crate::schema::FormSpec;
use crate::values::FormValues;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Everything collected by one session, handed off once on submit
///
/// Values read back from JSON are all [`crate::FieldValue::Text`]; the
/// dropdown tag does not survive serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Random v4 uuid
    pub id: String,
    /// Id of the submitted form
    pub form_id: String,
    /// Version of the submitted form
    pub version: String,
    /// Every value set during the session
    pub values: FormValues,
    /// When the submit succeeded
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Stamp a new submission for a form
    pub fn new(form: &FormSpec, values: FormValues) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            form_id: form.form_id().to_string(),
            version: form.version().to_string(),
            values,
            submitted_at: Utc::now(),
        }
    }
}

/// Receiver of completed submissions
pub trait SubmissionSink {
    /// Delivery failure
    type Error;

    /// Hand one submission over
    fn deliver(&mut self, submission: Submission) -> Result<(), Self::Error>;
}

impl SubmissionSink for Vec<Submission> {
    type Error = Infallible;

    fn deliver(&mut self, submission: Submission) -> Result<(), Self::Error> {
        self.push(submission);
        Ok(())
    }
}
