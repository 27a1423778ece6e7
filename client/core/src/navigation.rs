//! Section navigation
//!
//! A cursor over the form's sections. Moving forward and submitting are
//! gated on the active section validating clean; moving back is not. A
//! rejected move leaves the cursor where it was and hands the section's
//! errors back for display.

use crate::schema::FormSpec;
use crate::validation::validate_section;
use crate::values::{ErrorMap, FormValues};
use std::fmt;

/// Why a navigation request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The active section has validation errors
    InvalidSection,
    /// Advance requested on the final section; submit instead
    LastSection,
    /// Submit requested before the final section
    NotLastSection,
    /// The form was already submitted
    AlreadySubmitted,
    /// No form has been loaded yet
    NotRegistered,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BlockReason::InvalidSection => "section has errors",
            BlockReason::LastSection => "already on the last section",
            BlockReason::NotLastSection => "not on the last section",
            BlockReason::AlreadySubmitted => "form already submitted",
            BlockReason::NotRegistered => "no form loaded",
        };
        f.write_str(text)
    }
}

/// A refused move, with the active section's errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocked {
    /// Why the move was refused
    pub reason: BlockReason,
    /// Errors of the active section at the time
    pub errors: ErrorMap,
}

/// A move that was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved forward one section
    Advanced {
        /// Previous cursor
        from: usize,
        /// New cursor
        to: usize,
    },
    /// Moved back one section
    Retreated {
        /// Previous cursor
        from: usize,
        /// New cursor
        to: usize,
    },
    /// Retreat at the first section, or after submit
    Stayed,
    /// The form was submitted
    Submitted,
}

/// Cursor state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    cursor: usize,
    section_count: usize,
    submitted: bool,
}

impl Navigator {
    /// Start at the first section.
    pub fn new(form: &FormSpec) -> Self {
        Self {
            cursor: 0,
            section_count: form.section_count(),
            submitted: false,
        }
    }

    /// 0-based index of the active section
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of sections in the form
    pub fn section_count(&self) -> usize {
        self.section_count
    }

    /// True on the final section
    pub fn is_last_section(&self) -> bool {
        self.cursor + 1 == self.section_count
    }

    /// True once submit succeeded
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Move to the next section if the active one validates clean.
    pub fn advance(&mut self, form: &FormSpec, values: &FormValues) -> Result<Step, Blocked> {
        let errors = self.check(form, values)?;
        if self.is_last_section() {
            return Err(Blocked {
                reason: BlockReason::LastSection,
                errors,
            });
        }
        if !errors.is_empty() {
            return Err(Blocked {
                reason: BlockReason::InvalidSection,
                errors,
            });
        }

        let from = self.cursor;
        self.cursor += 1;
        Ok(Step::Advanced {
            from,
            to: self.cursor,
        })
    }

    /// Move to the previous section. Never validates, never fails.
    pub fn retreat(&mut self) -> Step {
        if self.submitted || self.cursor == 0 {
            return Step::Stayed;
        }
        let from = self.cursor;
        self.cursor -= 1;
        Step::Retreated {
            from,
            to: self.cursor,
        }
    }

    /// Finish the form from the last section. Succeeds at most once.
    pub fn submit(&mut self, form: &FormSpec, values: &FormValues) -> Result<Step, Blocked> {
        let errors = self.check(form, values)?;
        if !self.is_last_section() {
            return Err(Blocked {
                reason: BlockReason::NotLastSection,
                errors,
            });
        }
        if !errors.is_empty() {
            return Err(Blocked {
                reason: BlockReason::InvalidSection,
                errors,
            });
        }

        self.submitted = true;
        Ok(Step::Submitted)
    }

    fn check(&self, form: &FormSpec, values: &FormValues) -> Result<ErrorMap, Blocked> {
        if self.submitted {
            return Err(Blocked {
                reason: BlockReason::AlreadySubmitted,
                errors: ErrorMap::new(),
            });
        }
        Ok(form
            .section(self.cursor)
            .map(|section| validate_section(section, values))
            .unwrap_or_default())
    }
}
