//! Dynamic Form Client
//!
//! Fetches a server-described multi-step form and walks a user through it
//! one section at a time, validating each section before letting them move
//! on and handing the collected values off on submit.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FORM SESSION                          │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │   Schema     │   │  Navigator   │   │   Submission     │  │
//! │  │   Service    │   │  (cursor)    │   │   Sink           │  │
//! │  └──────┬───────┘   └──────┬───────┘   └──────────────────┘  │
//! │         │                  │                                 │
//! │  ┌──────▼───────┐   ┌──────▼───────┐                         │
//! │  │  FormSpec    │   │   Section    │──▶ Field validator      │
//! │  │  (checked)   │   │   validator  │                         │
//! │  └──────────────┘   └──────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use dynform_client::{FormSession, HttpSchemaService, Identity, ServiceConfig};
//!
//! # async fn run() -> Result<(), dynform_client::ClientError> {
//! let service = HttpSchemaService::new(ServiceConfig::default())?;
//! let mut session = FormSession::new();
//! session.register(&service, Identity::new("RA2211", "Asha")).await?;
//!
//! session.set_value("name", "Asha")?;
//! if let Err(blocked) = session.next() {
//!     for (field, message) in &blocked.errors {
//!         eprintln!("{field}: {message}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod navigation;
pub mod schema;
pub mod service;
pub mod session;
pub mod submission;
pub mod validation;
pub mod values;

use thiserror::Error;

pub use config::ServiceConfig;
pub use navigation::{BlockReason, Blocked, Navigator, Step};
pub use schema::{FieldKind, FieldOption, FieldSpec, FormSpec, SchemaError, SectionSpec, Widget};
pub use service::{register_and_fetch, HttpSchemaService, Identity, SchemaService};
pub use session::{FormSession, RegistrationTicket};
pub use submission::{Submission, SubmissionSink};
pub use validation::{validate_field, validate_section};
pub use values::{ErrorMap, FieldValue, FormValues};

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body read failure
    #[error("network error: {0}")]
    Network(String),
    /// Non-success response from either service call
    #[error("service returned status {status}: {body}")]
    Registration {
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded
        body: String,
    },
    /// The fetched form could not be used
    #[error("invalid form schema: {0}")]
    Schema(#[from] SchemaError),
    /// A newer registration attempt was started before this one finished
    #[error("registration attempt {attempt} was superseded")]
    Superseded {
        /// The stale attempt's number
        attempt: u64,
    },
    /// Registration requested on a session that already has a form
    #[error("session already has a form")]
    AlreadyRegistered,
    /// Form operation on a session without a form
    #[error("no form loaded")]
    NotRegistered,
    /// Bad client configuration
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// True when trying again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Registration { .. }
        )
    }

    /// True when the form itself is unusable; retrying will not help
    pub fn is_schema_error(&self) -> bool {
        matches!(self, ClientError::Schema(_))
    }
}
