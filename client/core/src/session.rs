//! Form session
//!
//! Owns everything one user's pass through a form needs: the fetched form,
//! the collected values, the active section's errors and the navigation
//! cursor. Nothing here is shared; each session is driven by its owner.
//!
//! Registration is split into [`FormSession::begin_registration`] and
//! [`FormSession::complete_registration`] so a caller that starts a newer
//! attempt can have the older one's result thrown away. Only the most
//! recently issued ticket may commit.

use crate::navigation::{BlockReason, Blocked, Navigator, Step};
use crate::schema::{FieldKind, FormSpec, SchemaError, SectionSpec};
use crate::service::{register_and_fetch, Identity, SchemaService};
use crate::submission::Submission;
use crate::values::{ErrorMap, FieldValue, FormValues};
use crate::ClientError;

/// Proof of an in-flight registration attempt
#[derive(Debug)]
pub struct RegistrationTicket {
    attempt: u64,
    identity: Identity,
}

impl RegistrationTicket {
    /// Attempt number, increasing per session
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Identity being registered
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[derive(Debug)]
enum Phase {
    Unregistered,
    Active(ActiveForm),
    /// The fetched schema was unusable; nothing else can happen.
    Failed(SchemaError),
}

#[derive(Debug)]
struct ActiveForm {
    identity: Identity,
    form: FormSpec,
    nav: Navigator,
    values: FormValues,
    errors: ErrorMap,
}

/// One user's form session
#[derive(Debug)]
pub struct FormSession {
    phase: Phase,
    latest_attempt: u64,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FormSession {
    /// Unregistered session
    pub fn new() -> Self {
        Self {
            phase: Phase::Unregistered,
            latest_attempt: 0,
        }
    }

    /// Open a session on a form that was obtained some other way, such as
    /// a saved schema document.
    pub fn with_form(identity: Identity, form: FormSpec) -> Self {
        Self {
            phase: Phase::Active(ActiveForm::new(identity, form)),
            latest_attempt: 0,
        }
    }

    /// Register and fetch the form in one go.
    pub async fn register<S>(&mut self, service: &S, identity: Identity) -> Result<&FormSpec, ClientError>
    where
        S: SchemaService + ?Sized,
    {
        let ticket = self.begin_registration(identity)?;
        let result = register_and_fetch(service, ticket.identity()).await;
        self.complete_registration(ticket, result)
    }

    /// Start a registration attempt. Any earlier ticket becomes stale.
    pub fn begin_registration(&mut self, identity: Identity) -> Result<RegistrationTicket, ClientError> {
        match &self.phase {
            Phase::Unregistered => {}
            Phase::Active(_) => return Err(ClientError::AlreadyRegistered),
            Phase::Failed(err) => return Err(ClientError::Schema(err.clone())),
        }
        self.latest_attempt += 1;
        Ok(RegistrationTicket {
            attempt: self.latest_attempt,
            identity,
        })
    }

    /// Apply the outcome of a registration attempt.
    ///
    /// Network and status failures leave the session unregistered so the
    /// user can retry. A schema failure ends the session.
    pub fn complete_registration(
        &mut self,
        ticket: RegistrationTicket,
        result: Result<FormSpec, ClientError>,
    ) -> Result<&FormSpec, ClientError> {
        if ticket.attempt != self.latest_attempt {
            tracing::warn!(
                attempt = ticket.attempt,
                latest = self.latest_attempt,
                "discarding superseded registration result"
            );
            return Err(ClientError::Superseded {
                attempt: ticket.attempt,
            });
        }
        if !matches!(self.phase, Phase::Unregistered) {
            return Err(ClientError::AlreadyRegistered);
        }

        let form = match result {
            Ok(form) => form,
            Err(ClientError::Schema(err)) => {
                tracing::error!(error = %err, "form schema rejected");
                self.phase = Phase::Failed(err.clone());
                return Err(ClientError::Schema(err));
            }
            Err(err) => {
                tracing::warn!(error = %err, "registration failed");
                return Err(err);
            }
        };

        tracing::info!(
            roll_number = %ticket.identity.roll_number,
            form_id = form.form_id(),
            "session registered"
        );
        self.phase = Phase::Active(ActiveForm::new(ticket.identity, form));
        self.form().ok_or(ClientError::NotRegistered)
    }

    fn active(&self) -> Option<&ActiveForm> {
        match &self.phase {
            Phase::Active(active) => Some(active),
            _ => None,
        }
    }

    fn active_mut(&mut self) -> Option<&mut ActiveForm> {
        match &mut self.phase {
            Phase::Active(active) => Some(active),
            _ => None,
        }
    }

    /// True once a form is loaded
    pub fn is_registered(&self) -> bool {
        self.active().is_some()
    }

    /// Schema failure that ended this session, if any
    pub fn failure(&self) -> Option<&SchemaError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Registered identity
    pub fn identity(&self) -> Option<&Identity> {
        self.active().map(|a| &a.identity)
    }

    /// Loaded form
    pub fn form(&self) -> Option<&FormSpec> {
        self.active().map(|a| &a.form)
    }

    /// 0-based index of the active section
    pub fn cursor(&self) -> Option<usize> {
        self.active().map(|a| a.nav.cursor())
    }

    /// Section currently shown
    pub fn active_section(&self) -> Option<&SectionSpec> {
        self.active().and_then(|a| a.form.section(a.nav.cursor()))
    }

    /// `(current, total)`, 1-based
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.active()
            .map(|a| (a.nav.cursor() + 1, a.nav.section_count()))
    }

    /// True on the final section
    pub fn is_last_section(&self) -> bool {
        self.active().map_or(false, |a| a.nav.is_last_section())
    }

    /// True once the form was submitted
    pub fn is_submitted(&self) -> bool {
        self.active().map_or(false, |a| a.nav.is_submitted())
    }

    /// Errors from the last navigation attempt on the active section
    pub fn errors(&self) -> Option<&ErrorMap> {
        self.active().map(|a| &a.errors)
    }

    /// Everything entered so far, across sections
    pub fn values(&self) -> Option<&FormValues> {
        self.active().map(|a| &a.values)
    }

    /// One field's value
    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.active().and_then(|a| a.values.get(field_id))
    }

    /// Overwrite a field's value. Not validated until the next move.
    pub fn set_value(&mut self, field_id: &str, raw: impl Into<String>) -> Result<(), ClientError> {
        let active = self.active_mut().ok_or(ClientError::NotRegistered)?;
        let raw = raw.into();
        let value = match active.form.field(field_id).map(|f| f.kind) {
            Some(FieldKind::Dropdown) => FieldValue::Selected(raw),
            _ => FieldValue::Text(raw),
        };
        active.values.set(field_id, value);
        Ok(())
    }

    /// Forget a field's value, as if it was never touched.
    pub fn clear_value(&mut self, field_id: &str) -> Result<(), ClientError> {
        let active = self.active_mut().ok_or(ClientError::NotRegistered)?;
        active.values.remove(field_id);
        Ok(())
    }

    /// Advance if the active section validates clean.
    pub fn next(&mut self) -> Result<Step, Blocked> {
        let active = self.active_mut().ok_or_else(not_registered)?;
        let result = active.nav.advance(&active.form, &active.values);
        active.settle(&result);
        if let Ok(Step::Advanced { from, to }) = result {
            tracing::info!(from, to, "advanced section");
        }
        result
    }

    /// Go back one section. Clears the errors shown.
    pub fn prev(&mut self) -> Step {
        let Some(active) = self.active_mut() else {
            return Step::Stayed;
        };
        let step = active.nav.retreat();
        if let Step::Retreated { from, to } = step {
            // errors belonged to the section being left
            active.errors.clear();
            tracing::info!(from, to, "retreated section");
        }
        step
    }

    /// Finish the form. Yields the submission exactly once.
    pub fn submit(&mut self) -> Result<Submission, Blocked> {
        let active = self.active_mut().ok_or_else(not_registered)?;
        let result = active.nav.submit(&active.form, &active.values);
        active.settle(&result);
        result?;

        let submission = Submission::new(&active.form, active.values.clone());
        tracing::info!(
            form_id = %submission.form_id,
            submission_id = %submission.id,
            fields = submission.values.len(),
            "form submitted"
        );
        Ok(submission)
    }
}

impl ActiveForm {
    fn new(identity: Identity, form: FormSpec) -> Self {
        Self {
            identity,
            nav: Navigator::new(&form),
            form,
            values: FormValues::new(),
            errors: ErrorMap::new(),
        }
    }

    /// Replace the error map with the outcome of a gated move.
    fn settle(&mut self, result: &Result<Step, Blocked>) {
        match result {
            Ok(_) => self.errors.clear(),
            Err(blocked) => {
                if blocked.reason != BlockReason::AlreadySubmitted {
                    self.errors = blocked.errors.clone();
                }
                tracing::warn!(
                    reason = %blocked.reason,
                    errors = blocked.errors.len(),
                    "navigation blocked"
                );
            }
        }
    }
}

fn not_registered() -> Blocked {
    Blocked {
        reason: BlockReason::NotRegistered,
        errors: ErrorMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, FormDocument};
    use crate::submission::SubmissionSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn field(id: &str, label: &str, kind: FieldKind, required: bool) -> FieldSpec {
        FieldSpec {
            field_id: id.into(),
            kind,
            label: label.into(),
            placeholder: None,
            required,
            data_test_id: None,
            validation: None,
            min_length: None,
            max_length: None,
            options: (kind == FieldKind::Dropdown).then(Vec::new),
        }
    }

    fn two_section_form() -> FormSpec {
        FormSpec::from_document(FormDocument {
            form_title: "Signup".into(),
            form_id: "signup".into(),
            version: "2".into(),
            sections: vec![
                SectionSpec {
                    section_id: 1,
                    title: "Who".into(),
                    description: String::new(),
                    fields: vec![field("name", "Name", FieldKind::Text, true)],
                },
                SectionSpec {
                    section_id: 2,
                    title: "What".into(),
                    description: String::new(),
                    fields: vec![
                        field("track", "Track", FieldKind::Dropdown, true),
                        field("bio", "Bio", FieldKind::Textarea, false),
                    ],
                },
            ],
        })
        .unwrap()
    }

    struct FakeService {
        register: Mutex<Option<ClientError>>,
        fetch: Mutex<Option<Result<FormSpec, ClientError>>>,
        fetch_calls: AtomicUsize,
    }

    impl FakeService {
        fn ok(form: FormSpec) -> Self {
            Self {
                register: Mutex::new(None),
                fetch: Mutex::new(Some(Ok(form))),
                fetch_calls: AtomicUsize::new(0),
            }
        }

        fn failing_register(err: ClientError) -> Self {
            Self {
                register: Mutex::new(Some(err)),
                fetch: Mutex::new(Some(Ok(two_section_form()))),
                fetch_calls: AtomicUsize::new(0),
            }
        }

        fn failing_fetch(err: ClientError) -> Self {
            Self {
                register: Mutex::new(None),
                fetch: Mutex::new(Some(Err(err))),
                fetch_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SchemaService for FakeService {
        async fn register(&self, _identity: &Identity) -> Result<(), ClientError> {
            match self.register.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn fetch_form(&self, _roll_number: &str) -> Result<FormSpec, ClientError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.fetch
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(two_section_form()))
        }
    }

    async fn registered() -> FormSession {
        let mut session = FormSession::new();
        session
            .register(&FakeService::ok(two_section_form()), Identity::new("R1", "Alice"))
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_register_activates_session() {
        let session = registered().await;
        assert!(session.is_registered());
        assert_eq!(session.cursor(), Some(0));
        assert_eq!(session.progress(), Some((1, 2)));
        assert_eq!(session.identity().unwrap().name, "Alice");
        assert!(session.errors().unwrap().is_empty());
        assert!(session.values().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_failure_skips_fetch_and_allows_retry() {
        let service = FakeService::failing_register(ClientError::Registration {
            status: 500,
            body: "down".into(),
        });
        let mut session = FormSession::new();

        let err = session
            .register(&service, Identity::new("R1", "Alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Registration { status: 500, .. }));
        assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_registered());
        assert!(session.failure().is_none());

        session
            .register(&service, Identity::new("R1", "Alice"))
            .await
            .unwrap();
        assert!(session.is_registered());
    }

    #[tokio::test]
    async fn test_schema_error_is_fatal() {
        let service = FakeService::failing_fetch(ClientError::Schema(SchemaError::NoSections));
        let mut session = FormSession::new();

        let err = session
            .register(&service, Identity::new("R1", "Alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Schema(SchemaError::NoSections)));
        assert_eq!(session.failure(), Some(&SchemaError::NoSections));

        let again = session.begin_registration(Identity::new("R1", "Alice"));
        assert!(matches!(again, Err(ClientError::Schema(_))));
    }

    #[test]
    fn test_stale_registration_is_discarded() {
        let mut session = FormSession::new();
        let first = session.begin_registration(Identity::new("R1", "Old")).unwrap();
        let second = session.begin_registration(Identity::new("R2", "New")).unwrap();

        // the newer attempt lands first
        session
            .complete_registration(second, Ok(two_section_form()))
            .unwrap();

        let err = session
            .complete_registration(first, Ok(two_section_form()))
            .unwrap_err();
        assert!(matches!(err, ClientError::Superseded { attempt: 1 }));
        assert_eq!(session.identity().unwrap().roll_number, "R2");
    }

    #[test]
    fn test_stale_failure_does_not_touch_state() {
        let mut session = FormSession::new();
        let first = session.begin_registration(Identity::new("R1", "Old")).unwrap();
        let second = session.begin_registration(Identity::new("R1", "Old")).unwrap();

        let err = session
            .complete_registration(first, Err(ClientError::Schema(SchemaError::NoSections)))
            .unwrap_err();
        assert!(matches!(err, ClientError::Superseded { .. }));
        assert!(session.failure().is_none());

        session
            .complete_registration(second, Ok(two_section_form()))
            .unwrap();
        assert!(session.is_registered());
    }

    #[tokio::test]
    async fn test_next_gates_on_section_errors() {
        let mut session = registered().await;

        let blocked = session.next().unwrap_err();
        assert_eq!(blocked.reason, BlockReason::InvalidSection);
        assert_eq!(session.errors().unwrap()["name"], "Name is required.");
        assert_eq!(session.cursor(), Some(0));

        session.set_value("name", "Alice").unwrap();
        assert_eq!(session.next(), Ok(Step::Advanced { from: 0, to: 1 }));
        assert_eq!(session.cursor(), Some(1));
        assert!(session.errors().unwrap().is_empty());
        assert!(session.is_last_section());
    }

    #[tokio::test]
    async fn test_set_value_does_not_revalidate() {
        let mut session = registered().await;
        session.next().unwrap_err();
        session.set_value("name", "Alice").unwrap();
        // errors stay until the next attempt
        assert_eq!(session.errors().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prev_clears_errors_of_left_section() {
        let mut session = registered().await;
        session.set_value("name", "Alice").unwrap();
        session.next().unwrap();

        session.submit().unwrap_err();
        assert_eq!(session.errors().unwrap().len(), 1);

        assert_eq!(session.prev(), Step::Retreated { from: 1, to: 0 });
        assert!(session.errors().unwrap().is_empty());
        assert_eq!(session.prev(), Step::Stayed);
    }

    #[tokio::test]
    async fn test_dropdown_values_are_tagged() {
        let mut session = registered().await;
        session.set_value("track", "be").unwrap();
        session.set_value("name", "Alice").unwrap();
        assert_eq!(
            session.value("track"),
            Some(&FieldValue::Selected("be".into()))
        );
        assert_eq!(session.value("name"), Some(&FieldValue::Text("Alice".into())));

        session.clear_value("name").unwrap();
        assert_eq!(session.value("name"), None);
    }

    #[tokio::test]
    async fn test_submit_fires_once_with_all_values() {
        let mut session = registered().await;
        session.set_value("name", "Alice").unwrap();
        session.next().unwrap();
        session.set_value("track", "be").unwrap();

        let mut sink: Vec<Submission> = Vec::new();
        let submission = session.submit().unwrap();
        sink.deliver(submission).unwrap();

        let blocked = session.submit().unwrap_err();
        assert_eq!(blocked.reason, BlockReason::AlreadySubmitted);
        assert!(session.is_submitted());

        assert_eq!(sink.len(), 1);
        let delivered = &sink[0];
        assert_eq!(delivered.form_id, "signup");
        assert_eq!(delivered.version, "2");
        assert_eq!(delivered.values.len(), 2);
        assert_eq!(delivered.values.get("name").unwrap().as_str(), "Alice");
    }

    #[test]
    fn test_actions_before_registration() {
        let mut session = FormSession::new();
        assert!(matches!(
            session.set_value("name", "x"),
            Err(ClientError::NotRegistered)
        ));
        assert_eq!(session.next().unwrap_err().reason, BlockReason::NotRegistered);
        assert_eq!(session.submit().unwrap_err().reason, BlockReason::NotRegistered);
        assert_eq!(session.prev(), Step::Stayed);
        assert!(session.form().is_none());
    }

    #[test]
    fn test_with_form_starts_at_first_section() {
        let mut session = FormSession::with_form(Identity::new("offline", "-"), two_section_form());
        assert_eq!(session.cursor(), Some(0));
        assert_eq!(session.active_section().unwrap().title, "Who");
        session.set_value("name", "Ravi").unwrap();
        session.next().unwrap();
        assert_eq!(session.active_section().unwrap().title, "What");
    }

    #[tokio::test]
    async fn test_cannot_register_twice() {
        let mut session = registered().await;
        assert!(matches!(
            session.begin_registration(Identity::new("R9", "Bob")),
            Err(ClientError::AlreadyRegistered)
        ));
    }
}
