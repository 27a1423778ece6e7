//! Fill command
//!
//! Registers the user, fetches their form and walks them through it.

use super::Context;
use crate::output::OutputFormat;
use crate::prompt::{Action, Answer, Prompter};
use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use dynform_client::{
    BlockReason, FormSession, Identity, SchemaService, Submission, SubmissionSink,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub struct FillArgs {
    pub roll_number: Option<String>,
    pub name: Option<String>,
    pub output: Option<PathBuf>,
}

pub async fn handle(args: FillArgs, ctx: &Context) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut prompter = Prompter::new(stdin.lock(), stdout.lock());

    let Some(identity) = identity(&args, ctx, &mut prompter)? else {
        return Ok(());
    };
    let service = ctx.service()?;
    let mut session = FormSession::new();
    if !register(&mut session, &service, identity, &mut prompter).await? {
        return Ok(());
    }

    let mut sink = PrintSink {
        format: ctx.format,
        output: args.output,
    };
    match run_form(&mut session, &mut prompter)? {
        Some(submission) => {
            prompter.say("Form submitted.".green().to_string())?;
            sink.deliver(submission)
        }
        None => {
            prompter.say("Left without submitting.")?;
            Ok(())
        }
    }
}

/// Identity from flags, environment or config, asking for whatever is missing.
fn identity<R: BufRead, W: Write>(
    args: &FillArgs,
    ctx: &Context,
    prompter: &mut Prompter<R, W>,
) -> Result<Option<Identity>> {
    let roll_number = match args.roll_number.clone().or_else(|| ctx.config.roll_number.clone()) {
        Some(roll) => roll,
        None => match prompter.ask_required("Roll Number: ")? {
            Some(roll) => roll,
            None => return Ok(None),
        },
    };
    let name = match args.name.clone().or_else(|| ctx.config.name.clone()) {
        Some(name) => name,
        None => match prompter.ask_required("Name: ")? {
            Some(name) => name,
            None => return Ok(None),
        },
    };
    Ok(Some(Identity::new(roll_number, name)))
}

/// Register until it works, the user gives up, or the schema turns out bad.
async fn register<S, R, W>(
    session: &mut FormSession,
    service: &S,
    identity: Identity,
    prompter: &mut Prompter<R, W>,
) -> Result<bool>
where
    S: SchemaService + ?Sized,
    R: BufRead,
    W: Write,
{
    loop {
        match session.register(service, identity.clone()).await {
            Ok(_) => return Ok(true),
            Err(err) if err.is_retryable() => {
                tracing::warn!(error = %err, "registration failed");
                prompter.say(
                    "Could not register or fetch the form. Please try again."
                        .red()
                        .to_string(),
                )?;
                if !prompter.confirm("Retry?")? {
                    return Ok(false);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Section loop. Returns the submission, or `None` when the user quits.
pub fn run_form<R: BufRead, W: Write>(
    session: &mut FormSession,
    prompter: &mut Prompter<R, W>,
) -> Result<Option<Submission>> {
    let form = session.form().cloned().context("no form loaded")?;
    let mut ask_all = true;

    loop {
        let cursor = session.cursor().context("no form loaded")?;
        let section = form.section(cursor).context("section out of range")?;
        prompter.section_header(form.title(), section, (cursor + 1, form.section_count()))?;

        let errors = session.errors().cloned().unwrap_or_default();
        let fields = section
            .fields
            .iter()
            .filter(|f| ask_all || errors.contains_key(&f.field_id));
        for field in fields {
            let answer = prompter.field(
                field,
                session.value(&field.field_id),
                errors.get(&field.field_id).map(String::as_str),
            )?;
            match answer {
                None => return Ok(None),
                Some(Answer::Keep) => {}
                Some(Answer::Clear) => session.clear_value(&field.field_id)?,
                Some(Answer::Value(value)) => session.set_value(&field.field_id, value)?,
            }
        }

        loop {
            let action = prompter.action(cursor == 0, session.is_last_section())?;
            let result = match action {
                None | Some(Action::Quit) => return Ok(None),
                Some(Action::Edit) => {
                    ask_all = true;
                    break;
                }
                Some(Action::Prev) => {
                    session.prev();
                    ask_all = true;
                    break;
                }
                Some(Action::Next) => session.next().map(|_| None),
                Some(Action::Submit) => session.submit().map(Some),
            };

            match result {
                Ok(Some(submission)) => return Ok(Some(submission)),
                Ok(None) => {
                    ask_all = true;
                    break;
                }
                Err(blocked) => match blocked.reason {
                    BlockReason::InvalidSection => {
                        prompter.show_errors(section, &blocked.errors)?;
                        ask_all = false;
                        break;
                    }
                    BlockReason::LastSection => {
                        prompter.say("This is the last section; submit to finish.")?;
                    }
                    BlockReason::NotLastSection => {
                        prompter.say("Complete the remaining sections before submitting.")?;
                    }
                    BlockReason::AlreadySubmitted | BlockReason::NotRegistered => {
                        bail!("cannot continue: {}", blocked.reason)
                    }
                },
            }
        }
    }
}

/// Prints the submission and optionally saves it as JSON.
pub struct PrintSink {
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl SubmissionSink for PrintSink {
    type Error = anyhow::Error;

    fn deliver(&mut self, submission: Submission) -> Result<()> {
        if let Some(path) = &self.output {
            let json = serde_json::to_string_pretty(&submission)?;
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "submission saved");
        }
        self.format.print(&submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynform_client::{FieldValue, FormSpec};
    use std::io::Cursor;

    fn form() -> FormSpec {
        FormSpec::from_json(
            br#"{ "message": "ok", "form": { "formTitle": "Signup", "formId": "signup", "version": "1",
                "sections": [
                    { "sectionId": 1, "title": "Who", "description": "About you", "fields": [
                        { "fieldId": "name", "type": "text", "label": "Name", "required": true } ] },
                    { "sectionId": 2, "title": "What", "description": "", "fields": [
                        { "fieldId": "track", "type": "dropdown", "label": "Track", "required": true,
                          "options": [ { "value": "be", "label": "Backend" }, { "value": "fe", "label": "Frontend" } ] },
                        { "fieldId": "bio", "type": "textarea", "label": "Bio", "required": false, "maxLength": 5 } ] }
                ] } }"#,
        )
        .unwrap()
    }

    fn run(input: &str) -> (Option<Submission>, String) {
        let mut session = FormSession::with_form(Identity::new("R1", "Test"), form());
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let submission = run_form(&mut session, &mut prompter).unwrap();
        (submission, String::from_utf8(prompter.into_output()).unwrap())
    }

    #[test]
    fn test_walkthrough_with_correction() {
        // blank name, next (blocked), fix name, next,
        // pick option 2, too-long bio, submit (blocked), fix bio, submit
        let input = "\nn\nAlice\nn\n2\nabcdefg\ns\nabc\ns\n";
        let (submission, out) = run(input);

        let submission = submission.expect("form should be submitted");
        assert_eq!(submission.form_id, "signup");
        assert_eq!(submission.values.get("name"), Some(&FieldValue::Text("Alice".into())));
        assert_eq!(submission.values.get("track"), Some(&FieldValue::Selected("fe".into())));
        assert_eq!(submission.values.get("bio").unwrap().as_str(), "abc");

        assert!(out.contains("Name is required."));
        assert!(out.contains("Bio must be less than 5 characters."));
        assert!(out.contains("[2/2]"));
    }

    #[test]
    fn test_prev_and_quit() {
        let input = "Bob\nn\n\n\np\n\nq\n";
        let (submission, out) = run(input);
        assert!(submission.is_none());
        assert_eq!(out.matches("[1/2]").count(), 2);
    }

    #[test]
    fn test_next_on_last_section_points_to_submit() {
        let input = "Bob\nn\n1\n\nn\ns\n";
        let (submission, out) = run(input);
        assert!(out.contains("This is the last section; submit to finish."));
        assert_eq!(submission.unwrap().values.len(), 2);
    }

    #[test]
    fn test_end_of_input_leaves_without_submission() {
        let (submission, _) = run("Bob\n");
        assert!(submission.is_none());
    }

    #[test]
    fn test_sink_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.json");
        let mut session = FormSession::with_form(Identity::new("R1", "Test"), form());
        session.set_value("name", "Eve").unwrap();
        session.next().unwrap();
        session.set_value("track", "be").unwrap();
        let submission = session.submit().unwrap();

        let mut sink = PrintSink {
            format: OutputFormat::Json,
            output: Some(path.clone()),
        };
        sink.deliver(submission).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["formId"], "signup");
        assert_eq!(saved["values"]["track"], "be");
    }
}
