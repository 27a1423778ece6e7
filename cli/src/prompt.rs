//! Line-based terminal prompts
//!
//! Renders one section at a time and reads answers line by line. Generic
//! over reader and writer so the form loop can be driven from tests.

use colored::Colorize;
use dynform_client::{ErrorMap, FieldSpec, FieldValue, SectionSpec, Widget};
use std::io::{self, BufRead, Write};

/// Answer to a field prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Blank line: leave the value as it is
    Keep,
    /// `-`: forget the value
    Clear,
    Value(String),
}

/// Action after a section's fields were entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Prev,
    Submit,
    Edit,
    Quit,
}

impl Action {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "n" | "next" => Some(Action::Next),
            "p" | "prev" | "back" => Some(Action::Prev),
            "s" | "submit" => Some(Action::Submit),
            "e" | "edit" => Some(Action::Edit),
            "q" | "quit" | "exit" => Some(Action::Quit),
            _ => None,
        }
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", text.as_ref())
    }

    /// Read one line. `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until a non-blank answer arrives.
    pub fn ask_required(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            match self.ask(prompt)? {
                None => return Ok(None),
                Some(answer) if answer.trim().is_empty() => continue,
                Some(answer) => return Ok(Some(answer.trim().to_string())),
            }
        }
    }

    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(matches!(
            self.ask(&format!("{} [y/N] ", prompt))?.as_deref().map(str::trim),
            Some("y" | "Y" | "yes")
        ))
    }

    pub fn section_header(
        &mut self,
        form_title: &str,
        section: &SectionSpec,
        progress: (usize, usize),
    ) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", form_title.bold())?;
        writeln!(
            self.output,
            "{} {}",
            format!("[{}/{}]", progress.0, progress.1).dimmed(),
            section.title.bold()
        )?;
        if !section.description.is_empty() {
            writeln!(self.output, "{}", section.description)?;
        }
        Ok(())
    }

    pub fn show_errors(&mut self, section: &SectionSpec, errors: &ErrorMap) -> io::Result<()> {
        // in field order, not map order
        for field in &section.fields {
            if let Some(message) = errors.get(&field.field_id) {
                writeln!(self.output, "  {} {}", "!".red().bold(), message.red())?;
            }
        }
        Ok(())
    }

    /// Prompt for one field, showing its current value and error.
    pub fn field(
        &mut self,
        field: &FieldSpec,
        current: Option<&FieldValue>,
        error: Option<&str>,
    ) -> io::Result<Option<Answer>> {
        let marker = if field.required { "*" } else { "" };
        writeln!(self.output, "{}{}", field.label, marker.red())?;
        if let Some(error) = error {
            writeln!(self.output, "  {}", error.red())?;
        }

        let widget = field.kind.widget();
        match widget {
            Widget::Select => {
                writeln!(self.output, "  0) Select")?;
                for (i, option) in field.options().iter().enumerate() {
                    writeln!(self.output, "  {}) {}", i + 1, option.label)?;
                }
            }
            Widget::MultiLine => {
                writeln!(self.output, "  {}", "(end lines with \\ to continue)".dimmed())?;
            }
            Widget::SingleLine { .. } => {}
        }

        let mut hint = Vec::new();
        if let Some(placeholder) = &field.placeholder {
            hint.push(placeholder.clone());
        }
        if let Some(value) = current {
            let shown = match widget {
                Widget::Select => field
                    .option(value.as_str())
                    .map(|o| o.label.clone())
                    .unwrap_or_else(|| value.as_str().to_string()),
                _ => value.as_str().to_string(),
            };
            hint.push(format!("current: {}", shown));
        }
        let prompt = if hint.is_empty() {
            "> ".to_string()
        } else {
            format!("[{}] > ", hint.join("; "))
        };

        let Some(line) = self.ask(&prompt)? else {
            return Ok(None);
        };
        let line = match widget {
            Widget::MultiLine => self.continue_lines(line)?,
            _ => line,
        };

        Ok(Some(match line.as_str() {
            "" => Answer::Keep,
            "-" => Answer::Clear,
            _ => match widget {
                Widget::Select => select_answer(field, line.trim()),
                _ => Answer::Value(line),
            },
        }))
    }

    fn continue_lines(&mut self, mut text: String) -> io::Result<String> {
        while text.ends_with('\\') {
            text.pop();
            text.push('\n');
            match self.ask("  ")? {
                Some(more) => text.push_str(&more),
                None => break,
            }
        }
        Ok(text)
    }

    pub fn action(&mut self, is_first: bool, is_last: bool) -> io::Result<Option<Action>> {
        let mut choices = Vec::new();
        if !is_first {
            choices.push("[p]rev");
        }
        choices.push(if is_last { "[s]ubmit" } else { "[n]ext" });
        choices.push("[e]dit");
        choices.push("[q]uit");
        let prompt = format!("{} > ", choices.join(" "));

        loop {
            match self.ask(&prompt)? {
                None => return Ok(None),
                Some(input) => match Action::parse(&input) {
                    Some(action) => return Ok(Some(action)),
                    None => writeln!(self.output, "Unknown action: {}", input.trim())?,
                },
            }
        }
    }
}

/// A number picks the option at that position; `0` clears; anything else is
/// taken as an option value as typed.
fn select_answer(field: &FieldSpec, input: &str) -> Answer {
    match input.parse::<usize>() {
        Ok(0) => Answer::Clear,
        Ok(n) => match field.options().get(n - 1) {
            Some(option) => Answer::Value(option.value.clone()),
            None => Answer::Value(input.to_string()),
        },
        Err(_) => Answer::Value(input.to_string()),
    }
}
