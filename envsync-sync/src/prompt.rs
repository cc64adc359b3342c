//! Line-based terminal prompts.
//!
//! Used for manual conflict resolution and the optional push confirmation.
//! Retries are bounded: after [`MAX_ATTEMPTS`] unrecognised answers the
//! prompt gives up with [`PromptError::TooManyInvalidAnswers`].

use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal, Write};

use thiserror::Error;

pub const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input closed before an answer was given")]
    Eof,

    #[error("no interactive terminal available")]
    NotInteractive,

    #[error("gave up after {attempts} invalid answers")]
    TooManyInvalidAnswers { attempts: usize },
}

/// Source of human answers.
pub trait Prompter: Send {
    /// Whether a human can answer. Manual resolution refuses to start
    /// otherwise.
    fn is_interactive(&self) -> bool;

    /// Show `prompt` and read one line, without its line terminator.
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError>;
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Declined,
}

/// Answer for one conflicting key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyChoice {
    UseLocal,
    UseRemote,
    NewValue(String),
}

/// Ask whether a detected local change should be published.
///
/// Anything but `y`/`yes` declines; declining is not an error.
pub fn confirm_push(prompter: &mut dyn Prompter, path: &str) -> Result<ConfirmOutcome, PromptError> {
    if !prompter.is_interactive() {
        return Err(PromptError::NotInteractive);
    }
    let answer = prompter.read_line(&format!("{path} changed. Push to remote? [y/N]: "))?;
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(ConfirmOutcome::Confirmed),
        _ => Ok(ConfirmOutcome::Declined),
    }
}

/// Ask which value to keep for a key changed on both sides.
pub fn choose_for_key(
    prompter: &mut dyn Prompter,
    key: &str,
    local: &str,
    remote: &str,
) -> Result<KeyChoice, PromptError> {
    if !prompter.is_interactive() {
        return Err(PromptError::NotInteractive);
    }

    let question = format!(
        "Conflict on {key}\n  local:  {local}\n  remote: {remote}\nKeep (l)ocal, (r)emote or (e)dit? "
    );
    for attempt in 1..=MAX_ATTEMPTS {
        let answer = prompter.read_line(&question)?;
        match answer.trim().to_ascii_lowercase().as_str() {
            "l" | "local" => return Ok(KeyChoice::UseLocal),
            "r" | "remote" => return Ok(KeyChoice::UseRemote),
            "e" | "edit" => {
                let value = prompter.read_line(&format!("New value for {key}: "))?;
                return Ok(KeyChoice::NewValue(value.trim().to_string()));
            }
            other => {
                tracing::debug!("invalid answer '{other}' for {key} (attempt {attempt})");
            }
        }
    }
    Err(PromptError::TooManyInvalidAnswers {
        attempts: MAX_ATTEMPTS,
    })
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// stdin/stdout prompter; interactive iff stdin is a terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(PromptError::Eof);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// Replays queued answers and records every prompt shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    interactive: bool,
    pub prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            interactive: true,
            prompts: Vec::new(),
        }
    }

    /// A prompter that reports no terminal.
    pub fn non_interactive() -> Self {
        Self::default()
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or(PromptError::Eof)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("y", ConfirmOutcome::Confirmed)]
    #[case("YES", ConfirmOutcome::Confirmed)]
    #[case("n", ConfirmOutcome::Declined)]
    #[case("", ConfirmOutcome::Declined)]
    #[case("maybe", ConfirmOutcome::Declined)]
    fn confirm_accepts_only_yes(#[case] answer: &str, #[case] expected: ConfirmOutcome) {
        let mut prompter = ScriptedPrompter::new([answer]);
        assert_eq!(confirm_push(&mut prompter, ".env").unwrap(), expected);
    }

    #[test]
    fn confirm_without_terminal_is_an_error() {
        let mut prompter = ScriptedPrompter::non_interactive();
        assert!(matches!(
            confirm_push(&mut prompter, ".env"),
            Err(PromptError::NotInteractive)
        ));
    }

    #[rstest]
    #[case(&["l"], KeyChoice::UseLocal)]
    #[case(&["remote"], KeyChoice::UseRemote)]
    #[case(&["x", " L "], KeyChoice::UseLocal)]
    #[case(&["e", "  fresh  "], KeyChoice::NewValue("fresh".to_string()))]
    fn choose_parses_answers(#[case] answers: &[&str], #[case] expected: KeyChoice) {
        let mut prompter = ScriptedPrompter::new(answers.iter().copied());
        assert_eq!(choose_for_key(&mut prompter, "A", "9", "8").unwrap(), expected);
    }

    #[test]
    fn choose_shows_both_values() {
        let mut prompter = ScriptedPrompter::new(["r"]);
        choose_for_key(&mut prompter, "DB_URL", "local-db", "remote-db").unwrap();
        assert!(prompter.prompts[0].contains("local-db"));
        assert!(prompter.prompts[0].contains("remote-db"));
    }

    #[test]
    fn choose_gives_up_after_bounded_attempts() {
        let mut prompter = ScriptedPrompter::new(["?", "??", "???", "l"]);
        let err = choose_for_key(&mut prompter, "A", "1", "2").unwrap_err();
        assert!(matches!(err, PromptError::TooManyInvalidAnswers { attempts: 3 }));
        assert_eq!(prompter.prompts.len(), MAX_ATTEMPTS);
    }

    #[test]
    fn choose_reports_closed_input() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        assert!(matches!(
            choose_for_key(&mut prompter, "A", "1", "2"),
            Err(PromptError::Eof)
        ));
    }
}
