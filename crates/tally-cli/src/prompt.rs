use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

use tally_db::conflict::{DuplicateTitleError, OptimisticLockError};
use tally_sync::ConflictPrompt;

/// Conflict prompt on stderr, answers read from `input`.
pub struct TerminalPrompt<R> {
    input: Mutex<R>,
}

impl TerminalPrompt<io::BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(io::BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send> TerminalPrompt<R> {
    pub const fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }

    /// Blocks the calling thread until a line arrives. `ConflictPolicy` is
    /// synchronous, and the CLI runs one explicit save at a time.
    fn ask(&self, question: &str) -> Option<String> {
        eprint!("{question}");
        let _ = io::stderr().flush();
        let mut line = String::new();
        let read = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_line(&mut line);
        match read {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `"2"` picks the second suggestion, other text is taken as a title, and an
/// empty answer cancels.
fn interpret_choice(answer: &str, suggestions: &[String]) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=suggestions.len()).contains(&n) => suggestions.get(n - 1).cloned(),
        _ => Some(answer.to_string()),
    }
}

impl<R: BufRead + Send> ConflictPrompt for TerminalPrompt<R> {
    fn notify(&self, message: &str) {
        eprintln!("conflict: {message}");
    }

    fn confirm_retry(&self, conflict: &OptimisticLockError) -> bool {
        self.ask(&format!(
            "Stored decision is at version {}. Overwrite it with your changes? [y/N] ",
            conflict.actual_version
        ))
        .is_some_and(|a| is_yes(&a))
    }

    fn choose_title(&self, _conflict: &DuplicateTitleError, suggestions: &[String]) -> Option<String> {
        for (i, title) in suggestions.iter().enumerate() {
            eprintln!("  {}) {title}", i + 1);
        }
        let answer = self.ask("Pick a title by number, type another, or press enter to cancel: ")?;
        interpret_choice(&answer, suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn suggestions() -> Vec<String> {
        vec!["Plan (2)".into(), "Plan (3)".into()]
    }

    #[test]
    fn choice_by_number_or_text() {
        assert_eq!(interpret_choice("2", &suggestions()).as_deref(), Some("Plan (3)"));
        assert_eq!(interpret_choice("Other plan", &suggestions()).as_deref(), Some("Other plan"));
        assert_eq!(interpret_choice("7", &suggestions()).as_deref(), Some("7"));
        assert_eq!(interpret_choice("  ", &suggestions()), None);
    }

    #[test]
    fn reads_answers_from_input() {
        let prompt = TerminalPrompt::new(Cursor::new("yes\n1\n"));
        let lock = OptimisticLockError {
            decision_id: "dec-1".into(),
            expected_version: 1,
            actual_version: 3,
        };
        assert!(prompt.confirm_retry(&lock));
        let dup = DuplicateTitleError {
            existing_id: None,
            conflicting_title: "Plan".into(),
        };
        assert_eq!(prompt.choose_title(&dup, &suggestions()).as_deref(), Some("Plan (2)"));
        // Input exhausted: treated as a refusal.
        assert!(!prompt.confirm_retry(&lock));
    }
}
