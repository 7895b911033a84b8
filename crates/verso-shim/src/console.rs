use std::io::{BufRead, IsTerminal, Write};

/// How the dispatcher talks to the user around a dispatched command.
pub trait Console {
    fn notice(&self, message: &str);

    /// Ask a yes/no question where an empty answer means yes.
    fn confirm(&self, question: &str) -> bool;
}

/// Writes to stderr so the dispatched command's stdout stays clean. Never
/// prompts unless stdin is a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn notice(&self, message: &str) {
        eprintln!("verso: {message}");
    }

    fn confirm(&self, question: &str) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return false;
        }

        let mut stderr = std::io::stderr();
        if write!(stderr, "verso: {question} [Y/n] ").is_err() || stderr.flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}
