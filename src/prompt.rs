use std::io::{self, BufRead, Write};

use crate::error::PipelineResult;

/// Answer to a yes/no gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Decline,
}

impl Decision {
    /// Only `y` proceeds; anything else, including an empty line, declines.
    pub fn from_answer(answer: &str) -> Self {
        if answer.trim().eq_ignore_ascii_case("y") {
            Decision::Proceed
        } else {
            Decision::Decline
        }
    }
}

pub fn confirm_question(verb: &str) -> String {
    format!("Do you want to {verb} the files? (y/n) ")
}

/// Source of the user's answers.
pub trait Prompter {
    /// Shows `question` and returns the raw answer without its line ending.
    fn ask(&mut self, question: &str) -> PipelineResult<String>;
}

pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&mut self, question: &str) -> PipelineResult<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{question}")?;
        stdout.flush()?;

        let mut answer = String::new();
        // EOF reads as an empty answer.
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}
