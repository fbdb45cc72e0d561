//! Terminal input
//!
//! One line of stdin is one command. What a line means depends on the
//! screen: while a question is open it is an answer, after scoring it
//! moves on, and on the result screen it picks retry, complete, or quit.
//! `:q` quits from anywhere.

use crate::error::InputError;
use crate::lesson::{Answer, QuestionKind};
use crate::phase::Outcome;

/// What the player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer the open question
    Answer(Answer),
    /// Move past the scored question
    Next,
    /// Start the lesson again
    Retry,
    /// Mark the lesson done and return to the lesson browser
    Complete,
    /// Leave without completing
    Quit,
}

/// Screen the input arrives on.
#[derive(Debug, Clone, Copy)]
pub enum Prompt<'a> {
    /// A question is open for answers
    Question(&'a QuestionKind),
    /// The question was scored; waiting for "next"
    Scored,
    /// The session is over
    Finished(Outcome),
}

/// Parses one input line for the given screen.
///
/// # Errors
///
/// Returns `InputError` when the line does not fit the screen. Nothing
/// about the session changes in that case.
pub fn parse_command(line: &str, prompt: Prompt<'_>) -> Result<Command, InputError> {
    let trimmed = line.trim();
    if trimmed == ":q" {
        return Ok(Command::Quit);
    }
    let word = trimmed.to_lowercase();

    match prompt {
        Prompt::Question(kind) => parse_answer(kind, trimmed).map(Command::Answer),
        Prompt::Scored => match word.as_str() {
            "" | "n" | "next" => Ok(Command::Next),
            "q" | "quit" => Ok(Command::Quit),
            _ => Err(InputError::Unavailable {
                input: trimmed.to_owned(),
                hint: "[enter] to continue",
            }),
        },
        Prompt::Finished(outcome) => match (word.as_str(), outcome) {
            ("r" | "retry", _) => Ok(Command::Retry),
            ("c" | "complete", Outcome::Won) => Ok(Command::Complete),
            ("q" | "quit", _) => Ok(Command::Quit),
            (_, Outcome::Won) => Err(InputError::Unavailable {
                input: trimmed.to_owned(),
                hint: "c, r or q",
            }),
            (_, Outcome::Lost) => Err(InputError::Unavailable {
                input: trimmed.to_owned(),
                hint: "r or q",
            }),
        },
    }
}

/// Interprets a line as an answer to a question of `kind`.
///
/// Options are numbered from 1 or lettered from `a`. Free text is passed
/// through untouched; the evaluator normalizes it.
///
/// # Errors
///
/// Returns `InputError` for a choice outside the option list or a
/// true/false line that is neither.
pub fn parse_answer(kind: &QuestionKind, line: &str) -> Result<Answer, InputError> {
    match kind {
        QuestionKind::SingleChoice { options, .. } => {
            let count = options.len();
            choice_index(line, count)
                .map(Answer::Choice)
                .ok_or(InputError::NotAChoice { count })
        }
        QuestionKind::TrueFalse { .. } => match line.to_lowercase().as_str() {
            "1" | "t" | "true" | "đúng" => Ok(Answer::Bool(true)),
            "2" | "f" | "false" | "sai" => Ok(Answer::Bool(false)),
            _ => Err(InputError::NotABool),
        },
        QuestionKind::ShortAnswer { .. } => Ok(Answer::Text(line.to_owned())),
    }
}

fn choice_index(line: &str, count: usize) -> Option<usize> {
    let index = match line.parse::<usize>() {
        Ok(number) => number.checked_sub(1)?,
        Err(_) => {
            let mut chars = line.chars();
            let letter = chars.next()?.to_ascii_lowercase();
            if chars.next().is_some() || !letter.is_ascii_lowercase() {
                return None;
            }
            usize::from(u8::try_from(letter).ok()? - b'a')
        }
    };
    (index < count).then_some(index)
}
