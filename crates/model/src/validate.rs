use alloc::{string::String, vec::Vec};
use core::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invalid {
    /// The question text is absent or blank.
    MissingText,
    /// Fewer than two options were supplied.
    TooFewOptions,
    /// No correct answer index was supplied.
    MissingAnswer,
    /// The correct answer index does not point into the options.
    AnswerOutOfRange,
    /// The quiz title is absent or blank.
    MissingTitle,
    /// A bulk payload contained no questions.
    EmptyBatch,
}

impl Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingText => "A question must have non-empty text.",
            Self::TooFewOptions => "A question must have at least two options.",
            Self::MissingAnswer => "A question must have a correctAnswerIndex.",
            Self::AnswerOutOfRange => "correctAnswerIndex must be a valid index in options array.",
            Self::MissingTitle => "A quiz must have a non-empty title.",
            Self::EmptyBatch => "Body must be a non-empty array.",
        })
    }
}

pub type Result<T> = core::result::Result<T, Invalid>;

/// Trims surrounding whitespace, reusing the allocation when nothing changes.
pub fn trimmed(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.len() == raw.len() {
        raw
    } else {
        trimmed.into()
    }
}

pub fn text(raw: String) -> Result<String> {
    let text = trimmed(raw);
    if text.is_empty() {
        Err(Invalid::MissingText)
    } else {
        Ok(text)
    }
}

pub fn title(raw: String) -> Result<String> {
    let title = trimmed(raw);
    if title.is_empty() {
        Err(Invalid::MissingTitle)
    } else {
        Ok(title)
    }
}

pub fn options(options: &[String]) -> Result<()> {
    if options.len() < 2 {
        Err(Invalid::TooFewOptions)
    } else {
        Ok(())
    }
}

/// Checks that `index` points into the options and narrows it to its stored width.
pub fn answer(index: i64, options: &[String]) -> Result<u32> {
    usize::try_from(index)
        .ok()
        .filter(|&index| index < options.len())
        .and_then(|index| u32::try_from(index).ok())
        .ok_or(Invalid::AnswerOutOfRange)
}

pub fn batch<T>(items: &[T]) -> Result<()> {
    if items.is_empty() {
        Err(Invalid::EmptyBatch)
    } else {
        Ok(())
    }
}

pub fn keywords(keywords: Vec<String>) -> Vec<String> {
    keywords.into_iter().map(trimmed).filter(|word| !word.is_empty()).collect()
}
