use model::Question;

/// Term used by the populate endpoint when the client does not supply one.
pub const DEFAULT_TERM: &str = "capital";

/// Selects questions that are tagged with the term as a keyword, or that
/// mention it anywhere in their text regardless of case.
pub struct Term {
    keyword: Box<str>,
    lowercase: Box<str>,
}

impl Term {
    pub fn new(term: &str) -> Self {
        Self { keyword: term.into(), lowercase: term.to_lowercase().into_boxed_str() }
    }

    pub fn matches(&self, question: &Question) -> bool {
        question.keywords.iter().any(|keyword| **keyword == *self.keyword)
            || question.text.to_lowercase().contains(&*self.lowercase)
    }
}

impl Default for Term {
    fn default() -> Self {
        Self::new(DEFAULT_TERM)
    }
}
