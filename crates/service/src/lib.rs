//! Consistency layer over the question and quiz stores.
//!
//! Quizzes reference questions by id and the store never enforces those
//! references, so every operation that can create or remove one goes through
//! [`Consistency`]. It guarantees the following:
//!
//! - Deleting a question pulls it from every quiz that references it.
//! - Deleting a quiz deletes the questions it referenced (see [`Config`]).
//! - Attaching new questions to a quiz either fully commits or leaves no
//!   question behind.
//!
//! Concurrent attaches to the same quiz are both applied since appending is a
//! single storage call. Read-modify-write updates are guarded by the record
//! version and fail with [`Error::Conflict`] instead of losing a write.

pub mod error;
pub mod filter;

mod attach;
mod question;
mod quiz;

use db::Store;
use model::{Id, PopulatedQuiz, Question, Quiz};
use std::collections::HashMap;

pub use error::{Error, Resource, Result};
pub use filter::Term;

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Whether deleting a quiz also deletes questions that other quizzes still
    /// reference. Enabled by default, which leaves those quizzes with dangling
    /// references that are filtered out on read.
    pub cascade_shared_questions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { cascade_shared_questions: true }
    }
}

pub struct Consistency {
    store: Box<dyn Store>,
    config: Config,
}

impl Consistency {
    pub fn new(store: Box<dyn Store>, config: Config) -> Self {
        Self { store, config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches every question referenced by `quizzes` in one lookup, keeping only
    /// those accepted by `predicate`.
    async fn lookup<'q, I, F>(&self, quizzes: I, predicate: F) -> Result<HashMap<Id, Question>>
    where
        I: IntoIterator<Item = &'q Quiz>,
        F: Fn(&Question) -> bool,
    {
        let ids: Vec<_> = quizzes.into_iter().flat_map(|quiz| quiz.questions.iter().copied()).collect();
        let found = self.store.find_questions(&ids).await.map_err(Error::store(Resource::Question))?;
        Ok(found.into_iter().filter(|question| predicate(question)).map(|question| (question.id, question)).collect())
    }

    async fn populate(&self, quiz: Quiz) -> Result<PopulatedQuiz> {
        let lookup = self.lookup([&quiz], |_| true).await?;
        Ok(quiz.populate_with(|id| lookup.get(&id).cloned()))
    }
}
