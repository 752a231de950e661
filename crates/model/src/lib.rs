#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod id;
pub mod question;
pub mod quiz;
pub mod validate;

pub use chrono::{DateTime, Utc};
pub use id::Id;
pub use question::{NewQuestion, Question, QuestionPatch};
pub use quiz::{NewQuiz, PopulatedQuiz, Quiz, QuizPatch};
