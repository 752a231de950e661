use crate::{validate, Id, Question};
use alloc::{string::String, vec::Vec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A persisted quiz. The question list holds plain references which are not
/// checked for existence when written. Readers must tolerate dangling entries.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: Id,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered question references. Duplicates are allowed.
    pub questions: Vec<Id>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

impl Quiz {
    pub fn to_new(&self) -> NewQuiz {
        NewQuiz {
            title: self.title.clone(),
            description: self.description.clone(),
            questions: self.questions.clone(),
        }
    }

    /// Resolves every reference through `resolve`, silently dropping the ones
    /// that no longer point to a question. Order and duplicates are kept.
    pub fn populate_with<F>(self, resolve: F) -> PopulatedQuiz
    where
        F: FnMut(Id) -> Option<Question>,
    {
        let Self { id, title, description, questions, created_at, updated_at, version } = self;
        let questions = questions.into_iter().filter_map(resolve).collect();
        PopulatedQuiz { id, title, description, questions, created_at, updated_at, version }
    }
}

/// A quiz whose references have been replaced by the full question records.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedQuiz {
    pub id: Id,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

/// A validated quiz that is ready to be persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuiz {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Id>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuizPatch {
    pub title: Option<String>,
    /// `None` keeps the current description while `Some(None)` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Replaces the reference list wholesale when present.
    pub questions: Option<Vec<Id>>,
}

/// Tells an explicit `null` apart from a missing field.
fn nullable<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(de).map(Some)
}

impl QuizPatch {
    pub fn into_new(self) -> validate::Result<NewQuiz> {
        let Self { title, description, questions } = self;
        let title = validate::title(title.unwrap_or_default())?;
        let description = description.flatten().map(validate::trimmed);
        Ok(NewQuiz { title, description, questions: questions.unwrap_or_default() })
    }

    pub fn merge_into(self, current: NewQuiz) -> validate::Result<NewQuiz> {
        let Self { title, description, questions } = self;
        let merged = Self {
            title: Some(title.unwrap_or(current.title)),
            description: Some(description.unwrap_or(current.description)),
            questions: Some(questions.unwrap_or(current.questions)),
        };
        merged.into_new()
    }
}
