use crate::{validate, Id};
use alloc::{string::String, vec::Vec};
use chrono::{DateTime, Utc};
use core::fmt;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};

/// A persisted multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Id,
    /// Prompt shown to the quiz taker.
    pub text: String,
    /// Possible answers to select from. Always at least two.
    pub options: Vec<String>,
    /// Index of the option with the correct answer.
    pub correct_answer_index: u32,
    /// Search terms used when filtering a quiz's questions.
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every write. Guards read-modify-write updates.
    pub version: i32,
}

impl Question {
    /// Strips the storage metadata, leaving only the user-supplied fields.
    pub fn to_new(&self) -> NewQuestion {
        NewQuestion {
            text: self.text.clone(),
            options: self.options.clone(),
            correct_answer_index: self.correct_answer_index,
            keywords: self.keywords.clone(),
        }
    }
}

/// A validated question that is ready to be persisted. The only way to obtain
/// one outside of this crate is through [`QuestionPatch`], which upholds
/// `correct_answer_index < options.len()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer_index: u32,
    pub keywords: Vec<String>,
}

/// Question fields as submitted by a client. Every field is optional so that
/// the same schema serves creation and partial updates alike.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub options: Option<Vec<String>>,
    #[serde(default, deserialize_with = "answer_index")]
    pub correct_answer_index: Option<i64>,
    pub keywords: Option<Vec<String>>,
}

/// Any JSON number is accepted as an answer index. Whole floats such as `1.0`
/// count as integers. Fractions map to `-1`, which validation rejects as out of range.
fn answer_index<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Index(i64);

    impl<'de> Deserialize<'de> for Index {
        fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
            struct IndexVisitor;

            impl Visitor<'_> for IndexVisitor {
                type Value = Index;

                fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                    fmt.write_str("a number")
                }

                fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                    Ok(Index(value))
                }

                fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                    Ok(Index(i64::try_from(value).unwrap_or(i64::MAX)))
                }

                fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                    let whole = value as i64;
                    Ok(Index(if whole as f64 == value { whole } else { -1 }))
                }
            }

            de.deserialize_any(IndexVisitor)
        }
    }

    Ok(Option::<Index>::deserialize(de)?.map(|Index(index)| index))
}

impl QuestionPatch {
    /// Validates the patch as a brand new question.
    pub fn into_new(self) -> validate::Result<NewQuestion> {
        let Self { text, options, correct_answer_index, keywords } = self;
        let text = validate::text(text.unwrap_or_default())?;
        let options = options.unwrap_or_default();
        validate::options(&options)?;
        let index = correct_answer_index.ok_or(validate::Invalid::MissingAnswer)?;
        let correct_answer_index = validate::answer(index, &options)?;
        let keywords = validate::keywords(keywords.unwrap_or_default());
        Ok(NewQuestion { text, options, correct_answer_index, keywords })
    }

    /// Applies the provided fields onto `current` and re-validates the result.
    /// The answer index is always checked against the merged options.
    pub fn merge_into(self, current: NewQuestion) -> validate::Result<NewQuestion> {
        let Self { text, options, correct_answer_index, keywords } = self;
        let merged = Self {
            text: Some(text.unwrap_or(current.text)),
            options: Some(options.unwrap_or(current.options)),
            correct_answer_index: Some(correct_answer_index.unwrap_or(current.correct_answer_index.into())),
            keywords: Some(keywords.unwrap_or(current.keywords)),
        };
        merged.into_new()
    }
}
