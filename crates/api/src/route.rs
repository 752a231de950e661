use crate::error::{Error, Result};
use model::Id;

#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Index,
    /// Endpoint catalog for frontends.
    Info,
    Health,
    /// Raw question dump with a count.
    DebugQuestions,
    Questions,
    Question(Id),
    Quizzes,
    Quiz(Id),
    /// Quiz with its questions filtered by a search term.
    Populate(Id),
    /// Create one question and attach it to the quiz.
    AttachOne(Id),
    /// Create a batch of questions and attach them to the quiz.
    AttachMany(Id),
}

fn parse_id(raw: &str, param: &'static str) -> Result<Id> {
    raw.parse().map_err(|_| Error::MalformedId(param))
}

impl Route {
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim_end_matches('/');
        let mut segments = path.split('/').skip(1);
        let route = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (None, ..) => Self::Index,
            (Some("health"), None, ..) => Self::Health,
            (Some("api"), Some("info"), None, ..) => Self::Info,
            (Some("debug"), Some("questions"), None, ..) => Self::DebugQuestions,
            (Some("questions"), None, ..) => Self::Questions,
            (Some("questions"), Some(id), None, ..) => Self::Question(parse_id(id, "questionId")?),
            (Some("quizzes"), None, ..) => Self::Quizzes,
            (Some("quizzes"), Some(id), None, ..) => Self::Quiz(parse_id(id, "quizId")?),
            (Some("quizzes"), Some(id), Some(action), None) => {
                let id = parse_id(id, "quizId")?;
                match action {
                    "populate" => Self::Populate(id),
                    "question" => Self::AttachOne(id),
                    "questions" => Self::AttachMany(id),
                    _ => return Err(Error::UnknownRoute),
                }
            }
            _ => return Err(Error::UnknownRoute),
        };
        Ok(route)
    }
}

/// Looks up the value of `key` in a raw query string. Values are taken verbatim.
pub fn query_param<'q>(query: &'q str, key: &str) -> Option<&'q str> {
    query.split('&').find_map(|chunk| {
        let (name, value) = chunk.split_once('=')?;
        (name == key).then_some(value)
    })
}
