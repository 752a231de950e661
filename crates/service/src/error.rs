use core::fmt::{self, Display};
use model::validate::Invalid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Question,
    Quiz,
}

impl Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Question => "Question",
            Self::Quiz => "Quiz",
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The submitted fields violate the data model.
    Validation(Invalid),
    /// The targeted record does not exist.
    NotFound(Resource),
    /// The targeted record was written by someone else in the meantime.
    Conflict(Resource),
    /// Storage failed. Details are logged, never shown to clients.
    Internal,
}

impl Error {
    /// Attributes a storage failure to the record the caller was working on.
    pub(crate) fn store(resource: Resource) -> impl Fn(db::error::Error) -> Self {
        move |err| match err {
            db::error::Error::NotFound => Self::NotFound(resource),
            db::error::Error::Conflict => Self::Conflict(resource),
            db::error::Error::Fatal => Self::Internal,
        }
    }
}

impl From<Invalid> for Error {
    fn from(invalid: Invalid) -> Self {
        Self::Validation(invalid)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(invalid) => invalid.fmt(f),
            Self::NotFound(resource) => write!(f, "{resource} not found."),
            Self::Conflict(resource) => write!(f, "{resource} was modified by another request. Please retry."),
            Self::Internal => f.write_str("Internal Server Error"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
