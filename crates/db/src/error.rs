use core::fmt::{self, Display};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The record we are looking for does not exist.
    NotFound,
    /// The record was modified since it was last read.
    Conflict,
    /// Unrecoverable error.
    Fatal,
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        log::error!("database failure: {err}");
        Self::Fatal
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "Record not found.",
            Self::Conflict => "Record was modified concurrently.",
            Self::Fatal => "Unrecoverable storage error.",
        })
    }
}

pub type Result<T> = core::result::Result<T, Error>;
