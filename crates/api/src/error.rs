use core::fmt::{self, Display};
use hyper::StatusCode;

#[derive(Debug)]
pub enum Error {
    /// The consistency layer rejected or failed the operation.
    Service(service::Error),
    /// A path parameter is not a valid identifier. Holds the parameter name.
    MalformedId(&'static str),
    /// The request body is not the expected JSON.
    MalformedBody,
    /// The request body exceeds the size limit.
    TooLarge,
    UnknownRoute,
    MethodNotAllowed,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        use service::Error as Svc;
        match self {
            Self::Service(Svc::Validation(_)) | Self::MalformedId(_) | Self::MalformedBody => StatusCode::BAD_REQUEST,
            Self::Service(Svc::NotFound(_)) | Self::UnknownRoute => StatusCode::NOT_FOUND,
            Self::Service(Svc::Conflict(_)) => StatusCode::CONFLICT,
            Self::Service(Svc::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl From<service::Error> for Error {
    fn from(err: service::Error) -> Self {
        Self::Service(err)
    }
}

impl From<model::validate::Invalid> for Error {
    fn from(invalid: model::validate::Invalid) -> Self {
        Self::Service(service::Error::Validation(invalid))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(err) => err.fmt(f),
            Self::MalformedId(param) => write!(f, "Invalid {param}"),
            Self::MalformedBody => f.write_str("Request body is not valid JSON for this endpoint."),
            Self::TooLarge => f.write_str("Request body is too large."),
            Self::UnknownRoute => f.write_str("Not Found"),
            Self::MethodNotAllowed => f.write_str("Method Not Allowed"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
