use core::{
    fmt::{self, Display},
    num::NonZeroI64,
    str::FromStr,
};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a stored question or quiz. Only positive integers are
/// valid identifiers, which matches the `BIGSERIAL` sequences in the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Id(NonZeroI64);

impl Id {
    pub const fn new(raw: i64) -> Option<Self> {
        if raw <= 0 {
            return None;
        }
        match NonZeroI64::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    pub const fn get(self) -> i64 {
        self.0.get()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MalformedId;

impl Display for MalformedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("identifiers must be positive integers")
    }
}

impl TryFrom<i64> for Id {
    type Error = MalformedId;
    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(MalformedId)
    }
}

impl From<Id> for i64 {
    fn from(id: Id) -> Self {
        id.get()
    }
}

impl FromStr for Id {
    type Err = MalformedId;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().ok().and_then(Self::new).ok_or(MalformedId)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
