use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

static PERMANENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^r[0-9]{8}$").expect("pattern is a valid regex"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^new[0-9]+$").expect("pattern is a valid regex"));

/// The largest value a permanent index can hold (eight decimal digits).
pub const PERMANENT_MAX: u32 = 99_999_999;

/// The identity of a requirement.
///
/// Two forms exist:
/// - permanent: `r` followed by exactly eight decimal digits (`r00000045`)
/// - placeholder: `new` followed by one or more decimal digits (`new1`)
///
/// Placeholders are written by authors for new requirements and are replaced
/// by permanent indices when a [`Standard`](crate::Standard) is read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Permanent(u32),
    /// Digits are kept exactly as authored so the literal round-trips.
    Placeholder(String),
}

impl Index {
    /// Creates a permanent index from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the value needs more than eight digits.
    pub fn permanent(value: u32) -> Result<Self, Error> {
        if value > PERMANENT_MAX {
            return Err(Error::OutOfRange(u64::from(value)));
        }
        Ok(Self(Repr::Permanent(value)))
    }

    /// Whether this is a placeholder (`newN`) index.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self.0, Repr::Placeholder(_))
    }

    /// Whether this is a permanent (`rNNNNNNNN`) index.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.0, Repr::Permanent(_))
    }

    /// The numeric value of the index.
    ///
    /// This is lossy: `new7` and `r00000007` share a value, and a placeholder
    /// too large for a `u64` yields `0`. Use it for ordering and tracking the
    /// maximum, never for identity.
    #[must_use]
    pub fn value(&self) -> u64 {
        match &self.0 {
            Repr::Permanent(value) => u64::from(*value),
            Repr::Placeholder(digits) => digits.parse().unwrap_or(0),
        }
    }

    /// The numeric value of a permanent index.
    #[must_use]
    pub const fn permanent_value(&self) -> Option<u32> {
        match self.0 {
            Repr::Permanent(value) => Some(value),
            Repr::Placeholder(_) => None,
        }
    }

    /// Whether `s` is a well-formed permanent or placeholder index.
    ///
    /// The leading letter is case-sensitive.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        PERMANENT.is_match(s) || PLACEHOLDER.is_match(s)
    }

    /// Whether `s` is a well-formed placeholder index.
    #[must_use]
    pub fn is_placeholder_literal(s: &str) -> bool {
        PLACEHOLDER.is_match(s)
    }

    /// Converts an index literal to its numeric value.
    ///
    /// Returns `0` for anything that is not a valid index.
    #[must_use]
    pub fn to_int(s: &str) -> u64 {
        s.parse::<Self>().map_or(0, |index| index.value())
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Permanent(value) => write!(f, "r{value:08}"),
            Repr::Placeholder(digits) => write!(f, "new{digits}"),
        }
    }
}

impl FromStr for Index {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if PERMANENT.is_match(s) {
            // eight ASCII digits always fit
            let value = s[1..]
                .parse::<u32>()
                .map_err(|_| Error::Syntax(s.to_string()))?;
            return Ok(Self(Repr::Permanent(value)));
        }

        if let Some(digits) = s.strip_prefix("new") {
            if PLACEHOLDER.is_match(s) {
                return Ok(Self(Repr::Placeholder(digits.to_string())));
            }
        }

        Err(Error::Syntax(s.to_string()))
    }
}

impl TryFrom<&str> for Index {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// Errors that can occur when parsing or constructing an [`Index`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The literal is neither `rNNNNNNNN` nor `newN`.
    #[error("Invalid index format: '{0}'")]
    Syntax(String),

    /// A permanent index was requested for a value wider than eight digits.
    #[error("Index value {0} does not fit in eight digits")]
    OutOfRange(u64),
}
