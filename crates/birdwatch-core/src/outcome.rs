//! Result of a daemon query as seen by callers.

use crate::parsed::Parsed;

/// What a query produced.
///
/// `Unreachable` and `NotAdmitted` are not errors in the `Result` sense:
/// they are expected states that every caller passes upward unchanged
/// before looking at any field of a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A parsed result, fresh or from the cache.
    Ready(Parsed),
    /// The client executable failed, timed out or could not be spawned.
    Unreachable,
    /// The rate limiter rejected the query. There is no data yet.
    NotAdmitted,
}

impl Outcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    pub fn as_parsed(&self) -> Option<&Parsed> {
        match self {
            Outcome::Ready(parsed) => Some(parsed),
            _ => None,
        }
    }

    pub fn into_parsed(self) -> Option<Parsed> {
        match self {
            Outcome::Ready(parsed) => Some(parsed),
            _ => None,
        }
    }
}

/// An [`Outcome`] together with whether it was served from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub outcome: Outcome,
    pub from_cache: bool,
}

impl Fetched {
    pub fn ready(parsed: Parsed, from_cache: bool) -> Self {
        Self {
            outcome: Outcome::Ready(parsed),
            from_cache,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            outcome: Outcome::Unreachable,
            from_cache: false,
        }
    }

    pub fn not_admitted() -> Self {
        Self {
            outcome: Outcome::NotAdmitted,
            from_cache: false,
        }
    }

    /// Transform a ready payload; sentinels pass through untouched.
    pub fn map(self, f: impl FnOnce(Parsed) -> Parsed) -> Self {
        let outcome = match self.outcome {
            Outcome::Ready(parsed) => Outcome::Ready(f(parsed)),
            other => other,
        };
        Self {
            outcome,
            from_cache: self.from_cache,
        }
    }
}
