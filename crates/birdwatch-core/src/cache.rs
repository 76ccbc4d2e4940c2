//! Time-bounded query cache.
//!
//! Maps the exact command string sent to the daemon onto its parsed result.
//! On store the result is stamped with two bookkeeping fields, `cached_at`
//! and `ttl` (absolute expiry), both RFC 3339 UTC strings. Expiry is checked
//! lazily on lookup; stale entries stay in the map until the same key is
//! stored again.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::parsed::{Parsed, Value};

/// Bookkeeping field holding the absolute expiry instant.
pub const TTL_FIELD: &str = "ttl";

/// Bookkeeping field holding the instant the entry was stored.
pub const CACHED_AT_FIELD: &str = "cached_at";

/// Entry lifetime used when the configured value is zero, negative or too
/// large to represent.
pub const DEFAULT_TTL_MINUTES: i64 = 5;

/// Process-wide result cache guarded by a single reader/writer lock.
#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, Parsed>>,
    ttl: Duration,
}

impl QueryCache {
    /// Create a cache whose entries live for `ttl_minutes`.
    pub fn new(ttl_minutes: i64) -> Self {
        let ttl = (ttl_minutes > 0)
            .then(|| Duration::try_minutes(ttl_minutes))
            .flatten()
            .unwrap_or(Duration::minutes(DEFAULT_TTL_MINUTES));
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the entry for `key` if it exists and has not expired.
    ///
    /// An entry whose `ttl` field is missing or not a timestamp counts as a miss.
    pub fn lookup(&self, key: &str) -> Option<Parsed> {
        self.lookup_at(key, Utc::now())
    }

    pub(crate) fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Option<Parsed> {
        let entry = self.entries.read().get(key).cloned()?;
        let expires = entry
            .get(TTL_FIELD)
            .and_then(Value::as_str)
            .and_then(|ttl| DateTime::parse_from_rfc3339(ttl).ok())?
            .with_timezone(&Utc);
        (now < expires).then_some(entry)
    }

    /// Stamp `value` with its bookkeeping fields and store it under `key`,
    /// replacing any previous entry. Returns the stamped value.
    pub fn store(&self, key: &str, value: Parsed) -> Parsed {
        self.store_at(key, value, Utc::now())
    }

    pub(crate) fn store_at(&self, key: &str, mut value: Parsed, now: DateTime<Utc>) -> Parsed {
        let latest = latest_expiry();
        let expires = now
            .checked_add_signed(self.ttl)
            .map_or(latest, |expires| expires.min(latest));
        value.insert(CACHED_AT_FIELD.to_string(), Value::String(now.to_rfc3339()));
        value.insert(TTL_FIELD.to_string(), Value::String(expires.to_rfc3339()));

        self.entries.write().insert(key.to_string(), value.clone());
        value
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Latest expiry whose RFC 3339 form still has a four-digit year, so the
/// `ttl` field parses back on lookup.
fn latest_expiry() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map_or(DateTime::<Utc>::MAX_UTC, |latest| latest.and_utc())
}

/// Drop the bookkeeping fields, leaving only the semantic payload.
pub fn strip_bookkeeping(mut parsed: Parsed) -> Parsed {
    parsed.remove(TTL_FIELD);
    parsed.remove(CACHED_AT_FIELD);
    parsed
}
