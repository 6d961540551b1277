//! UTC normalization and ISO-8601 round-tripping.
//!
//! Wire timestamps always carry a trailing `Z`; the parser tolerates both
//! `Z` and `+00:00` on the way in. Ported from the reference Python
//! implementation's `ensure_utc` / `isoformat` / `parse_datetime` trio.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{CoreError, CoreResult};

/// Coerce any UTC-convertible timestamp to `DateTime<Utc>`. `chrono`'s
/// `DateTime<Utc>` is already UTC by construction, so this exists mainly as
/// the single choke point callers go through, matching the shape of the
/// Python original where naive/aware datetimes both had to funnel through
/// one normalizer.
pub fn ensure_utc(value: DateTime<Utc>) -> DateTime<Utc> {
    value
}

/// Serialize a timestamp as ISO-8601 with a trailing `Z` (never
/// `+00:00`).
pub fn isoformat(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an ISO-8601 string, accepting both `Z` and `+00:00` suffixes.
pub fn parse_datetime(raw: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::InvalidTimestamp(raw.to_string(), e.to_string()))
}
