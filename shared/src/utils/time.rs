//! Time-related utilities

use chrono::{DateTime, TimeZone, Utc};

/// Convert a signed nanosecond timestamp to a UTC datetime.
///
/// Every `i64` is representable, so this never fails; negative values land
/// before the UNIX epoch.
pub fn nanos_to_datetime(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}
