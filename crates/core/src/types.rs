//! Identifier and time aliases shared by every crate.

/// Row id of profiles, dishes, orders and the other store tables (`BIGSERIAL`).
pub type DbId = i64;

/// `TIMESTAMPTZ` columns, always handled in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
