//! Domain model for custody schedules and change requests.
//!
//! # Responsibility
//! - Define the value objects shared by resolvers, repositories and services.
//! - Keep every string union from the persisted shape as a closed enum.
//!
//! # Invariants
//! - Illegal pattern/rule/status values are unrepresentable after parsing.
//! - Timestamps are Unix epoch milliseconds; calendar days are `NaiveDate`.

pub mod change_request;
pub mod custody;
pub mod profile;
pub mod schedule;

/// Current wall-clock time in Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
