//! Leave balance reconciliation core.
//!
//! Pure day counting, status transitions and bucket arithmetic live in
//! `days`, `status` and `balance`; `store` is the only part that talks
//! to the database.

pub mod balance;
pub mod days;
pub mod status;
pub mod store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("end_date cannot be before start_date")]
    EndBeforeStart,

    #[error("Insufficient balance: requested {requested} day(s), available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Unknown leave status '{0}'")]
    UnknownStatus(String),

    #[error("Balance inconsistency: {bucket} would go {shortfall} day(s) negative")]
    NegativeBucket {
        bucket: &'static str,
        shortfall: i64,
    },
}
