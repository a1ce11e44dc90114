use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::leave::LeaveError;

/// Workflow status of a leave request. Stored lowercase in the database.
///
/// `Cancelled` is terminal: no endpoint offers a transition out of it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Parse the database representation, surfacing bad rows as errors
    /// instead of defaulting.
    pub fn parse(value: &str) -> Result<Self, LeaveError> {
        value
            .parse()
            .map_err(|_| LeaveError::UnknownStatus(value.to_string()))
    }

    /// True for statuses that hold capacity on the balance.
    pub fn consumes_balance(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    /// How many days a request in this status contributes to each bucket.
    pub fn contribution(self, days: i64) -> Contribution {
        match self {
            LeaveStatus::Pending => Contribution {
                pending: days,
                used: 0,
            },
            LeaveStatus::Approved => Contribution {
                pending: 0,
                used: days,
            },
            LeaveStatus::Rejected | LeaveStatus::Cancelled => Contribution {
                pending: 0,
                used: 0,
            },
        }
    }
}

/// What a single request occupies on the balance, per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub pending: i64,
    pub used: i64,
}

/// Signed bucket adjustment produced by a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    pub pending: i64,
    pub used: i64,
}

/// Pure transition rule: subtract the old contribution, add the new one.
///
/// `old = None` models request creation. This one rule covers create,
/// approve, reject, cancel and every edit combination (status change,
/// day-count change, or both).
pub fn balance_delta(old: Option<(LeaveStatus, i64)>, new: (LeaveStatus, i64)) -> BalanceDelta {
    let before = match old {
        Some((status, days)) => status.contribution(days),
        None => Contribution { pending: 0, used: 0 },
    };
    let after = new.0.contribution(new.1);

    BalanceDelta {
        pending: after.pending - before.pending,
        used: after.used - before.used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_db_strings() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert_eq!(LeaveStatus::parse(&status.to_string()).unwrap(), status);
        }
        assert_eq!(LeaveStatus::Pending.to_string(), "pending");
        assert!(LeaveStatus::parse("unknown").is_err());
    }

    #[test]
    fn create_puts_days_into_pending() {
        let delta = balance_delta(None, (LeaveStatus::Pending, 3));
        assert_eq!(delta, BalanceDelta { pending: 3, used: 0 });
    }

    #[test]
    fn approval_moves_days_from_pending_to_used() {
        let delta = balance_delta(Some((LeaveStatus::Pending, 3)), (LeaveStatus::Approved, 3));
        assert_eq!(delta, BalanceDelta { pending: -3, used: 3 });
    }

    #[test]
    fn rejection_releases_pending_without_touching_used() {
        let delta = balance_delta(Some((LeaveStatus::Pending, 4)), (LeaveStatus::Rejected, 4));
        assert_eq!(delta, BalanceDelta { pending: -4, used: 0 });
    }

    #[test]
    fn cancel_releases_pending_like_rejection() {
        let delta = balance_delta(Some((LeaveStatus::Pending, 2)), (LeaveStatus::Cancelled, 2));
        assert_eq!(delta, BalanceDelta { pending: -2, used: 0 });
    }

    #[test]
    fn edit_of_pending_days_adjusts_pending_only() {
        let delta = balance_delta(Some((LeaveStatus::Pending, 5)), (LeaveStatus::Pending, 7));
        assert_eq!(delta, BalanceDelta { pending: 2, used: 0 });
    }

    #[test]
    fn edit_of_approved_days_adjusts_used_only() {
        let delta = balance_delta(Some((LeaveStatus::Approved, 5)), (LeaveStatus::Approved, 3));
        assert_eq!(delta, BalanceDelta { pending: 0, used: -2 });
    }

    #[test]
    fn approved_back_to_pending_with_new_days() {
        // 5 approved days edited back to pending with 7 days: used drops
        // by the old 5, pending gains the new 7.
        let delta = balance_delta(Some((LeaveStatus::Approved, 5)), (LeaveStatus::Pending, 7));
        assert_eq!(delta, BalanceDelta { pending: 7, used: -5 });
    }

    #[test]
    fn pending_to_approved_with_changed_days_uses_new_count() {
        let delta = balance_delta(Some((LeaveStatus::Pending, 5)), (LeaveStatus::Approved, 8));
        assert_eq!(delta, BalanceDelta { pending: -5, used: 8 });
    }

    #[test]
    fn terminal_statuses_contribute_nothing() {
        for status in [LeaveStatus::Rejected, LeaveStatus::Cancelled] {
            let c = status.contribution(9);
            assert_eq!(c, Contribution { pending: 0, used: 0 });
            assert!(!status.consumes_balance());
        }
    }
}
