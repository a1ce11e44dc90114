use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::warn;

use crate::leave::LeaveError;
use crate::leave::status::{BalanceDelta, Contribution, LeaveStatus};

/// What to do when applying a delta would drive a bucket below zero.
///
/// The observed legacy behavior floors at 0 and carries on; `Reject`
/// surfaces the inconsistency as an error instead. Chosen via the
/// `LEAVE_DRIFT_POLICY` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DriftPolicy {
    Clamp,
    Reject,
}

/// The four day buckets of one (employee, leave type, year) balance.
///
/// `available` is always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSheet {
    pub allocated_days: i64,
    pub carried_forward_days: i64,
    pub used_days: i64,
    pub pending_days: i64,
}

impl BalanceSheet {
    /// Ephemeral default for a balance row that does not exist yet.
    /// Not persisted until a request touches it.
    pub fn synthesized(allocated_days: i64) -> Self {
        Self {
            allocated_days,
            carried_forward_days: 0,
            used_days: 0,
            pending_days: 0,
        }
    }

    pub fn available(&self) -> i64 {
        self.allocated_days + self.carried_forward_days - self.used_days - self.pending_days
    }

    /// The sheet as it would look with one request's contribution removed.
    /// Used to validate edits against capacity the request itself holds.
    pub fn without(&self, c: Contribution) -> Self {
        Self {
            used_days: self.used_days - c.used,
            pending_days: self.pending_days - c.pending,
            ..*self
        }
    }

    /// Apply a transition delta, handling negative buckets per `policy`.
    pub fn apply(&self, delta: BalanceDelta, policy: DriftPolicy) -> Result<Self, LeaveError> {
        let pending_days = settle("pending_days", self.pending_days + delta.pending, policy)?;
        let used_days = settle("used_days", self.used_days + delta.used, policy)?;

        Ok(Self {
            pending_days,
            used_days,
            ..*self
        })
    }
}

fn settle(bucket: &'static str, value: i64, policy: DriftPolicy) -> Result<i64, LeaveError> {
    if value >= 0 {
        return Ok(value);
    }
    match policy {
        DriftPolicy::Clamp => {
            warn!(bucket, shortfall = -value, "balance bucket clamped to zero");
            Ok(0)
        }
        DriftPolicy::Reject => Err(LeaveError::NegativeBucket {
            bucket,
            shortfall: -value,
        }),
    }
}

/// Capacity check for moving a request into a consuming status.
///
/// `sheet` must already exclude the request's own old contribution.
/// Rejected/cancelled targets bypass the check: they free capacity.
pub fn check_capacity(
    sheet: &BalanceSheet,
    new_status: LeaveStatus,
    new_days: i64,
) -> Result<(), LeaveError> {
    if !new_status.consumes_balance() {
        return Ok(());
    }
    let available = sheet.available();
    if new_days > available {
        return Err(LeaveError::InsufficientBalance {
            requested: new_days,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::status::balance_delta;

    fn sheet(allocated: i64, used: i64, pending: i64) -> BalanceSheet {
        BalanceSheet {
            allocated_days: allocated,
            carried_forward_days: 0,
            used_days: used,
            pending_days: pending,
        }
    }

    #[test]
    fn available_is_derived_from_all_four_buckets() {
        let s = BalanceSheet {
            allocated_days: 20,
            carried_forward_days: 3,
            used_days: 5,
            pending_days: 2,
        };
        assert_eq!(s.available(), 16);
    }

    #[test]
    fn request_then_approve_flow() {
        // allocated=20, used=5: request 3 days, then approve them.
        let s = sheet(20, 5, 0);
        check_capacity(&s, LeaveStatus::Pending, 3).unwrap();

        let s = s
            .apply(balance_delta(None, (LeaveStatus::Pending, 3)), DriftPolicy::Clamp)
            .unwrap();
        assert_eq!((s.used_days, s.pending_days), (5, 3));

        let s = s
            .apply(
                balance_delta(Some((LeaveStatus::Pending, 3)), (LeaveStatus::Approved, 3)),
                DriftPolicy::Clamp,
            )
            .unwrap();
        assert_eq!((s.used_days, s.pending_days), (8, 0));
        assert_eq!(s.available(), 12);
    }

    #[test]
    fn over_allocation_is_refused_before_any_write() {
        // allocated=10, pending=2 leaves 8 available; 9 must not fit.
        let s = sheet(10, 0, 2);
        let err = check_capacity(&s, LeaveStatus::Pending, 9).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::InsufficientBalance {
                requested: 9,
                available: 8
            }
        ));
    }

    #[test]
    fn releasing_statuses_bypass_the_capacity_check() {
        let s = sheet(1, 0, 1);
        check_capacity(&s, LeaveStatus::Rejected, 50).unwrap();
        check_capacity(&s, LeaveStatus::Cancelled, 50).unwrap();
    }

    #[test]
    fn edit_validation_excludes_the_requests_own_hold() {
        // 5 pending days being edited to 7: the 5 it already holds count
        // as available again for the check.
        let s = sheet(10, 0, 5);
        let freed = s.without(LeaveStatus::Pending.contribution(5));
        assert_eq!(freed.available(), 10);
        check_capacity(&freed, LeaveStatus::Pending, 7).unwrap();
        assert!(check_capacity(&freed, LeaveStatus::Pending, 11).is_err());
    }

    #[test]
    fn clamp_policy_floors_negative_buckets_at_zero() {
        let s = sheet(10, 1, 1);
        let delta = balance_delta(Some((LeaveStatus::Pending, 4)), (LeaveStatus::Rejected, 4));
        let s = s.apply(delta, DriftPolicy::Clamp).unwrap();
        assert_eq!(s.pending_days, 0);
        assert_eq!(s.used_days, 1);
    }

    #[test]
    fn reject_policy_surfaces_the_drift() {
        let s = sheet(10, 1, 1);
        let delta = balance_delta(Some((LeaveStatus::Pending, 4)), (LeaveStatus::Rejected, 4));
        let err = s.apply(delta, DriftPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::NegativeBucket {
                bucket: "pending_days",
                shortfall: 3
            }
        ));
    }

    #[test]
    fn approved_request_edited_back_to_pending() {
        // Scenario: approved 5-day request edited to pending with 7 days.
        let s = sheet(20, 5, 0);
        let delta = balance_delta(Some((LeaveStatus::Approved, 5)), (LeaveStatus::Pending, 7));
        let s = s.apply(delta, DriftPolicy::Clamp).unwrap();
        assert_eq!((s.used_days, s.pending_days), (0, 7));
    }

    #[test]
    fn drift_policy_parses_from_config_strings() {
        assert_eq!("clamp".parse::<DriftPolicy>().unwrap(), DriftPolicy::Clamp);
        assert_eq!("reject".parse::<DriftPolicy>().unwrap(), DriftPolicy::Reject);
        assert!("panic".parse::<DriftPolicy>().is_err());
    }
}
