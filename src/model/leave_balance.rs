use serde::{Deserialize, Serialize};

use crate::leave::balance::BalanceSheet;

/// Persisted balance row; unique per (employee, leave type, year).
/// `available` is never stored, always derived.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
    pub allocated_days: i64,
    pub carried_forward_days: i64,
    pub used_days: i64,
    pub pending_days: i64,
}

impl LeaveBalance {
    pub fn sheet(&self) -> BalanceSheet {
        BalanceSheet {
            allocated_days: self.allocated_days,
            carried_forward_days: self.carried_forward_days,
            used_days: self.used_days,
            pending_days: self.pending_days,
        }
    }
}
