use chrono::{Datelike, NaiveDate};
use sqlx::{MySql, MySqlPool, Transaction};

use crate::leave::balance::BalanceSheet;
use crate::model::leave_balance::LeaveBalance;

/// Unique key of a balance row.
#[derive(Debug, Clone, Copy)]
pub struct BalanceKey {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
}

/// A request is accounted against the year its leave starts in.
pub fn balance_year(start_date: NaiveDate) -> i32 {
    start_date.year()
}

const BALANCE_COLUMNS: &str = "id, employee_id, leave_type_id, year, \
     allocated_days, carried_forward_days, used_days, pending_days";

/// Balance Reader: fetch the unique row, or synthesize an ephemeral
/// sheet from the leave type's annual allotment. Synthesis never writes;
/// the row is only persisted once a request touches it.
pub async fn fetch_sheet(
    pool: &MySqlPool,
    key: BalanceKey,
    default_allocated: i64,
) -> Result<BalanceSheet, sqlx::Error> {
    let row = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {} FROM leave_balances WHERE employee_id = ? AND leave_type_id = ? AND year = ?",
        BALANCE_COLUMNS
    ))
    .bind(key.employee_id)
    .bind(key.leave_type_id)
    .bind(key.year)
    .fetch_optional(pool)
    .await?;

    Ok(row
        .map(|b| b.sheet())
        .unwrap_or_else(|| BalanceSheet::synthesized(default_allocated)))
}

/// Same lookup inside a transaction, locking the row (`FOR UPDATE`) so
/// the request mutation and the balance write commit together without
/// racing a concurrent approver.
pub async fn lock_sheet(
    tx: &mut Transaction<'_, MySql>,
    key: BalanceKey,
    default_allocated: i64,
) -> Result<BalanceSheet, sqlx::Error> {
    let row = sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {} FROM leave_balances \
         WHERE employee_id = ? AND leave_type_id = ? AND year = ? FOR UPDATE",
        BALANCE_COLUMNS
    ))
    .bind(key.employee_id)
    .bind(key.leave_type_id)
    .bind(key.year)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row
        .map(|b| b.sheet())
        .unwrap_or_else(|| BalanceSheet::synthesized(default_allocated)))
}

/// Balance Writer: upsert the row keyed by (employee, leave type, year)
/// with caller-computed absolute used/pending totals.
pub async fn write_sheet(
    tx: &mut Transaction<'_, MySql>,
    key: BalanceKey,
    sheet: &BalanceSheet,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, leave_type_id, year,
             allocated_days, carried_forward_days, used_days, pending_days)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            used_days = VALUES(used_days),
            pending_days = VALUES(pending_days)
        "#,
    )
    .bind(key.employee_id)
    .bind(key.leave_type_id)
    .bind(key.year)
    .bind(sheet.allocated_days)
    .bind(sheet.carried_forward_days)
    .bind(sheet.used_days)
    .bind(sheet.pending_days)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_year_comes_from_the_start_date() {
        let d = NaiveDate::parse_from_str("2025-12-29", "%Y-%m-%d").unwrap();
        assert_eq!(balance_year(d), 2025);
    }

    #[test]
    fn synthesized_sheet_starts_empty() {
        let s = BalanceSheet::synthesized(15);
        assert_eq!(s.allocated_days, 15);
        assert_eq!(s.carried_forward_days, 0);
        assert_eq!(s.used_days, 0);
        assert_eq!(s.pending_days, 0);
        assert_eq!(s.available(), 15);
    }

    #[test]
    fn stored_row_converts_to_a_sheet() {
        let row = LeaveBalance {
            id: 1,
            employee_id: 1000,
            leave_type_id: 1,
            year: 2026,
            allocated_days: 20,
            carried_forward_days: 2,
            used_days: 5,
            pending_days: 3,
        };
        let sheet = row.sheet();
        assert_eq!(sheet.available(), 14);
    }
}
