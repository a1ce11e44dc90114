use actix_web::error::ErrorBadRequest;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// A JSON value narrowed to something we can bind to a MySQL placeholder.
/// Date-looking strings bind as dates so `hire_date = "2024-01-01"`
/// round-trips correctly.
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl TryFrom<&Value> for SqlValue {
    type Error = actix_web::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(SqlValue::Date(d))
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    Ok(SqlValue::DateTime(dt))
                } else {
                    Ok(SqlValue::String(s.clone()))
                }
            }
            Value::Number(n) => n
                .as_i64()
                .map(SqlValue::I64)
                .or_else(|| n.as_f64().map(SqlValue::F64))
                .ok_or_else(|| ErrorBadRequest("Unsupported number")),
            Value::Bool(b) => Ok(SqlValue::Bool(*b)),
            Value::Null => Ok(SqlValue::Null),
            _ => Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Assemble a dynamic `UPDATE` from a JSON patch payload.
///
/// Only columns in `allowed` may appear; anything else is rejected
/// before any SQL is assembled. Values are bound, never interpolated.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: i64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ErrorBadRequest(format!("Unknown column '{}'", unknown)));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = obj
        .values()
        .map(SqlValue::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    values.push(SqlValue::I64(id_value)); // WHERE id = ?

    Ok(SqlUpdate { sql, values })
}

pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_set_clause_from_allowed_columns() {
        let update = build_update_sql(
            "employees",
            &json!({"status": "inactive"}),
            &["status", "email"],
            "id",
            7,
        )
        .unwrap();
        assert_eq!(update.sql, "UPDATE employees SET status = ? WHERE id = ?");
        assert_eq!(update.values.len(), 2);
    }

    #[test]
    fn rejects_unknown_columns() {
        let err = build_update_sql(
            "employees",
            &json!({"password": "oops"}),
            &["status"],
            "id",
            7,
        );
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_payloads() {
        assert!(build_update_sql("employees", &json!({}), &["status"], "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), &["status"], "id", 1).is_err());
    }

    #[test]
    fn date_strings_bind_as_dates() {
        let update = build_update_sql(
            "employees",
            &json!({"hire_date": "2024-01-01"}),
            &["hire_date"],
            "id",
            1,
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::Date(_)));
    }
}
