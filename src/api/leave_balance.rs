use crate::auth::auth::AuthUser;
use crate::leave::store::{self, BalanceKey};
use crate::utils::leave_type_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Employee to inspect; defaults to the caller's own record
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    /// Calendar year; defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 20)]
    pub allocated_days: i64,
    #[schema(example = 2)]
    pub carried_forward_days: i64,
    #[schema(example = 5)]
    pub used_days: i64,
    #[schema(example = 3)]
    pub pending_days: i64,
    /// Always derived: allocated + carried_forward - used - pending
    #[schema(example = 14)]
    pub available_days: i64,
}

/// Balance lookup; synthesizes an empty sheet when no row exists yet
#[utoipa::path(
    get,
    path = "/api/v1/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balance for the employee, leave type and year", body = BalanceResponse),
        (status = 400, description = "Unknown leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(id) => id,
        None => auth.require_employee_profile()?,
    };
    auth.require_self_or_hr(employee_id)?;

    let leave_type = leave_type_cache::get_or_load(pool.get_ref(), query.leave_type_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_type_id = query.leave_type_id, "Failed to fetch leave type");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let leave_type = match leave_type {
        Some(lt) => lt,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Unknown leave type"
            })));
        }
    };

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let key = BalanceKey {
        employee_id,
        leave_type_id: leave_type.id,
        year,
    };

    let sheet = store::fetch_sheet(pool.get_ref(), key, leave_type.default_allocation())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(BalanceResponse {
        employee_id,
        leave_type_id: leave_type.id,
        year,
        allocated_days: sheet.allocated_days,
        carried_forward_days: sheet.carried_forward_days,
        used_days: sheet.used_days,
        pending_days: sheet.pending_days,
        available_days: sheet.available(),
    }))
}
