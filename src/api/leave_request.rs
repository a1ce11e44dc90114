use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::leave::balance::check_capacity;
use crate::leave::days::inclusive_days;
use crate::leave::status::{LeaveStatus, balance_delta};
use crate::leave::store::{self, BalanceKey, balance_year};
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;
use crate::utils::leave_type_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
    /// HR/Admin may file on behalf of another employee
    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "2026-01-02", format = "date", value_type = String, nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-05", format = "date", value_type = String, nullable = true)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "pending", nullable = true)]
    pub status: Option<LeaveStatus>,
    #[schema(example = "Dates shifted by one day", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Team is at capacity that week")]
    pub rejection_reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = 1)]
    /// Filter by leave type
    pub leave_type_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave application id
    pub id: u64,
    #[schema(example = 1000)]
    /// employee the leave is filed for
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub days_requested: i64,
    #[schema(example = "Family trip", nullable = true)]
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = 42, nullable = true)]
    pub approved_by: Option<u64>,
    #[schema(example = "2026-01-02T09:30:00Z", format = "date-time", value_type = String, nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(example = "Team is at capacity", nullable = true)]
    pub rejection_reason: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

const REQUEST_COLUMNS: &str = "id, employee_id, leave_type_id, start_date, end_date, \
     days_requested, reason, status, approved_by, approved_at, rejection_reason, created_at";

async fn fetch_request_for_update(
    tx: &mut Transaction<'_, MySql>,
    leave_id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {} FROM leave_requests WHERE id = ? FOR UPDATE",
        REQUEST_COLUMNS
    ))
    .bind(leave_id)
    .fetch_optional(&mut **tx)
    .await
}

async fn load_leave_type(
    pool: &MySqlPool,
    leave_type_id: u64,
) -> Result<Option<LeaveType>, actix_web::Error> {
    leave_type_cache::get_or_load(pool, leave_type_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_type_id, "Failed to fetch leave type");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })
}

fn parse_status(raw: &str, leave_id: u64) -> Result<LeaveStatus, actix_web::Error> {
    LeaveStatus::parse(raw).map_err(|e| {
        tracing::error!(error = %e, leave_id, "Corrupt status on leave request row");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "pending",
            "days_requested": 3
         })
        ),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    // filing for someone else is an HR/Admin action
    let employee_id = match payload.employee_id {
        Some(id) if Some(id) != auth.employee_id => {
            auth.require_hr_or_admin()?;
            id
        }
        Some(id) => id,
        None => auth.require_employee_profile()?,
    };

    let days = match inclusive_days(payload.start_date, payload.end_date) {
        Ok(d) => d,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }
    };

    if payload.reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Reason must not be empty"
        })));
    }

    let leave_type = match load_leave_type(pool.get_ref(), payload.leave_type_id).await? {
        Some(lt) => lt,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Unknown leave type"
            })));
        }
    };

    // types that skip approval land straight in `approved`
    let status = if leave_type.requires_approval {
        LeaveStatus::Pending
    } else {
        LeaveStatus::Approved
    };

    let key = BalanceKey {
        employee_id,
        leave_type_id: leave_type.id,
        year: balance_year(payload.start_date),
    };

    // request insert and balance write commit or roll back together
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let sheet = store::lock_sheet(&mut tx, key, leave_type.default_allocation())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if let Err(e) = check_capacity(&sheet, status, days) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
    }

    let insert_sql = if status == LeaveStatus::Approved {
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type_id, start_date, end_date,
             days_requested, reason, status, approved_by, approved_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW())
        "#
    } else {
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type_id, start_date, end_date,
             days_requested, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#
    };

    let mut insert = sqlx::query(insert_sql)
        .bind(employee_id)
        .bind(leave_type.id)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(days)
        .bind(payload.reason.trim())
        .bind(status.to_string());
    if status == LeaveStatus::Approved {
        insert = insert.bind(auth.user_id);
    }

    let result = insert.execute(&mut *tx).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let leave_id = result.last_insert_id();

    let sheet = match sheet.apply(balance_delta(None, (status, days)), config.leave_drift_policy) {
        Ok(s) => s,
        Err(e) => {
            return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
        }
    };

    store::write_sheet(&mut tx, key, &sheet).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to write leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit leave creation");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request submitted",
        "id": leave_id,
        "status": status.to_string(),
        "days_requested": days
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request = fetch_request_for_update(&mut tx, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Leave request not found or already processed"
            })));
        }
    };

    let old_status = parse_status(&request.status, leave_id)?;
    if old_status != LeaveStatus::Pending {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let leave_type = match load_leave_type(pool.get_ref(), request.leave_type_id).await? {
        Some(lt) => lt,
        None => {
            tracing::error!(leave_id, leave_type_id = request.leave_type_id, "Leave type missing");
            return Err(actix_web::error::ErrorInternalServerError("Internal Server Error"));
        }
    };

    let key = BalanceKey {
        employee_id: request.employee_id,
        leave_type_id: request.leave_type_id,
        year: balance_year(request.start_date),
    };
    let days = request.days_requested;

    let sheet = store::lock_sheet(&mut tx, key, leave_type.default_allocation())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // the pending hold counts toward its own approval
    let freed = sheet.without(old_status.contribution(days));
    if let Err(e) = check_capacity(&freed, LeaveStatus::Approved, days) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
    }

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'approved', approved_by = ?, approved_at = NOW()
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(auth.user_id)
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Approve leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let delta = balance_delta(
        Some((LeaveStatus::Pending, days)),
        (LeaveStatus::Approved, days),
    );
    let sheet = match sheet.apply(delta, config.leave_drift_policy) {
        Ok(s) => s,
        Err(e) => {
            return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
        }
    };

    store::write_sheet(&mut tx, key, &sheet).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to write leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit approval");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    if payload.rejection_reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Rejection reason must not be empty"
        })));
    }

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request = fetch_request_for_update(&mut tx, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Leave request not found or already processed"
            })));
        }
    };

    let old_status = parse_status(&request.status, leave_id)?;
    if old_status != LeaveStatus::Pending {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let leave_type = match load_leave_type(pool.get_ref(), request.leave_type_id).await? {
        Some(lt) => lt,
        None => {
            tracing::error!(leave_id, leave_type_id = request.leave_type_id, "Leave type missing");
            return Err(actix_web::error::ErrorInternalServerError("Internal Server Error"));
        }
    };

    let key = BalanceKey {
        employee_id: request.employee_id,
        leave_type_id: request.leave_type_id,
        year: balance_year(request.start_date),
    };
    let days = request.days_requested;

    let sheet = store::lock_sheet(&mut tx, key, leave_type.default_allocation())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'rejected', rejection_reason = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(payload.rejection_reason.trim())
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    // rejection releases the pending hold; used_days is untouched
    let delta = balance_delta(
        Some((LeaveStatus::Pending, days)),
        (LeaveStatus::Rejected, days),
    );
    let sheet = match sheet.apply(delta, config.leave_drift_policy) {
        Ok(s) => s,
        Err(e) => {
            return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
        }
    };

    store::write_sheet(&mut tx, key, &sheet).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to write leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit rejection");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected"
    })))
}

/* =========================
Cancel leave (owner or HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = Object, example = json!({
            "message": "Leave cancelled"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request = fetch_request_for_update(&mut tx, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Leave request not found or already processed"
            })));
        }
    };

    auth.require_self_or_hr(request.employee_id)?;

    let old_status = parse_status(&request.status, leave_id)?;
    if old_status != LeaveStatus::Pending {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let leave_type = match load_leave_type(pool.get_ref(), request.leave_type_id).await? {
        Some(lt) => lt,
        None => {
            tracing::error!(leave_id, leave_type_id = request.leave_type_id, "Leave type missing");
            return Err(actix_web::error::ErrorInternalServerError("Internal Server Error"));
        }
    };

    let key = BalanceKey {
        employee_id: request.employee_id,
        leave_type_id: request.leave_type_id,
        year: balance_year(request.start_date),
    };
    let days = request.days_requested;

    let sheet = store::lock_sheet(&mut tx, key, leave_type.default_allocation())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'cancelled'
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Cancel leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let delta = balance_delta(
        Some((LeaveStatus::Pending, days)),
        (LeaveStatus::Cancelled, days),
    );
    let sheet = match sheet.apply(delta, config.leave_drift_policy) {
        Ok(s) => s,
        Err(e) => {
            return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
        }
    };

    store::write_sheet(&mut tx, key, &sheet).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to write leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit cancellation");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave cancelled"
    })))
}

/* =========================
Edit leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to edit")
    ),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Leave updated", body = Object, example = json!({
            "message": "Leave updated",
            "status": "pending",
            "days_requested": 7
        })),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request = fetch_request_for_update(&mut tx, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Leave request not found"
            })));
        }
    };

    let old_status = parse_status(&request.status, leave_id)?;
    let new_status = payload.status.unwrap_or(old_status);

    if old_status == LeaveStatus::Cancelled && new_status != LeaveStatus::Cancelled {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cancelled requests cannot be reopened"
        })));
    }

    let new_start = payload.start_date.unwrap_or(request.start_date);
    let new_end = payload.end_date.unwrap_or(request.end_date);
    let new_days = match inclusive_days(new_start, new_end) {
        Ok(d) => d,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }
    };

    if let Some(reason) = &payload.reason {
        if reason.trim().is_empty() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Reason must not be empty"
            })));
        }
    }

    let leave_type = match load_leave_type(pool.get_ref(), request.leave_type_id).await? {
        Some(lt) => lt,
        None => {
            tracing::error!(leave_id, leave_type_id = request.leave_type_id, "Leave type missing");
            return Err(actix_web::error::ErrorInternalServerError("Internal Server Error"));
        }
    };

    let old_days = request.days_requested;
    let old_key = BalanceKey {
        employee_id: request.employee_id,
        leave_type_id: request.leave_type_id,
        year: balance_year(request.start_date),
    };
    let new_key = BalanceKey {
        year: balance_year(new_start),
        ..old_key
    };
    let policy = config.leave_drift_policy;
    let allocation = leave_type.default_allocation();

    if old_key.year == new_key.year {
        let sheet = store::lock_sheet(&mut tx, new_key, allocation).await.map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        // the request's current hold is available to its own edit
        let freed = sheet.without(old_status.contribution(old_days));
        if let Err(e) = check_capacity(&freed, new_status, new_days) {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }

        let delta = balance_delta(Some((old_status, old_days)), (new_status, new_days));
        let sheet = match sheet.apply(delta, policy) {
            Ok(s) => s,
            Err(e) => {
                return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
            }
        };

        store::write_sheet(&mut tx, new_key, &sheet).await.map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to write leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    } else {
        // the start date moved across a year boundary: release the old
        // year's hold, charge the new year's balance
        let old_sheet = store::lock_sheet(&mut tx, old_key, allocation).await.map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
        let new_sheet = store::lock_sheet(&mut tx, new_key, allocation).await.map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to read leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        if let Err(e) = check_capacity(&new_sheet, new_status, new_days) {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }

        let release = balance_delta(Some((old_status, old_days)), (old_status, 0));
        let charge = balance_delta(None, (new_status, new_days));

        let old_sheet = match old_sheet.apply(release, policy) {
            Ok(s) => s,
            Err(e) => {
                return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
            }
        };
        let new_sheet = match new_sheet.apply(charge, policy) {
            Ok(s) => s,
            Err(e) => {
                return Ok(HttpResponse::Conflict().json(json!({ "message": e.to_string() })));
            }
        };

        store::write_sheet(&mut tx, old_key, &old_sheet).await.map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to write leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
        store::write_sheet(&mut tx, new_key, &new_sheet).await.map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to write leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    }

    // approval stamp follows the status transition
    let (approved_by, approved_at) = match (old_status, new_status) {
        (LeaveStatus::Approved, LeaveStatus::Approved) => (request.approved_by, request.approved_at),
        (_, LeaveStatus::Approved) => (Some(auth.user_id), Some(Utc::now())),
        _ => (None, None),
    };
    let reason = payload
        .reason
        .as_ref()
        .map(|r| r.trim().to_string())
        .or(request.reason);

    sqlx::query(
        r#"
        UPDATE leave_requests
        SET start_date = ?, end_date = ?, days_requested = ?,
            status = ?, reason = ?, approved_by = ?, approved_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_start)
    .bind(new_end)
    .bind(new_days)
    .bind(new_status.to_string())
    .bind(reason)
    .bind(approved_by)
    .bind(approved_at)
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to update leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit leave edit");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave updated",
        "status": new_status.to_string(),
        "days_requested": new_days
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveResponse>(&format!(
        "SELECT {} FROM leave_requests WHERE id = ?",
        REQUEST_COLUMNS
    ))
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match leave {
        Some(data) => {
            auth.require_self_or_hr(data.employee_id)?;
            Ok(HttpResponse::Ok().json(data))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        }))),
    }
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(leave_type_id) = query.leave_type_id {
        where_sql.push_str(" AND leave_type_id = ?");
        args.push(FilterValue::U64(leave_type_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT {} FROM leave_requests{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        REQUEST_COLUMNS, where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
