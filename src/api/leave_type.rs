use crate::auth::auth::AuthUser;
use crate::model::leave_type::LeaveType;
use crate::utils::leave_type_cache;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "Annual Leave")]
    pub name: String,
    #[schema(example = "annual")]
    pub code: String,
    /// NULL means unlimited
    #[schema(example = 20, nullable = true)]
    pub max_days_per_year: Option<i64>,
    #[schema(example = true)]
    pub is_paid: bool,
    #[schema(example = true)]
    pub requires_approval: bool,
}

/// Create leave type (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/leave-types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created", body = Object, example = json!({
            "message": "Leave type created",
            "id": 1
        })),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Code already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "LeaveType"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    let code = payload.code.trim().to_lowercase();
    if name.is_empty() || code.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name and code must not be empty"
        })));
    }
    if payload.max_days_per_year.is_some_and(|d| d < 0) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "max_days_per_year cannot be negative"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leave_types
            (name, code, max_days_per_year, is_paid, requires_approval)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&code)
    .bind(payload.max_days_per_year)
    .bind(payload.is_paid)
    .bind(payload.requires_approval)
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Leave type code already exists"
                    })));
                }
            }
            tracing::error!(error = %e, "Failed to create leave type");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    let id = result.last_insert_id();
    leave_type_cache::insert(LeaveType {
        id,
        name: name.to_string(),
        code,
        max_days_per_year: payload.max_days_per_year,
        is_paid: payload.is_paid,
        requires_approval: payload.requires_approval,
    })
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave type created",
        "id": id
    })))
}

/// List leave types (reference data, unpaginated)
#[utoipa::path(
    get,
    path = "/api/v1/leave-types",
    responses(
        (status = 200, description = "All leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "LeaveType"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let types = sqlx::query_as::<_, LeaveType>(
        r#"
        SELECT id, name, code, max_days_per_year, is_paid, requires_approval
        FROM leave_types
        ORDER BY id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave types");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(types))
}
