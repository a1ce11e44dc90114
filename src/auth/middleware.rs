use crate::auth::auth::{AuthUser, bearer_token};
use crate::auth::jwt::verify_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::{Value, json};

fn deny(req: ServiceRequest, body: Value) -> Result<ServiceResponse<BoxBody>, Error> {
    let resp = HttpResponse::Unauthorized().json(body);
    Ok(req.into_response(resp.map_into_boxed_body()))
}

/// Scope-level guard for the protected API: verifies the access token
/// and stashes the `AuthUser` in request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = match bearer_token(req.request()) {
        Some(t) => t.to_owned(),
        None => return deny(req, json!({"error": "Missing bearer token"})),
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            return deny(req, json!({"error": "Invalid or expired token", "details": e}));
        }
    };

    let auth_user = match AuthUser::try_from(claims) {
        Ok(u) => u,
        Err(_) => return deny(req, json!({"error": "Invalid role"})),
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
