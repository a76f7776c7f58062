// src/staff_handlers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use std::str::FromStr;
use std::sync::Arc;

use crate::AppState;
use crate::audit::audit;
use crate::auth::{require_permission, StaffRole};
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::NewStaffAccount;
use crate::repositories::StaffRepository;

/// Registers a staff account in the table of the role named in the path
pub async fn register_staff(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
    body: web::Json<NewStaffAccount>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_manage_staff)?;
    let raw_role = path.into_inner();
    let role = StaffRole::from_str(&raw_role)
        .map_err(|_| ApiError::BadRequest(format!("Unknown role '{}'", raw_role)))?;

    let repository = app_state.staff_repository(role);
    let account = repository.create(body.into_inner()).await?;

    audit(
        &app_state.db_pool, &claims.sub, "create", repository.role().table(), &account.id.to_string(),
        &format!("Registered {} {}", role.display_name(), account.email),
        &http_request,
    ).await;

    Ok(HttpResponse::Created().json(ApiResponse::success(account)))
}
