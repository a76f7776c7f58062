// src/notification_handlers.rs
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use std::str::FromStr;
use std::sync::Arc;

use crate::AppState;
use crate::auth::{ensure_acting_as, get_current_user, StaffRole};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_id, ApiResponse};

/// Inbox of one staff member. Never cached by clients or proxies.
pub async fn get_inbox(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let (raw_role, raw_staff_id) = path.into_inner();

    let role = StaffRole::from_str(&raw_role)
        .map_err(|_| ApiError::BadRequest(format!("Unknown role '{}'", raw_role)))?;
    let staff_id = parse_id(&raw_staff_id, "staff id")?;
    ensure_acting_as(&claims, role, staff_id)?;

    let notifications = app_state.notifications.list_for(role, staff_id).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(ApiResponse::success(notifications)))
}

/// Only the owner of a notification (or an admin) may touch it. An id that
/// no longer exists is left to the idempotent store call.
async fn ensure_owner(app_state: &AppState, http_request: &HttpRequest, id: i64) -> ApiResult<()> {
    let claims = get_current_user(http_request)?;
    if let Some((role, staff_id)) = app_state.notifications.owner(id).await? {
        ensure_acting_as(&claims, role, staff_id)?;
    }
    Ok(())
}

pub async fn mark_read(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "notification id")?;
    ensure_owner(&app_state, &http_request, id).await?;
    app_state.notifications.mark_read(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Notification marked as read")))
}

pub async fn delete_notification(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "notification id")?;
    ensure_owner(&app_state, &http_request, id).await?;
    app_state.notifications.delete(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Notification deleted")))
}
