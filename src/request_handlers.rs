// src/request_handlers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use crate::audit::audit;
use crate::auth::{get_current_user, require_permission, StaffRole};
use crate::error::ApiResult;
use crate::handlers::{parse_id, ApiResponse};
use crate::models::{ApprovalRequest, CreateRequestRequest, StepUpdateRequest};

pub async fn create_request(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    body: web::Json<CreateRequestRequest>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_report_problems)?;
    let created = app_state
        .workflow
        .create_request(body.into_inner(), claims.role, claims.staff_id()?)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(created)))
}

pub async fn get_request(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    get_current_user(&http_request)?;
    let id = parse_id(&path.into_inner(), "request id")?;
    let request = app_state.workflow.get(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(request)))
}

pub async fn advance_request(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
    body: web::Json<StepUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_progress_requests)?;
    let id = parse_id(&path.into_inner(), "request id")?;
    let update = body.into_inner();
    let step = update.completed_steps;

    let request = app_state.workflow.advance(id, update).await?;

    audit(
        &app_state.db_pool, &claims.sub, "progress", "request", &id.to_string(),
        &format!("Request moved to step {} ({})", step, request.status.as_str()),
        &http_request,
    ).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        request,
        format!("Step {} recorded", step),
    )))
}

/// Admin overview of every request with both status dimensions
pub async fn admin_requests(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    require_permission(&http_request, StaffRole::can_review_requests)?;
    let requests = app_state.workflow.list_for_admin().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

pub async fn set_approval(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ApprovalRequest>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_review_requests)?;
    let id = parse_id(&path.into_inner(), "request id")?;

    let change = app_state.workflow.set_approval_status(id, &body.status).await?;

    audit(
        &app_state.db_pool, &claims.sub, "approve", "request", &id.to_string(),
        &format!("Approval set to {}", change.status),
        &http_request,
    ).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(change)))
}
