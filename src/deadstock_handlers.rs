// src/deadstock_handlers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use crate::audit::audit;
use crate::auth::{get_current_user, require_permission, StaffRole};
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{CreateDeadstockRequest, CreatedId, DeadstockStatusRequest};

pub async fn get_deadstock(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let groups = app_state.deadstock.list_grouped().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(groups)))
}

pub async fn add_deadstock_item(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    body: web::Json<CreateDeadstockRequest>,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    let id = app_state
        .deadstock
        .add_item(body.into_inner(), claims.staff_id()?)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(CreatedId { id })))
}

pub async fn set_deadstock_status(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
    body: web::Json<DeadstockStatusRequest>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_decide_deadstock)?;
    let deadstock_id = path.into_inner();

    let change = app_state.deadstock.set_status(&deadstock_id, &body.status).await?;

    audit(
        &app_state.db_pool, &claims.sub, "decide", "deadstock", &deadstock_id,
        &format!("Dead-stock {} marked {}", deadstock_id, change.status),
        &http_request,
    ).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(change)))
}
