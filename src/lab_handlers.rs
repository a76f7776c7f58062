// src/lab_handlers.rs
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use log::info;

use crate::AppState;
use crate::audit::audit;
use crate::auth::{require_permission, StaffRole};
use crate::error::ApiResult;
use crate::handlers::{parse_id, ApiResponse};
use crate::models::{CreateLabRequest, UpdateLabRequest};

pub async fn get_all_labs(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let labs = app_state.labs.find_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(labs)))
}

pub async fn get_lab(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "lab id")?;
    let lab = app_state.labs.find_by_id(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(lab)))
}

pub async fn get_lab_equipment(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let lab_id = parse_id(&path.into_inner(), "lab id")?;
    let summary = app_state.labs.equipment_summary(lab_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub async fn create_lab(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    body: web::Json<CreateLabRequest>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_provision_labs)?;
    let admin_id = claims.staff_id()?;

    let created = app_state.labs.create(body.into_inner(), admin_id).await?;

    info!("🏫 Lab {} created by {}", created.lab.lab_no, claims.name);
    audit(
        &app_state.db_pool, &claims.sub, "create", "lab", &created.lab.id.to_string(),
        &format!("Created lab {} ({})", created.lab.lab_no, created.lab.lab_name),
        &http_request,
    ).await;

    Ok(HttpResponse::Created().json(ApiResponse::success(created)))
}

pub async fn update_lab(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateLabRequest>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_provision_labs)?;
    let id = parse_id(&path.into_inner(), "lab id")?;

    let updated = app_state.labs.update(id, body.into_inner()).await?;

    audit(
        &app_state.db_pool, &claims.sub, "edit", "lab", &id.to_string(),
        &format!("Updated lab {}", updated.lab.lab_no),
        &http_request,
    ).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

pub async fn delete_lab(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let claims = require_permission(&http_request, StaffRole::can_provision_labs)?;
    let id = parse_id(&path.into_inner(), "lab id")?;

    app_state.labs.delete(id).await?;

    audit(
        &app_state.db_pool, &claims.sub, "delete", "lab", &id.to_string(),
        &format!("Deleted lab {}", id),
        &http_request,
    ).await;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Lab deleted successfully")))
}
