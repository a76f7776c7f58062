//! Equipment registry endpoints. Every route is scoped to the lab of the
//! staff member named in the path, who must be the caller. The lab is found
//! through the caller's role, so there is no admin override here.

use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use crate::auth::{get_current_user, Claims};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_id, ApiResponse};
use crate::models::UpdateEquipmentRequest;

fn acting_staff(http_request: &HttpRequest, raw_staff_id: &str) -> ApiResult<(Claims, i64)> {
    let claims = get_current_user(http_request)?;
    let staff_id = parse_id(raw_staff_id, "staff id")?;
    if claims.staff_id()? != staff_id {
        return Err(ApiError::forbidden("Equipment routes are limited to the caller's own lab"));
    }
    Ok((claims, staff_id))
}

pub async fn list_by_staff(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let (claims, staff_id) = acting_staff(&http_request, &path.into_inner())?;
    let listing = app_state.equipment.list_by_staff(claims.role, staff_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(listing)))
}

pub async fn get_equipment(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (raw_staff_id, raw_equipment_id) = path.into_inner();
    let (claims, staff_id) = acting_staff(&http_request, &raw_staff_id)?;
    let equipment_id = parse_id(&raw_equipment_id, "equipment id")?;

    let item = app_state.equipment.get_one(claims.role, staff_id, equipment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(item)))
}

pub async fn update_equipment(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateEquipmentRequest>,
) -> ApiResult<HttpResponse> {
    let (raw_staff_id, raw_equipment_id) = path.into_inner();
    let (claims, staff_id) = acting_staff(&http_request, &raw_staff_id)?;
    let equipment_id = parse_id(&raw_equipment_id, "equipment id")?;

    let item = app_state
        .equipment
        .update(claims.role, staff_id, equipment_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(item)))
}

pub async fn delete_equipment(
    app_state: web::Data<Arc<AppState>>,
    http_request: HttpRequest,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (raw_staff_id, raw_equipment_id) = path.into_inner();
    let (claims, staff_id) = acting_staff(&http_request, &raw_staff_id)?;
    let equipment_id = parse_id(&raw_equipment_id, "equipment id")?;

    app_state.equipment.delete(claims.role, staff_id, equipment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Equipment deleted successfully")))
}
