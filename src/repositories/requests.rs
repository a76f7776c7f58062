// src/repositories/requests.rs
//! Maintenance request workflow: reporting, step progression and the
//! independent admin approval decision.

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use std::str::FromStr;

use super::notifications::notify;
use crate::auth::StaffRole;
use crate::error::{ApiError, ApiResult};
use crate::validator::reject_blank_fields;
use crate::models::{
    ApprovalChange, ApprovalStatus, CreateRequestRequest, RequestRow, RequestView, StepUpdateRequest,
    TERMINAL_STEP,
};

#[derive(Clone)]
pub struct RequestWorkflow {
    pool: SqlitePool,
}

/// Only the exact lower-case names are accepted
fn parse_approval(status: &str) -> ApiResult<ApprovalStatus> {
    ApprovalStatus::all()
        .iter()
        .copied()
        .find(|s| s.as_str() == status)
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid approval status '{}'. Allowed: {}",
                status,
                ApprovalStatus::all_values().join(", ")
            ))
        })
}

impl RequestWorkflow {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_request(
        &self,
        request: CreateRequestRequest,
        reporter_role: StaffRole,
        reporter_id: i64,
    ) -> ApiResult<RequestView> {
        request.validate()?;
        reject_blank_fields(&[
            ("type_of_problem", Some(request.type_of_problem.as_str())),
            ("department", Some(request.department.as_str())),
            ("location", Some(request.location.as_str())),
            ("complaint_details", Some(request.complaint_details.as_str())),
        ])
        .into_result()?;
        let now = Utc::now();

        let id = sqlx::query(
            r#"INSERT INTO requests
               (type_of_problem, department, location, complaint_details, reported_by, reporter_role,
                approver_id, completed_steps, admin_approval_status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)"#,
        )
        .bind(request.type_of_problem.trim())
        .bind(request.department.trim())
        .bind(request.location.trim())
        .bind(request.complaint_details.trim())
        .bind(reporter_id)
        .bind(reporter_role.as_str())
        .bind(request.approver_id)
        .bind(ApprovalStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        log::info!("📝 Request {} reported by {} {}", id, reporter_role, reporter_id);
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<RequestView> {
        let row: RequestRow = sqlx::query_as("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Request"))?;

        Ok(row.into())
    }

    /// Every request, newest first, with approval defaulted to pending
    pub async fn list_for_admin(&self) -> ApiResult<Vec<RequestView>> {
        let rows: Vec<RequestRow> = sqlx::query_as("SELECT * FROM requests ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(RequestView::from).collect())
    }

    /// Records completion of workflow steps. The counter never moves back and
    /// stops at the terminal step.
    pub async fn advance(&self, id: i64, update: StepUpdateRequest) -> ApiResult<RequestView> {
        update.validate()?;
        if update.completed_steps > TERMINAL_STEP {
            return Err(ApiError::BadRequest(format!(
                "completed_steps cannot exceed {}",
                TERMINAL_STEP
            )));
        }

        let mut tx = self.pool.begin().await?;

        let stored: i64 = sqlx::query_scalar("SELECT completed_steps FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Request"))?;

        if stored >= TERMINAL_STEP {
            return Err(ApiError::conflict("Request is closed and can no longer progress"));
        }
        if update.completed_steps < stored {
            return Err(ApiError::BadRequest(format!(
                "completed_steps cannot go back from {} to {}",
                stored, update.completed_steps
            )));
        }

        sqlx::query(
            r#"UPDATE requests SET
                 completed_steps = ?,
                 current_step = COALESCE(?, current_step),
                 assigned_person = COALESCE(?, assigned_person),
                 verification_remarks = COALESCE(?, verification_remarks),
                 materials_used = COALESCE(?, materials_used),
                 resolved_inhouse = COALESCE(?, resolved_inhouse),
                 resolved_remark = COALESCE(?, resolved_remark),
                 consumables_needed = COALESCE(?, consumables_needed),
                 consumables_details = COALESCE(?, consumables_details),
                 external_agency_needed = COALESCE(?, external_agency_needed),
                 external_agency_name = COALESCE(?, external_agency_name),
                 external_agency_details = COALESCE(?, external_agency_details),
                 updated_at = ?
               WHERE id = ?"#,
        )
        .bind(update.completed_steps)
        .bind(&update.current_step)
        .bind(&update.assigned_person)
        .bind(&update.verification_remarks)
        .bind(&update.materials_used)
        .bind(update.resolved_inhouse)
        .bind(&update.resolved_remark)
        .bind(update.consumables_needed)
        .bind(&update.consumables_details)
        .bind(update.external_agency_needed)
        .bind(&update.external_agency_name)
        .bind(&update.external_agency_details)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!("🔁 Request {} at step {}", id, update.completed_steps);
        self.get(id).await
    }

    /// Persists the admin decision and tells the reporter about it in the
    /// same transaction.
    pub async fn set_approval_status(&self, id: i64, status: &str) -> ApiResult<ApprovalChange> {
        let status = parse_approval(status)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE requests SET admin_approval_status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Request"));
        }

        let (reporter, raw_role): (i64, String) =
            sqlx::query_as("SELECT reported_by, reporter_role FROM requests WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let reporter_role = StaffRole::from_str(&raw_role).map_err(|_| {
            ApiError::InternalServerError(format!("Request {} has unknown reporter role '{}'", id, raw_role))
        })?;

        let payload = json!({
            "kind": "approval",
            "request_id": id,
            "status": status.as_str(),
            "message": format!("Request #{} was marked {}", id, status),
        });
        notify(&mut *tx, reporter_role, reporter, &payload).await?;

        tx.commit().await?;

        log::info!("✅ Request {} approval set to {}", id, status);
        Ok(ApprovalChange { id, status })
    }
}
