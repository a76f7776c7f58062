// src/repositories/equipment.rs
//! Equipment registry scoped to the acting staff member's lab

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::StaffRole;
use crate::error::{ApiError, ApiResult};
use crate::validator::reject_blank_fields;
use crate::models::{EquipmentItem, EquipmentListing, EquipmentRow, EquipmentStatus, UpdateEquipmentRequest};

const EQUIPMENT_COLUMNS: &str =
    "equipment_id, lab_id, name, code, equipment_type, status, description, password, updated_at";

#[derive(Clone)]
pub struct EquipmentRegistry {
    pool: SqlitePool,
}

impl EquipmentRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lab whose staff assignment names this account. Every other registry
    /// call goes through here first.
    pub async fn resolve_owning_lab(&self, role: StaffRole, staff_id: i64) -> ApiResult<i64> {
        let column = role
            .assignment_email_column()
            .ok_or_else(ApiError::no_lab_assigned)?;

        let query = format!(
            r#"SELECT ls.lab_id FROM lab_staff ls
               JOIN {table} s ON lower(s.email) = lower(ls.{column})
               WHERE s.id = ?
               ORDER BY ls.lab_id
               LIMIT 1"#,
            table = role.table(),
            column = column,
        );

        let lab_id: Option<i64> = sqlx::query_scalar(&query)
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;

        lab_id.ok_or_else(ApiError::no_lab_assigned)
    }

    pub async fn list_by_staff(&self, role: StaffRole, staff_id: i64) -> ApiResult<EquipmentListing> {
        let lab_id = self.resolve_owning_lab(role, staff_id).await?;

        let rows: Vec<EquipmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM equipment_items WHERE lab_id = ? ORDER BY equipment_type, code",
            EQUIPMENT_COLUMNS
        ))
        .bind(lab_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(EquipmentItem::from).collect();
        Ok(EquipmentListing::from_items(lab_id, items))
    }

    pub async fn get_one(&self, role: StaffRole, staff_id: i64, equipment_id: i64) -> ApiResult<EquipmentItem> {
        let lab_id = self.resolve_owning_lab(role, staff_id).await?;
        self.fetch_in_lab(lab_id, equipment_id).await
    }

    pub async fn update(
        &self,
        role: StaffRole,
        staff_id: i64,
        equipment_id: i64,
        request: UpdateEquipmentRequest,
    ) -> ApiResult<EquipmentItem> {
        request.validate()?;
        reject_blank_fields(&[
            ("name", request.name.as_deref()),
            ("code", request.code.as_deref()),
        ])
        .into_result()?;
        let status = match request.status.as_deref() {
            None => None,
            Some(s) => Some(EquipmentStatus::from_str(s).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Invalid equipment status '{}'. Allowed: active, maintenance, damaged",
                    s
                ))
            })?),
        };

        let lab_id = self.resolve_owning_lab(role, staff_id).await?;

        let result = sqlx::query(
            r#"UPDATE equipment_items SET
                 name = COALESCE(?, name),
                 code = COALESCE(?, code),
                 status = COALESCE(?, status),
                 description = COALESCE(?, description),
                 password = COALESCE(?, password),
                 updated_at = ?
               WHERE equipment_id = ? AND lab_id = ?"#,
        )
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.code.as_deref().map(str::trim))
        .bind(status.map(|s| s.encode()))
        .bind(&request.description)
        .bind(&request.password)
        .bind(Utc::now())
        .bind(equipment_id)
        .bind(lab_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::from(e).with_conflict_message("Equipment code already exists in this lab"))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Equipment"));
        }

        log::info!("🔧 Equipment {} updated in lab {}", equipment_id, lab_id);
        self.fetch_in_lab(lab_id, equipment_id).await
    }

    pub async fn delete(&self, role: StaffRole, staff_id: i64, equipment_id: i64) -> ApiResult<()> {
        let lab_id = self.resolve_owning_lab(role, staff_id).await?;

        let result = sqlx::query("DELETE FROM equipment_items WHERE equipment_id = ? AND lab_id = ?")
            .bind(equipment_id)
            .bind(lab_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Equipment"));
        }

        log::info!("🗑️ Equipment {} removed from lab {}", equipment_id, lab_id);
        Ok(())
    }

    async fn fetch_in_lab(&self, lab_id: i64, equipment_id: i64) -> ApiResult<EquipmentItem> {
        let row: EquipmentRow = sqlx::query_as(&format!(
            "SELECT {} FROM equipment_items WHERE equipment_id = ? AND lab_id = ?",
            EQUIPMENT_COLUMNS
        ))
        .bind(equipment_id)
        .bind(lab_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Equipment"))?;

        Ok(row.into())
    }
}
