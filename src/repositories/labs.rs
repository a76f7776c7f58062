// src/repositories/labs.rs
//! Lab aggregate provisioning. The lab row, its equipment summary and its
//! staff assignment are only ever written together in one transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateLabRequest, EquipmentSummary, EquipmentSummaryInput, Lab, LabAggregate, LabStatus,
    StaffAssignment, StaffAssignmentInput, UpdateLabRequest,
};
use crate::validator::{reject_blank_fields, validate_staff_assignment};

const LAB_COLUMNS: &str =
    "id, lab_no, lab_name, building, floor, capacity, status, admin_id, created_at, updated_at";

#[derive(Clone)]
pub struct LabProvisioner {
    pool: SqlitePool,
}

fn parse_lab_status(status: Option<&str>) -> ApiResult<Option<LabStatus>> {
    match status {
        None => Ok(None),
        Some(s) => LabStatus::from_str(s).map(Some).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid lab status '{}'. Allowed: {}",
                s,
                LabStatus::all_values().join(", ")
            ))
        }),
    }
}

fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl LabProvisioner {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateLabRequest, admin_id: i64) -> ApiResult<LabAggregate> {
        request.validate()?;
        reject_blank_fields(&[
            ("lab_no", request.lab_no.as_deref()),
            ("lab_name", request.lab_name.as_deref()),
            ("building", request.building.as_deref()),
        ])
        .into_result()?;
        validate_staff_assignment(&request.staff).into_result()?;

        if admin_id <= 0 {
            return Err(ApiError::bad_request("Owning admin is required"));
        }
        let lab_no = required(request.lab_no, "lab_no")?;
        let lab_name = required(request.lab_name, "lab_name")?;
        let building = required(request.building, "building")?;
        let floor = required(request.floor, "floor")?;
        let status = parse_lab_status(request.status.as_deref())?.unwrap_or_default();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let lab_id = sqlx::query(
            r#"INSERT INTO labs
               (lab_no, lab_name, building, floor, capacity, status, admin_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(lab_no.trim())
        .bind(lab_name.trim())
        .bind(building.trim())
        .bind(floor)
        .bind(request.capacity)
        .bind(status.as_str())
        .bind(admin_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::from(e).with_conflict_message(&format!("Lab number '{}' already exists", lab_no.trim())))?
        .last_insert_rowid();

        let equipment = &request.equipment;
        sqlx::query(
            r#"INSERT INTO lab_equipment (lab_id, monitors, projectors, switch_boards, fans, wifi)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(lab_id)
        .bind(equipment.monitors.unwrap_or(0))
        .bind(equipment.projectors.unwrap_or(0))
        .bind(equipment.switch_boards.unwrap_or(0))
        .bind(equipment.fans.unwrap_or(0))
        .bind(equipment.wifi.unwrap_or(0))
        .execute(&mut *tx)
        .await?;

        let staff = &request.staff;
        sqlx::query(
            r#"INSERT INTO lab_staff
               (lab_id, incharge_name, incharge_email, incharge_phone,
                assistant_name, assistant_email, assistant_phone)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(lab_id)
        .bind(blank_to_none(&staff.incharge_name))
        .bind(blank_to_none(&staff.incharge_email).map(str::to_lowercase))
        .bind(blank_to_none(&staff.incharge_phone))
        .bind(blank_to_none(&staff.assistant_name))
        .bind(blank_to_none(&staff.assistant_email).map(str::to_lowercase))
        .bind(blank_to_none(&staff.assistant_phone))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!("🏫 Lab provisioned: {} (id {})", lab_no.trim(), lab_id);
        self.find_by_id(lab_id).await
    }

    /// Partial update. Sub-rows are upserted so a lab that lost them is repaired.
    pub async fn update(&self, id: i64, request: UpdateLabRequest) -> ApiResult<LabAggregate> {
        request.validate()?;
        reject_blank_fields(&[
            ("lab_no", request.lab_no.as_deref()),
            ("lab_name", request.lab_name.as_deref()),
            ("building", request.building.as_deref()),
        ])
        .into_result()?;
        if let Some(staff) = &request.staff {
            validate_staff_assignment(staff).into_result()?;
        }
        let status = parse_lab_status(request.status.as_deref())?;
        let equipment = request.equipment.unwrap_or_default();
        let staff = request.staff.unwrap_or_default();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE labs SET
                 lab_no = COALESCE(?, lab_no),
                 lab_name = COALESCE(?, lab_name),
                 building = COALESCE(?, building),
                 floor = COALESCE(?, floor),
                 capacity = COALESCE(?, capacity),
                 status = COALESCE(?, status),
                 updated_at = ?
               WHERE id = ?"#,
        )
        .bind(request.lab_no.as_deref().map(str::trim))
        .bind(request.lab_name.as_deref().map(str::trim))
        .bind(request.building.as_deref().map(str::trim))
        .bind(request.floor)
        .bind(request.capacity)
        .bind(status.map(|s| s.as_str()))
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::from(e).with_conflict_message("Lab number already exists"))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Lab"));
        }

        upsert_equipment(&mut tx, id, &equipment).await?;
        upsert_staff(&mut tx, id, &staff).await?;

        tx.commit().await?;

        log::info!("🏫 Lab updated: {}", id);
        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM lab_staff WHERE lab_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM lab_equipment WHERE lab_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM labs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Lab"));
        }

        tx.commit().await?;

        log::info!("🗑️ Lab deleted: {}", id);
        Ok(())
    }

    pub async fn find_all(&self) -> ApiResult<Vec<LabAggregate>> {
        let labs: Vec<Lab> = sqlx::query_as(&format!("SELECT {} FROM labs ORDER BY lab_no", LAB_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        let equipment: Vec<EquipmentSummary> = sqlx::query_as("SELECT * FROM lab_equipment")
            .fetch_all(&self.pool)
            .await?;

        let staff: Vec<StaffAssignment> = sqlx::query_as("SELECT * FROM lab_staff")
            .fetch_all(&self.pool)
            .await?;

        let mut equipment: std::collections::HashMap<i64, EquipmentSummary> =
            equipment.into_iter().map(|e| (e.lab_id, e)).collect();
        let mut staff: std::collections::HashMap<i64, StaffAssignment> =
            staff.into_iter().map(|s| (s.lab_id, s)).collect();

        Ok(labs
            .into_iter()
            .map(|lab| {
                let id = lab.id;
                LabAggregate::assemble(lab, equipment.remove(&id), staff.remove(&id))
            })
            .collect())
    }

    pub async fn find_by_id(&self, id: i64) -> ApiResult<LabAggregate> {
        let lab: Lab = sqlx::query_as(&format!("SELECT {} FROM labs WHERE id = ?", LAB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Lab"))?;

        let equipment = self.find_summary(id).await?;

        let staff: Option<StaffAssignment> = sqlx::query_as("SELECT * FROM lab_staff WHERE lab_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(LabAggregate::assemble(lab, equipment, staff))
    }

    pub async fn equipment_summary(&self, lab_id: i64) -> ApiResult<EquipmentSummary> {
        self.find_summary(lab_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Equipment summary"))
    }

    async fn find_summary(&self, lab_id: i64) -> ApiResult<Option<EquipmentSummary>> {
        let summary = sqlx::query_as("SELECT * FROM lab_equipment WHERE lab_id = ?")
            .bind(lab_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(summary)
    }
}

async fn upsert_equipment(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    lab_id: i64,
    equipment: &EquipmentSummaryInput,
) -> ApiResult<()> {
    sqlx::query(
        r#"INSERT INTO lab_equipment (lab_id, monitors, projectors, switch_boards, fans, wifi)
           VALUES (?1, COALESCE(?2, 0), COALESCE(?3, 0), COALESCE(?4, 0), COALESCE(?5, 0), COALESCE(?6, 0))
           ON CONFLICT(lab_id) DO UPDATE SET
             monitors = COALESCE(?2, monitors),
             projectors = COALESCE(?3, projectors),
             switch_boards = COALESCE(?4, switch_boards),
             fans = COALESCE(?5, fans),
             wifi = COALESCE(?6, wifi)"#,
    )
    .bind(lab_id)
    .bind(equipment.monitors)
    .bind(equipment.projectors)
    .bind(equipment.switch_boards)
    .bind(equipment.fans)
    .bind(equipment.wifi)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn upsert_staff(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    lab_id: i64,
    staff: &StaffAssignmentInput,
) -> ApiResult<()> {
    sqlx::query(
        r#"INSERT INTO lab_staff
             (lab_id, incharge_name, incharge_email, incharge_phone,
              assistant_name, assistant_email, assistant_phone)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(lab_id) DO UPDATE SET
             incharge_name = COALESCE(?2, incharge_name),
             incharge_email = COALESCE(?3, incharge_email),
             incharge_phone = COALESCE(?4, incharge_phone),
             assistant_name = COALESCE(?5, assistant_name),
             assistant_email = COALESCE(?6, assistant_email),
             assistant_phone = COALESCE(?7, assistant_phone)"#,
    )
    .bind(lab_id)
    .bind(blank_to_none(&staff.incharge_name))
    .bind(blank_to_none(&staff.incharge_email).map(str::to_lowercase))
    .bind(blank_to_none(&staff.incharge_phone))
    .bind(blank_to_none(&staff.assistant_name))
    .bind(blank_to_none(&staff.assistant_email).map(str::to_lowercase))
    .bind(blank_to_none(&staff.assistant_phone))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_pool;

    pub(crate) fn physics_lab(lab_no: &str) -> CreateLabRequest {
        CreateLabRequest {
            lab_no: Some(lab_no.to_string()),
            lab_name: Some("Physics".to_string()),
            building: Some("A".to_string()),
            floor: Some(1),
            capacity: Some(30),
            status: None,
            equipment: EquipmentSummaryInput {
                monitors: Some(10),
                projectors: Some(1),
                switch_boards: Some(4),
                fans: Some(6),
                wifi: Some(1),
            },
            staff: StaffAssignmentInput {
                incharge_name: Some("Dr. Rao".to_string()),
                incharge_email: Some("rao@college.edu".to_string()),
                incharge_phone: Some("+91 98450 11111".to_string()),
                assistant_name: Some("Meena".to_string()),
                assistant_email: Some("meena@college.edu".to_string()),
                assistant_phone: None,
            },
        }
    }

    async fn row_counts(pool: &SqlitePool) -> (i64, i64, i64) {
        let labs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM labs").fetch_one(pool).await.unwrap();
        let equipment: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lab_equipment").fetch_one(pool).await.unwrap();
        let staff: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lab_staff").fetch_one(pool).await.unwrap();
        (labs, equipment, staff)
    }

    #[actix_rt::test]
    async fn test_create_then_find_has_nested_rows() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool);

        let created = labs.create(physics_lab("L1"), 1).await.unwrap();
        assert!(created.lab.id > 0);
        assert_eq!(created.lab.status, "active");

        let found = labs.find_by_id(created.lab.id).await.unwrap();
        let equipment = found.equipment.expect("equipment summary");
        let staff = found.staff.expect("staff assignment");
        assert_eq!(equipment.monitors, 10);
        assert_eq!(staff.assistant_email.as_deref(), Some("meena@college.edu"));
    }

    #[actix_rt::test]
    async fn test_missing_fields_are_rejected() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());

        let mut request = physics_lab("L1");
        request.building = None;
        assert!(matches!(labs.create(request, 1).await, Err(ApiError::ValidationError(_))));

        assert!(matches!(labs.create(physics_lab("L1"), 0).await, Err(ApiError::BadRequest(_))));
        assert_eq!(row_counts(&pool).await, (0, 0, 0));
    }

    #[actix_rt::test]
    async fn test_whitespace_only_fields_are_invalid_input() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());

        let mut request = physics_lab("   ");
        request.lab_name = Some("\t".to_string());
        let err = labs.create(request, 1).await.unwrap_err();
        assert_eq!(err.category(), "invalid_input");
        assert_eq!(row_counts(&pool).await, (0, 0, 0));

        let id = labs.create(physics_lab("L1"), 1).await.unwrap().lab.id;
        let update = UpdateLabRequest { building: Some("  ".to_string()), ..Default::default() };
        let err = labs.update(id, update).await.unwrap_err();
        assert_eq!(err.category(), "invalid_input");
        assert_eq!(labs.find_by_id(id).await.unwrap().lab.building, "A");
    }

    #[actix_rt::test]
    async fn test_overlong_phone_is_invalid_input() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());

        let mut request = physics_lab("L1");
        request.staff.incharge_phone = Some("+12345678901234567890".to_string());
        let err = labs.create(request, 1).await.unwrap_err();
        assert_eq!(err.category(), "invalid_input");
        assert_eq!(row_counts(&pool).await, (0, 0, 0));
    }

    #[actix_rt::test]
    async fn test_duplicate_lab_no_is_conflict() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());

        labs.create(physics_lab("L1"), 1).await.unwrap();
        let err = labs.create(physics_lab("L1"), 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m.contains("L1")));
        assert_eq!(row_counts(&pool).await, (1, 1, 1));
    }

    #[actix_rt::test]
    async fn test_failed_third_insert_leaves_no_rows() {
        let pool = test_pool().await;
        sqlx::query(
            "CREATE TRIGGER fail_staff BEFORE INSERT ON lab_staff BEGIN SELECT RAISE(ABORT, 'injected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let labs = LabProvisioner::new(pool.clone());
        let err = labs.create(physics_lab("L1"), 1).await.unwrap_err();

        assert!(matches!(err, ApiError::DatabaseError(_)));
        assert_eq!(row_counts(&pool).await, (0, 0, 0));
    }

    #[actix_rt::test]
    async fn test_update_missing_lab_is_not_found() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());

        let request = UpdateLabRequest {
            lab_name: Some("Chemistry".to_string()),
            equipment: Some(EquipmentSummaryInput { fans: Some(2), ..Default::default() }),
            ..Default::default()
        };
        assert!(matches!(labs.update(42, request).await, Err(ApiError::NotFound(_))));
        assert_eq!(row_counts(&pool).await, (0, 0, 0));
    }

    #[actix_rt::test]
    async fn test_partial_update_keeps_other_fields() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool);
        let created = labs.create(physics_lab("L1"), 1).await.unwrap();

        let request = UpdateLabRequest {
            status: Some("maintenance".to_string()),
            equipment: Some(EquipmentSummaryInput { fans: Some(8), ..Default::default() }),
            staff: Some(StaffAssignmentInput {
                assistant_phone: Some("080-2345-6789".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = labs.update(created.lab.id, request).await.unwrap();

        assert_eq!(updated.lab.lab_name, "Physics");
        assert_eq!(updated.lab.status, "maintenance");
        assert!(updated.lab.updated_at >= created.lab.updated_at);
        let equipment = updated.equipment.unwrap();
        assert_eq!(equipment.fans, 8);
        assert_eq!(equipment.monitors, 10);
        let staff = updated.staff.unwrap();
        assert_eq!(staff.assistant_phone.as_deref(), Some("080-2345-6789"));
        assert_eq!(staff.incharge_name.as_deref(), Some("Dr. Rao"));
    }

    #[actix_rt::test]
    async fn test_update_rejects_unknown_status() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool);
        let created = labs.create(physics_lab("L1"), 1).await.unwrap();

        let request = UpdateLabRequest { status: Some("demolished".to_string()), ..Default::default() };
        assert!(matches!(labs.update(created.lab.id, request).await, Err(ApiError::BadRequest(_))));
    }

    #[actix_rt::test]
    async fn test_update_repairs_missing_sub_rows() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());
        let created = labs.create(physics_lab("L1"), 1).await.unwrap();

        sqlx::query("DELETE FROM lab_equipment").execute(&pool).await.unwrap();
        assert!(labs.find_by_id(created.lab.id).await.unwrap().equipment.is_none());

        let updated = labs.update(created.lab.id, UpdateLabRequest::default()).await.unwrap();
        assert_eq!(updated.equipment.unwrap().monitors, 0);
    }

    #[actix_rt::test]
    async fn test_delete_removes_aggregate() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());
        let created = labs.create(physics_lab("L1"), 1).await.unwrap();

        labs.delete(created.lab.id).await.unwrap();
        assert_eq!(row_counts(&pool).await, (0, 0, 0));
        assert!(matches!(labs.find_by_id(created.lab.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(labs.delete(created.lab.id).await, Err(ApiError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_failed_delete_leaves_aggregate() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());
        let created = labs.create(physics_lab("L1"), 1).await.unwrap();

        sqlx::query("CREATE TRIGGER keep_labs BEFORE DELETE ON labs BEGIN SELECT RAISE(ABORT, 'injected'); END")
            .execute(&pool)
            .await
            .unwrap();

        assert!(labs.delete(created.lab.id).await.is_err());
        assert_eq!(row_counts(&pool).await, (1, 1, 1));
    }

    #[actix_rt::test]
    async fn test_find_all_with_missing_staff_row() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool.clone());
        let first = labs.create(physics_lab("L1"), 1).await.unwrap();
        labs.create(physics_lab("L2"), 1).await.unwrap();

        sqlx::query("DELETE FROM lab_staff WHERE lab_id = ?")
            .bind(first.lab.id)
            .execute(&pool)
            .await
            .unwrap();

        let all = labs.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].lab.lab_no, "L1");
        assert!(all[0].staff.is_none());
        assert!(all[0].equipment.is_some());
        assert!(all[1].staff.is_some());
    }

    #[actix_rt::test]
    async fn test_equipment_summary() {
        let pool = test_pool().await;
        let labs = LabProvisioner::new(pool);
        let created = labs.create(physics_lab("L1"), 1).await.unwrap();

        let summary = labs.equipment_summary(created.lab.id).await.unwrap();
        assert_eq!(summary.projectors, 1);
        assert!(matches!(labs.equipment_summary(999).await, Err(ApiError::NotFound(_))));
    }
}
