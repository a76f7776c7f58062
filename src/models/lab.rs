// src/models/lab.rs
//! Lab aggregate: lab row plus its equipment summary and staff assignment

use serde::{Serialize, Deserialize};
use validator::Validate;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lab {
    pub id: i64,
    pub lab_no: String,
    pub lab_name: String,
    pub building: String,
    pub floor: i64,
    pub capacity: Option<i64>,
    pub status: String,
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-lab equipment counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EquipmentSummary {
    pub lab_id: i64,
    pub monitors: i64,
    pub projectors: i64,
    pub switch_boards: i64,
    pub fans: i64,
    pub wifi: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StaffAssignment {
    pub lab_id: i64,
    pub incharge_name: Option<String>,
    pub incharge_email: Option<String>,
    pub incharge_phone: Option<String>,
    pub assistant_name: Option<String>,
    pub assistant_email: Option<String>,
    pub assistant_phone: Option<String>,
}

/// Lab with its nested rows; a missing sub-row serializes as `null`
#[derive(Debug, Clone, Serialize)]
pub struct LabAggregate {
    #[serde(flatten)]
    pub lab: Lab,
    pub equipment: Option<EquipmentSummary>,
    pub staff: Option<StaffAssignment>,
}

impl LabAggregate {
    pub fn assemble(
        lab: Lab,
        equipment: Option<EquipmentSummary>,
        staff: Option<StaffAssignment>,
    ) -> Self {
        Self { lab, equipment, staff }
    }
}

// ==================== REQUEST DTOs ====================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EquipmentSummaryInput {
    #[validate(range(min = 0, max = 100000, message = "Monitor count must be non-negative"))]
    pub monitors: Option<i64>,
    #[validate(range(min = 0, max = 100000, message = "Projector count must be non-negative"))]
    pub projectors: Option<i64>,
    #[validate(range(min = 0, max = 100000, message = "Switch board count must be non-negative"))]
    pub switch_boards: Option<i64>,
    #[validate(range(min = 0, max = 100000, message = "Fan count must be non-negative"))]
    pub fans: Option<i64>,
    #[validate(range(min = 0, max = 100000, message = "Wifi count must be non-negative"))]
    pub wifi: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StaffAssignmentInput {
    #[validate(length(max = 255, message = "Incharge name cannot exceed 255 characters"))]
    pub incharge_name: Option<String>,
    #[validate(email(message = "Invalid incharge email"))]
    pub incharge_email: Option<String>,
    pub incharge_phone: Option<String>,
    #[validate(length(max = 255, message = "Assistant name cannot exceed 255 characters"))]
    pub assistant_name: Option<String>,
    #[validate(email(message = "Invalid assistant email"))]
    pub assistant_email: Option<String>,
    pub assistant_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLabRequest {
    #[validate(required(message = "lab_no is required"), length(min = 1, max = 50, message = "lab_no must be 1-50 characters"))]
    pub lab_no: Option<String>,
    #[validate(required(message = "lab_name is required"), length(min = 1, max = 255, message = "lab_name must be 1-255 characters"))]
    pub lab_name: Option<String>,
    #[validate(required(message = "building is required"), length(min = 1, max = 255, message = "building must be 1-255 characters"))]
    pub building: Option<String>,
    #[validate(required(message = "floor is required"), range(min = -10, max = 200, message = "floor is out of range"))]
    pub floor: Option<i64>,
    #[validate(range(min = 0, max = 10000, message = "capacity must be between 0 and 10000"))]
    pub capacity: Option<i64>,
    pub status: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub equipment: EquipmentSummaryInput,
    #[serde(default)]
    #[validate(nested)]
    pub staff: StaffAssignmentInput,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLabRequest {
    #[validate(length(min = 1, max = 50, message = "lab_no must be 1-50 characters"))]
    pub lab_no: Option<String>,
    #[validate(length(min = 1, max = 255, message = "lab_name must be 1-255 characters"))]
    pub lab_name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "building must be 1-255 characters"))]
    pub building: Option<String>,
    #[validate(range(min = -10, max = 200, message = "floor is out of range"))]
    pub floor: Option<i64>,
    #[validate(range(min = 0, max = 10000, message = "capacity must be between 0 and 10000"))]
    pub capacity: Option<i64>,
    pub status: Option<String>,
    #[validate(nested)]
    pub equipment: Option<EquipmentSummaryInput>,
    #[validate(nested)]
    pub staff: Option<StaffAssignmentInput>,
}
