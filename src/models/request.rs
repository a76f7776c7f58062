// src/models/request.rs
//! Maintenance/incident requests and their workflow projections

use serde::{Serialize, Deserialize};
use validator::Validate;
use chrono::{DateTime, Utc};

use super::status::{ApprovalStatus, RequestStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RequestRow {
    pub id: i64,
    pub type_of_problem: String,
    pub department: String,
    pub location: String,
    pub complaint_details: String,
    pub reported_by: i64,
    pub reporter_role: String,
    pub approver_id: Option<i64>,
    pub assigned_person: Option<String>,
    pub verification_remarks: Option<String>,
    pub materials_used: Option<String>,
    pub resolved_inhouse: Option<bool>,
    pub resolved_remark: Option<String>,
    pub consumables_needed: Option<bool>,
    pub consumables_details: Option<String>,
    pub external_agency_needed: Option<bool>,
    pub external_agency_name: Option<String>,
    pub external_agency_details: Option<String>,
    pub current_step: Option<String>,
    pub completed_steps: i64,
    pub admin_approval_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request as presented to clients, with both status dimensions
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    pub id: i64,
    pub type_of_problem: String,
    pub department: String,
    pub location: String,
    pub complaint_details: String,
    pub reported_by: i64,
    pub reporter_role: String,
    pub approver_id: Option<i64>,
    pub assigned_person: Option<String>,
    pub verification_remarks: Option<String>,
    pub materials_used: Option<String>,
    pub resolved_inhouse: Option<bool>,
    pub resolved_remark: Option<String>,
    pub consumables_needed: Option<bool>,
    pub consumables_details: Option<String>,
    pub external_agency_needed: Option<bool>,
    pub external_agency_name: Option<String>,
    pub external_agency_details: Option<String>,
    pub current_step: Option<String>,
    pub completed_steps: i64,
    pub status: RequestStatus,
    pub admin_approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestRow> for RequestView {
    fn from(row: RequestRow) -> Self {
        let admin_approval_status = row
            .admin_approval_status
            .as_deref()
            .and_then(ApprovalStatus::from_str)
            .unwrap_or_default();

        Self {
            id: row.id,
            type_of_problem: row.type_of_problem,
            department: row.department,
            location: row.location,
            complaint_details: row.complaint_details,
            reported_by: row.reported_by,
            reporter_role: row.reporter_role,
            approver_id: row.approver_id,
            assigned_person: row.assigned_person,
            verification_remarks: row.verification_remarks,
            materials_used: row.materials_used,
            resolved_inhouse: row.resolved_inhouse,
            resolved_remark: row.resolved_remark,
            consumables_needed: row.consumables_needed,
            consumables_details: row.consumables_details,
            external_agency_needed: row.external_agency_needed,
            external_agency_name: row.external_agency_name,
            external_agency_details: row.external_agency_details,
            current_step: row.current_step,
            completed_steps: row.completed_steps,
            status: RequestStatus::from_steps(row.completed_steps),
            admin_approval_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalChange {
    pub id: i64,
    pub status: ApprovalStatus,
}

// ==================== REQUEST DTOs ====================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRequestRequest {
    #[validate(length(min = 1, max = 255, message = "type_of_problem must be 1-255 characters"))]
    pub type_of_problem: String,
    #[validate(length(min = 1, max = 255, message = "department must be 1-255 characters"))]
    pub department: String,
    #[validate(length(min = 1, max = 255, message = "location must be 1-255 characters"))]
    pub location: String,
    #[validate(length(min = 1, max = 2000, message = "complaint_details must be 1-2000 characters"))]
    pub complaint_details: String,
    pub approver_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalRequest {
    pub status: String,
}

/// Step completion; optional fields are merged into the stored request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StepUpdateRequest {
    pub completed_steps: i64,
    #[validate(length(max = 100, message = "current_step cannot exceed 100 characters"))]
    pub current_step: Option<String>,
    #[validate(length(max = 255, message = "assigned_person cannot exceed 255 characters"))]
    pub assigned_person: Option<String>,
    #[validate(length(max = 2000, message = "verification_remarks cannot exceed 2000 characters"))]
    pub verification_remarks: Option<String>,
    #[validate(length(max = 2000, message = "materials_used cannot exceed 2000 characters"))]
    pub materials_used: Option<String>,
    pub resolved_inhouse: Option<bool>,
    #[validate(length(max = 2000, message = "resolved_remark cannot exceed 2000 characters"))]
    pub resolved_remark: Option<String>,
    pub consumables_needed: Option<bool>,
    #[validate(length(max = 2000, message = "consumables_details cannot exceed 2000 characters"))]
    pub consumables_details: Option<String>,
    pub external_agency_needed: Option<bool>,
    #[validate(length(max = 255, message = "external_agency_name cannot exceed 255 characters"))]
    pub external_agency_name: Option<String>,
    #[validate(length(max = 2000, message = "external_agency_details cannot exceed 2000 characters"))]
    pub external_agency_details: Option<String>,
}
