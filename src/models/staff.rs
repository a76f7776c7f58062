// src/models/staff.rs

use serde::{Serialize, Deserialize};
use validator::Validate;
use chrono::{DateTime, Utc};

use crate::auth::StaffRole;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffAccountRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Account of one role; the hash never leaves the repository
#[derive(Debug, Clone, Serialize)]
pub struct StaffAccount {
    pub id: i64,
    pub role: StaffRole,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StaffAccount {
    pub fn from_row(role: StaffRole, row: StaffAccountRow) -> Self {
        Self {
            id: row.id,
            role,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStaffAccount {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}
