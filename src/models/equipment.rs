// src/models/equipment.rs

use serde::{Serialize, Deserialize};
use validator::Validate;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::status::{EquipmentKind, EquipmentStatus};

/// Equipment-detail row as stored; `status` is the raw numeric code
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EquipmentRow {
    pub equipment_id: i64,
    pub lab_id: i64,
    pub name: String,
    pub code: String,
    pub equipment_type: String,
    pub status: i64,
    pub description: Option<String>,
    pub password: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Equipment-detail as returned by every registry read path
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentItem {
    pub equipment_id: i64,
    pub lab_id: i64,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub status: EquipmentStatus,
    pub description: Option<String>,
    pub password: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<EquipmentRow> for EquipmentItem {
    fn from(row: EquipmentRow) -> Self {
        Self {
            equipment_id: row.equipment_id,
            lab_id: row.lab_id,
            name: row.name,
            code: row.code,
            equipment_type: row.equipment_type,
            status: EquipmentStatus::decode(row.status),
            description: row.description,
            password: row.password,
            updated_at: row.updated_at,
        }
    }
}

/// Registry listing: flat list, named buckets and their counts
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentListing {
    pub lab_id: i64,
    pub counts: BTreeMap<&'static str, usize>,
    pub items: Vec<EquipmentItem>,
    pub grouped: BTreeMap<&'static str, Vec<EquipmentItem>>,
}

impl EquipmentListing {
    /// Groups items by kind. Every bucket is present even when empty;
    /// `total` counts all items including rows of an unrecognised type.
    pub fn from_items(lab_id: i64, items: Vec<EquipmentItem>) -> Self {
        let mut grouped: BTreeMap<&'static str, Vec<EquipmentItem>> = EquipmentKind::all()
            .iter()
            .map(|kind| (kind.bucket(), Vec::new()))
            .collect();

        for item in &items {
            if let Some(kind) = EquipmentKind::from_str(&item.equipment_type) {
                if let Some(bucket) = grouped.get_mut(kind.bucket()) {
                    bucket.push(item.clone());
                }
            }
        }

        let mut counts: BTreeMap<&'static str, usize> = grouped
            .iter()
            .map(|(bucket, list)| (*bucket, list.len()))
            .collect();
        counts.insert("total", items.len());

        Self { lab_id, counts, items, grouped }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEquipmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Code must be 1-100 characters"))]
    pub code: Option<String>,
    /// One of `active`, `maintenance`, `damaged`
    pub status: Option<String>,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 255, message = "Password cannot exceed 255 characters"))]
    pub password: Option<String>,
}
