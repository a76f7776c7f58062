// src/models/deadstock.rs

use serde::{Serialize, Deserialize};
use validator::Validate;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeadstockItem {
    pub id: i64,
    pub deadstock_id: String,
    pub po_no: Option<String>,
    pub purchase_year: Option<i64>,
    pub equipment_name: String,
    pub ds_number: Option<String>,
    pub quantity: i64,
    pub unit_rate: Option<f64>,
    pub cost: Option<f64>,
    pub remark: Option<String>,
    pub staff_id: i64,
    pub date_submitted: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeadstockRequest {
    #[validate(required(message = "deadstock_id is required"), length(min = 1, max = 100, message = "deadstock_id must be 1-100 characters"))]
    pub deadstock_id: Option<String>,
    #[validate(length(max = 100, message = "po_no cannot exceed 100 characters"))]
    pub po_no: Option<String>,
    #[validate(range(min = 1900, max = 2200, message = "purchase_year is out of range"))]
    pub purchase_year: Option<i64>,
    #[validate(required(message = "equipment_name is required"), length(min = 1, max = 255, message = "equipment_name must be 1-255 characters"))]
    pub equipment_name: Option<String>,
    #[validate(length(max = 100, message = "ds_number cannot exceed 100 characters"))]
    pub ds_number: Option<String>,
    #[validate(required(message = "quantity is required"), range(min = 1, message = "quantity must be positive"))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0.0, message = "unit_rate cannot be negative"))]
    pub unit_rate: Option<f64>,
    #[validate(range(min = 0.0, message = "cost cannot be negative"))]
    pub cost: Option<f64>,
    #[validate(length(max = 1000, message = "remark cannot exceed 1000 characters"))]
    pub remark: Option<String>,
}

impl CreateDeadstockRequest {
    /// Explicit cost, or quantity × unit rate when only the rate is known
    pub fn effective_cost(&self) -> Option<f64> {
        self.cost.or_else(|| {
            match (self.quantity, self.unit_rate) {
                (Some(q), Some(rate)) => Some(q as f64 * rate),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeadstockStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadstockStatusChange {
    pub deadstock_id: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateDeadstockRequest {
        CreateDeadstockRequest {
            deadstock_id: Some("DS-2024-01".into()),
            po_no: None,
            purchase_year: Some(2015),
            equipment_name: Some("CRT monitor".into()),
            ds_number: None,
            quantity: Some(4),
            unit_rate: Some(2500.0),
            cost: None,
            remark: None,
        }
    }

    #[test]
    fn test_effective_cost() {
        let mut req = request();
        assert_eq!(req.effective_cost(), Some(10000.0));

        req.cost = Some(9000.0);
        assert_eq!(req.effective_cost(), Some(9000.0));
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let mut req = request();
        assert!(req.validate().is_ok());

        req.equipment_name = None;
        assert!(req.validate().is_err());

        let mut req = request();
        req.quantity = Some(0);
        assert!(req.validate().is_err());
    }
}
