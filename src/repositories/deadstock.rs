// src/repositories/deadstock.rs
//! Dead-stock write-off register. Line items sharing a `deadstock_id`
//! form one submission and are decided together.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateDeadstockRequest, DeadstockItem, DeadstockStatus, DeadstockStatusChange};

#[derive(Clone)]
pub struct DeadstockLedger {
    pool: SqlitePool,
}

impl DeadstockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_grouped(&self) -> ApiResult<BTreeMap<String, Vec<DeadstockItem>>> {
        let items: Vec<DeadstockItem> = sqlx::query_as(
            "SELECT * FROM deadstock_items ORDER BY deadstock_id, date_submitted, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut groups: BTreeMap<String, Vec<DeadstockItem>> = BTreeMap::new();
        for item in items {
            groups.entry(item.deadstock_id.clone()).or_default().push(item);
        }
        Ok(groups)
    }

    pub async fn add_item(&self, request: CreateDeadstockRequest, staff_id: i64) -> ApiResult<i64> {
        request.validate()?;
        let cost = request.effective_cost();

        let deadstock_id = request
            .deadstock_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request("deadstock_id is required"))?;
        let equipment_name = request
            .equipment_name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request("equipment_name is required"))?;
        let quantity = request
            .quantity
            .ok_or_else(|| ApiError::bad_request("quantity is required"))?;

        let id = sqlx::query(
            r#"INSERT INTO deadstock_items
               (deadstock_id, po_no, purchase_year, equipment_name, ds_number, quantity,
                unit_rate, cost, remark, staff_id, date_submitted)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(deadstock_id)
        .bind(&request.po_no)
        .bind(request.purchase_year)
        .bind(equipment_name)
        .bind(&request.ds_number)
        .bind(quantity)
        .bind(request.unit_rate)
        .bind(cost)
        .bind(&request.remark)
        .bind(staff_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        log::info!("📦 Dead-stock item {} added to {}", id, deadstock_id);
        Ok(id)
    }

    /// Decides every line item of a submission at once
    pub async fn set_status(&self, deadstock_id: &str, status: &str) -> ApiResult<DeadstockStatusChange> {
        let decided = DeadstockStatus::all()
            .iter()
            .copied()
            .find(|s| s.as_str() == status)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Invalid dead-stock status '{}'. Allowed: {}",
                    status,
                    DeadstockStatus::all_values().join(", ")
                ))
            })?;

        let result = sqlx::query("UPDATE deadstock_items SET status = ? WHERE deadstock_id = ?")
            .bind(decided.as_str())
            .bind(deadstock_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Dead-stock submission"));
        }

        log::info!("📦 Dead-stock {} marked {}", deadstock_id, decided);
        Ok(DeadstockStatusChange {
            deadstock_id: deadstock_id.to_string(),
            status: decided.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn line(deadstock_id: &str, name: &str) -> CreateDeadstockRequest {
        CreateDeadstockRequest {
            deadstock_id: Some(deadstock_id.to_string()),
            po_no: Some("PO-118".to_string()),
            purchase_year: Some(2012),
            equipment_name: Some(name.to_string()),
            ds_number: None,
            quantity: Some(2),
            unit_rate: Some(1500.0),
            cost: None,
            remark: None,
        }
    }

    #[actix_rt::test]
    async fn test_items_are_grouped_by_submission() {
        let ledger = DeadstockLedger::new(test_pool().await);
        ledger.add_item(line("DS-1", "CRT monitor"), 3).await.unwrap();
        ledger.add_item(line("DS-1", "Keyboard"), 3).await.unwrap();
        ledger.add_item(line("DS-2", "UPS"), 4).await.unwrap();

        let groups = ledger.list_grouped().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["DS-1"].len(), 2);
        assert_eq!(groups["DS-1"][0].cost, Some(3000.0));
        assert!(groups["DS-1"].iter().all(|i| i.status.is_none()));
        assert_eq!(groups["DS-2"][0].staff_id, 4);
    }

    #[actix_rt::test]
    async fn test_add_item_validates() {
        let ledger = DeadstockLedger::new(test_pool().await);
        let mut request = line("DS-1", "UPS");
        request.quantity = None;
        assert!(matches!(ledger.add_item(request, 3).await, Err(ApiError::ValidationError(_))));

        let mut request = line("   ", "UPS");
        request.deadstock_id = Some("   ".to_string());
        assert!(matches!(ledger.add_item(request, 3).await, Err(ApiError::BadRequest(_))));
    }

    #[actix_rt::test]
    async fn test_status_applies_to_whole_group() {
        let ledger = DeadstockLedger::new(test_pool().await);
        ledger.add_item(line("DS-1", "CRT monitor"), 3).await.unwrap();
        ledger.add_item(line("DS-1", "Keyboard"), 3).await.unwrap();
        ledger.add_item(line("DS-2", "UPS"), 3).await.unwrap();

        let change = ledger.set_status("DS-1", "approved").await.unwrap();
        assert_eq!(change.status, "approved");

        let groups = ledger.list_grouped().await.unwrap();
        assert!(groups["DS-1"].iter().all(|i| i.status.as_deref() == Some("approved")));
        assert!(groups["DS-2"][0].status.is_none());
    }

    #[actix_rt::test]
    async fn test_status_values_and_missing_group() {
        let ledger = DeadstockLedger::new(test_pool().await);
        ledger.add_item(line("DS-1", "UPS"), 3).await.unwrap();

        for bad in ["pending", "Approved", "scrapped"] {
            assert!(matches!(ledger.set_status("DS-1", bad).await, Err(ApiError::BadRequest(_))));
        }
        assert!(matches!(ledger.set_status("DS-404", "rejected").await, Err(ApiError::NotFound(_))));

        let json = serde_json::to_value(ledger.set_status("DS-1", "rejected").await.unwrap()).unwrap();
        assert_eq!(json["deadstockId"], "DS-1");
        assert_eq!(json["status"], "rejected");
    }
}
