// src/repositories/staff.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use super::StaffRepository;
use crate::auth::StaffRole;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewStaffAccount, StaffAccount, StaffAccountRow};
use crate::validator::{reject_blank_fields, FieldValidator};

/// Single repository implementation; the role picks the table
#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
    role: StaffRole,
    bcrypt_cost: u32,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool, role: StaffRole, bcrypt_cost: u32) -> Self {
        Self { pool, role, bcrypt_cost }
    }
}

#[async_trait]
impl StaffRepository for RoleRepository {
    fn role(&self) -> StaffRole {
        self.role
    }

    async fn find_by_credential(&self, email: &str) -> ApiResult<Option<StaffAccount>> {
        let query = format!(
            "SELECT id, name, email, phone, password_hash, created_at FROM {} WHERE email = ?",
            self.role.table()
        );

        let row = sqlx::query_as::<_, StaffAccountRow>(&query)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| StaffAccount::from_row(self.role, row)))
    }

    async fn create(&self, account: NewStaffAccount) -> ApiResult<StaffAccount> {
        account.validate()?;
        reject_blank_fields(&[("name", Some(account.name.as_str()))]).into_result()?;
        if let Some(phone) = account.phone.as_deref() {
            FieldValidator::phone(phone).map_err(|e| ApiError::ValidationError(e.to_string()))?;
        }

        let email = account.email.trim().to_lowercase();
        let password_hash = bcrypt::hash(&account.password, self.bcrypt_cost)
            .map_err(|e| ApiError::InternalServerError(format!("Failed to hash password: {}", e)))?;
        let now = Utc::now();

        let query = format!(
            "INSERT INTO {} (name, email, phone, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
            self.role.table()
        );

        let result = sqlx::query(&query)
            .bind(account.name.trim())
            .bind(&email)
            .bind(&account.phone)
            .bind(&password_hash)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| ApiError::from(e).with_conflict_message("An account with this email already exists"))?;

        log::info!("👤 {} account created: {}", self.role.display_name(), email);

        Ok(StaffAccount {
            id: result.last_insert_rowid(),
            role: self.role,
            name: account.name.trim().to_string(),
            email,
            phone: account.phone,
            password_hash,
            created_at: now,
        })
    }

    async fn count(&self) -> ApiResult<i64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.role.table());
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn account(email: &str) -> NewStaffAccount {
        NewStaffAccount {
            name: "Ravi Kumar".to_string(),
            email: email.to_string(),
            phone: Some("+91 98450 12345".to_string()),
            password: "Sup3rSecret".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_create_and_find_by_credential() {
        let pool = test_pool().await;
        let repo = RoleRepository::new(pool, StaffRole::LabAssistant, 4);

        let created = repo.create(account("Ravi@Example.com")).await.unwrap();
        assert_eq!(created.email, "ravi@example.com");
        assert!(bcrypt::verify("Sup3rSecret", &created.password_hash).unwrap());

        let found = repo.find_by_credential("ravi@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, StaffRole::LabAssistant);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[actix_rt::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = test_pool().await;
        let repo = RoleRepository::new(pool, StaffRole::Hod, 4);

        repo.create(account("hod@example.com")).await.unwrap();
        let err = repo.create(account("hod@example.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_roles_are_stored_separately() {
        let pool = test_pool().await;
        let incharges = RoleRepository::new(pool.clone(), StaffRole::LabIncharge, 4);
        let assistants = RoleRepository::new(pool, StaffRole::LabAssistant, 4);

        incharges.create(account("same@example.com")).await.unwrap();
        assistants.create(account("same@example.com")).await.unwrap();

        assert!(incharges.find_by_credential("same@example.com").await.unwrap().is_some());
        assert_eq!(assistants.count().await.unwrap(), 1);
        assert_eq!(assistants.role(), StaffRole::LabAssistant);
    }

    #[actix_rt::test]
    async fn test_invalid_account_is_rejected() {
        let pool = test_pool().await;
        let repo = RoleRepository::new(pool, StaffRole::Admin, 4);

        let mut bad = account("not-an-email");
        assert!(matches!(repo.create(bad.clone()).await, Err(ApiError::ValidationError(_))));

        bad = account("ok@example.com");
        bad.phone = Some("call me".to_string());
        assert!(matches!(repo.create(bad).await, Err(ApiError::ValidationError(_))));

        bad = account("ok@example.com");
        bad.name = "   ".to_string();
        assert!(matches!(repo.create(bad).await, Err(ApiError::ValidationError(_))));

        bad = account("ok@example.com");
        bad.phone = Some("+12345678901234567890".to_string());
        assert!(matches!(repo.create(bad).await, Err(ApiError::ValidationError(_))));
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
