// src/db.rs - Database schema and pool setup

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use anyhow::Result;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

pub async fn create_pool(db_config: &DatabaseConfig) -> Result<SqlitePool> {
    // Accepts both "sqlite:labdesk.db" and a bare file name
    let options = SqliteConnectOptions::from_str(&db_config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(db_config.connect_timeout));

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .idle_timeout(Duration::from_secs(db_config.idle_timeout))
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // ==================== STAFF ACCOUNTS (one table per role) ====================

    for table in ["admins", "hods", "lab_incharges", "lab_assistants"] {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 255),
                email TEXT NOT NULL UNIQUE CHECK(length(email) >= 5 AND length(email) <= 255),
                phone TEXT CHECK(phone IS NULL OR length(phone) <= 20),
                password_hash TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#
        );
        sqlx::query(&ddl).execute(pool).await?;
    }

    // ==================== LAB AGGREGATE ====================

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS labs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lab_no TEXT NOT NULL UNIQUE CHECK(length(lab_no) > 0 AND length(lab_no) <= 50),
            lab_name TEXT NOT NULL CHECK(length(lab_name) > 0 AND length(lab_name) <= 255),
            building TEXT NOT NULL CHECK(length(building) > 0 AND length(building) <= 255),
            floor INTEGER NOT NULL,
            capacity INTEGER CHECK(capacity IS NULL OR capacity >= 0),
            status TEXT NOT NULL DEFAULT 'active' CHECK(
                status IN ('active', 'inactive', 'maintenance')
            ),
            admin_id INTEGER NOT NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lab_equipment (
            lab_id INTEGER PRIMARY KEY,
            monitors INTEGER NOT NULL DEFAULT 0 CHECK(monitors >= 0),
            projectors INTEGER NOT NULL DEFAULT 0 CHECK(projectors >= 0),
            switch_boards INTEGER NOT NULL DEFAULT 0 CHECK(switch_boards >= 0),
            fans INTEGER NOT NULL DEFAULT 0 CHECK(fans >= 0),
            wifi INTEGER NOT NULL DEFAULT 0 CHECK(wifi >= 0),
            FOREIGN KEY (lab_id) REFERENCES labs (id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lab_staff (
            lab_id INTEGER PRIMARY KEY,
            incharge_name TEXT CHECK(incharge_name IS NULL OR length(incharge_name) <= 255),
            incharge_email TEXT CHECK(incharge_email IS NULL OR length(incharge_email) <= 255),
            incharge_phone TEXT CHECK(incharge_phone IS NULL OR length(incharge_phone) <= 20),
            assistant_name TEXT CHECK(assistant_name IS NULL OR length(assistant_name) <= 255),
            assistant_email TEXT CHECK(assistant_email IS NULL OR length(assistant_email) <= 255),
            assistant_phone TEXT CHECK(assistant_phone IS NULL OR length(assistant_phone) <= 20),
            FOREIGN KEY (lab_id) REFERENCES labs (id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== EQUIPMENT DETAIL ====================

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS equipment_items (
            equipment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            lab_id INTEGER NOT NULL,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 255),
            code TEXT NOT NULL CHECK(length(code) > 0 AND length(code) <= 100),
            equipment_type TEXT NOT NULL CHECK(
                equipment_type IN ('monitor', 'projector', 'switch_board', 'fan', 'wifi')
            ),
            status INTEGER NOT NULL DEFAULT 0,
            description TEXT CHECK(description IS NULL OR length(description) <= 1000),
            password TEXT CHECK(password IS NULL OR length(password) <= 255),
            updated_at DATETIME NOT NULL,
            FOREIGN KEY (lab_id) REFERENCES labs (id) ON DELETE CASCADE,
            UNIQUE(lab_id, code)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== REQUESTS ====================

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_of_problem TEXT NOT NULL CHECK(length(type_of_problem) > 0 AND length(type_of_problem) <= 255),
            department TEXT NOT NULL CHECK(length(department) > 0 AND length(department) <= 255),
            location TEXT NOT NULL CHECK(length(location) > 0 AND length(location) <= 255),
            complaint_details TEXT NOT NULL CHECK(length(complaint_details) > 0 AND length(complaint_details) <= 2000),
            reported_by INTEGER NOT NULL,
            reporter_role TEXT NOT NULL DEFAULT 'lab_assistant' CHECK(
                reporter_role IN ('admin', 'hod', 'lab_incharge', 'lab_assistant')
            ),
            approver_id INTEGER,
            assigned_person TEXT,
            verification_remarks TEXT,
            materials_used TEXT,
            resolved_inhouse INTEGER CHECK(resolved_inhouse IS NULL OR resolved_inhouse IN (0, 1)),
            resolved_remark TEXT,
            consumables_needed INTEGER CHECK(consumables_needed IS NULL OR consumables_needed IN (0, 1)),
            consumables_details TEXT,
            external_agency_needed INTEGER CHECK(external_agency_needed IS NULL OR external_agency_needed IN (0, 1)),
            external_agency_name TEXT,
            external_agency_details TEXT,
            current_step TEXT,
            completed_steps INTEGER NOT NULL DEFAULT 0 CHECK(completed_steps >= 0),
            admin_approval_status TEXT DEFAULT 'pending' CHECK(
                admin_approval_status IS NULL
                OR admin_approval_status IN ('pending', 'approved', 'rejected')
            ),
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== NOTIFICATIONS ====================

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_role TEXT NOT NULL CHECK(
                user_role IN ('admin', 'hod', 'lab_incharge', 'lab_assistant')
            ),
            staff_id INTEGER NOT NULL,
            payload TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0 CHECK(is_read IN (0, 1))
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== DEAD STOCK ====================

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS deadstock_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deadstock_id TEXT NOT NULL CHECK(length(deadstock_id) > 0 AND length(deadstock_id) <= 100),
            po_no TEXT CHECK(po_no IS NULL OR length(po_no) <= 100),
            purchase_year INTEGER,
            equipment_name TEXT NOT NULL CHECK(length(equipment_name) > 0 AND length(equipment_name) <= 255),
            ds_number TEXT CHECK(ds_number IS NULL OR length(ds_number) <= 100),
            quantity INTEGER NOT NULL CHECK(quantity > 0),
            unit_rate REAL CHECK(unit_rate IS NULL OR unit_rate >= 0),
            cost REAL CHECK(cost IS NULL OR cost >= 0),
            remark TEXT CHECK(remark IS NULL OR length(remark) <= 1000),
            staff_id INTEGER NOT NULL,
            date_submitted DATETIME NOT NULL,
            status TEXT CHECK(status IS NULL OR status IN ('approved', 'rejected'))
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== AUDIT ====================

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT,
            description TEXT,
            ip_address TEXT,
            user_agent TEXT,
            created_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    // ==================== CREATE INDEXES ====================

    let index_queries = [
        "CREATE INDEX IF NOT EXISTS idx_labs_status ON labs(status)",
        "CREATE INDEX IF NOT EXISTS idx_lab_staff_incharge_email ON lab_staff(incharge_email)",
        "CREATE INDEX IF NOT EXISTS idx_lab_staff_assistant_email ON lab_staff(assistant_email)",
        "CREATE INDEX IF NOT EXISTS idx_equipment_items_lab ON equipment_items(lab_id, equipment_type, code)",
        "CREATE INDEX IF NOT EXISTS idx_requests_created ON requests(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_requests_reporter ON requests(reported_by)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_inbox ON notifications(user_role, staff_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_deadstock_group ON deadstock_items(deadstock_id)",
        "CREATE INDEX IF NOT EXISTS idx_audit_created ON audit_logs(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_logs(entity_type, entity_id)",
    ];

    for query in index_queries.iter() {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            log::warn!("Failed to create index ({}): {}", query, e);
        }
    }

    Ok(())
}

/// Fresh single-connection in-memory database with the full schema.
///
/// An in-memory SQLite database lives per connection, so the pool is capped
/// at one connection to keep every query on the same database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.expect("second run");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<String> = tables.into_iter().map(|t| t.0).collect();

        for expected in ["labs", "lab_equipment", "lab_staff", "equipment_items", "requests",
                         "notifications", "deadstock_items", "audit_logs", "admins", "lab_assistants"] {
            assert!(names.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[actix_rt::test]
    async fn test_approval_status_check_constraint() {
        let pool = test_pool().await;
        let result = sqlx::query(
            r#"INSERT INTO requests (type_of_problem, department, location, complaint_details,
               reported_by, admin_approval_status, created_at, updated_at)
               VALUES ('x', 'y', 'z', 'w', 1, 'maybe', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')"#
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
