// src/monitoring.rs
use actix_web::{HttpResponse, web};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use serde::Serialize;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use std::time::Instant;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::time::{interval, sleep, Duration};

use crate::AppState;

const PRUNE_CHUNK: i64 = 1000;

#[derive(Debug)]
pub struct Metrics {
    pub request_count: AtomicU64,
    pub error_count: AtomicU64,
    pub response_times: std::sync::Mutex<Vec<u64>>,
    started_at: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            response_times: std::sync::Mutex::new(Vec::new()),
            started_at: Instant::now(),
        }
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_time(&self, time_ms: u64) {
        if let Ok(mut times) = self.response_times.lock() {
            times.push(time_ms);
            if times.len() > 1000 {
                times.remove(0);
            }
        }
    }

    pub fn average_response_time(&self) -> f64 {
        match self.response_times.lock() {
            Ok(times) if !times.is_empty() => times.iter().sum::<u64>() as f64 / times.len() as f64,
            _ => 0.0,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub requests_total: u64,
    pub errors_total: u64,
    pub avg_response_time_ms: f64,
    pub database_connections: u32,
    pub idle_connections: usize,
}

pub async fn health_check(metrics: web::Data<Metrics>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: metrics.uptime_seconds(),
    })
}

pub async fn readiness_check(app_state: web::Data<Arc<AppState>>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(&app_state.db_pool).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ready",
            "database": "connected"
        })),
        Err(e) => {
            log::warn!("Readiness probe failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "not ready",
                "database": "disconnected"
            }))
        }
    }
}

pub async fn metrics_endpoint(
    metrics: web::Data<Metrics>,
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    HttpResponse::Ok().json(MetricsResponse {
        requests_total: metrics.request_count.load(Ordering::Relaxed),
        errors_total: metrics.error_count.load(Ordering::Relaxed),
        avg_response_time_ms: metrics.average_response_time(),
        database_connections: app_state.db_pool.size(),
        idle_connections: app_state.db_pool.num_idle(),
    })
}

// ==================== REQUEST LOGGER MIDDLEWARE ====================

pub struct RequestLogger {
    metrics: Arc<Metrics>,
}

impl RequestLogger {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl<S, B> actix_web::dev::Transform<S, actix_web::dev::ServiceRequest> for RequestLogger
where
    S: actix_web::dev::Service<
        actix_web::dev::ServiceRequest,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    S::Future: 'static,
    B: 'static,
{
    type Response = actix_web::dev::ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware {
            service,
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
    metrics: Arc<Metrics>,
}

impl<S, B> actix_web::dev::Service<actix_web::dev::ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: actix_web::dev::Service<
        actix_web::dev::ServiceRequest,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    S::Future: 'static,
    B: 'static,
{
    type Response = actix_web::dev::ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: actix_web::dev::ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let metrics = self.metrics.clone();
        let method = req.method().clone();
        let path = req.path().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            metrics.increment_requests();
            let res = fut.await;
            let elapsed = start_time.elapsed().as_millis() as u64;
            metrics.record_response_time(elapsed);

            match res {
                Ok(ref response) if response.status().is_client_error() || response.status().is_server_error() => {
                    metrics.increment_errors();
                    tracing::debug!(%method, %path, status = response.status().as_u16(), elapsed_ms = elapsed, "request failed");
                }
                Err(_) => metrics.increment_errors(),
                _ => {}
            }
            res
        })
    }
}

// ==================== MAINTENANCE ====================

pub async fn start_maintenance_tasks(pool: SqlitePool, retention_days: i64) {
    tokio::spawn(async move {
        cleanup_old_audit_logs(pool, retention_days).await;
    });
}

async fn cleanup_old_audit_logs(pool: SqlitePool, retention_days: i64) {
    let mut interval = interval(Duration::from_secs(24 * 3600));

    loop {
        interval.tick().await;
        log::info!("Starting daily cleanup of audit logs...");

        match prune_audit_logs(&pool, retention_days).await {
            Ok(0) => {}
            Ok(total) => log::info!("Cleaned up {} old audit log entries in chunks", total),
            Err(e) => log::error!("Failed to cleanup audit logs: {}", e),
        }
    }
}

/// Deletes audit entries older than the retention window, in chunks so the
/// write lock is released between batches.
pub async fn prune_audit_logs(pool: &SqlitePool, retention_days: i64) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::days(retention_days);
    let mut total_deleted = 0;

    loop {
        let result = sqlx::query(
            "DELETE FROM audit_logs
             WHERE id IN (
                 SELECT id FROM audit_logs
                 WHERE created_at < ?
                 LIMIT ?
             )"
        )
        .bind(cutoff)
        .bind(PRUNE_CHUNK)
        .execute(pool)
        .await?;

        let count = result.rows_affected();
        total_deleted += count;
        if count < PRUNE_CHUNK as u64 {
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }

    Ok(total_deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_metrics_average() {
        let metrics = Metrics::new();
        assert_eq!(metrics.average_response_time(), 0.0);

        metrics.record_response_time(10);
        metrics.record_response_time(30);
        metrics.increment_requests();
        assert_eq!(metrics.average_response_time(), 20.0);
        assert_eq!(metrics.request_count.load(Ordering::Relaxed), 1);
    }

    #[actix_rt::test]
    async fn test_prune_keeps_recent_entries() {
        let pool = test_pool().await;
        let old = Utc::now() - chrono::Duration::days(120);
        let recent = Utc::now() - chrono::Duration::days(2);

        for (id, created_at) in [("old", old), ("recent", recent)] {
            sqlx::query("INSERT INTO audit_logs (id, action, entity_type, created_at) VALUES (?, 'delete', 'lab', ?)")
                .bind(id)
                .bind(created_at)
                .execute(&pool)
                .await
                .unwrap();
        }

        assert_eq!(prune_audit_logs(&pool, 90).await.unwrap(), 1);

        let remaining: Vec<String> = sqlx::query_scalar("SELECT id FROM audit_logs")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec!["recent".to_string()]);
    }
}
