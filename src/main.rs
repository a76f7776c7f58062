// labdesk: lab resource provisioning and maintenance request workflow service
use actix_web::{
    middleware::{Logger, DefaultHeaders, Compress},
    web, App, HttpServer,
};
use actix_web_httpauth::middleware::HttpAuthentication;
use actix_web::http::header;
use actix_cors::Cors;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use anyhow::Context;
use sqlx::SqlitePool;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Module declarations
mod auth;
mod audit;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod monitoring;
pub mod validator;
pub mod repositories;
mod lab_handlers;
mod equipment_handlers;
mod request_handlers;
mod notification_handlers;
mod deadstock_handlers;
mod staff_handlers;

use config::{load_config, Config};
use auth::{AuthService, StaffRole, jwt_middleware};
use error::ApiError;
use models::NewStaffAccount;
use monitoring::{Metrics, RequestLogger, start_maintenance_tasks};
use repositories::{
    DeadstockLedger, EquipmentRegistry, LabProvisioner, NotificationDispatcher, RequestWorkflow,
    RoleRepository, StaffRepository,
};

/// Shared state handed to every handler. Components hold clones of the one
/// pool opened at start-up.
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub labs: LabProvisioner,
    pub equipment: EquipmentRegistry,
    pub workflow: RequestWorkflow,
    pub notifications: NotificationDispatcher,
    pub deadstock: DeadstockLedger,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            labs: LabProvisioner::new(pool.clone()),
            equipment: EquipmentRegistry::new(pool.clone()),
            workflow: RequestWorkflow::new(pool.clone()),
            notifications: NotificationDispatcher::new(pool.clone()),
            deadstock: DeadstockLedger::new(pool.clone()),
            db_pool: pool,
            config,
        }
    }

    pub fn staff_repository(&self, role: StaffRole) -> RoleRepository {
        RoleRepository::new(self.db_pool.clone(), role, self.config.auth.bcrypt_cost)
    }
}

// ==================== ROUTES ====================

/// Routes mounted under `/api/v1`, behind bearer authentication
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg
        // Lab aggregates
        .service(
            web::scope("/labs")
                .route("", web::get().to(lab_handlers::get_all_labs))
                .route("", web::post().to(lab_handlers::create_lab))
                .route("/equipment/{lab_id}", web::get().to(lab_handlers::get_lab_equipment))
                .route("/{id}", web::get().to(lab_handlers::get_lab))
                .route("/{id}", web::put().to(lab_handlers::update_lab))
                .route("/{id}", web::delete().to(lab_handlers::delete_lab))
        )

        // Equipment registry
        .service(
            web::scope("/equipment")
                .route("/by-staff/{staff_id}", web::get().to(equipment_handlers::list_by_staff))
                .route("/{staff_id}/{equipment_id}", web::get().to(equipment_handlers::get_equipment))
                .route("/{staff_id}/{equipment_id}", web::put().to(equipment_handlers::update_equipment))
                .route("/{staff_id}/{equipment_id}", web::delete().to(equipment_handlers::delete_equipment))
        )

        // Requests and approvals
        .route("/admin/notifications", web::get().to(request_handlers::admin_requests))
        .service(
            web::scope("/requests")
                .route("", web::post().to(request_handlers::create_request))
                .route("/{id}", web::get().to(request_handlers::get_request))
                .route("/{id}/steps", web::put().to(request_handlers::advance_request))
                .route("/{id}/approval", web::put().to(request_handlers::set_approval))
        )

        // Notifications
        .service(
            web::scope("/notifications")
                .route("/{id}/read", web::put().to(notification_handlers::mark_read))
                .route("/{id}", web::delete().to(notification_handlers::delete_notification))
                .route("/{role}/{staff_id}", web::get().to(notification_handlers::get_inbox))
        )

        // Dead stock
        .service(
            web::scope("/deadstock")
                .route("", web::get().to(deadstock_handlers::get_deadstock))
                .route("", web::post().to(deadstock_handlers::add_deadstock_item))
                .route("/{deadstock_id}/status", web::put().to(deadstock_handlers::set_deadstock_status))
        )

        // Staff accounts
        .route("/staff/{role}", web::post().to(staff_handlers::register_staff));
}

/// JSON extractor settings; malformed bodies use the regular error envelope
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

// ==================== MAIN ====================

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    if config.is_production() {
        validate_production_config(&config)?;
    }

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to open database")?;
    db::run_migrations(&pool).await.context("Failed to run migrations")?;

    let auth_service = Arc::new(AuthService::new(&config.auth.jwt_secret));
    let app_state = Arc::new(AppState::new(pool.clone(), config.clone()));

    create_default_admin_if_needed(&app_state).await?;

    start_maintenance_tasks(pool.clone(), config.logging.audit_retention_days).await;

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let metrics_arc = Arc::new(Metrics::new());
    let metrics = web::Data::from(metrics_arc.clone());
    let server_config = config.clone();

    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&server_config.security.allowed_origins);
        let auth_middleware = HttpAuthentication::bearer(jwt_middleware);
        let security_headers = setup_security_headers(&server_config.security);

        App::new()
            .wrap(cors)
            .wrap(security_headers)
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(RequestLogger::new(metrics_arc.clone()))
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(metrics.clone())
            .app_data(json_config(server_config.security.max_request_size))

            // Health check and metrics (no auth)
            .service(
                web::scope("/health")
                    .route("", web::get().to(monitoring::health_check))
                    .route("/ready", web::get().to(monitoring::readiness_check))
                    .route("/metrics", web::get().to(monitoring::metrics_endpoint))
            )

            // Protected API endpoints
            .service(
                web::scope("/api/v1")
                    .wrap(auth_middleware)
                    .configure(configure_api)
            )
    })
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive))
        .client_request_timeout(std::time::Duration::from_secs(config.server.client_timeout));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)?
        .run()
        .await
        .context("Server failed to run")?;

    log::info!("Server stopped, closing database pool");
    pool.close().await;

    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        log::warn!("⚠️  Using wildcard CORS (*) in development mode");
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins.iter().filter(|o| !o.is_empty()) {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = config.logging.level.as_str();
            tracing_subscriber::EnvFilter::new(level)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn validate_production_config(config: &Config) -> anyhow::Result<()> {
    if config.auth.jwt_secret == Config::default().auth.jwt_secret {
        anyhow::bail!("Insecure JWT secret in production! Set JWT_SECRET.");
    }

    if config.security.allowed_origins.iter().any(|o| o == "*") {
        anyhow::bail!("Wildcard CORS origins not allowed in production!");
    }

    Ok(())
}

fn setup_security_headers(config: &config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains; preload"
        ));
    }

    headers
}

fn generate_admin_password() -> String {
    let mut rng = thread_rng();
    let base: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(14)
        .map(char::from)
        .collect();
    // Guarantee at least one digit and one symbol whatever the sample was
    format!("{}{}!", base, rng.gen_range(0..10))
}

async fn create_default_admin_if_needed(app_state: &AppState) -> anyhow::Result<()> {
    let admins = app_state.staff_repository(StaffRole::Admin);

    let count = admins
        .count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count admins: {}", e))?;
    if count > 0 {
        return Ok(());
    }

    let email = env::var("DEFAULT_ADMIN_EMAIL").unwrap_or_else(|_| "admin@labdesk.local".to_string());
    let (password, generated) = match env::var("DEFAULT_ADMIN_PASSWORD") {
        Ok(p) => (p, false),
        Err(_) => (generate_admin_password(), true),
    };

    let admin = admins
        .create(NewStaffAccount {
            name: "Administrator".to_string(),
            email,
            phone: None,
            password: password.clone(),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create default admin: {}", e))?;

    log::warn!("Default admin account created:");
    log::warn!("  Email: {}", admin.email);
    if generated {
        log::warn!("  Password: {} (generated - CHANGE IMMEDIATELY!)", password);
    }

    Ok(())
}
