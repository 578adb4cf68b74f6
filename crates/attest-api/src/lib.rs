//! # attest-api: Axum API Service
//!
//! HTTP surface of the policy acknowledgement tracker. Handlers validate
//! input, call [`orchestration`] (which runs the `attest-state` operations
//! against the shared stores), write the result through to Postgres when a
//! pool is configured, and only then send notifications.
//!
//! ## API Surface
//!
//! | Prefix                         | Module                          |
//! |--------------------------------|---------------------------------|
//! | `/v1/customers/*`              | [`routes::customers`]           |
//! | `/v1/compliances/*`            | [`routes::compliances`]         |
//! | `/v1/customer-compliance/*`    | [`routes::customer_compliance`] |
//! | `/v1/employees/*`              | [`routes::employees`]           |
//! | `/v1/templates/*`              | [`routes::templates`]           |
//! | `/v1/policies/*`               | [`routes::policies`]            |
//! | `/v1/policy-configurations/*`  | [`routes::configurations`]      |
//! | `/v1/acknowledgements/*`       | [`routes::acknowledgements`]    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! Health probes and `/metrics` sit outside the stack.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::customers::router())
        .merge(routes::compliances::router())
        .merge(routes::customer_compliance::router())
        .merge(routes::employees::router())
        .merge(routes::templates::router())
        .merge(routes::policies::router())
        .merge(routes::configurations::router())
        .merge(routes::acknowledgements::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http());

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::render));

    Router::new().merge(probes).merge(api).with_state(state)
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: checks the database when one is configured.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    if let Some(pool) = &state.db_pool {
        sqlx::query("SELECT 1").execute(pool).await.map_err(|e| {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    }
    Ok("ready")
}
