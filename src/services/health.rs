//! HTTP probes for whoever supervises the bot process.
//!
//! `/health` reports storage latency and how many plans are stored,
//! `/health/ready` answers once storage responds, `/health/live` always answers.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::database::connection::DatabaseManager;
use crate::database::repository::PlanRepository;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub checked_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub storage: StorageReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageReport {
    pub status: String,
    pub stored_plans: i64,
    pub open_connections: u32,
    pub response_time_ms: u128,
}

#[derive(Clone)]
struct ProbeState {
    db: Arc<DatabaseManager>,
    started_at: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        let state = ProbeState {
            db,
            started_at: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(report))
            .route("/health/ready", get(ready))
            .route("/health/live", get(|| async { Json("alive") }))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(state);

        Self { router }
    }
}

async fn report(State(state): State<ProbeState>) -> Result<Json<HealthReport>, StatusCode> {
    let started = Instant::now();
    let stored_plans = state.db.count().await.map_err(|e| {
        tracing::warn!("Health report could not reach storage: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let now = Utc::now();
    Ok(Json(HealthReport {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checked_at: now,
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
        storage: StorageReport {
            status: "reachable".to_string(),
            stored_plans,
            open_connections: state.db.pool.size(),
            response_time_ms: started.elapsed().as_millis(),
        },
    }))
}

async fn ready(State(state): State<ProbeState>) -> Result<Json<&'static str>, StatusCode> {
    match state.db.count().await {
        Ok(_) => Ok(Json("ready")),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn probe_server() -> (TestServer, Arc<DatabaseManager>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_url = format!("sqlite://{}", temp_dir.path().join("health.db").display());
        let db = Arc::new(DatabaseManager::new(&db_url).await.unwrap());
        db.run_migrations().await.unwrap();

        let server = TestServer::new(HealthService::new(db.clone()).router).unwrap();
        (server, db, temp_dir)
    }

    #[tokio::test]
    async fn test_report_counts_stored_plans() {
        let (server, db, _temp_dir) = probe_server().await;
        let due_at = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(18, 0, 0).unwrap();
        db.insert(42, "Buy milk", due_at).await.unwrap();

        let response = server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let report: HealthReport = response.json();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.storage.status, "reachable");
        assert_eq!(report.storage.stored_plans, 1);
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ready_and_live() {
        let (server, _db, _temp_dir) = probe_server().await;

        assert_eq!(server.get("/health/ready").await.json::<String>(), "ready");
        assert_eq!(server.get("/health/live").await.json::<String>(), "alive");
    }
}
