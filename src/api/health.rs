/// Health check endpoints for liveness and readiness probes
///
/// Readiness covers the two things every request depends on:
/// - The backing store can be read and parsed
/// - The avatar directory is present

use crate::{context::AppContext, error::{DirectoryError, DirectoryResult}};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    /// Application version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: f64,

    /// Individual component checks
    pub checks: Vec<ComponentHealth>,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health status of individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,

    /// Status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    /// Response time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,

    /// Optional error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/health/detailed", get(health_detailed))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
///
/// Succeeds whenever the process can answer at all.
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe
///
/// Returns 503 if the backing store is unreadable or the avatar directory
/// is missing.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = check_record_store(&ctx).await {
        tracing::warn!(error = %e, "readiness_probe_failed: record store check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if let Err(e) = check_avatar_storage(&ctx).await {
        tracing::warn!(error = %e, "readiness_probe_failed: avatar storage check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Detailed health check with all component statuses
pub async fn health_detailed(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let start = Instant::now();

    let checks = vec![
        check_record_store_detailed(&ctx).await,
        check_avatar_storage_detailed(&ctx).await,
    ];

    let overall_status = determine_overall_status(&checks);

    let health = HealthStatus {
        status: overall_status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: ctx.uptime_seconds(),
        checks,
        message: if overall_status == "healthy" {
            None
        } else {
            Some("One or more components are unhealthy".to_string())
        },
    };

    let status_code = match overall_status.as_str() {
        "healthy" | "degraded" => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    tracing::info!(
        status = %overall_status,
        duration_ms = start.elapsed().as_millis(),
        "health_check_completed"
    );

    (status_code, Json(health))
}

/// Check that the backing store parses; returns the record count
async fn check_record_store(ctx: &AppContext) -> DirectoryResult<usize> {
    Ok(ctx.backend.list_all().await?.len())
}

async fn check_record_store_detailed(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();
    let result = check_record_store(ctx).await.map(|count| {
        serde_json::json!({ "type": "json_file", "records": count })
    });
    component_from("record_store", start, result, "unhealthy")
}

/// Check that the avatar root exists
async fn check_avatar_storage(ctx: &AppContext) -> DirectoryResult<()> {
    let root = ctx.users.avatars().root();
    let metadata = tokio::fs::metadata(root).await.map_err(|e| {
        DirectoryError::Filesystem(format!("Avatar root {} unavailable: {}", root.display(), e))
    })?;

    if !metadata.is_dir() {
        return Err(DirectoryError::Filesystem(format!(
            "Avatar root {} is not a directory",
            root.display()
        )));
    }
    Ok(())
}

async fn check_avatar_storage_detailed(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();
    let result = check_avatar_storage(ctx)
        .await
        .map(|()| serde_json::json!({ "type": "disk" }));
    // Uploads recreate missing per-user directories, so this only degrades service
    component_from("avatar_storage", start, result, "degraded")
}

/// Fold a check result into a component report
fn component_from(
    name: &str,
    start: Instant,
    result: DirectoryResult<serde_json::Value>,
    failed_status: &str,
) -> ComponentHealth {
    let response_time_ms = Some(start.elapsed().as_millis() as u64);
    match result {
        Ok(details) => ComponentHealth {
            name: name.to_string(),
            status: "healthy".to_string(),
            response_time_ms,
            error: None,
            details: Some(details),
        },
        Err(e) => ComponentHealth {
            name: name.to_string(),
            status: failed_status.to_string(),
            response_time_ms,
            error: Some(e.to_string()),
            details: None,
        },
    }
}

/// Determine overall health status from individual checks
fn determine_overall_status(checks: &[ComponentHealth]) -> String {
    let unhealthy_count = checks.iter().filter(|c| c.status == "unhealthy").count();
    let degraded_count = checks.iter().filter(|c| c.status == "degraded").count();

    if unhealthy_count > 0 {
        "unhealthy".to_string()
    } else if degraded_count > 0 {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(status: &str) -> ComponentHealth {
        ComponentHealth {
            name: "c".to_string(),
            status: status.to_string(),
            response_time_ms: None,
            error: None,
            details: None,
        }
    }

    #[test]
    fn test_determine_overall_status() {
        assert_eq!(determine_overall_status(&[component("healthy")]), "healthy");
        assert_eq!(
            determine_overall_status(&[component("healthy"), component("degraded")]),
            "degraded"
        );
        assert_eq!(
            determine_overall_status(&[component("degraded"), component("unhealthy")]),
            "unhealthy"
        );
    }

    #[test]
    fn test_component_from_failure_uses_given_status() {
        let failed = component_from(
            "avatar_storage",
            Instant::now(),
            Err(DirectoryError::Filesystem("gone".to_string())),
            "degraded",
        );
        assert_eq!(failed.status, "degraded");
        assert!(failed.error.unwrap().contains("gone"));
        assert!(failed.details.is_none());
    }

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            uptime_seconds: 1.5,
            checks: vec![component("healthy")],
            message: None,
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("message").is_none());
        assert!(json["checks"][0].get("error").is_none());
    }
}
