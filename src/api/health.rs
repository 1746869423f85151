use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use tracing::debug;

use crate::api::session::SessionService;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    supabase: String,
    telegram: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    open_sessions: Option<usize>,
}

fn configured(present: bool) -> String {
    if present { "configured" } else { "not_configured" }.to_string()
}

/// Health check endpoint
///
/// Reports which sinks are configured. Unconfigured sinks are skipped on
/// submit, so the service stays healthy without them.
#[get("/health")]
async fn health_check(service: web::Data<SessionService>) -> impl Responder {
    let sinks = service.sinks();
    let open_sessions = service.session_count().await;
    debug!("Health check: {} open session(s)", open_sessions);

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        supabase: configured(sinks.data_store.is_some()),
        telegram: configured(sinks.notification.is_some()),
        open_sessions: Some(open_sessions),
    })
}

/// Liveness check endpoint
///
/// Simple check that the process is alive. Does not inspect sinks.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        supabase: "not_checked".to_string(),
        telegram: "not_checked".to_string(),
        open_sessions: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config.service(health_check).service(liveness_check);
}
