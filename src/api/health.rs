use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use tracing::error;

use crate::api::job::JobService;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// General health check including store connectivity.
#[get("/health")]
async fn health_check(service: web::Data<JobService>) -> impl Responder {
    match service.store().ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unhealthy".to_string(),
                database: "disconnected".to_string(),
                error: Some("Database unavailable".to_string()),
            })
        }
    }
}

/// Readiness probe. Returns 503 while the store is unreachable; the
/// process recovers on its own once it returns.
#[get("/ready")]
async fn readiness_check(service: web::Data<JobService>) -> impl Responder {
    match service.store().ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ready".to_string(),
            database: "connected".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("Readiness check failed: database unavailable: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "not_ready".to_string(),
                database: "disconnected".to_string(),
                error: Some("Database unavailable".to_string()),
            })
        }
    }
}

/// Liveness probe. Does not touch dependencies.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        database: "not_checked".to_string(),
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryJobStore;
    use crate::query::ListingLimits;
    use actix_web::{test, App};
    use std::sync::Arc;

    #[actix_web::test]
    async fn probes_report_healthy_store() {
        let service = web::Data::new(JobService::new(
            Arc::new(MemoryJobStore::new()),
            ListingLimits::default(),
        ));
        let app = test::init_service(App::new().app_data(service).configure(health_config)).await;

        for path in ["/health", "/ready", "/live"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
            assert!(resp.status().is_success(), "{} returned {}", path, resp.status());
        }
    }
}
