//! Careers page job listing: a safe, paginated job search endpoint and the
//! infinite-scroll client that consumes it.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod logging;
pub mod query;
pub mod shutdown;

use actix_web::web;

use crate::api::{health::health_config, job::handlers::job_config, validation};

/// Register every route plus the extractor configs they rely on.
/// `JobService` must be provided as app data by the caller.
pub fn configure(config: &mut web::ServiceConfig) {
    config
        .app_data(validation::json_config())
        .app_data(validation::plain_json_config())
        .app_data(validation::query_config())
        .configure(health_config)
        .configure(job_config);
}
