use actix_multipart::form::MultipartFormConfig;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use tracing::{error, info, warn};

use careers_jobs::api::job::dto::{BulkJobResponse, BulkJobsPayload};
use careers_jobs::api::job::JobService;
use careers_jobs::cli::{Cli, Command};
use careers_jobs::config::Config;
use careers_jobs::db::{self, JobRepository, JobStore, MemoryJobStore};
use careers_jobs::shutdown::ShutdownCoordinator;
use careers_jobs::logging;

fn io_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

async fn connect(config: &Config) -> std::io::Result<Pool<Postgres>> {
    let database_url = config.require_database_url().map_err(io_error)?;
    let pool = db::connection::get_connection(database_url, config.max_db_connections)
        .await
        .map_err(io_error)?;
    info!("Database connection pool established");
    Ok(pool)
}

async fn migrated_store(config: &Config) -> std::io::Result<Arc<dyn JobStore>> {
    let pool = connect(config).await?;
    db::migrations::run_migrations(&pool).await.map_err(io_error)?;
    Ok(Arc::new(JobRepository::new(pool)))
}

async fn seed(config: &Config, file: &std::path::Path) -> std::io::Result<()> {
    let raw = std::fs::read(file)?;
    let payload: BulkJobsPayload = serde_json::from_slice(&raw).map_err(io_error)?;

    let store = migrated_store(config).await?;
    let service = JobService::new(store.clone(), config.listing);
    let report = service.bulk_create_jobs(payload).await;
    let (status, response) = BulkJobResponse::from_report(report);

    for failure in &response.failures {
        warn!(
            "Job #{} ({}) rejected [{:?}]: {}",
            failure.index + 1,
            failure.job_slug,
            failure.kind,
            failure.message
        );
    }
    info!("Seed finished with status {}: {}", status, response.message);

    store.close().await;
    Ok(())
}

async fn serve(config: Config, in_memory: bool) -> std::io::Result<()> {
    let store: Arc<dyn JobStore> = if in_memory {
        warn!("Serving from the in-memory store; data is lost on exit");
        Arc::new(MemoryJobStore::new())
    } else {
        migrated_store(&config).await?
    };

    info!("Starting careers-jobs application");
    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Max filter length: {} characters", config.listing.max_filter_length);
    info!(
        "  - Page limit: default {}, max {}",
        config.listing.default_limit, config.listing.max_limit
    );

    let job_service = web::Data::new(JobService::new(store.clone(), config.listing));
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);
        let multipart_config = MultipartFormConfig::default().total_limit(max_payload_size);

        App::new()
            .app_data(job_service.clone())
            .app_data(payload_config)
            .app_data(multipart_config)
            .configure(careers_jobs::configure)
    })
    .bind(&config.bind_addr)?
    .run();

    info!("Server starting on http://{}", config.bind_addr);

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, store)
        .wait_for_shutdown()
        .await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    logging::init(&config.log_dir)?;

    let result = match cli.command() {
        Command::Serve { in_memory } => serve(config, in_memory).await,
        Command::Migrate => {
            let pool = connect(&config).await?;
            db::migrations::run_migrations(&pool).await.map_err(io_error)?;
            pool.close().await;
            Ok(())
        }
        Command::Seed { file } => seed(&config, &file).await,
    };

    if let Err(e) = &result {
        error!("careers-jobs exited with error: {}", e);
    }
    result
}
