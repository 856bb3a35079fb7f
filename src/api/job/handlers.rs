use actix_multipart::form::MultipartForm;
use actix_web::{
    get, post,
    web::{Data, Json, Path, Query, ServiceConfig, scope},
    HttpResponse,
};
use tracing::warn;

use super::dto::{BulkJobResponse, BulkJobsPayload, BulkUploadForm, FilterOptions};
use super::models::NewJob;
use super::service::{JobService, ServiceError};
use crate::api::validation::ApiResponse;
use crate::query::ListingParams;

/// `GET /jobs?offset=&limit=&search=&location=&jobType=&sortBy=`
#[get("")]
async fn list_jobs(
    service: Data<JobService>,
    params: Query<ListingParams>,
) -> Result<HttpResponse, ServiceError> {
    let jobs = service.list_jobs(&params).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(jobs)))
}

#[get("/filters")]
async fn filter_options() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(FilterOptions::current()))
}

#[get("/{job_slug}")]
async fn get_job(service: Data<JobService>, path: Path<String>) -> Result<HttpResponse, ServiceError> {
    let job = service.get_job(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(job)))
}

#[post("")]
async fn create_job(
    service: Data<JobService>,
    job: actix_web_validator::Json<NewJob>,
) -> Result<HttpResponse, ServiceError> {
    let created = service.create_job(job.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(created).with_message("Job created successfully")))
}

/// `POST /jobs/bulk` with `{jobs: [...]}` or a bare array
#[post("/bulk")]
async fn bulk_create_jobs(service: Data<JobService>, payload: Json<BulkJobsPayload>) -> HttpResponse {
    let report = service.bulk_create_jobs(payload.into_inner()).await;
    let (status, body) = BulkJobResponse::from_report(report);
    HttpResponse::build(status).json(body)
}

/// Same as `/jobs/bulk`, reading the JSON from an uploaded `file` field
#[post("/bulk/upload")]
async fn bulk_upload_jobs(
    service: Data<JobService>,
    form: MultipartForm<BulkUploadForm>,
) -> Result<HttpResponse, ServiceError> {
    let payload: BulkJobsPayload = serde_json::from_slice(&form.file.data).map_err(|e| {
        warn!("Uploaded bulk file is not valid JSON: {}", e);
        ServiceError::Validation(vec![
            "Uploaded file must contain a JSON array of jobs or {\"jobs\": [...]}".to_string(),
        ])
    })?;

    let report = service.bulk_create_jobs(payload).await;
    let (status, body) = BulkJobResponse::from_report(report);
    Ok(HttpResponse::build(status).json(body))
}

pub fn job_config(config: &mut ServiceConfig) {
    config.service(
        scope("/jobs")
            .service(list_jobs)
            .service(filter_options)
            .service(get_job)
            .service(create_job)
            .service(bulk_create_jobs)
            .service(bulk_upload_jobs),
    );
}
