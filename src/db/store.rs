use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::api::job::models::{JobSummary, NewJob};
use crate::query::Pipeline;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("duplicate job_slug '{value}' violates unique constraint {constraint}")]
    Duplicate { constraint: String, value: String },

    /// The store rejected the row shape (check constraint, bad enum text)
    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Duplicate,
    Validation,
    Store,
}

/// One record that did not make it into the store
#[derive(Debug, Clone, Serialize)]
pub struct InsertFailure {
    /// Position in the submitted batch
    pub index: usize,
    pub job_slug: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of an unordered bulk insert. Each record succeeds or fails on
/// its own.
#[derive(Debug, Default)]
pub struct BulkInsertReport {
    pub inserted: Vec<JobSummary>,
    pub failures: Vec<InsertFailure>,
}

impl BulkInsertReport {
    pub fn has_failures(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }

    pub(crate) fn record(&mut self, index: usize, job_slug: &str, result: Result<JobSummary, StoreError>) {
        match result {
            Ok(job) => self.inserted.push(job),
            Err(err) => {
                let (kind, message) = match &err {
                    StoreError::Duplicate { .. } => (FailureKind::Duplicate, err.to_string()),
                    StoreError::Invalid(_) => (FailureKind::Validation, err.to_string()),
                    StoreError::Query(_) | StoreError::Database(_) => {
                        error!("Insert of job_slug={} failed: {}", job_slug, err);
                        (FailureKind::Store, "Database error occurred".to_string())
                    }
                };
                self.failures.push(InsertFailure {
                    index,
                    job_slug: job_slug.to_string(),
                    kind,
                    message,
                });
            }
        }
    }
}

/// Job collection as seen by the listing core
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Run a listing pipeline and return the projected page
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<JobSummary>, StoreError>;

    async fn insert(&self, job: &NewJob) -> Result<JobSummary, StoreError>;

    /// Insert each job independently; a failing record never aborts its
    /// siblings. `jobs` pairs each record with its index in the submitted batch.
    async fn insert_many(&self, jobs: &[(usize, NewJob)]) -> BulkInsertReport {
        let mut report = BulkInsertReport::default();
        for (index, job) in jobs {
            let result = self.insert(job).await;
            report.record(*index, &job.job_slug, result);
        }
        report
    }

    async fn find_by_slug(&self, job_slug: &str) -> Result<Option<JobSummary>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}
