use async_trait::async_trait;
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use std::sync::RwLock;
use tracing::debug;

use crate::api::job::models::{JobSummary, NewJob};
use crate::db::store::{JobStore, StoreError};
use crate::query::{Condition, Field, Pipeline, SortDirection, Stage};

/// Upper bound on compiled pattern size. Inputs are already length-checked
/// and escaped; this only caps the automaton.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

struct Record {
    id: u64,
    job: JobSummary,
}

#[derive(Default)]
struct Collection {
    next_id: u64,
    records: Vec<Record>,
}

/// Process-local job store. Interprets listing pipelines stage by stage and
/// enforces `job_slug` uniqueness like the database constraint does.
#[derive(Default)]
pub struct MemoryJobStore {
    collection: RwLock<Collection>,
}

enum Compiled {
    Pattern { field: Field, regex: Regex },
    Equals { field: Field, value: String },
    Or(Vec<Compiled>),
    And(Vec<Compiled>),
}

fn text_field(job: &JobSummary, field: Field) -> Option<&str> {
    match field {
        Field::Title => Some(&job.title),
        Field::Location => Some(&job.location),
        Field::Department => Some(&job.department),
        Field::JobSlug => Some(&job.job_slug),
        Field::WorkPolicy => Some(job.work_policy.as_str()),
        Field::EmploymentType => Some(job.employment_type.as_str()),
        Field::ExperienceLevel => Some(job.experience_level.as_str()),
        Field::JobType => Some(job.job_type.as_str()),
        Field::SalaryRange | Field::PostedDaysAgo | Field::CreatedAt | Field::UpdatedAt => None,
    }
}

fn compile(condition: &Condition) -> Result<Compiled, StoreError> {
    Ok(match condition {
        Condition::Pattern { field, pattern } => Compiled::Pattern {
            field: *field,
            regex: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .size_limit(PATTERN_SIZE_LIMIT)
                .build()
                .map_err(|e| StoreError::Query(e.to_string()))?,
        },
        Condition::Equals { field, value } => Compiled::Equals {
            field: *field,
            value: value.clone(),
        },
        Condition::Or(parts) => Compiled::Or(parts.iter().map(compile).collect::<Result<_, _>>()?),
        Condition::And(parts) => Compiled::And(parts.iter().map(compile).collect::<Result<_, _>>()?),
    })
}

impl Compiled {
    fn matches(&self, job: &JobSummary) -> bool {
        match self {
            Compiled::Pattern { field, regex } => text_field(job, *field).is_some_and(|v| regex.is_match(v)),
            Compiled::Equals { field, value } => text_field(job, *field).is_some_and(|v| v == value),
            Compiled::Or(parts) => parts.iter().any(|p| p.matches(job)),
            Compiled::And(parts) => parts.iter().all(|p| p.matches(job)),
        }
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Collection> {
        self.collection.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Collection> {
        self.collection.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<JobSummary>, StoreError> {
        let collection = self.read();
        let mut working: Vec<&Record> = collection.records.iter().collect();

        for stage in pipeline.stages() {
            match stage {
                Stage::Match(condition) => {
                    let compiled = compile(condition)?;
                    working.retain(|r| compiled.matches(&r.job));
                }
                Stage::Sort { field, direction } => {
                    if *field != Field::PostedDaysAgo {
                        return Err(StoreError::Query(format!("unsupported sort field {}", field.name())));
                    }
                    working.sort_by(|a, b| {
                        let primary = a.job.posted_days_ago.cmp(&b.job.posted_days_ago);
                        let primary = match direction {
                            SortDirection::Ascending => primary,
                            SortDirection::Descending => primary.reverse(),
                        };
                        primary.then(a.id.cmp(&b.id))
                    });
                }
                // Records hold listing fields only, so projection is a no-op.
                Stage::Project(_) => {}
                Stage::Skip(n) => {
                    let n = (*n).min(working.len() as u64) as usize;
                    working.drain(..n);
                }
                Stage::Limit(n) => {
                    working.truncate((*n).min(working.len() as u64) as usize);
                }
            }
        }

        debug!("Memory listing returned {} jobs", working.len());
        Ok(working.into_iter().map(|r| r.job.clone()).collect())
    }

    async fn insert(&self, job: &NewJob) -> Result<JobSummary, StoreError> {
        let mut collection = self.write();
        if collection.records.iter().any(|r| r.job.job_slug == job.job_slug) {
            return Err(StoreError::Duplicate {
                constraint: "job_postings_job_slug_key".to_string(),
                value: job.job_slug.clone(),
            });
        }

        let now = Utc::now().naive_utc();
        let summary = JobSummary {
            title: job.title.clone(),
            work_policy: job.work_policy,
            location: job.location.clone(),
            department: job.department.clone(),
            employment_type: job.employment_type,
            experience_level: job.experience_level,
            job_type: job.job_type,
            salary_range: job.salary_range.clone(),
            job_slug: job.job_slug.clone(),
            posted_days_ago: job.posted_days_ago,
            created_at: now,
            updated_at: now,
        };

        collection.next_id += 1;
        let id = collection.next_id;
        collection.records.push(Record {
            id,
            job: summary.clone(),
        });
        Ok(summary)
    }

    async fn find_by_slug(&self, job_slug: &str) -> Result<Option<JobSummary>, StoreError> {
        Ok(self
            .read()
            .records
            .iter()
            .find(|r| r.job.job_slug == job_slug)
            .map(|r| r.job.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
