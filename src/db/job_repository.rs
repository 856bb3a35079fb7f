use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use crate::api::job::models::{JobSummary, NewJob};
use crate::db::models::JobRow;
use crate::db::store::{JobStore, StoreError};
use crate::query::{Condition, Field, Pipeline, SortDirection, Stage};
use crate::query::pipeline::LISTING_FIELDS;

const TABLE: &str = "job_postings";

/// PostgreSQL-backed job store
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Postgres>,
}

impl JobRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn columns(field: Field) -> &'static str {
    match field {
        Field::SalaryRange => "salary_min, salary_max, salary_currency",
        other => other.name(),
    }
}

fn select_list(fields: &[Field]) -> String {
    fields.iter().map(|f| columns(*f)).collect::<Vec<_>>().join(", ")
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    match condition {
        Condition::Pattern { field, pattern } => {
            qb.push(columns(*field)).push(" ~* ").push_bind(pattern.clone());
        }
        Condition::Equals { field, value } => {
            qb.push(columns(*field)).push(" = ").push_bind(value.clone());
        }
        Condition::Or(parts) => push_junction(qb, parts, " OR ", "FALSE"),
        Condition::And(parts) => push_junction(qb, parts, " AND ", "TRUE"),
    }
}

fn push_junction(qb: &mut QueryBuilder<'_, Postgres>, parts: &[Condition], separator: &str, empty: &str) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_condition(qb, part);
    }
    qb.push(")");
}

fn stage_rank(stage: &Stage) -> u8 {
    match stage {
        Stage::Match(_) => 0,
        Stage::Sort { .. } => 1,
        Stage::Project(_) => 2,
        Stage::Skip(_) => 3,
        Stage::Limit(_) => 4,
    }
}

/// Render a pipeline as a single SELECT. One statement can only express
/// the stages in filter, sort, project, skip, limit order, each at most once.
pub(crate) fn render_listing(pipeline: &Pipeline) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut last_rank = None;
    for stage in pipeline.stages() {
        let rank = stage_rank(stage);
        if last_rank.is_some_and(|last| rank <= last) {
            return Err(StoreError::Query(format!(
                "stage {:?} cannot follow an equal or later stage",
                stage
            )));
        }
        last_rank = Some(rank);
    }

    let projection = pipeline
        .stages()
        .iter()
        .find_map(|s| match s {
            Stage::Project(fields) => Some(*fields),
            _ => None,
        })
        .unwrap_or(LISTING_FIELDS);

    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(select_list(projection));
    qb.push(" FROM ").push(TABLE);

    for stage in pipeline.stages() {
        match stage {
            Stage::Match(condition) => {
                qb.push(" WHERE ");
                push_condition(&mut qb, condition);
            }
            Stage::Sort { field, direction } => {
                let dir = match direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                qb.push(format!(" ORDER BY {} {}, id ASC", columns(*field), dir));
            }
            Stage::Project(_) => {}
            Stage::Skip(n) => {
                qb.push(" OFFSET ").push_bind(*n as i64);
            }
            Stage::Limit(n) => {
                qb.push(" LIMIT ").push_bind(*n as i64);
            }
        }
    }

    Ok(qb)
}

fn map_write_error(err: sqlx::Error, job_slug: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate {
                constraint: db_err.constraint().unwrap_or("job_slug").to_string(),
                value: job_slug.to_string(),
            };
        }
        if db_err.is_check_violation() {
            return StoreError::Invalid(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl JobStore for JobRepository {
    #[instrument(skip_all)]
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<JobSummary>, StoreError> {
        let mut qb = render_listing(pipeline)?;
        debug!("Listing query: {}", qb.sql());

        let rows: Vec<JobRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(JobSummary::try_from).collect()
    }

    #[instrument(skip(self, job), fields(job_slug = %job.job_slug))]
    async fn insert(&self, job: &NewJob) -> Result<JobSummary, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {TABLE} (
                title, work_policy, location, department, employment_type,
                experience_level, job_type, salary_min, salary_max, salary_currency,
                job_slug, posted_days_ago
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            select_list(LISTING_FIELDS)
        );

        let row: JobRow = sqlx::query_as(&sql)
            .bind(&job.title)
            .bind(job.work_policy.as_str())
            .bind(&job.location)
            .bind(&job.department)
            .bind(job.employment_type.as_str())
            .bind(job.experience_level.as_str())
            .bind(job.job_type.as_str())
            .bind(job.salary_range.min)
            .bind(job.salary_range.max)
            .bind(&job.salary_range.currency)
            .bind(&job.job_slug)
            .bind(job.posted_days_ago)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &job.job_slug))?;

        debug!("Job inserted: job_slug={}", row.job_slug);
        JobSummary::try_from(row)
    }

    async fn find_by_slug(&self, job_slug: &str) -> Result<Option<JobSummary>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {TABLE} WHERE job_slug = $1",
            select_list(LISTING_FIELDS)
        );

        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(job_slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(JobSummary::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{build_pipeline, ListingLimits, ListingParams, ListingQuery};

    fn sql_for(params: ListingParams) -> String {
        let query = ListingQuery::from_params(&params, &ListingLimits::default()).unwrap();
        render_listing(&build_pipeline(&query)).unwrap().into_sql()
    }

    #[test]
    fn unfiltered_listing_has_no_where_clause() {
        let sql = sql_for(ListingParams::default());

        assert_eq!(
            sql,
            "SELECT title, work_policy, location, department, employment_type, experience_level, \
             job_type, salary_min, salary_max, salary_currency, job_slug, posted_days_ago, \
             created_at, updated_at FROM job_postings ORDER BY posted_days_ago ASC, id ASC \
             OFFSET $1 LIMIT $2"
        );
    }

    #[test]
    fn filters_are_bound_not_interpolated() {
        let sql = sql_for(ListingParams {
            search: Some("'; DROP TABLE job_postings; --".to_string()),
            location: Some("Berlin".to_string()),
            job_type: Some("Tech".to_string()),
            sort_by: Some("false".to_string()),
            ..Default::default()
        });

        assert!(sql.contains(
            " WHERE ((title ~* $1 OR department ~* $2) AND location ~* $3 AND job_type = $4)"
        ));
        assert!(sql.contains("ORDER BY posted_days_ago DESC, id ASC OFFSET $5 LIMIT $6"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn out_of_order_stages_are_refused() {
        let pipeline = Pipeline::from_stages(vec![Stage::Limit(5), Stage::Skip(0)]);

        assert!(matches!(render_listing(&pipeline), Err(StoreError::Query(_))));
    }
}
