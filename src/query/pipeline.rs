//! Staged listing pipeline: filter, sort, project, paginate.
//!
//! The builder is pure and total. Stores interpret the stages in order; see
//! `db::job_repository` and `db::memory`.

use super::listing::{ListingQuery, SortDirection};
use super::sanitize::escape_pattern;

/// Columns a stage may refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    WorkPolicy,
    Location,
    Department,
    EmploymentType,
    ExperienceLevel,
    JobType,
    SalaryRange,
    JobSlug,
    PostedDaysAgo,
    CreatedAt,
    UpdatedAt,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::WorkPolicy => "work_policy",
            Field::Location => "location",
            Field::Department => "department",
            Field::EmploymentType => "employment_type",
            Field::ExperienceLevel => "experience_level",
            Field::JobType => "job_type",
            Field::SalaryRange => "salary_range",
            Field::JobSlug => "job_slug",
            Field::PostedDaysAgo => "posted_days_ago",
            Field::CreatedAt => "created_at",
            Field::UpdatedAt => "updated_at",
        }
    }
}

/// Fields a public listing may expose
pub const LISTING_FIELDS: &[Field] = &[
    Field::Title,
    Field::WorkPolicy,
    Field::Location,
    Field::Department,
    Field::EmploymentType,
    Field::ExperienceLevel,
    Field::JobType,
    Field::SalaryRange,
    Field::JobSlug,
    Field::PostedDaysAgo,
    Field::CreatedAt,
    Field::UpdatedAt,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Case-insensitive containment match; `pattern` is already escaped
    Pattern { field: Field, pattern: String },
    Equals { field: Field, value: String },
    Or(Vec<Condition>),
    And(Vec<Condition>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Match(Condition),
    Sort { field: Field, direction: SortDirection },
    Project(&'static [Field]),
    Skip(u64),
    Limit(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    #[cfg(test)]
    pub(crate) fn from_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn filter(&self) -> Option<&Condition> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Match(condition) => Some(condition),
            _ => None,
        })
    }
}

/// Translate a validated query into pipeline stages.
pub fn build_pipeline(query: &ListingQuery) -> Pipeline {
    let mut conditions = Vec::new();

    if let Some(search) = query.search_filter() {
        let pattern = escape_pattern(search);
        conditions.push(Condition::Or(vec![
            Condition::Pattern {
                field: Field::Title,
                pattern: pattern.clone(),
            },
            Condition::Pattern {
                field: Field::Department,
                pattern,
            },
        ]));
    }

    if let Some(location) = query.location_filter() {
        conditions.push(Condition::Pattern {
            field: Field::Location,
            pattern: escape_pattern(location),
        });
    }

    if let Some(job_type) = query.job_type_filter() {
        conditions.push(Condition::Equals {
            field: Field::JobType,
            value: job_type.to_string(),
        });
    }

    let mut stages = Vec::with_capacity(5);

    match conditions.len() {
        0 => {}
        1 => stages.extend(conditions.pop().map(Stage::Match)),
        _ => stages.push(Stage::Match(Condition::And(conditions))),
    }

    stages.push(Stage::Sort {
        field: Field::PostedDaysAgo,
        direction: query.sort,
    });
    stages.push(Stage::Project(LISTING_FIELDS));
    stages.push(Stage::Skip(u64::from(query.offset) * u64::from(query.limit)));
    stages.push(Stage::Limit(u64::from(query.limit)));

    Pipeline { stages }
}
