use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "invalid {} value: {}",
                        stringify!($name),
                        other
                    )),
                }
            }
        }
    };
}

closed_enum!(
    /// Where the work happens
    WorkPolicy {
        Remote => "Remote",
        Hybrid => "Hybrid",
        Onsite => "Onsite",
    }
);

closed_enum!(
    EmploymentType {
        FullTime => "Full-time",
        PartTime => "Part-time",
        Contract => "Contract",
        Internship => "Internship",
    }
);

closed_enum!(
    ExperienceLevel {
        Junior => "Junior",
        Mid => "Mid",
        Senior => "Senior",
        Lead => "Lead",
    }
);

closed_enum!(
    /// Job category; the listing filters on it by exact equality
    JobType {
        Tech => "Tech",
        NonTech => "Non-Tech",
        Management => "Management",
        Design => "Design",
    }
);

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Job posting as submitted to the single and bulk insert paths
#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_salary_range"))]
pub struct NewJob {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub work_policy: WorkPolicy,
    #[validate(length(min = 1, max = 200, message = "Location must be between 1 and 200 characters"))]
    pub location: String,
    #[validate(length(min = 1, max = 200, message = "Department must be between 1 and 200 characters"))]
    pub department: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub job_type: JobType,
    pub salary_range: SalaryRange,
    #[validate(custom(function = "validate_slug"))]
    pub job_slug: String,
    #[validate(range(min = 0, message = "posted_days_ago must not be negative"))]
    pub posted_days_ago: i32,
}

impl NewJob {
    /// Trim free text and lowercase the slug, the way the store keeps them.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.location = self.location.trim().to_string();
        self.department = self.department.trim().to_string();
        self.job_slug = self.job_slug.trim().to_lowercase();
        self.salary_range.currency = self.salary_range.currency.trim().to_string();
        if self.salary_range.currency.is_empty() {
            self.salary_range.currency = default_currency();
        }
        self
    }

    /// Flatten validator output into plain messages
    pub fn validation_messages(&self) -> Option<Vec<String>> {
        let errors = self.validate().err()?;
        let messages = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation error in field: {}", field))
                })
            })
            .collect();
        Some(messages)
    }
}

fn validate_salary_range(job: &NewJob) -> Result<(), ValidationError> {
    let range = &job.salary_range;
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
        let mut err = ValidationError::new("salary_range");
        err.message = Some("salary_range bounds must be non-negative numbers".into());
        return Err(err);
    }
    if range.min > range.max {
        let mut err = ValidationError::new("salary_range");
        err.message = Some("salary_range.min must not exceed salary_range.max".into());
        return Err(err);
    }
    Ok(())
}

/// Path segments under `/jobs` that a slug would collide with
const RESERVED_SLUGS: &[&str] = &["filters"];

/// Checked on the raw value; slugs are stored trimmed and lowercased, so
/// letter case is not an error here.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let slug = slug.trim();
    if RESERVED_SLUGS.iter().any(|r| slug.eq_ignore_ascii_case(r)) {
        let mut err = ValidationError::new("job_slug");
        err.message = Some(format!("job_slug '{}' is reserved", slug.to_lowercase()).into());
        return Err(err);
    }

    let valid = !slug.is_empty()
        && slug.len() <= 200
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("job_slug");
        err.message = Some("job_slug must be letters, digits, '-' or '_' (max 200)".into());
        Err(err)
    }
}

/// Listing-safe view of a job posting. Internal fields such as the row id
/// never appear here.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct JobSummary {
    pub title: String,
    pub work_policy: WorkPolicy,
    pub location: String,
    pub department: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub job_type: JobType,
    pub salary_range: SalaryRange,
    pub job_slug: String,
    pub posted_days_ago: i32,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}
