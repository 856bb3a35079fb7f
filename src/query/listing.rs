use serde::Deserialize;

use super::sanitize::{normalize_filter, validate_length};

/// Location option that disables the location filter
pub const ALL_LOCATIONS: &str = "All Locations";

/// Job type option that disables the job type filter
pub const ALL_JOB_TYPES: &str = "All Job Types";

pub const LOCATION_OPTIONS: &[&str] = &[
    ALL_LOCATIONS,
    "Berlin, Germany",
    "Dubai, United Arab Emirates",
    "Bangalore, India",
    "Boston, United States",
    "London, England, United Kingdom",
];

pub const JOB_TYPE_OPTIONS: &[&str] = &[ALL_JOB_TYPES, "Tech", "Non-Tech", "Management", "Design"];

/// (label, sortBy value)
pub const SORT_OPTIONS: &[(&str, &str)] = &[("Latest Jobs", "true"), ("Oldest Jobs", "false")];

/// Bounds applied while turning query-string input into a [`ListingQuery`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingLimits {
    pub max_filter_length: usize,
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            max_filter_length: 100,
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Raw listing parameters exactly as they arrive in the query string.
/// Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Which filter value was too long
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTooLong {
    pub field: &'static str,
    pub max_length: usize,
}

/// Validated listing request. Free-text filters are trimmed but not yet
/// escaped; escaping belongs to the pipeline builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub search: String,
    pub location: String,
    pub job_type: String,
    pub sort: SortDirection,
    /// Page index, not a row offset
    pub offset: u32,
    pub limit: u32,
}

impl ListingQuery {
    /// Parse raw parameters defensively. Only oversized free-text filters are
    /// rejected; everything else falls back to defaults.
    pub fn from_params(params: &ListingParams, limits: &ListingLimits) -> Result<Self, FilterTooLong> {
        let search = normalize_filter(params.search.as_deref().unwrap_or_default());
        let location = normalize_filter(params.location.as_deref().unwrap_or_default());

        if !validate_length(&search, limits.max_filter_length) {
            return Err(FilterTooLong {
                field: "search",
                max_length: limits.max_filter_length,
            });
        }
        if !validate_length(&location, limits.max_filter_length) {
            return Err(FilterTooLong {
                field: "location",
                max_length: limits.max_filter_length,
            });
        }

        let offset = params
            .offset
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .map(|n| n.min(u32::MAX as i64) as u32)
            .unwrap_or(0);

        let limit = params
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(|n| n.min(limits.max_limit as i64) as u32)
            .unwrap_or(limits.default_limit);

        let sort = match params
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("true")
        {
            "true" => SortDirection::Ascending,
            _ => SortDirection::Descending,
        };

        Ok(Self {
            search,
            location,
            job_type: normalize_filter(params.job_type.as_deref().unwrap_or_default()),
            sort,
            offset,
            limit,
        })
    }

    pub fn location_filter(&self) -> Option<&str> {
        (!self.location.is_empty() && self.location != ALL_LOCATIONS).then_some(self.location.as_str())
    }

    pub fn job_type_filter(&self) -> Option<&str> {
        (!self.job_type.is_empty() && self.job_type != ALL_JOB_TYPES).then_some(self.job_type.as_str())
    }

    pub fn search_filter(&self) -> Option<&str> {
        (!self.search.is_empty()).then_some(self.search.as_str())
    }
}
