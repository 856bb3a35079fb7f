pub mod listing;
pub mod pipeline;
pub mod sanitize;

pub use listing::{ListingLimits, ListingParams, ListingQuery, SortDirection};
pub use pipeline::{build_pipeline, Condition, Field, Pipeline, Stage};
