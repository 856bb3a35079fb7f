pub mod api;
pub mod controller;
pub mod debounce;
pub mod scroll;

pub use api::{ClientError, HttpJobsApi, JobsApi, JobsRequest};
pub use controller::{JobFilters, JobsListController, ListSnapshot, LOAD_MORE_DELAY, SEARCH_DEBOUNCE};
pub use scroll::{FetchOutcome, Phase, ScrollState};
