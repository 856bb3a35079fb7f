use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, warn};

use super::api::{ClientError, JobsApi, JobsRequest};
use super::debounce::Debouncer;
use super::scroll::{FetchOutcome, FetchTicket, Phase, ScrollState};
use crate::api::job::models::JobSummary;
use crate::query::listing::{ListingLimits, ALL_JOB_TYPES, ALL_LOCATIONS};

/// Quiet period after the last search keystroke before the list is reloaded
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Delay applied to scroll-triggered page loads
pub const LOAD_MORE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilters {
    pub search: String,
    pub location: String,
    pub job_type: String,
    /// Most recently posted first
    pub sort_latest: bool,
}

impl Default for JobFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            location: ALL_LOCATIONS.to_string(),
            job_type: ALL_JOB_TYPES.to_string(),
            sort_latest: true,
        }
    }
}

impl JobFilters {
    pub fn request(&self, offset: u32, limit: u32) -> JobsRequest {
        JobsRequest {
            offset,
            limit,
            search: self.search.trim().to_string(),
            location: self.location.clone(),
            job_type: self.job_type.clone(),
            sort_by: self.sort_latest.to_string(),
        }
    }
}

/// Point-in-time copy of the controller state for rendering
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub items: Vec<JobSummary>,
    pub filters: JobFilters,
    pub phase: Phase,
    pub offset: u32,
    pub has_more: bool,
    pub loading: bool,
    /// Message from the most recent failed fetch, cleared by the next success
    pub last_error: Option<String>,
}

struct Inner {
    filters: JobFilters,
    scroll: ScrollState<JobSummary>,
    last_error: Option<String>,
}

struct Shared<A> {
    api: A,
    inner: Mutex<Inner>,
    search_timer: Mutex<Debouncer>,
    more_timer: Mutex<Debouncer>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: JobsApi> Shared<A> {
    /// Issue one fetch. With `only_if_more` the fetch is skipped unless the
    /// list can still grow, checked under the same lock that starts it.
    async fn fetch_page(&self, reset: bool, only_if_more: bool) -> Option<FetchOutcome<ClientError>> {
        let (ticket, request) = {
            let mut inner = lock(&self.inner);
            if only_if_more && !inner.scroll.can_load_more() {
                return None;
            }
            let ticket = inner.scroll.begin_fetch(reset);
            let request = inner.filters.request(ticket.offset, inner.scroll.limit());
            (ticket, request)
        };

        debug!(
            "Fetching jobs page {} (reset: {}, search: {:?})",
            request.offset, reset, request.search
        );
        let result = self.api.list_jobs(&request).await;
        Some(self.apply(ticket, result))
    }

    fn apply(
        &self,
        ticket: FetchTicket,
        result: Result<Vec<JobSummary>, ClientError>,
    ) -> FetchOutcome<ClientError> {
        let mut inner = lock(&self.inner);
        let outcome = inner.scroll.complete(ticket, result);
        match &outcome {
            FetchOutcome::Applied { received, has_more } => {
                inner.last_error = None;
                debug!("Received {} jobs (has more: {})", received, has_more);
            }
            FetchOutcome::Failed(err) => {
                warn!("Failed to fetch jobs page {}: {}", ticket.offset, err);
                inner.last_error = Some(err.to_string());
            }
            FetchOutcome::Stale => {
                debug!("Dropping superseded response for page {}", ticket.offset);
            }
        }
        outcome
    }

    fn update_filters(&self, change: impl FnOnce(&mut JobFilters)) {
        change(&mut lock(&self.inner).filters);
        // a queued page load belongs to the previous filter state
        lock(&self.more_timer).cancel();
    }
}

/// Drives the infinite-scroll listing: owns filter state, debounces search
/// input and scroll bursts, and merges pages from a [`JobsApi`].
///
/// Timers hold only weak references and are cancelled when the last handle
/// is dropped.
pub struct JobsListController<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for JobsListController<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: JobsApi> JobsListController<A> {
    /// `limit` is clamped to the server's default maximum page size; a
    /// larger value would make every full page look like the last one.
    pub fn new(api: A, limit: u32) -> Self {
        Self::with_filters(api, limit, JobFilters::default())
    }

    pub fn with_filters(api: A, limit: u32, filters: JobFilters) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                inner: Mutex::new(Inner {
                    filters,
                    scroll: ScrollState::new(limit.min(ListingLimits::default().max_limit)),
                    last_error: None,
                }),
                search_timer: Mutex::new(Debouncer::new(SEARCH_DEBOUNCE)),
                more_timer: Mutex::new(Debouncer::new(LOAD_MORE_DELAY)),
            }),
        }
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let inner = lock(&self.shared.inner);
        ListSnapshot {
            items: inner.scroll.items().to_vec(),
            filters: inner.filters.clone(),
            phase: inner.scroll.phase(),
            offset: inner.scroll.offset(),
            has_more: inner.scroll.has_more(),
            loading: inner.scroll.is_loading(),
            last_error: inner.last_error.clone(),
        }
    }

    pub fn is_search_pending(&self) -> bool {
        lock(&self.shared.search_timer).is_pending()
    }

    /// Reload from the first page with the current filters.
    pub async fn refresh(&self) -> FetchOutcome<ClientError> {
        lock(&self.shared.search_timer).cancel();
        lock(&self.shared.more_timer).cancel();
        self.reset_fetch().await
    }

    /// Record the search text and reload once typing pauses for
    /// [`SEARCH_DEBOUNCE`]. Each call restarts the wait.
    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.shared.update_filters(|filters| filters.search = search);

        let weak = Arc::downgrade(&self.shared);
        lock(&self.shared.search_timer).schedule(move || spawn_fetch(weak, true, false));
    }

    pub async fn set_location(&self, location: impl Into<String>) -> FetchOutcome<ClientError> {
        let location = location.into();
        self.shared.update_filters(|filters| filters.location = location);
        self.apply_filter_now().await
    }

    pub async fn set_job_type(&self, job_type: impl Into<String>) -> FetchOutcome<ClientError> {
        let job_type = job_type.into();
        self.shared.update_filters(|filters| filters.job_type = job_type);
        self.apply_filter_now().await
    }

    pub async fn set_sort_latest(&self, sort_latest: bool) -> FetchOutcome<ClientError> {
        self.shared.update_filters(|filters| filters.sort_latest = sort_latest);
        self.apply_filter_now().await
    }

    /// Queue the next page after [`LOAD_MORE_DELAY`]. Returns false without
    /// scheduling anything when the list is exhausted, not yet loaded, or a
    /// fetch is in flight.
    pub fn load_more(&self) -> bool {
        if !lock(&self.shared.inner).scroll.can_load_more() {
            return false;
        }
        let weak = Arc::downgrade(&self.shared);
        lock(&self.shared.more_timer).schedule(move || spawn_fetch(weak, false, true));
        true
    }

    async fn apply_filter_now(&self) -> FetchOutcome<ClientError> {
        // the immediate reload already carries any pending search text
        lock(&self.shared.search_timer).cancel();
        self.reset_fetch().await
    }

    async fn reset_fetch(&self) -> FetchOutcome<ClientError> {
        self.shared
            .fetch_page(true, false)
            .await
            .unwrap_or(FetchOutcome::Stale)
    }
}

fn spawn_fetch<A: JobsApi>(shared: Weak<Shared<A>>, reset: bool, only_if_more: bool) {
    if let Some(shared) = shared.upgrade() {
        tokio::spawn(async move {
            shared.fetch_page(reset, only_if_more).await;
        });
    }
}
