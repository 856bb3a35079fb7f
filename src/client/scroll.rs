//! Pure infinite-scroll state: accumulated items, the next page index and
//! the has-more signal. No I/O happens here; the controller feeds responses
//! back through [`ScrollState::complete`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded { has_more: bool },
}

/// Identifies one issued fetch. Only the most recently issued ticket may
/// change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pub offset: u32,
    pub reset: bool,
}

#[derive(Debug)]
pub enum FetchOutcome<E> {
    Applied { received: usize, has_more: bool },
    /// The fetch failed; items and `has_more` are untouched
    Failed(E),
    /// A newer fetch superseded this one; the response was dropped
    Stale,
}

#[derive(Debug, Clone)]
pub struct ScrollState<T> {
    items: Vec<T>,
    offset: u32,
    limit: u32,
    has_more: bool,
    loading: bool,
    phase: Phase,
    seq: u64,
    pending: Option<u64>,
}

impl<T> ScrollState<T> {
    pub fn new(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            limit: limit.max(1),
            has_more: false,
            loading: false,
            phase: Phase::Idle,
            seq: 0,
            pending: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Next page index to request
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.loading
    }

    /// Start a fetch. A reset clears the items and restarts at page 0; any
    /// fetch still in flight becomes stale.
    pub fn begin_fetch(&mut self, reset: bool) -> FetchTicket {
        if reset {
            self.items.clear();
            self.offset = 0;
        }
        self.seq += 1;
        self.pending = Some(self.seq);
        self.loading = true;
        self.phase = Phase::Loading;

        FetchTicket {
            seq: self.seq,
            offset: self.offset,
            reset,
        }
    }

    /// Merge the response for `ticket`.
    pub fn complete<E>(&mut self, ticket: FetchTicket, result: Result<Vec<T>, E>) -> FetchOutcome<E> {
        if self.pending != Some(ticket.seq) {
            return FetchOutcome::Stale;
        }
        self.pending = None;
        self.loading = false;

        match result {
            Ok(page) => {
                let received = page.len();
                self.has_more = received >= self.limit as usize;
                if ticket.reset {
                    self.items = page;
                    self.offset = 1;
                } else {
                    self.items.extend(page);
                    self.offset = ticket.offset + 1;
                }
                self.phase = Phase::Loaded {
                    has_more: self.has_more,
                };
                FetchOutcome::Applied {
                    received,
                    has_more: self.has_more,
                }
            }
            Err(err) => {
                self.phase = Phase::Loaded {
                    has_more: self.has_more,
                };
                FetchOutcome::Failed(err)
            }
        }
    }
}
