//! Latest-request-wins task lookups.
//!
//! Every lookup is stamped with a sequence number when it is issued. After the
//! (simulated) latency and the filter/paginate step, a result is published
//! only if no newer lookup has been issued in the meantime, so a slow stale
//! lookup can never overwrite a fresher one.
//!
//! A lookup settles when it publishes, is superseded or is dropped mid-flight.
//! A session is loading while its newest lookup has not settled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::query::{filter_tasks, paginate, Page, SearchQuery};
use crate::task::{Task, TaskProvider};

/// Number of sessions kept before idle ones are evicted.
pub const MAX_SESSIONS: usize = 1024;

/// A completed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub query: SearchQuery,
    pub page: Page<Task>,
    /// Sequence number of the lookup that produced this result.
    pub stamp: u64,
}

impl SearchResult {
    /// The "no tasks found" outcome. Not an error.
    pub fn is_empty(&self) -> bool {
        self.page.items.is_empty()
    }
}

/// What a lookup produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// This lookup is the latest one and its result is now published.
    Fresh(SearchResult),
    /// A newer lookup was issued while this one was in flight; nothing was published.
    Superseded { stamp: u64, latest: u64 },
}

impl SearchOutcome {
    pub fn into_result(self) -> Option<SearchResult> {
        match self {
            SearchOutcome::Fresh(result) => Some(result),
            SearchOutcome::Superseded { .. } => None,
        }
    }
}

/// Search state of one user session.
pub struct SearchSession {
    provider: Arc<dyn TaskProvider>,
    page_size: usize,
    latency: Duration,
    issued: AtomicU64,
    settled: AtomicU64,
    published: RwLock<Option<SearchResult>>,
}

/// Marks a lookup settled when it goes out of scope, including on cancellation.
struct Settle<'a> {
    settled: &'a AtomicU64,
    stamp: u64,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.settled.fetch_max(self.stamp, Ordering::SeqCst);
    }
}

impl SearchSession {
    pub fn new(provider: Arc<dyn TaskProvider>, page_size: usize, latency: Duration) -> Self {
        Self {
            provider,
            page_size,
            latency,
            issued: AtomicU64::new(0),
            settled: AtomicU64::new(0),
            published: RwLock::new(None),
        }
    }

    /// Run a lookup for `query`.
    ///
    /// # Postconditions
    /// - Returns `Fresh` iff no lookup was issued after this one before it finished
    /// - `latest()` only ever moves to results of increasing stamp
    pub async fn search(&self, query: SearchQuery) -> SearchOutcome {
        let stamp = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _settle = Settle {
            settled: &self.settled,
            stamp,
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        // Skip the work entirely if we already lost.
        let latest = self.issued.load(Ordering::SeqCst);
        if latest != stamp {
            tracing::debug!(stamp, latest, "Search superseded before lookup");
            return SearchOutcome::Superseded { stamp, latest };
        }

        let tasks = self.provider.all_tasks().await;
        let filtered = filter_tasks(&tasks, &query.criteria);
        let page = paginate(&filtered, query.page_number(), self.page_size);
        let result = SearchResult { query, page, stamp };

        let mut published = self.published.write().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if latest != stamp {
            tracing::debug!(stamp, latest, "Search superseded, dropping stale result");
            return SearchOutcome::Superseded { stamp, latest };
        }
        *published = Some(result.clone());

        tracing::debug!(
            stamp,
            total = result.page.total_count,
            page = result.page.current_page,
            "Search published"
        );
        SearchOutcome::Fresh(result)
    }

    /// Last published result, if any lookup has completed.
    pub async fn latest(&self) -> Option<SearchResult> {
        self.published.read().await.clone()
    }

    /// True while the most recently issued lookup has not settled.
    pub fn is_loading(&self) -> bool {
        self.settled.load(Ordering::SeqCst) < self.issued.load(Ordering::SeqCst)
    }
}

/// A tracked session and the tick of its last use.
struct SessionEntry {
    session: Arc<SearchSession>,
    last_used: AtomicU64,
}

/// Search sessions keyed by client session id.
///
/// Sessions never share state; the task collection behind them is read-only.
///
/// # Invariants
/// - A loading session is never evicted, so an in-flight lookup always
///   reports against the session that issued it
/// - Once `limit` is reached, each new client evicts at most the
///   least-recently-used idle session; if none is idle the table grows
pub struct SearchSessions {
    provider: Arc<dyn TaskProvider>,
    page_size: usize,
    latency: Duration,
    limit: usize,
    clock: AtomicU64,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SearchSessions {
    pub fn new(provider: Arc<dyn TaskProvider>, page_size: usize, latency: Duration) -> Self {
        Self::with_limit(provider, page_size, latency, MAX_SESSIONS)
    }

    pub fn with_limit(
        provider: Arc<dyn TaskProvider>,
        page_size: usize,
        latency: Duration,
        limit: usize,
    ) -> Self {
        Self {
            provider,
            page_size,
            latency,
            limit: limit.max(1),
            clock: AtomicU64::new(0),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch the session for `id`, creating it on first use.
    pub async fn session(&self, id: &str) -> Arc<SearchSession> {
        if let Some(entry) = self.sessions.read().await.get(id) {
            entry.last_used.store(self.tick(), Ordering::SeqCst);
            return Arc::clone(&entry.session);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get(id) {
            entry.last_used.store(self.tick(), Ordering::SeqCst);
            return Arc::clone(&entry.session);
        }

        if sessions.len() >= self.limit {
            let idle = sessions
                .iter()
                .filter(|(_, entry)| !entry.session.is_loading())
                .min_by_key(|(_, entry)| entry.last_used.load(Ordering::SeqCst))
                .map(|(key, _)| key.clone());
            match idle {
                Some(key) => {
                    sessions.remove(&key);
                    tracing::debug!(evicted = %key, "Evicted idle search session");
                }
                None => tracing::warn!(
                    sessions = sessions.len(),
                    "All search sessions are loading, growing past the limit"
                ),
            }
        }

        let session = Arc::new(SearchSession::new(
            Arc::clone(&self.provider),
            self.page_size,
            self.latency,
        ));
        sessions.insert(
            id.to_string(),
            SessionEntry {
                session: Arc::clone(&session),
                last_used: AtomicU64::new(self.tick()),
            },
        );
        session
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }
}
