use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::cache::{InFlight, QueryCache, QueryData, QueryView, SharedFetch};
use super::key::{QueryKey, QueryKind};
use crate::core::news::client::{NewsError, NewsSource};
use crate::core::news::types::{NewsArticle, NewsPage};
use crate::core::store::models::NewsFilters;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// How long a successful fetch is served without going back to the network.
    pub stale_time: Duration,
    /// How long an unobserved entry is kept before `collect_garbage` drops it.
    /// Never shorter than `stale_time` in effect.
    pub cache_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            cache_time: DEFAULT_CACHE_TIME,
        }
    }
}

/// Cache of news queries keyed by filter snapshot.
///
/// Fetches run on spawned tasks and always land in the cache, whether or not
/// the caller that started them is still waiting. Concurrent observers of
/// the same key share one in-flight request.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    source: Arc<dyn NewsSource>,
    cache: Mutex<QueryCache>,
    options: QueryOptions,
}

enum NextStep {
    Serve,
    Wait(SharedFetch),
    Revalidate,
}

impl QueryClient {
    pub fn new(source: impl NewsSource, options: QueryOptions) -> Self {
        Self::from_shared(Arc::new(source), options)
    }

    pub fn from_shared(source: Arc<dyn NewsSource>, options: QueryOptions) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                source,
                cache: Mutex::new(QueryCache::default()),
                options,
            }),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    pub fn latest(&self, filters: &NewsFilters) -> QueryHandle {
        self.handle(QueryKey::latest(filters))
    }

    pub fn infinite(&self, filters: &NewsFilters) -> QueryHandle {
        self.handle(QueryKey::infinite(filters))
    }

    pub fn handle(&self, key: QueryKey) -> QueryHandle {
        QueryHandle {
            client: self.clone(),
            key,
        }
    }

    /// Marks every entry for these filters stale without fetching.
    pub fn invalidate(&self, filters: &NewsFilters) {
        let now = Instant::now();
        let stale_time = self.inner.options.stale_time;
        let mut cache = self.cache();
        for (key, entry) in cache.entries_mut() {
            if &key.filters == filters {
                entry.invalidate();
                entry.publish(now, stale_time);
            }
        }
    }

    /// Regaining focus never refetches.
    pub fn notify_window_focus(&self) {
        debug!("window focus observed; focus refetching is disabled");
    }

    pub fn prune_inactive(&self, max_idle: Duration) -> usize {
        let removed = self.cache().prune(Instant::now(), max_idle);
        if removed > 0 {
            debug!(removed, "pruned inactive news queries");
        }
        removed
    }

    /// Drops entries left unobserved past the configured cache time.
    pub fn collect_garbage(&self) -> usize {
        let options = &self.inner.options;
        self.prune_inactive(options.cache_time.max(options.stale_time))
    }

    pub fn cached_queries(&self) -> usize {
        self.cache().len()
    }

    /// Looks an article up in any cached result for these filters.
    pub fn find_article(&self, filters: &NewsFilters, article_id: &str) -> Option<NewsArticle> {
        self.cache()
            .entries()
            .filter(|(key, _)| &key.filters == filters)
            .find_map(|(_, entry)| entry.article(article_id).cloned())
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn view_of(&self, key: &QueryKey) -> QueryView {
        let now = Instant::now();
        self.cache()
            .get(key)
            .map(|entry| entry.view(now, self.inner.options.stale_time))
            .unwrap_or_else(QueryView::idle)
    }

    /// Starts a fetch from the first cursor for `key`. A cursor chain walks
    /// as many pages as it already holds. The cache lock must be held by the
    /// caller through `cache`.
    fn start_fetch(&self, cache: &mut QueryCache, key: &QueryKey, now: Instant) -> SharedFetch {
        let stale_time = self.inner.options.stale_time;
        let entry = cache.entry(key, now);
        let seq = entry.next_seq();
        let pages = match key.kind {
            QueryKind::Latest => 1,
            QueryKind::Infinite => entry.pages_loaded(),
        };
        debug!(key = %key.canonical(), seq, pages, "fetching news");

        let client = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let result =
                fetch_chain(client.inner.source.as_ref(), &task_key.filters, pages).await;
            client.complete_fetch(&task_key, seq, result);
        });
        let future = self.joinable(task, key.clone(), seq, false, 0);
        entry.begin_fetch(InFlight {
            seq,
            future: future.clone(),
        });
        entry.publish(now, stale_time);
        future
    }

    fn start_next_page(
        &self,
        cache: &mut QueryCache,
        key: &QueryKey,
        cursor: String,
        now: Instant,
    ) -> SharedFetch {
        let stale_time = self.inner.options.stale_time;
        let entry = cache.entry(key, now);
        let seq = entry.next_seq();
        let generation = entry.generation();
        debug!(key = %key.canonical(), seq, "fetching next news page");

        let client = self.clone();
        let task_key = key.clone();
        let params = key.filters.fetch_params(Some(cursor));
        let task = tokio::spawn(async move {
            let result = client.inner.source.fetch_news(&params).await;
            client.complete_next_page(&task_key, seq, generation, result);
        });
        let future = self.joinable(task, key.clone(), seq, true, generation);
        entry.begin_next_page(InFlight {
            seq,
            future: future.clone(),
        });
        entry.publish(now, stale_time);
        future
    }

    /// Wraps a fetch task so any number of waiters can await it. A task that
    /// died without reporting is recorded as a failed fetch.
    fn joinable(
        &self,
        task: tokio::task::JoinHandle<()>,
        key: QueryKey,
        seq: u64,
        next_page: bool,
        generation: u64,
    ) -> SharedFetch {
        let client = self.clone();
        async move {
            if let Err(error) = task.await {
                warn!(%error, key = %key.canonical(), "news fetch task did not complete");
                let failure = NewsError::Network {
                    status: None,
                    reason: format!("fetch task failed: {error}"),
                };
                if next_page {
                    client.complete_next_page(&key, seq, generation, Err(failure));
                } else {
                    client.complete_fetch(&key, seq, Err(failure));
                }
            }
        }
        .boxed()
        .shared()
    }

    fn complete_fetch(&self, key: &QueryKey, seq: u64, result: Result<QueryData, NewsError>) {
        let now = Instant::now();
        let stale_time = self.inner.options.stale_time;
        if let Err(error) = &result {
            warn!(%error, key = %key.canonical(), "news fetch failed");
        }
        let mut cache = self.cache();
        let Some(entry) = cache.get_mut(key) else {
            return;
        };
        if !entry.finish_fetch(seq, result, now) {
            debug!(key = %key.canonical(), seq, "dropping superseded news response");
        }
        entry.publish(now, stale_time);
    }

    fn complete_next_page(
        &self,
        key: &QueryKey,
        seq: u64,
        generation: u64,
        result: Result<NewsPage, NewsError>,
    ) {
        let now = Instant::now();
        let stale_time = self.inner.options.stale_time;
        if let Err(error) = &result {
            warn!(%error, key = %key.canonical(), "next news page failed");
        }
        let mut cache = self.cache();
        let Some(entry) = cache.get_mut(key) else {
            return;
        };
        if !entry.finish_next_page(seq, generation, result, now) {
            debug!(key = %key.canonical(), seq, "dropping next page for replaced data");
        }
        entry.publish(now, stale_time);
    }
}

/// Fetches the first page, then follows cursors until `pages` pages are
/// loaded or the chain ends. Any failed page fails the whole walk.
async fn fetch_chain(
    source: &dyn NewsSource,
    filters: &NewsFilters,
    pages: usize,
) -> Result<QueryData, NewsError> {
    let first = source.fetch_news(&filters.fetch_params(None)).await?;
    let mut data = QueryData::first_page(first);
    while data.pages_loaded < pages {
        let Some(cursor) = data.next_page.clone() else {
            break;
        };
        let page = source.fetch_news(&filters.fetch_params(Some(cursor))).await?;
        data.append(page);
    }
    Ok(data)
}

/// A consumer's view onto one cache key.
#[derive(Clone)]
pub struct QueryHandle {
    client: QueryClient,
    key: QueryKey,
}

impl QueryHandle {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current state without touching the network.
    pub fn view(&self) -> QueryView {
        self.client.view_of(&self.key)
    }

    /// Receives a new view after every change to this key's entry.
    pub fn subscribe(&self) -> watch::Receiver<QueryView> {
        let now = Instant::now();
        let mut cache = self.client.cache();
        let entry = cache.entry(&self.key, now);
        entry.touch(now);
        entry.subscribe()
    }

    /// Observes the key. Fresh data is served as is. Stale data is served
    /// immediately while a background fetch revalidates it. Without data the
    /// call waits for the fetch, joining one already in flight.
    pub async fn load(&self) -> QueryView {
        let step = {
            let now = Instant::now();
            let stale_time = self.client.inner.options.stale_time;
            let mut cache = self.client.cache();
            let entry = cache.entry(&self.key, now);
            entry.touch(now);
            if entry.is_fresh(now, stale_time) {
                debug!(key = %self.key.canonical(), "serving fresh news from cache");
                NextStep::Serve
            } else if entry.has_data() {
                if entry.in_flight().is_none() {
                    self.client.start_fetch(&mut cache, &self.key, now);
                }
                NextStep::Revalidate
            } else if let Some(fetch) = entry.in_flight() {
                NextStep::Wait(fetch.future.clone())
            } else {
                NextStep::Wait(self.client.start_fetch(&mut cache, &self.key, now))
            }
        };
        match step {
            NextStep::Serve | NextStep::Revalidate => {}
            NextStep::Wait(fetch) => fetch.await,
        }
        self.view()
    }

    /// Always goes to the network for this key, ignoring staleness. On
    /// success the cached data is replaced; a cursor chain is re-walked from
    /// its first cursor up to the pages it already held. On failure the
    /// previous data stays and the error is reported next to it.
    pub async fn refetch(&self) -> QueryView {
        let fetch = {
            let now = Instant::now();
            let mut cache = self.client.cache();
            cache.entry(&self.key, now).touch(now);
            self.client.start_fetch(&mut cache, &self.key, now)
        };
        fetch.await;
        self.view()
    }

    pub fn has_next_page(&self) -> bool {
        self.key.kind == QueryKind::Infinite && self.view().next_page().is_some()
    }

    /// Loads the page after the last one and appends it. Calling this with no
    /// next cursor, or on a single-page query, is a caller bug; it is logged
    /// and nothing is fetched.
    pub async fn fetch_next_page(&self) -> QueryView {
        let fetch = {
            let now = Instant::now();
            let mut cache = self.client.cache();
            let entry = cache.entry(&self.key, now);
            entry.touch(now);
            if self.key.kind != QueryKind::Infinite {
                warn!(key = %self.key.canonical(), "next page requested on a single-page query");
                None
            } else if let Some(fetch) = entry.next_in_flight() {
                Some(fetch.future.clone())
            } else if let Some(cursor) = entry.next_cursor() {
                Some(self.client.start_next_page(&mut cache, &self.key, cursor, now))
            } else {
                warn!(key = %self.key.canonical(), "next page requested without a cursor");
                None
            }
        };
        if let Some(fetch) = fetch {
            fetch.await;
        }
        self.view()
    }
}
