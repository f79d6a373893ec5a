use std::collections::HashMap;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::time::Instant;

use super::key::QueryKey;
use crate::core::news::client::NewsError;
use crate::core::news::types::{NewsArticle, NewsPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing fetched successfully yet.
    Pending,
    Success,
    /// The last fetch failed. Earlier data, if any, is still in `data`.
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    pub articles: Vec<NewsArticle>,
    pub total_results: u64,
    pub next_page: Option<String>,
    pub pages_loaded: usize,
}

impl QueryData {
    pub(crate) fn first_page(page: NewsPage) -> Self {
        Self {
            articles: page.results,
            total_results: page.total_results,
            next_page: page.next_page,
            pages_loaded: 1,
        }
    }

    pub(crate) fn append(&mut self, page: NewsPage) {
        self.articles.extend(page.results);
        self.total_results = page.total_results;
        self.next_page = page.next_page;
        self.pages_loaded += 1;
    }
}

/// What a consumer sees for one cache key.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryView {
    pub status: QueryStatus,
    /// No data yet and a fetch is running.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_fetching_next_page: bool,
    pub is_error: bool,
    pub is_stale: bool,
    pub error: Option<NewsError>,
    pub data: Option<QueryData>,
}

impl QueryView {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Pending,
            is_loading: false,
            is_fetching: false,
            is_fetching_next_page: false,
            is_error: false,
            is_stale: true,
            error: None,
            data: None,
        }
    }

    pub fn articles(&self) -> &[NewsArticle] {
        self.data
            .as_ref()
            .map(|data| data.articles.as_slice())
            .unwrap_or_default()
    }

    pub fn next_page(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.next_page.as_deref())
    }
}

pub(crate) type SharedFetch = Shared<BoxFuture<'static, ()>>;

#[derive(Clone)]
pub(crate) struct InFlight {
    pub seq: u64,
    pub future: SharedFetch,
}

/// Bookkeeping for one key. Responses carry the sequence number of the
/// request that produced them; anything older than what was last applied is
/// dropped, and next-page results only land on the data generation they
/// were requested from.
pub(crate) struct CacheEntry {
    data: Option<QueryData>,
    error: Option<NewsError>,
    updated_at: Option<Instant>,
    last_used: Instant,
    invalidated: bool,
    issued: u64,
    applied: u64,
    generation: u64,
    in_flight: Option<InFlight>,
    next_in_flight: Option<InFlight>,
    sender: watch::Sender<QueryView>,
}

impl CacheEntry {
    fn new(now: Instant) -> Self {
        let (sender, _) = watch::channel(QueryView::idle());
        Self {
            data: None,
            error: None,
            updated_at: None,
            last_used: now,
            invalidated: false,
            issued: 0,
            applied: 0,
            generation: 0,
            in_flight: None,
            next_in_flight: None,
            sender,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn next_cursor(&self) -> Option<String> {
        self.data.as_ref().and_then(|data| data.next_page.clone())
    }

    pub fn article(&self, article_id: &str) -> Option<&NewsArticle> {
        self.data
            .as_ref()?
            .articles
            .iter()
            .find(|article| article.article_id == article_id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pages_loaded(&self) -> usize {
        self.data.as_ref().map_or(1, |data| data.pages_loaded.max(1))
    }

    pub fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        if self.invalidated || self.data.is_none() {
            return false;
        }
        self.updated_at
            .is_some_and(|updated_at| now.saturating_duration_since(updated_at) < stale_time)
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn next_in_flight(&self) -> Option<&InFlight> {
        self.next_in_flight.as_ref()
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_used = now;
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn next_seq(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn begin_fetch(&mut self, fetch: InFlight) {
        self.in_flight = Some(fetch);
    }

    pub fn begin_next_page(&mut self, fetch: InFlight) {
        self.next_in_flight = Some(fetch);
    }

    /// Swaps in data rebuilt from the first cursor. Returns false when the
    /// response was superseded by a newer one and dropped.
    pub fn finish_fetch(
        &mut self,
        seq: u64,
        result: Result<QueryData, NewsError>,
        now: Instant,
    ) -> bool {
        if self.in_flight.as_ref().is_some_and(|fetch| fetch.seq == seq) {
            self.in_flight = None;
        }
        if seq < self.applied {
            return false;
        }
        self.applied = seq;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.updated_at = Some(now);
                self.invalidated = false;
                self.generation += 1;
            }
            Err(error) => {
                self.error = Some(error);
            }
        }
        true
    }

    /// Appends a next-page response when the data it continues is still the
    /// current data.
    pub fn finish_next_page(
        &mut self,
        seq: u64,
        generation: u64,
        result: Result<NewsPage, NewsError>,
        now: Instant,
    ) -> bool {
        if self.next_in_flight.as_ref().is_some_and(|fetch| fetch.seq == seq) {
            self.next_in_flight = None;
        }
        if generation != self.generation {
            return false;
        }
        let Some(data) = self.data.as_mut() else {
            return false;
        };
        match result {
            Ok(page) => {
                data.append(page);
                self.error = None;
                self.updated_at = Some(now);
            }
            Err(error) => {
                self.error = Some(error);
            }
        }
        true
    }

    pub fn view(&self, now: Instant, stale_time: Duration) -> QueryView {
        let status = match (&self.error, &self.data) {
            (Some(_), _) => QueryStatus::Error,
            (None, Some(_)) => QueryStatus::Success,
            (None, None) => QueryStatus::Pending,
        };
        let is_fetching = self.in_flight.is_some() || self.next_in_flight.is_some();
        QueryView {
            status,
            is_loading: self.data.is_none() && self.in_flight.is_some(),
            is_fetching,
            is_fetching_next_page: self.next_in_flight.is_some(),
            is_error: self.error.is_some(),
            is_stale: !self.is_fresh(now, stale_time),
            error: self.error.clone(),
            data: self.data.clone(),
        }
    }

    pub fn publish(&self, now: Instant, stale_time: Duration) {
        self.sender.send_replace(self.view(now, stale_time));
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryView> {
        self.sender.subscribe()
    }

    fn is_idle(&self, now: Instant, max_idle: Duration) -> bool {
        self.in_flight.is_none()
            && self.next_in_flight.is_none()
            && self.sender.receiver_count() == 0
            && now.saturating_duration_since(self.last_used) >= max_idle
    }
}

#[derive(Default)]
pub(crate) struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &QueryKey) -> Option<&mut CacheEntry> {
        self.entries.get_mut(key)
    }

    pub fn entry(&mut self, key: &QueryKey, now: Instant) -> &mut CacheEntry {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(now))
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&QueryKey, &mut CacheEntry)> {
        self.entries.iter_mut()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&QueryKey, &CacheEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops entries nobody watches, nothing is fetching for, and nobody has
    /// used for `max_idle`. Returns how many were removed.
    pub fn prune(&mut self, now: Instant, max_idle: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_idle(now, max_idle));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: Duration = Duration::from_secs(300);

    fn page(ids: &[&str], next_page: Option<&str>) -> NewsPage {
        NewsPage {
            total_results: 10,
            results: ids
                .iter()
                .map(|id| {
                    serde_json::from_value(serde_json::json!({ "article_id": id }))
                        .expect("minimal article must parse")
                })
                .collect(),
            next_page: next_page.map(ToString::to_string),
        }
    }

    fn loaded(ids: &[&str], next_page: Option<&str>) -> QueryData {
        QueryData::first_page(page(ids, next_page))
    }

    fn ids(view: &QueryView) -> Vec<&str> {
        view.articles()
            .iter()
            .map(|article| article.article_id.as_str())
            .collect()
    }

    #[test]
    fn superseded_response_is_dropped() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(now);
        let older = entry.next_seq();
        let newer = entry.next_seq();

        assert!(entry.finish_fetch(newer, Ok(loaded(&["new"], None)), now));
        assert!(!entry.finish_fetch(older, Ok(loaded(&["old"], None)), now));
        assert_eq!(ids(&entry.view(now, STALE)), vec!["new"]);
    }

    #[test]
    fn failed_refresh_keeps_previous_data() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(now);
        let first = entry.next_seq();
        entry.finish_fetch(first, Ok(loaded(&["a"], None)), now);
        let second = entry.next_seq();
        entry.finish_fetch(
            second,
            Err(NewsError::Network {
                status: Some(503),
                reason: "HTTP 503 Service Unavailable".to_string(),
            }),
            now,
        );

        let view = entry.view(now, STALE);
        assert_eq!(view.status, QueryStatus::Error);
        assert!(view.is_error);
        assert_eq!(ids(&view), vec!["a"]);
    }

    #[test]
    fn next_page_for_replaced_data_is_discarded() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(now);
        let first = entry.next_seq();
        entry.finish_fetch(first, Ok(loaded(&["a"], Some("c2"))), now);
        let generation = entry.generation();

        let refetch = entry.next_seq();
        entry.finish_fetch(refetch, Ok(loaded(&["a2"], Some("c2b"))), now);
        let next = entry.next_seq();
        assert!(!entry.finish_next_page(next, generation, Ok(page(&["b"], None)), now));
        assert_eq!(ids(&entry.view(now, STALE)), vec!["a2"]);
    }

    #[test]
    fn rebuilt_chain_replaces_data_in_one_step() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(now);
        assert_eq!(entry.pages_loaded(), 1);
        let first = entry.next_seq();
        entry.finish_fetch(first, Ok(loaded(&["a"], Some("c2"))), now);
        let next = entry.next_seq();
        entry.finish_next_page(next, entry.generation(), Ok(page(&["b"], None)), now);
        assert_eq!(entry.pages_loaded(), 2);

        let mut rebuilt = loaded(&["a2"], Some("c2b"));
        rebuilt.append(page(&["b2"], Some("c3")));
        let refresh = entry.next_seq();
        assert!(entry.finish_fetch(refresh, Ok(rebuilt), now));

        let view = entry.view(now, STALE);
        assert_eq!(ids(&view), vec!["a2", "b2"]);
        assert_eq!(view.next_page(), Some("c3"));
        assert_eq!(entry.pages_loaded(), 2);
    }

    #[test]
    fn freshness_expires_and_invalidation_forces_staleness() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(now);
        assert!(!entry.is_fresh(now, STALE));

        let seq = entry.next_seq();
        entry.finish_fetch(seq, Ok(loaded(&["a"], None)), now);
        assert!(entry.is_fresh(now + Duration::from_secs(299), STALE));
        assert!(!entry.is_fresh(now + STALE, STALE));

        entry.invalidate();
        assert!(!entry.is_fresh(now, STALE));
    }

    #[test]
    fn prune_keeps_watched_and_recent_entries() {
        let now = Instant::now();
        let mut cache = QueryCache::default();
        let filters = crate::core::store::models::NewsFilters::default();
        let watched = QueryKey::latest(&filters);
        let idle = QueryKey::infinite(&filters);
        let _receiver = cache.entry(&watched, now).subscribe();
        cache.entry(&idle, now);

        assert_eq!(cache.prune(now + Duration::from_secs(5), Duration::from_secs(60)), 0);
        assert_eq!(cache.prune(now + Duration::from_secs(61), Duration::from_secs(60)), 1);
        assert!(cache.get(&watched).is_some());
        assert!(cache.get(&idle).is_none());
    }
}
