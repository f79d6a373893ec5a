use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::models::{BookmarkedArticle, NewBookmark, NewsFilters, PersistedState, StoreState};
use super::persistence::{read_state, write_state, StateStorage, STORAGE_KEY};
use crate::core::news::types::NewsCategory;

/// Process-wide application state: filters, bookmarks, UI and theme flags.
///
/// Created once at bootstrap and handed to whoever needs it; clones share the
/// same state. Every mutation swaps in a new immutable snapshot and notifies
/// subscribers before returning. Persisted fields are written through to
/// storage whenever they change. Storage failures are logged and otherwise
/// ignored.
#[derive(Clone)]
pub struct NewsStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<Arc<StoreState>>,
    storage: Box<dyn StateStorage>,
    storage_key: String,
    clock: fn() -> DateTime<Utc>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for NewsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsStore")
            .field("storage_key", &self.inner.storage_key)
            .field("state", &self.snapshot())
            .finish()
    }
}

impl NewsStore {
    pub fn open(storage: impl StateStorage + 'static) -> Self {
        Self::open_with(storage, STORAGE_KEY, Utc::now)
    }

    pub fn open_with(
        storage: impl StateStorage + 'static,
        storage_key: &str,
        clock: fn() -> DateTime<Utc>,
    ) -> Self {
        let initial = match read_state(&storage, storage_key) {
            Ok(Some(persisted)) => {
                info!(
                    bookmarks = persisted.bookmarks.len(),
                    "restored persisted news state"
                );
                StoreState::hydrated(persisted)
            }
            Ok(None) => StoreState::default(),
            Err(error) => {
                warn!(%error, "discarding unreadable persisted state");
                StoreState::default()
            }
        };
        let (state, _) = watch::channel(Arc::new(initial));
        Self {
            inner: Arc::new(StoreInner {
                state,
                storage: Box::new(storage),
                storage_key: storage_key.to_string(),
                clock,
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<StoreState> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreState>> {
        self.inner.state.subscribe()
    }

    pub fn filters(&self) -> NewsFilters {
        self.inner.state.borrow().filters.clone()
    }

    pub fn bookmarks(&self) -> Vec<BookmarkedArticle> {
        self.inner.state.borrow().bookmarks.clone()
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.inner.state.borrow().is_bookmarked(id)
    }

    pub fn is_dark_mode(&self) -> bool {
        self.inner.state.borrow().is_dark_mode
    }

    pub fn is_mobile_menu_open(&self) -> bool {
        self.inner.state.borrow().is_mobile_menu_open
    }

    pub fn set_category(&self, category: Option<NewsCategory>) {
        self.update("set_category", |state| state.filters.category = category);
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update("set_query", |state| state.filters.query = query);
    }

    pub fn set_country(&self, country: &str) {
        let country = country.trim().to_lowercase();
        self.update("set_country", |state| state.filters.country = country);
    }

    pub fn set_language(&self, language: &str) {
        let language = language.trim().to_lowercase();
        self.update("set_language", |state| state.filters.language = language);
    }

    pub fn reset_filters(&self) {
        self.update("reset_filters", |state| state.filters = NewsFilters::default());
    }

    /// Saves a snapshot of the article. An id that is already bookmarked is
    /// left untouched, original `saved_at` included; returns whether a new
    /// entry was stored.
    pub fn add_bookmark(&self, article: impl Into<NewBookmark>) -> bool {
        let article = article.into();
        let saved_at = (self.inner.clock)();
        let mut inserted = false;
        self.update("add_bookmark", |state| {
            if state.is_bookmarked(&article.id) {
                return;
            }
            state
                .bookmarks
                .push(BookmarkedArticle::saved(article, saved_at));
            inserted = true;
        });
        inserted
    }

    pub fn remove_bookmark(&self, id: &str) -> bool {
        self.update("remove_bookmark", |state| {
            state.bookmarks.retain(|bookmark| bookmark.id != id)
        })
    }

    pub fn toggle_mobile_menu(&self) {
        self.update("toggle_mobile_menu", |state| {
            state.is_mobile_menu_open = !state.is_mobile_menu_open
        });
    }

    pub fn close_mobile_menu(&self) {
        self.update("close_mobile_menu", |state| state.is_mobile_menu_open = false);
    }

    pub fn toggle_dark_mode(&self) {
        self.update("toggle_dark_mode", |state| state.is_dark_mode = !state.is_dark_mode);
    }

    fn update(&self, action: &'static str, mutate: impl FnOnce(&mut StoreState)) -> bool {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut to_persist: Option<PersistedState> = None;
        let changed = self.inner.state.send_if_modified(|current| {
            let mut next = StoreState::clone(current);
            mutate(&mut next);
            if next == **current {
                return false;
            }
            if persisted_fields_differ(current, &next) {
                to_persist = Some(next.persisted());
            }
            *current = Arc::new(next);
            true
        });
        debug!(action, changed, "store mutation");

        if let Some(persisted) = to_persist {
            if let Err(error) =
                write_state(self.inner.storage.as_ref(), &self.inner.storage_key, &persisted)
            {
                warn!(%error, action, "failed to persist news state");
            }
        }
        changed
    }
}

fn persisted_fields_differ(before: &StoreState, after: &StoreState) -> bool {
    before.bookmarks != after.bookmarks
        || before.is_dark_mode != after.is_dark_mode
        || before.filters.country != after.filters.country
        || before.filters.language != after.filters.language
}
