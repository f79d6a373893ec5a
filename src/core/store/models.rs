use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::news::types::{FetchParams, NewsArticle, NewsCategory};

pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_LANGUAGE: &str = "en";

/// The filter snapshot that fully determines which articles a feed targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NewsFilters {
    pub category: Option<NewsCategory>,
    pub query: String,
    pub country: String,
    pub language: String,
}

impl Default for NewsFilters {
    fn default() -> Self {
        Self {
            category: Some(NewsCategory::Top),
            query: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl NewsFilters {
    pub fn fetch_params(&self, page: Option<String>) -> FetchParams {
        FetchParams {
            category: self.category,
            query: self.query.clone(),
            country: self.country.clone(),
            language: self.language.clone(),
            page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBookmark {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub link: String,
}

impl From<&NewsArticle> for NewBookmark {
    fn from(article: &NewsArticle) -> Self {
        Self {
            id: article.article_id.clone(),
            title: article.title.clone(),
            image_url: article.image_url.clone(),
            source_name: article.source_name.clone(),
            link: article.link.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookmarkedArticle {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub link: String,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

impl BookmarkedArticle {
    pub fn saved(bookmark: NewBookmark, saved_at: DateTime<Utc>) -> Self {
        Self {
            id: bookmark.id,
            title: bookmark.title,
            image_url: bookmark.image_url,
            source_name: bookmark.source_name,
            link: bookmark.link,
            saved_at,
        }
    }
}

/// One immutable snapshot of everything the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreState {
    pub filters: NewsFilters,
    pub bookmarks: Vec<BookmarkedArticle>,
    pub is_mobile_menu_open: bool,
    pub is_dark_mode: bool,
}

impl StoreState {
    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.bookmarks.iter().any(|bookmark| bookmark.id == id)
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            bookmarks: self.bookmarks.clone(),
            is_dark_mode: self.is_dark_mode,
            filters: PersistedFilters {
                country: self.filters.country.clone(),
                language: self.filters.language.clone(),
            },
        }
    }

    /// Fresh-process state: persisted fields restored, the rest at defaults.
    pub fn hydrated(persisted: PersistedState) -> Self {
        Self {
            filters: NewsFilters {
                country: persisted.filters.country,
                language: persisted.filters.language,
                ..NewsFilters::default()
            },
            bookmarks: persisted.bookmarks,
            is_mobile_menu_open: false,
            is_dark_mode: persisted.is_dark_mode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedFilters {
    pub country: String,
    pub language: String,
}

/// The subset of state that survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub bookmarks: Vec<BookmarkedArticle>,
    pub is_dark_mode: bool,
    pub filters: PersistedFilters,
}
