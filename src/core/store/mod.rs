pub mod models;
pub mod persistence;
pub mod news_store;

pub use models::{BookmarkedArticle, NewBookmark, NewsFilters, StoreState};
pub use persistence::{FileStorage, MemoryStorage, StateStorage, StorageError, STORAGE_KEY};
pub use news_store::NewsStore;
