pub mod client;
pub mod types;

pub use client::{NewsClient, NewsError, NewsSource};
pub use types::{FetchParams, NewsArticle, NewsCategory, NewsPage};
