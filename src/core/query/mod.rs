pub mod cache;
pub mod client;
pub mod key;

pub use cache::{QueryData, QueryStatus, QueryView};
pub use client::{QueryClient, QueryHandle, QueryOptions, DEFAULT_CACHE_TIME, DEFAULT_STALE_TIME};
pub use key::{QueryKey, QueryKind};
