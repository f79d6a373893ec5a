pub mod catalog;
pub mod format;
pub mod news;
pub mod query;
pub mod store;
