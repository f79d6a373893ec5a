use crate::core::store::models::NewsFilters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// A single page that is replaced on every fetch.
    Latest,
    /// A cursor chain whose pages are appended in order.
    Infinite,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Latest => "news",
            QueryKind::Infinite => "news-infinite",
        }
    }
}

/// Cache key: equal whenever the kind and every filter field are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub filters: NewsFilters,
}

impl QueryKey {
    pub fn latest(filters: &NewsFilters) -> Self {
        Self {
            kind: QueryKind::Latest,
            filters: filters.clone(),
        }
    }

    pub fn infinite(filters: &NewsFilters) -> Self {
        Self {
            kind: QueryKind::Infinite,
            filters: filters.clone(),
        }
    }

    /// Stable textual form, used in logs.
    pub fn canonical(&self) -> String {
        serde_json::json!([
            self.kind.as_str(),
            {
                "category": self.filters.category,
                "query": self.filters.query,
                "country": self.filters.country,
                "language": self.filters.language,
            }
        ])
        .to_string()
    }
}
