use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Business,
    Crime,
    Domestic,
    Education,
    Entertainment,
    Environment,
    Food,
    Health,
    Lifestyle,
    Politics,
    Science,
    Sports,
    Technology,
    Top,
    Tourism,
    World,
    #[serde(other)]
    Other,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 17] = [
        NewsCategory::Business,
        NewsCategory::Crime,
        NewsCategory::Domestic,
        NewsCategory::Education,
        NewsCategory::Entertainment,
        NewsCategory::Environment,
        NewsCategory::Food,
        NewsCategory::Health,
        NewsCategory::Lifestyle,
        NewsCategory::Other,
        NewsCategory::Politics,
        NewsCategory::Science,
        NewsCategory::Sports,
        NewsCategory::Technology,
        NewsCategory::Top,
        NewsCategory::Tourism,
        NewsCategory::World,
    ];

    /// Wire name used by the provider's `category` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Business => "business",
            NewsCategory::Crime => "crime",
            NewsCategory::Domestic => "domestic",
            NewsCategory::Education => "education",
            NewsCategory::Entertainment => "entertainment",
            NewsCategory::Environment => "environment",
            NewsCategory::Food => "food",
            NewsCategory::Health => "health",
            NewsCategory::Lifestyle => "lifestyle",
            NewsCategory::Other => "other",
            NewsCategory::Politics => "politics",
            NewsCategory::Science => "science",
            NewsCategory::Sports => "sports",
            NewsCategory::Technology => "technology",
            NewsCategory::Top => "top",
            NewsCategory::Tourism => "tourism",
            NewsCategory::World => "world",
        }
    }
}

impl std::fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NewsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        NewsCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentStats {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

/// One article as returned by the provider. Read-only on this side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub article_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, deserialize_with = "lenient")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub creator: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(rename = "pubDate", default, deserialize_with = "lenient")]
    pub pub_date: Option<String>,
    #[serde(rename = "pubDateTZ", default, deserialize_with = "lenient")]
    pub pub_date_tz: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub source_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub source_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source_icon: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source_priority: Option<i64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub country: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub category: Vec<NewsCategory>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ai_tag: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, deserialize_with = "lenient")]
    pub sentiment_stats: Option<SentimentStats>,
    #[serde(default, deserialize_with = "lenient")]
    pub ai_region: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ai_org: Option<Vec<String>>,
    #[serde(default)]
    pub duplicate: bool,
}

/// One successful page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsPage {
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<NewsArticle>,
    #[serde(rename = "nextPage", default)]
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProviderFailure {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: Option<String>,
}

/// The provider's JSON envelope, discriminated by `status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success(NewsPage),
    Error {
        #[serde(default, deserialize_with = "lenient")]
        results: Option<ProviderFailure>,
    },
}

/// Parameters of one call to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub category: Option<NewsCategory>,
    pub query: String,
    pub country: String,
    pub language: String,
    pub page: Option<String>,
}

/// Plan-restricted fields come back as placeholder strings; anything that
/// does not parse as the declared type is treated as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient::<D, Vec<T>>(deserializer)?.unwrap_or_default())
}

fn lenient_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(code) => Some(code),
        serde_json::Value::Number(code) => Some(code.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_tolerates_plan_placeholders_and_unknown_categories() {
        let raw = r#"{
            "article_id": "a1",
            "title": "Markets rally",
            "link": "https://example.com/a1",
            "pubDate": "2026-10-18 09:30:00",
            "source_name": "Example Wire",
            "country": ["united states of america"],
            "category": ["business", "crypto"],
            "sentiment": "ONLY AVAILABLE IN PROFESSIONAL AND CORPORATE PLANS",
            "ai_tag": "ONLY AVAILABLE IN PROFESSIONAL AND CORPORATE PLANS",
            "image_url": null,
            "duplicate": false
        }"#;
        let article: NewsArticle = serde_json::from_str(raw).expect("article must parse");

        assert_eq!(article.category, vec![NewsCategory::Business, NewsCategory::Other]);
        assert_eq!(article.sentiment, None);
        assert_eq!(article.ai_tag, None);
        assert_eq!(article.image_url, None);
        assert_eq!(article.pub_date.as_deref(), Some("2026-10-18 09:30:00"));
    }

    #[test]
    fn envelope_distinguishes_success_and_error() {
        let ok: Envelope = serde_json::from_str(
            r#"{"status":"success","totalResults":3,"results":[],"nextPage":"abc"}"#,
        )
        .expect("success envelope must parse");
        let Envelope::Success(page) = ok else {
            panic!("expected success envelope");
        };
        assert_eq!(page.total_results, 3);
        assert_eq!(page.next_page.as_deref(), Some("abc"));

        let failed: Envelope = serde_json::from_str(
            r#"{"status":"error","results":{"message":"Invalid API key","code":"Unauthorized"}}"#,
        )
        .expect("error envelope must parse");
        let Envelope::Error {
            results: Some(results),
        } = failed
        else {
            panic!("expected error envelope with results");
        };
        assert_eq!(results.message.as_deref(), Some("Invalid API key"));
        assert_eq!(results.code.as_deref(), Some("Unauthorized"));

        let bare: Envelope =
            serde_json::from_str(r#"{"status":"error"}"#).expect("bare error must parse");
        assert!(matches!(bare, Envelope::Error { results: None }));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Technology".parse::<NewsCategory>(), Ok(NewsCategory::Technology));
        assert!("gossip".parse::<NewsCategory>().is_err());
    }
}
