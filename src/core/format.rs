use chrono::{DateTime, NaiveDateTime, Utc};

use super::store::models::NewsFilters;

const PUB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const EXCERPT_WIDTH: usize = 10_000;

/// Provider timestamps carry no zone; they are UTC.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), PUB_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_relative_time(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - published).num_seconds();
    if seconds < 60 {
        return "Just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    published.format("%b %-d").to_string()
}

/// Cuts `text` to `max` characters and marks the cut with "...".
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head.trim())
}

/// Plain-text preview of an HTML fragment.
pub fn excerpt(html: &str, max: usize) -> String {
    let text = html2text::config::plain()
        .string_from_read(html.as_bytes(), EXCERPT_WIDTH)
        .unwrap_or_else(|_| html.to_string());
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_text(&collapsed, max)
}

/// Headline shown above the article feed.
pub fn feed_title(filters: &NewsFilters) -> String {
    if !filters.query.is_empty() {
        return format!("Results for \"{}\"", filters.query);
    }
    match filters.category {
        Some(category) => {
            let name = category.as_str();
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => format!("{}{} News", first.to_uppercase(), chars.as_str()),
                None => "Top Stories".to_string(),
            }
        }
        None => "Top Stories".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::news::types::NewsCategory;
    use chrono::{Duration, TimeZone};

    fn at(raw: &str) -> DateTime<Utc> {
        parse_pub_date(raw).expect("timestamp should parse")
    }

    #[test]
    fn parses_provider_timestamps_as_utc() {
        let parsed = at("2024-03-05 14:30:00");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
        assert!(parse_pub_date("yesterday").is_none());
    }

    #[test]
    fn relative_time_buckets() {
        let now = at("2024-03-10 12:00:00");
        assert_eq!(format_relative_time(now - Duration::seconds(59), now), "Just now");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_relative_time(at("2024-02-01 09:00:00"), now), "Feb 1");
        assert_eq!(format_relative_time(now + Duration::minutes(10), now), "Just now");
    }

    #[test]
    fn truncation_keeps_short_text_and_trims_the_cut() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("hello brave world", 6), "hello...");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn excerpt_strips_markup() {
        let preview = excerpt("<p>Markets <b>rally</b>\n after   the report</p>", 100);
        assert!(preview.contains("Markets"));
        assert!(preview.contains("after the report"));
        assert!(!preview.contains('<'));
    }

    #[test]
    fn feed_title_prefers_query_then_category() {
        let mut filters = NewsFilters::default();
        filters.query = "rust".to_string();
        assert_eq!(feed_title(&filters), "Results for \"rust\"");

        filters.query.clear();
        filters.category = Some(NewsCategory::Science);
        assert_eq!(feed_title(&filters), "Science News");

        filters.category = None;
        assert_eq!(feed_title(&filters), "Top Stories");
    }
}
