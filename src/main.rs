use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use shele_news::config::AppConfig;
use shele_news::core::catalog::{self, COUNTRIES, LANGUAGES, NEWS_CATEGORIES};
use shele_news::core::format::{
    excerpt, feed_title, format_relative_time, parse_pub_date, truncate_text,
};
use shele_news::core::news::{NewsArticle, NewsCategory};
use shele_news::core::query::QueryView;
use shele_news::logging::{LogFormat, LoggingConfig, LOG_LEVEL_ENV};
use shele_news::NewsApp;

#[derive(Parser, Debug)]
#[command(name = "shele-news")]
#[command(version)]
#[command(about = "Browse and bookmark the latest news from the terminal")]
struct Cli {
    /// Log output format (text, json, pretty)
    #[arg(long, env = "SHELE_NEWS_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Enable debug logging to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the latest page for the saved filters
    Latest,
    /// Page through results using the provider cursor
    More {
        /// Extra pages to load after the first
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Bookmark an article from the latest page
    Save { id: String },
    /// Remove a bookmark
    Unsave { id: String },
    /// List bookmarks in the order they were saved
    Bookmarks,
    /// Show or change the saved filters
    Filters {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Category name, or "all" to clear it
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        query: Option<String>,
        /// Restore the default filters before applying other flags
        #[arg(long)]
        reset: bool,
    },
    /// Toggle dark mode
    Theme,
    /// List navigable categories
    Categories,
    /// List supported countries and languages
    Countries,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "warn".to_string());
    LoggingConfig::new(cli.log_format, level, cli.verbose).init();

    match cli.command {
        Command::Categories => {
            for info in NEWS_CATEGORIES {
                println!("{:<14} {}", info.value.as_str(), info.label);
            }
            return Ok(());
        }
        Command::Countries => {
            println!("Countries:");
            for region in COUNTRIES {
                println!("  {}  {}", region.code, region.name);
            }
            println!("Languages:");
            for region in LANGUAGES {
                println!("  {}  {}", region.code, region.name);
            }
            return Ok(());
        }
        _ => {}
    }

    let config = AppConfig::load().context("failed to load configuration")?;
    let app = NewsApp::bootstrap(&config)?;

    match cli.command {
        Command::Latest => {
            let view = app.latest().load().await;
            print_feed(&app, &view)?;
        }
        Command::More { pages } => {
            let handle = app.latest_pages();
            let mut view = handle.load().await;
            for _ in 0..pages {
                if !handle.has_next_page() {
                    break;
                }
                view = handle.fetch_next_page().await;
            }
            print_feed(&app, &view)?;
        }
        Command::Save { id } => {
            let view = app.latest().load().await;
            ensure_loaded(&view)?;
            if app.bookmark_article(&id) {
                println!("Saved {id}");
            } else if app.store().is_bookmarked(&id) {
                println!("{id} is already bookmarked");
            } else {
                bail!("article {id} is not in the latest results");
            }
        }
        Command::Unsave { id } => {
            if app.store().remove_bookmark(&id) {
                println!("Removed {id}");
            } else {
                println!("{id} was not bookmarked");
            }
        }
        Command::Bookmarks => {
            let bookmarks = app.store().bookmarks();
            if bookmarks.is_empty() {
                println!("No bookmarks yet");
            }
            let now = Utc::now();
            for bookmark in bookmarks {
                println!(
                    "{}  {} | {} | saved {}",
                    bookmark.id,
                    truncate_text(&bookmark.title, 100),
                    bookmark.source_name,
                    format_relative_time(bookmark.saved_at, now)
                );
                println!("    {}", bookmark.link);
            }
        }
        Command::Filters {
            country,
            language,
            category,
            query,
            reset,
        } => {
            let store = app.store();
            if reset {
                store.reset_filters();
            }
            if let Some(country) = country {
                store.set_country(&country);
            }
            if let Some(language) = language {
                store.set_language(&language);
            }
            if let Some(category) = category {
                store.set_category(parse_category(&category)?);
            }
            if let Some(query) = query {
                store.set_query(query);
            }
            let filters = store.filters();
            println!(
                "country:  {} ({})",
                filters.country,
                catalog::country_name(&filters.country).unwrap_or("unknown")
            );
            println!(
                "language: {} ({})",
                filters.language,
                catalog::language_name(&filters.language).unwrap_or("unknown")
            );
            match filters.category {
                Some(category) => println!("category: {category}"),
                None => println!("category: all"),
            }
            println!("query:    {}", filters.query);
        }
        Command::Theme => {
            app.store().toggle_dark_mode();
            let mode = if app.store().is_dark_mode() { "dark" } else { "light" };
            println!("Theme: {mode}");
        }
        Command::Categories | Command::Countries => {}
    }
    Ok(())
}

fn parse_category(raw: &str) -> Result<Option<NewsCategory>> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    let category = raw
        .parse::<NewsCategory>()
        .map_err(|error| anyhow::anyhow!(error))?;
    Ok(Some(category))
}

fn ensure_loaded(view: &QueryView) -> Result<()> {
    if view.data.is_none() {
        if let Some(error) = &view.error {
            bail!("could not load news: {error}");
        }
    }
    Ok(())
}

fn print_feed(app: &NewsApp, view: &QueryView) -> Result<()> {
    ensure_loaded(view)?;
    if let Some(error) = &view.error {
        eprintln!("warning: showing cached results, refresh failed: {error}");
    }
    println!("{}", feed_title(&app.store().filters()));
    let articles = view.articles();
    if articles.is_empty() {
        println!("No articles found");
        return Ok(());
    }
    let now = Utc::now();
    for article in articles {
        print_article(app, article, now);
    }
    if let Some(data) = &view.data {
        println!(
            "{} of {} results, {} page(s) loaded",
            data.articles.len(),
            data.total_results,
            data.pages_loaded
        );
    }
    Ok(())
}

fn print_article(app: &NewsApp, article: &NewsArticle, now: chrono::DateTime<Utc>) {
    let marker = if app.store().is_bookmarked(&article.article_id) {
        "*"
    } else {
        " "
    };
    let when = article
        .pub_date
        .as_deref()
        .and_then(parse_pub_date)
        .map(|published| format_relative_time(published, now))
        .unwrap_or_default();
    println!(
        "{marker} {}  {} | {} | {}",
        article.article_id,
        truncate_text(&article.title, 100),
        article.source_name,
        when
    );
    if let Some(description) = &article.description {
        println!("    {}", excerpt(description, 150));
    }
}
