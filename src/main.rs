use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use bizmap::accounts::SupabaseClient;
use bizmap::analytics::ga4::Ga4Client;
use bizmap::analytics::AnalyticsService;
use bizmap::api::{self, AppState};
use bizmap::config::{AnalyticsSetting, AppConfig, Secrets};
use bizmap::content::ArticleStore;
use bizmap::monitoring::health::HealthState;
use bizmap::monitoring::logger;
use bizmap::ranking::RankingHandler;
use bizmap::wordpress::WordPressClient;

#[derive(Parser)]
#[command(name = "bizmap", version, about = "BizMap media backend")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API (default).
    Serve,
    /// Refresh the view-count snapshot from GA4.
    UpdateViews,
    /// Print the current top articles.
    Top {
        /// Skip analytics and rank by the fallback heuristic only.
        #[arg(long)]
        fallback: bool,
    },
    /// Print article ids with rising traffic.
    Trending,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load_from(&cli.config)?;

    logger::init_logging(&config.logging)?;

    let analytics = build_analytics(&config, &secrets)?;
    tracing::info!(
        analytics_enabled = analytics.is_some(),
        "BizMap starting"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config, secrets, analytics).await,
        Command::UpdateViews => update_views(&config, analytics).await,
        Command::Top { fallback } => print_top(&config, analytics, fallback).await,
        Command::Trending => print_trending(&config, analytics).await,
    }
}

/// Decided once at startup: GA4 is consulted only when both id and token are set.
fn build_analytics(config: &AppConfig, secrets: &Secrets) -> Result<Option<Arc<AnalyticsService>>> {
    match secrets.analytics_setting() {
        AnalyticsSetting::Disabled => {
            tracing::info!("GA4 credentials not set, rankings use the fallback heuristic");
            Ok(None)
        }
        AnalyticsSetting::Enabled(credentials) => {
            let client = Ga4Client::new(
                &config.analytics.base_url,
                credentials,
                config.analytics.request_timeout(),
            )?;
            Ok(Some(Arc::new(AnalyticsService::new(
                Arc::new(client),
                config.analytics.request_timeout(),
                config.analytics.history_days,
            ))))
        }
    }
}

fn load_ranking(
    config: &AppConfig,
    analytics: Option<Arc<AnalyticsService>>,
) -> Result<(Arc<ArticleStore>, RankingHandler)> {
    let store = Arc::new(ArticleStore::load(&config.content, Utc::now())?);
    let handler = RankingHandler::new(store.clone(), analytics);
    Ok((store, handler))
}

async fn run_server(
    config: AppConfig,
    secrets: Secrets,
    analytics: Option<Arc<AnalyticsService>>,
) -> Result<()> {
    let (store, ranking) = load_ranking(&config, analytics)?;
    let health = HealthState::new(store.articles().len(), ranking.analytics_enabled());

    let accounts = match secrets.supabase_credentials() {
        Some((url, anon_key)) => Some(Arc::new(SupabaseClient::new(&url, anon_key)?)),
        None => {
            tracing::info!("Supabase not configured, account routes disabled");
            None
        }
    };

    let wordpress = if config.wordpress.enabled {
        Some(Arc::new(WordPressClient::new(
            &config.wordpress,
            secrets.wordpress_credentials(),
        )?))
    } else {
        None
    };

    let state = AppState {
        site: Arc::new(config.site.clone()),
        features: config.features,
        store,
        ranking: Arc::new(ranking),
        health,
        views_snapshot: Arc::new(config.content.views_snapshot.clone()),
        accounts,
        wordpress,
    };

    api::serve(state, &config.server).await
}

async fn update_views(config: &AppConfig, analytics: Option<Arc<AnalyticsService>>) -> Result<()> {
    let Some(analytics) = analytics else {
        bail!("GA4_PROPERTY_ID and GA4_ACCESS_TOKEN must be set to update view counts");
    };

    let snapshot = analytics.views_snapshot(Utc::now()).await?;
    snapshot.write_to(&config.content.views_snapshot)?;

    tracing::info!(
        articles = snapshot.views.len(),
        pages = snapshot.total_views.len(),
        path = %config.content.views_snapshot.display(),
        "View snapshot written"
    );
    Ok(())
}

async fn print_top(
    config: &AppConfig,
    analytics: Option<Arc<AnalyticsService>>,
    fallback: bool,
) -> Result<()> {
    let (_, ranking) = load_ranking(config, analytics)?;

    let (articles, source) = if fallback {
        (ranking.top_articles_fallback(), bizmap::ranking::RankingSource::Fallback)
    } else {
        ranking.ranked(Utc::now()).await
    };

    println!("Top articles ({source}):");
    for (i, entry) in articles.iter().enumerate() {
        println!(
            "{:>2}. {:<40} score={:>8.2} views={:>6}{}",
            i + 1,
            entry.article.id,
            entry.popularity_score,
            entry.page_views,
            if entry.trending { " [trending]" } else { "" }
        );
    }
    Ok(())
}

async fn print_trending(config: &AppConfig, analytics: Option<Arc<AnalyticsService>>) -> Result<()> {
    let (_, ranking) = load_ranking(config, analytics)?;
    let ids = ranking.trending_articles().await;

    if ids.is_empty() {
        println!("No rising articles");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
