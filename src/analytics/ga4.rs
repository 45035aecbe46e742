//! Google Analytics Data API (GA4) client.
//!
//! Calls `runReport` and `runRealtimeReport` over REST with a bearer token.
//! Metric values arrive as strings; missing or unparsable values read as 0.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::analytics::{MetricsSource, PageViewRow, PathViews, ARTICLE_PATH_PREFIX};
use crate::config::Ga4Credentials;

const HISTORICAL_ROW_LIMIT: u32 = 50;
const REALTIME_ROW_LIMIT: u32 = 20;

pub struct Ga4Client {
    client: reqwest::Client,
    base_url: String,
    property_id: String,
    access_token: SecretString,
}

impl Ga4Client {
    pub fn new(base_url: &str, credentials: Ga4Credentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build GA4 HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            property_id: credentials.property_id,
            access_token: credentials.access_token,
        })
    }

    async fn run(&self, method: &str, request: &ReportRequest) -> Result<ReportResponse> {
        let url = format!("{}/properties/{}:{method}", self.base_url, self.property_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(request)
            .send()
            .await
            .with_context(|| format!("GA4 {method} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("GA4 {method} error ({status}): {body}");
        }

        response
            .json::<ReportResponse>()
            .await
            .with_context(|| format!("Failed to parse GA4 {method} response"))
    }
}

#[async_trait]
impl MetricsSource for Ga4Client {
    #[instrument(skip(self))]
    async fn page_views(&self, days: u32) -> Result<Vec<PageViewRow>> {
        let request = ReportRequest {
            date_ranges: Some(vec![DateRange::trailing_days(days)]),
            dimensions: vec![Named::new("pagePath"), Named::new("pageTitle")],
            metrics: vec![
                Named::new("screenPageViews"),
                Named::new("sessions"),
                Named::new("averageSessionDuration"),
                Named::new("bounceRate"),
                Named::new("engagementRate"),
            ],
            dimension_filter: Some(FilterExpression::contains("pagePath", ARTICLE_PATH_PREFIX)),
            order_bys: vec![OrderBy::metric_desc("screenPageViews")],
            limit: Some(HISTORICAL_ROW_LIMIT),
        };

        let response = self.run("runReport", &request).await?;
        let rows: Vec<PageViewRow> = response
            .rows
            .iter()
            .map(|row| PageViewRow {
                path: row.dimension(0).to_string(),
                page_views: row.count(0),
                unique_views: row.count(1),
                avg_session_duration: row.number(2),
                bounce_rate: row.number(3),
                engagement_rate: row.number(4),
            })
            .collect();

        info!(days, rows = rows.len(), "GA4 page views fetched");
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn realtime_page_views(&self) -> Result<Vec<PageViewRow>> {
        let request = ReportRequest {
            date_ranges: None,
            dimensions: vec![Named::new("unifiedPagePathScreen")],
            metrics: vec![Named::new("activeUsers")],
            dimension_filter: Some(FilterExpression::contains(
                "unifiedPagePathScreen",
                ARTICLE_PATH_PREFIX,
            )),
            order_bys: vec![OrderBy::metric_desc("activeUsers")],
            limit: Some(REALTIME_ROW_LIMIT),
        };

        let response = self.run("runRealtimeReport", &request).await?;
        let rows: Vec<PageViewRow> = response
            .rows
            .iter()
            .map(|row| PageViewRow::from_active_users(row.dimension(0).to_string(), row.count(0)))
            .collect();

        info!(rows = rows.len(), "GA4 realtime page views fetched");
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn site_page_views(&self, days: u32) -> Result<Vec<PathViews>> {
        let request = ReportRequest {
            date_ranges: Some(vec![DateRange::trailing_days(days)]),
            dimensions: vec![Named::new("pagePath")],
            metrics: vec![Named::new("screenPageViews")],
            dimension_filter: None,
            order_bys: Vec::new(),
            limit: None,
        };

        let response = self.run("runReport", &request).await?;
        let rows: Vec<PathViews> = response
            .rows
            .iter()
            .map(|row| PathViews {
                path: row.dimension(0).to_string(),
                views: row.count(0),
            })
            .collect();

        info!(days, rows = rows.len(), "GA4 site page views fetched");
        Ok(rows)
    }

    fn name(&self) -> &str {
        "ga4"
    }
}

// --- Request/Response Types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_ranges: Option<Vec<DateRange>>,
    dimensions: Vec<Named>,
    metrics: Vec<Named>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension_filter: Option<FilterExpression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_bys: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DateRange {
    start_date: String,
    end_date: String,
}

impl DateRange {
    fn trailing_days(days: u32) -> Self {
        Self {
            start_date: format!("{days}daysAgo"),
            end_date: "today".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Named {
    name: String,
}

impl Named {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FilterExpression {
    filter: Filter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter {
    field_name: String,
    string_filter: StringFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StringFilter {
    match_type: String,
    value: String,
}

impl FilterExpression {
    fn contains(field: &str, value: &str) -> Self {
        Self {
            filter: Filter {
                field_name: field.to_string(),
                string_filter: StringFilter {
                    match_type: "CONTAINS".to_string(),
                    value: value.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OrderBy {
    metric: MetricOrder,
    desc: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricOrder {
    metric_name: String,
}

impl OrderBy {
    fn metric_desc(metric: &str) -> Self {
        Self {
            metric: MetricOrder {
                metric_name: metric.to_string(),
            },
            desc: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    dimension_values: Vec<Cell>,
    #[serde(default)]
    metric_values: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[serde(default)]
    value: String,
}

impl ReportRow {
    fn dimension(&self, index: usize) -> &str {
        self.dimension_values
            .get(index)
            .map(|c| c.value.as_str())
            .unwrap_or("")
    }

    /// Integer metric, truncating fractional values.
    fn count(&self, index: usize) -> u64 {
        let value = self.number(index);
        if value > 0.0 {
            value.trunc() as u64
        } else {
            0
        }
    }

    fn number(&self, index: usize) -> f64 {
        self.metric_values
            .get(index)
            .and_then(|c| c.value.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}
