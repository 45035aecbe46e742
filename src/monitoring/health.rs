//! Service health reported by `GET /health`.
//!
//! Tracks how rankings were produced so an operator can see when GA4 has
//! been falling back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::ranking::RankingSource;

/// Shared health state updated by the request handlers.
#[derive(Clone)]
pub struct HealthState {
    inner: Arc<RwLock<HealthData>>,
}

#[derive(Debug, Clone, Serialize)]
struct HealthData {
    status: String,
    started_at: DateTime<Utc>,
    uptime_seconds: i64,
    articles: usize,
    analytics_enabled: bool,
    last_ranking_source: Option<RankingSource>,
    last_ranking_at: Option<DateTime<Utc>>,
    rankings_served: u64,
    fallback_rankings: u64,
}

impl HealthState {
    pub fn new(articles: usize, analytics_enabled: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HealthData {
                status: "ok".to_string(),
                started_at: Utc::now(),
                uptime_seconds: 0,
                articles,
                analytics_enabled,
                last_ranking_source: None,
                last_ranking_at: None,
                rankings_served: 0,
                fallback_rankings: 0,
            })),
        }
    }

    pub fn record_ranking(&self, source: RankingSource) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut data = inner.write().await;
            data.rankings_served += 1;
            if source == RankingSource::Fallback {
                data.fallback_rankings += 1;
            }
            data.last_ranking_source = Some(source);
            data.last_ranking_at = Some(Utc::now());
            // Analytics is configured but the last ranking could not use it
            data.status = if data.analytics_enabled && source == RankingSource::Fallback {
                "degraded".to_string()
            } else {
                "ok".to_string()
            };
        });
    }

    pub async fn to_json(&self) -> serde_json::Value {
        let mut data = self.inner.read().await.clone();
        data.uptime_seconds = (Utc::now() - data.started_at).num_seconds();
        serde_json::to_value(&data).unwrap_or_else(
            |_| serde_json::json!({"status": "error", "message": "serialization failed"}),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_state_creation() {
        let state = HealthState::new(3, false);
        let _ = state.clone();
    }

    #[tokio::test]
    async fn test_fallback_with_analytics_is_degraded() {
        let state = HealthState::new(3, true);
        state.record_ranking(RankingSource::Fallback);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let json = state.to_json().await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["fallback_rankings"], 1);
        assert_eq!(json["last_ranking_source"], "fallback");
    }

    #[tokio::test]
    async fn test_fallback_without_analytics_is_ok() {
        let state = HealthState::new(3, false);
        state.record_ranking(RankingSource::Fallback);
        state.record_ranking(RankingSource::Fallback);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let json = state.to_json().await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["rankings_served"], 2);
        assert_eq!(json["articles"], 3);
    }

    #[tokio::test]
    async fn test_analytics_ranking_recovers() {
        let state = HealthState::new(1, true);
        state.record_ranking(RankingSource::Fallback);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        state.record_ranking(RankingSource::Analytics);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let json = state.to_json().await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["last_ranking_source"], "analytics");
    }
}
