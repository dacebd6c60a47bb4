//! HTTP client for the dashboard analytics service.
//!
//! Endpoints (relative to the configured base URL):
//! - `GET  /api/dashboard/sentiment` — market status, score, top movers
//! - `POST /api/dashboard/rrg`       — rotation-grid dataset
//!
//! Each call is a single attempt; retry policy lives in the controller so
//! it can consult the reconciliation gate between attempts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::SnapshotFeed;
use crate::config::ApiConfig;
use crate::ingest::remote::{RotationGridPayload, SentimentPayload, ValidatedSentiment};
use crate::types::{CommandCenterError, InstrumentPoint};

const FEED_NAME: &str = "dashboard-api";

/// reqwest-backed `SnapshotFeed`.
pub struct HttpFeed {
    http: Client,
    sentiment_url: String,
    rotation_grid_url: String,
}

impl HttpFeed {
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent("command-center/0.1.0")
            .build()
            .context("Failed to build HTTP client for dashboard API")?;

        Ok(Self {
            http,
            sentiment_url: join_url(&cfg.base_url, &cfg.sentiment_path),
            rotation_grid_url: join_url(&cfg.base_url, &cfg.rotation_grid_path),
        })
    }

    pub fn sentiment_url(&self) -> &str {
        &self.sentiment_url
    }

    pub fn rotation_grid_url(&self) -> &str {
        &self.rotation_grid_url
    }

    /// Check status and decode the body, mapping failures onto the
    /// domain error taxonomy.
    async fn decode<T: DeserializeOwned>(source_name: &str, resp: Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(CommandCenterError::Transport {
                    source_name: source_name.to_string(),
                    message: format!("HTTP {status}: {message}"),
                }
                .into());
            }
            return Err(CommandCenterError::Rejected {
                source_name: source_name.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = resp.bytes().await.map_err(|e| CommandCenterError::Transport {
            source_name: source_name.to_string(),
            message: format!("failed to read body: {e}"),
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            anyhow::Error::from(CommandCenterError::Schema(format!("{source_name} payload: {e}")))
        })
    }

    fn transport(source_name: &str, e: reqwest::Error) -> anyhow::Error {
        CommandCenterError::Transport {
            source_name: source_name.to_string(),
            message: e.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl SnapshotFeed for HttpFeed {
    async fn fetch_sentiment(&self) -> Result<ValidatedSentiment> {
        debug!(url = %self.sentiment_url, "Fetching market sentiment");

        let resp = self
            .http
            .get(&self.sentiment_url)
            .send()
            .await
            .map_err(|e| Self::transport("sentiment", e))?;

        let payload: SentimentPayload = Self::decode("sentiment", resp).await?;
        Ok(payload.validate()?)
    }

    async fn fetch_rotation_grid(&self) -> Result<Vec<InstrumentPoint>> {
        debug!(url = %self.rotation_grid_url, "Fetching rotation grid");

        let resp = self
            .http
            .post(&self.rotation_grid_url)
            .send()
            .await
            .map_err(|e| Self::transport("rotation-grid", e))?;

        let payload: RotationGridPayload = Self::decode("rotation-grid", resp).await?;
        Ok(payload.into_points())
    }

    fn name(&self) -> &str {
        FEED_NAME
    }
}

/// Join a base URL and a path with exactly one slash between them.
fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
