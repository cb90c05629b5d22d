use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult, NetworkErrorKind},
    models::{RawRecommendation, ORACLE_FIELDS},
};

/// Source of ranked product ids for a user
///
/// The service is best-effort: an empty list is a valid answer, failures are
/// surfaced as `AppError::Network` or `AppError::Decode` and never retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationClient: Send + Sync {
    /// Fetch raw recommendations for the given user
    async fn fetch(&self, user_id: i64) -> AppResult<Vec<RawRecommendation>>;

    /// Client name for logging and debugging
    fn name(&self) -> &'static str;
}

/// HTTP client for the external recommendation service
#[derive(Clone)]
pub struct HttpRecommendationClient {
    http_client: HttpClient,
    url_template: String,
}

impl HttpRecommendationClient {
    /// `timeout` bounds both connection setup and the whole request
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url_template: url_template.into(),
        })
    }

    fn url_for(&self, user_id: i64) -> String {
        expand_template(&self.url_template, user_id)
    }
}

/// Replaces the first `{...}` placeholder with the user id
fn expand_template(template: &str, user_id: i64) -> String {
    if let Some(start) = template.find('{') {
        if let Some(len) = template[start..].find('}') {
            let end = start + len + 1;
            return format!("{}{}{}", &template[..start], user_id, &template[end..]);
        }
    }
    template.to_string()
}

#[async_trait::async_trait]
impl RecommendationClient for HttpRecommendationClient {
    async fn fetch(&self, user_id: i64) -> AppResult<Vec<RawRecommendation>> {
        let url = self.url_for(user_id);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "Recommendation request failed");
            AppError::from(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::network(
                NetworkErrorKind::Status(status.as_u16()),
                format!("Recommendation service returned status {}: {}", status, body),
            ));
        }

        let body = response.text().await?;
        tracing::debug!(response = %body, "Raw recommendation response");

        let recommendations = RawRecommendation::parse_payload(&body, &ORACLE_FIELDS)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    response = %body,
                    "Failed to decode recommendation response"
                );
                e
            })?;

        tracing::info!(
            user_id,
            results = recommendations.len(),
            client = self.name(),
            "Recommendations fetched"
        );

        Ok(recommendations)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
