use super::{ContentError, ContentResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Headline of the first "Spot the Bias" question
pub const DEFAULT_HEADLINE: &str = "How many times can there be lucky guesses before it's just the truth hiding in plain sight? #SimpsonsConspiracy";

#[async_trait]
pub trait HeadlineStore: Send + Sync {
    async fn headline(&self, question_id: &str) -> ContentResult<String>;
}

/// In-memory headlines keyed by question id
#[derive(Debug, Clone, Default)]
pub struct StaticHeadlines {
    headlines: HashMap<String, String>,
}

impl StaticHeadlines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the built-in question "1"
    pub fn builtin() -> Self {
        Self::new().with("1", DEFAULT_HEADLINE)
    }

    pub fn with(mut self, question_id: impl Into<String>, headline: impl Into<String>) -> Self {
        self.headlines.insert(question_id.into(), headline.into());
        self
    }
}

#[async_trait]
impl HeadlineStore for StaticHeadlines {
    async fn headline(&self, question_id: &str) -> ContentResult<String> {
        self.headlines
            .get(question_id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(question_id.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct HeadlineRow {
    headline: String,
}

/// Headline lookup against a REST-exposed table (`/rest/v1/{table}`)
pub struct RestHeadlineStore {
    base_url: String,
    api_key: String,
    table: String,
    client: reqwest::Client,
}

impl RestHeadlineStore {
    pub fn new(base_url: String, api_key: String, table: String) -> ContentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
            client,
        })
    }

    /// Build from CONTENT_BASE_URL / CONTENT_API_KEY / CONTENT_TABLE.
    /// Returns None when no base URL is configured.
    pub fn from_env() -> ContentResult<Option<Self>> {
        let read = |name: &str| {
            std::env::var(name).ok().and_then(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };

        let Some(base_url) = read("CONTENT_BASE_URL") else {
            return Ok(None);
        };
        let api_key = read("CONTENT_API_KEY").ok_or_else(|| {
            ContentError::Config("CONTENT_API_KEY must be set with CONTENT_BASE_URL".to_string())
        })?;
        let table = read("CONTENT_TABLE").unwrap_or_else(|| "bias_questions".to_string());

        Self::new(base_url, api_key, table).map(Some)
    }

    fn build_request(&self, question_id: &str) -> ContentResult<reqwest::Request> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        let request = self
            .client
            .get(url)
            .query(&[
                ("id", format!("eq.{}", question_id)),
                ("select", "headline".to_string()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl HeadlineStore for RestHeadlineStore {
    async fn headline(&self, question_id: &str) -> ContentResult<String> {
        let request = self.build_request(question_id)?;
        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            return Err(ContentError::Unavailable(format!(
                "Headline lookup returned status: {}",
                response.status()
            )));
        }

        let rows: Vec<HeadlineRow> = response.json().await?;
        rows.into_iter()
            .next()
            .map(|row| row.headline)
            .ok_or_else(|| ContentError::NotFound(question_id.to_string()))
    }
}
