//! Generation service HTTP client
//!
//! JSON over HTTP to the text-generation backend:
//! - `POST {base_url}/roadmaps` → roadmap steps, insights, alternatives, category
//! - `POST {base_url}/quiz-suggestions` → career suggestions
//!
//! Requests are spaced by a client-side rate limiter. The client never
//! retries; callers decide.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use waypoint_common::config::GeneratorConfig;
use waypoint_common::models::{CareerSuggestion, EntityKind, QuizKind};

use crate::types::{ContentGenerator, GeneratedRoadmap, GenerationError};

const USER_AGENT: &str = concat!("waypoint-engine/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct RoadmapRequest<'a> {
    name: &'a str,
    kind: EntityKind,
    known_categories: &'a [String],
}

#[derive(Debug, Serialize)]
struct QuizRequest<'a> {
    answers: &'a [String],
    variant: &'a str,
}

/// Backends answer either with a bare list or wrapped in `suggestions`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionsResponse {
    Wrapped { suggestions: Vec<CareerSuggestion> },
    Bare(Vec<CareerSuggestion>),
}

impl SuggestionsResponse {
    fn into_inner(self) -> Vec<CareerSuggestion> {
        match self {
            SuggestionsResponse::Wrapped { suggestions } => suggestions,
            SuggestionsResponse::Bare(suggestions) => suggestions,
        }
    }
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Generation service client
pub struct HttpGenerator {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpGenerator {
    pub fn new(config: &GeneratorConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: Arc::new(RateLimiter::new(config.min_interval_ms)),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        self.rate_limiter.wait().await;

        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(url = %url, "Calling generation service");

        let mut request = self.http_client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 429 || status == 503 {
            return Err(GenerationError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ContentGenerator for HttpGenerator {
    async fn generate_roadmap(
        &self,
        name: &str,
        kind: EntityKind,
        known_categories: &[String],
    ) -> Result<GeneratedRoadmap, GenerationError> {
        let request = RoadmapRequest {
            name,
            kind,
            known_categories,
        };
        let roadmap: GeneratedRoadmap = self.post("roadmaps", &request).await?;

        if roadmap.steps.is_empty() {
            return Err(GenerationError::EmptyResult);
        }

        tracing::info!(
            name = %name,
            kind = %kind,
            steps = roadmap.steps.len(),
            category = roadmap.category.as_deref().unwrap_or("none"),
            "Generated roadmap"
        );

        Ok(roadmap)
    }

    async fn generate_quiz_suggestions(
        &self,
        answers: &[String],
        variant: &QuizKind,
    ) -> Result<Vec<CareerSuggestion>, GenerationError> {
        let request = QuizRequest {
            answers,
            variant: variant.as_str(),
        };
        let response: SuggestionsResponse = self.post("quiz-suggestions", &request).await?;
        let suggestions = response.into_inner();

        if suggestions.is_empty() {
            return Err(GenerationError::EmptyResult);
        }

        tracing::info!(
            variant = %variant,
            answers = answers.len(),
            suggestions = suggestions.len(),
            "Generated quiz suggestions"
        );

        Ok(suggestions)
    }
}
