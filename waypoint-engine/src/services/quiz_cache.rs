//! Fingerprint cache for quiz results
//!
//! Look-up-or-compute around the generation service. The cache key is the
//! fingerprint of the canonicalized answers plus the quiz variant, so the
//! same answers under two variants never share a result.
//!
//! **Algorithm:**
//! 1. Fingerprint the answers
//! 2. Hit: return the stored payload, no generation call
//! 3. Miss: take the in-flight lease for the key, then re-check the store
//!    under it
//! 4. Generate from the original answers; failure or zero suggestions fail
//!    the whole call
//! 5. Insert a new cached result (never update) and return the fresh payload

use std::sync::Arc;
use waypoint_common::models::{CachedResult, CareerSuggestion, QuizKind};
use waypoint_common::{fingerprint, Fingerprint, QuizAnswers, Result};

use crate::services::inflight::{InflightLeases, LeaseOutcome};
use crate::types::{ContentGenerator, GenerationError, QuizResultStore};

/// Cache decision and the payload it produced
#[derive(Debug, Clone, PartialEq)]
pub struct CacheResolution {
    pub fingerprint: Fingerprint,
    pub suggestions: Vec<CareerSuggestion>,
    pub was_cached: bool,
}

pub struct QuizCache {
    results: Arc<dyn QuizResultStore>,
    generator: Arc<dyn ContentGenerator>,
    leases: Arc<InflightLeases>,
}

impl QuizCache {
    pub fn new(
        results: Arc<dyn QuizResultStore>,
        generator: Arc<dyn ContentGenerator>,
        leases: Arc<InflightLeases>,
    ) -> Self {
        Self {
            results,
            generator,
            leases,
        }
    }

    pub async fn resolve(&self, answers: &QuizAnswers, kind: &QuizKind) -> Result<CacheResolution> {
        let fp = fingerprint(answers);

        if let Some(hit) = self.lookup(&fp, kind).await? {
            return Ok(hit);
        }

        let key = format!("quiz:{}:{}", kind, fp);
        let (_lease, waited) = match self.leases.acquire(&key).await {
            LeaseOutcome::Acquired { lease, waited } => (Some(lease), waited),
            LeaseOutcome::Expired => (None, true),
        };

        // A holder may have finished between the first lookup and the lease
        if let Some(hit) = self.lookup(&fp, kind).await? {
            tracing::debug!(fingerprint = %fp, waited, "Concurrent request populated cache");
            return Ok(hit);
        }

        tracing::info!(
            fingerprint = %fp,
            quiz_type = %kind,
            answers = answers.len(),
            "Quiz cache miss, generating suggestions"
        );

        let suggestions = self
            .generator
            .generate_quiz_suggestions(&answers.to_answer_lines(), kind)
            .await?;

        if suggestions.is_empty() {
            return Err(GenerationError::EmptyResult.into());
        }

        let record = CachedResult::new(fp.clone(), kind.clone(), suggestions);
        if let Err(e) = self.results.create_cached_result(&record).await {
            tracing::warn!(
                fingerprint = %fp,
                error = %e,
                "Failed to persist quiz result; returning uncached suggestions"
            );
        }

        Ok(CacheResolution {
            fingerprint: fp,
            suggestions: record.payload,
            was_cached: false,
        })
    }

    async fn lookup(&self, fp: &Fingerprint, kind: &QuizKind) -> Result<Option<CacheResolution>> {
        let cached = self.results.find_cached_result(fp, kind).await?;
        Ok(cached.map(|record| {
            tracing::debug!(
                fingerprint = %fp,
                quiz_type = %kind,
                created_at = %record.created_at,
                "Quiz cache hit"
            );
            CacheResolution {
                fingerprint: fp.clone(),
                suggestions: record.payload,
                was_cached: true,
            }
        }))
    }
}
