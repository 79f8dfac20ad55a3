//! Scripted generation backend that counts its calls

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use waypoint_common::models::{CareerSuggestion, EntityKind, QuizKind, RoadmapInsights, RoadmapStep};
use waypoint_engine::types::{ContentGenerator, GeneratedRoadmap, GenerationError};

#[derive(Default)]
pub struct FakeGenerator {
    roadmap_calls: AtomicUsize,
    quiz_calls: AtomicUsize,
    fail: AtomicBool,
    empty: AtomicBool,
    delay: Mutex<Option<Duration>>,
    category: Mutex<Option<String>>,
    suggestions: Mutex<Vec<String>>,
    last_answers: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        let generator = Self::default();
        generator.set_suggestions(&["Data Scientist", "UX Designer"]);
        generator
    }

    pub fn roadmap_calls(&self) -> usize {
        self.roadmap_calls.load(Ordering::SeqCst)
    }

    pub fn quiz_calls(&self) -> usize {
        self.quiz_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn set_category(&self, category: &str) {
        *self.category.lock().unwrap() = Some(category.to_string());
    }

    pub fn set_suggestions(&self, careers: &[&str]) {
        *self.suggestions.lock().unwrap() = careers.iter().map(|c| c.to_string()).collect();
    }

    pub fn last_answers(&self) -> Vec<String> {
        self.last_answers.lock().unwrap().clone()
    }

    async fn pause(&self) -> Result<(), GenerationError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::ApiError(500, "scripted failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate_roadmap(
        &self,
        name: &str,
        _kind: EntityKind,
        _known_categories: &[String],
    ) -> Result<GeneratedRoadmap, GenerationError> {
        self.roadmap_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;

        if self.empty.load(Ordering::SeqCst) {
            return Err(GenerationError::EmptyResult);
        }

        Ok(GeneratedRoadmap {
            steps: vec![RoadmapStep {
                title: format!("Explore {}", name),
                description: format!("First steps toward {}", name),
                duration: Some("1 month".to_string()),
                resources: vec![],
            }],
            insights: RoadmapInsights {
                salary_range: Some("$50k-$90k".to_string()),
                market_outlook: Some("Growing".to_string()),
                key_skills: vec!["communication".to_string()],
            },
            alternative_careers: vec!["Analyst".to_string()],
            category: self.category.lock().unwrap().clone(),
        })
    }

    async fn generate_quiz_suggestions(
        &self,
        answers: &[String],
        _variant: &QuizKind,
    ) -> Result<Vec<CareerSuggestion>, GenerationError> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_answers.lock().unwrap() = answers.to_vec();
        self.pause().await?;

        if self.empty.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }

        let careers = self.suggestions.lock().unwrap().clone();
        Ok(careers
            .into_iter()
            .map(|career| CareerSuggestion {
                description: format!("{} suits you", career),
                reasoning: "Matches your answers".to_string(),
                roadmap_path: None,
                career,
            })
            .collect())
    }
}
