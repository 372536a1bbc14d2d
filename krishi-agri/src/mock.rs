//! In-process stand-ins for the weather API, crop model and language model
//!
//! Used by this crate's tests and by the HTTP layer's tests.

use crate::error::{AgriError, AgriResult};
use crate::llm::{LanguageModel, LlmPrompt};
use crate::recommender::{CropFeatures, CropRecommender};
use crate::weather::{WeatherReport, WeatherSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Weather source answering every lookup with the same report
#[derive(Debug, Clone)]
pub struct StaticWeather {
    report: Option<WeatherReport>,
    calls: Arc<Mutex<Vec<(f64, f64)>>>,
    timestamps: Arc<Mutex<Vec<Option<String>>>>,
}

impl StaticWeather {
    pub fn new(report: WeatherReport) -> Self {
        Self {
            report: Some(report),
            calls: Arc::default(),
            timestamps: Arc::default(),
        }
    }

    /// Every lookup fails like an unreachable forecast endpoint
    pub fn unavailable() -> Self {
        Self {
            report: None,
            calls: Arc::default(),
            timestamps: Arc::default(),
        }
    }

    /// Coordinates requested so far
    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Timestamps passed with each lookup, in call order
    pub fn timestamps(&self) -> Vec<Option<String>> {
        self.timestamps.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WeatherSource for StaticWeather {
    async fn get_weather(
        &self,
        lat: f64,
        lon: f64,
        timestamp: Option<&str>,
    ) -> AgriResult<WeatherReport> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((lat, lon));
        }
        if let Ok(mut timestamps) = self.timestamps.lock() {
            timestamps.push(timestamp.map(str::to_string));
        }
        self.report
            .clone()
            .ok_or_else(|| AgriError::Weather("open-meteo request failed".to_string()))
    }
}

/// Recommender returning a fixed ranking truncated to `top_k`
#[derive(Debug, Clone)]
pub struct FixedRecommender {
    ranking: Vec<String>,
    seen: Arc<Mutex<Vec<CropFeatures>>>,
}

impl FixedRecommender {
    pub fn new<I, S>(ranking: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ranking: ranking.into_iter().map(Into::into).collect(),
            seen: Arc::default(),
        }
    }

    /// Feature vectors passed in so far
    pub fn seen(&self) -> Vec<CropFeatures> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl CropRecommender for FixedRecommender {
    fn recommend(&self, features: &CropFeatures, top_k: usize) -> AgriResult<Vec<String>> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(*features);
        }
        Ok(self.ranking.iter().take(top_k).cloned().collect())
    }
}

/// Language model replaying canned replies in order and recording prompts
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<LlmPrompt>>>,
    failing: bool,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    /// Every call fails with an upstream error
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<LlmPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &LlmPrompt) -> AgriResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        if self.failing {
            return Err(AgriError::Api {
                status: 503,
                message: "model unavailable".to_string(),
            });
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .ok_or(AgriError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
