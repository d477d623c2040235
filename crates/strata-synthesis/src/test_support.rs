//! Scripted text model and fixtures for pipeline tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use strata_core::entities::{Item, NewItem};
use strata_db::service::StrataService;
use strata_model::{CompletionRequest, Embedder, Generator, ModelError};

pub const DIMS: usize = 3;

pub async fn test_service() -> StrataService {
    StrataService::new_local(":memory:").await.unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

pub fn at(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, hour, 0, 0).unwrap()
}

pub fn new_item(title: &str, content: &str, source: &str, d: u32) -> NewItem {
    NewItem {
        title: title.to_string(),
        content: content.to_string(),
        source_identifier: source.to_string(),
        source_url: None,
        collected_at: at(d, 8),
        newsletter_date: day(d),
        embedding: None,
    }
}

pub async fn insert(
    svc: &StrataService,
    title: &str,
    content: &str,
    source: &str,
    d: u32,
    embedding: Option<Vec<f32>>,
) -> Item {
    let mut item = new_item(title, content, source, d);
    item.embedding = embedding;
    svc.insert_item(&item).await.unwrap()
}

/// Embeds text by keyword: the first `(needle, vector)` whose needle occurs
/// in the text wins, otherwise `fallback`.
pub struct KeywordEmbedder {
    pub vectors: Vec<(&'static str, Vec<f32>)>,
    pub fallback: Vec<f32>,
    pub fail_on: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(vectors: Vec<(&'static str, Vec<f32>)>) -> Self {
        Self {
            vectors,
            fallback: vec![0.0, 0.0, 1.0],
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, needle: &'static str) -> Self {
        self.fail_on = Some(needle);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.is_some_and(|needle| text.contains(needle)) {
            return Err(ModelError::Api {
                status: 500,
                message: "embedding backend unavailable".into(),
            });
        }
        Ok(self
            .vectors
            .iter()
            .find(|(needle, _)| text.contains(needle))
            .map_or_else(|| self.fallback.clone(), |(_, v)| v.clone()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Answers scoring prompts with `score_reply` and development prompts with
/// `develop_reply`. Prompts containing a `fail_on` needle get an API error;
/// development prompts containing a `stall_on` needle never answer.
pub struct ScriptedGenerator {
    pub score_reply: String,
    pub develop_reply: String,
    pub fail_on: Vec<&'static str>,
    pub stall_on: Vec<&'static str>,
    pub prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            score_reply: r#"{"originality": 7, "relevance": 8, "reasoning": "shared arc"}"#.into(),
            develop_reply: r#"```json
{"headline": "Rails, again", "content": "Then as now, networks won.",
 "historical_reference": "1840s railway mania",
 "core_thesis_alignment": "Infrastructure compounds."}
```"#
            .into(),
            fail_on: Vec::new(),
            stall_on: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn development_calls(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| is_development_prompt(p))
            .count()
    }

    pub fn scoring_calls(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| !is_development_prompt(p))
            .count()
    }
}

fn is_development_prompt(prompt: &str) -> bool {
    prompt.contains("\"headline\"")
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if is_development_prompt(&request.prompt)
            && self.stall_on.iter().any(|n| request.prompt.contains(n))
        {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_on.iter().any(|n| request.prompt.contains(n)) {
            return Err(ModelError::Api {
                status: 503,
                message: "overloaded".into(),
            });
        }
        if is_development_prompt(&request.prompt) {
            Ok(self.develop_reply.clone())
        } else {
            Ok(self.score_reply.clone())
        }
    }
}
