//! Action-item extraction.
//!
//! [`Extractor::extract`] asks the configured LLM for action items and
//! normalizes the answer. Upstream failures (backend disabled, unreachable,
//! error status, output of no recognizable shape) are never surfaced: the
//! extractor logs them and falls back to [`fallback::heuristic_items`].

pub mod fallback;
pub mod normalize;
pub mod prompt;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use normalize::Normalizer;

use crate::config::Rules;
use crate::llm::{ChatOptions, LlmClient, LlmError};
use crate::models::NewTask;

/// How a set of tasks was extracted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Extraction {
    pub method: ExtractionMethod,
    pub tasks: Vec<NewTask>,
}

#[derive(Clone)]
pub struct Extractor {
    llm: Option<Arc<dyn LlmClient>>,
    normalizer: Normalizer,
}

impl Extractor {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, rules: Rules) -> Self {
        Self {
            llm,
            normalizer: Normalizer::new(rules),
        }
    }

    /// Extractor that only uses the heuristic fallback.
    pub fn offline(rules: Rules) -> Self {
        Self::new(None, rules)
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub async fn extract(&self, text: &str, today: NaiveDate) -> Extraction {
        let text = text.trim();
        if text.is_empty() {
            return Extraction {
                method: ExtractionMethod::Heuristic,
                tasks: Vec::new(),
            };
        }

        if let Some(llm) = &self.llm {
            match self.extract_with_llm(llm.as_ref(), text, today).await {
                Ok(tasks) => {
                    tracing::info!("Extracted {} action items with {}", tasks.len(), llm.model());
                    return Extraction {
                        method: ExtractionMethod::Llm,
                        tasks,
                    };
                }
                Err(e) => tracing::warn!("AI extraction failed, using fallback: {}", e),
            }
        }

        let tasks = self.fallback(text);
        tracing::info!("Extracted {} action items heuristically", tasks.len());
        Extraction {
            method: ExtractionMethod::Heuristic,
            tasks,
        }
    }

    /// Heuristic extraction, normalized like model output.
    pub fn fallback(&self, text: &str) -> Vec<NewTask> {
        self.normalizer
            .normalize_items(&fallback::heuristic_items(text))
    }

    async fn extract_with_llm(
        &self,
        llm: &dyn LlmClient,
        text: &str,
        today: NaiveDate,
    ) -> Result<Vec<NewTask>, LlmError> {
        let messages = prompt::extraction_messages(text, today);
        let options = ChatOptions {
            temperature: Some(0.2),
            max_tokens: Some(2000),
        };

        let content = llm.chat_completion(&messages, options).await?;
        let items = normalize::parse_items(&content).ok_or_else(|| {
            LlmError::Parse(format!(
                "unrecognized response: {}",
                normalize::truncate_chars(&content, 200)
            ))
        })?;

        Ok(self.normalizer.normalize_items(&items))
    }
}
