//! Runtime configuration loaded from environment variables and the rules file.
//!
//! Environment:
//! - `TASKMASTER_LLM_BACKEND` - `perplexity`, `openai`, `ollama`, or `none` (default: `perplexity`)
//! - `TASKMASTER_LLM_MODEL` - Model name (default depends on the backend)
//! - `PERPLEXITY_API_KEY` / `OPENAI_API_KEY` - Keys for the hosted backends
//! - `OLLAMA_HOST` - Local runner address (default: `http://localhost:11434`)
//! - `TASKMASTER_RULES` - Path to the rules file (default: `rules.yaml`)
//! - `TASKMASTER_DB` - SQLite database path (default: platform data directory)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::llm::LlmBackend;
use crate::models::Priority;

const DEFAULT_RULES_PATH: &str = "rules.yaml";

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: LlmBackend,
    /// Overrides the backend's default model.
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub ollama_host: Option<String>,
    pub rules_path: PathBuf,
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let backend = std::env::var("TASKMASTER_LLM_BACKEND")
            .ok()
            .map(|value| {
                LlmBackend::from_str(&value).unwrap_or_else(|| {
                    tracing::warn!("Unknown LLM backend {:?}, disabling AI extraction", value);
                    LlmBackend::Disabled
                })
            })
            .unwrap_or(LlmBackend::Perplexity);

        let api_key = match backend {
            LlmBackend::Perplexity => std::env::var("PERPLEXITY_API_KEY").ok(),
            LlmBackend::OpenAi => std::env::var("OPENAI_API_KEY").ok(),
            LlmBackend::Ollama | LlmBackend::Disabled => None,
        };

        Self {
            backend,
            model: std::env::var("TASKMASTER_LLM_MODEL").ok(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            ollama_host: std::env::var("OLLAMA_HOST").ok(),
            rules_path: std::env::var("TASKMASTER_RULES")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_RULES_PATH)),
            db_path: std::env::var("TASKMASTER_DB").ok().map(PathBuf::from),
        }
    }

    /// Configuration with AI extraction turned off (for local use and tests).
    pub fn offline() -> Self {
        Self {
            backend: LlmBackend::Disabled,
            model: None,
            api_key: None,
            ollama_host: None,
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            db_path: None,
        }
    }
}

/// A keyword rule that fills in a missing priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityRule {
    pub keywords: Vec<String>,
    pub priority: Priority,
}

/// Contents of the rules file.
///
/// ```yaml
/// category_weights:
///   strategic: 1.0
///   administrative: 0.25
/// priority_rules:
///   - keywords: [asap, urgent, outage]
///     priority: critical
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rules {
    #[serde(default)]
    pub category_weights: HashMap<String, f64>,
    #[serde(default)]
    pub priority_rules: Vec<PriorityRule>,
}

impl Default for Rules {
    fn default() -> Self {
        let category_weights = [
            ("strategic", 1.0),
            ("technical", 0.75),
            ("meeting", 0.5),
            ("review", 0.5),
            ("administrative", 0.25),
            ("other", 0.25),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        Self {
            category_weights,
            priority_rules: Vec::new(),
        }
    }
}

impl Rules {
    /// Parse rules from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse rules file")
    }

    /// Load rules from a file, falling back to the built-in defaults.
    ///
    /// A missing file is expected on first run and only logged as a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match Self::from_yaml(&text) {
                Ok(rules) => {
                    tracing::info!("Rules loaded from {}", path.display());
                    rules
                }
                Err(e) => {
                    tracing::error!("Error loading rules from {}: {:#}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Rules file not found at {}, using default weights",
                    path.display()
                );
                Self::default()
            }
            Err(e) => {
                tracing::error!("Error reading rules from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// First rule whose keywords appear in `text` (case-insensitive).
    pub fn priority_for(&self, text: &str) -> Option<Priority> {
        let text = text.to_lowercase();
        self.priority_rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|keyword| !keyword.is_empty() && text.contains(&keyword.to_lowercase()))
            })
            .map(|rule| rule.priority)
    }
}
