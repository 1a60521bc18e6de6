use thiserror::Error;

/// Failures talking to an LLM backend.
///
/// None of these reach the user: the extractor logs them and falls back to
/// heuristic extraction.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Backend returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("timeout: {}", e))
        } else if e.is_connect() {
            Self::Network(format!("connection failed: {}", e))
        } else if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
