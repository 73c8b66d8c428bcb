//! Free-text Q&A against a remote chat-completions service.
//!
//! The advisor never feeds into scoring; failures surface to the user as
//! notices and leave the session untouched.

use std::fmt::Debug;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::AdvisorConfig;

const SYSTEM_ROLE: &str = "You are a professional and concise government subsidy advisor.";

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("advisor is not configured (missing API key)")]
    NotConfigured,
    #[error("advisor endpoint '{0}' is not an http(s) URL")]
    InvalidEndpoint(String),
    #[error("advisor request failed: {0}")]
    Transport(String),
    #[error("advisor returned an empty answer")]
    EmptyAnswer,
}

pub trait SubsidyAdvisor: Debug + Send + Sync {
    fn answer(&self, question: &str) -> Result<String, AdvisorError>;
}

/// Prompt that scopes answers to the programs the self-check covers.
pub fn advisor_prompt(question: &str) -> String {
    format!(
        "You are SubsidySmart, an AI assistant trained to guide clients on subsidy program eligibility.\n\
         Answer clearly based only on:\n\
         1. SME Expansion (5-100 employees, <$50M revenue)\n\
         2. R&D Innovation (AI, Biotech, >=3 yrs, >=$200K budget)\n\
         3. Export Assistance ($500K+ domestic sales)\n\
         \n\
         Question: {}",
        question.trim()
    )
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsAdvisor {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl ChatCompletionsAdvisor {
    pub fn new(config: &AdvisorConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            agent,
        }
    }
}

impl Debug for ChatCompletionsAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsAdvisor")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl SubsidyAdvisor for ChatCompletionsAdvisor {
    fn answer(&self, question: &str) -> Result<String, AdvisorError> {
        let api_key = self.api_key.as_deref().ok_or(AdvisorError::NotConfigured)?;

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(AdvisorError::InvalidEndpoint(self.endpoint.clone()));
        }

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_ROLE },
                { "role": "user", "content": advisor_prompt(question) },
            ],
        });

        let completion: ChatCompletion = self
            .agent
            .post(&format!("{}/chat/completions", self.endpoint))
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(body)
            .map_err(|err| AdvisorError::Transport(err.to_string()))?
            .into_json()
            .map_err(|err| AdvisorError::Transport(err.to_string()))?;

        extract_answer(completion)
    }
}

fn extract_answer(completion: ChatCompletion) -> Result<String, AdvisorError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(AdvisorError::EmptyAnswer)
}
