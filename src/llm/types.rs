use crate::error::{CusteioError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice.
    pub fn into_text(self) -> Result<String> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            CusteioError::ChatCompletion("No choices returned".to_string())
        })?;

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(CusteioError::ChatCompletion(
                "Model returned empty content".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum PanelBody {
    Text(String),
    Failed(String),
}

/// One narrative answer, or the reason it could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativePanel {
    pub title: &'static str,
    pub body: PanelBody,
}

impl NarrativePanel {
    pub fn text(title: &'static str, text: String) -> Self {
        Self {
            title,
            body: PanelBody::Text(text),
        }
    }

    pub fn failed(title: &'static str, reason: impl Into<String>) -> Self {
        Self {
            title,
            body: PanelBody::Failed(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.body, PanelBody::Failed(_))
    }
}
