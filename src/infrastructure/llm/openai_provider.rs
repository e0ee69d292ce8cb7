use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::{ContentProvider, ContentProviderError};
use crate::domain::{ChapterContent, CourseSpec};

/// Chat-completions implementation of `ContentProvider`.
///
/// Asks the model for exactly one chapter as a JSON object matching
/// `ChapterContent`; upstream failure modes map onto the provider error
/// categories the job records on failure.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

impl OpenAiProvider {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ContentProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContentProviderError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    fn chapter_prompt(&self, spec: &CourseSpec, topic: &str, chapter_number: u32) -> String {
        let mut prompt = format!(
            "Write chapter {} of {} for a level-{} {} course titled \"{}\".\n\
             Chapter topic: {}.\n",
            chapter_number, spec.total_chapters, spec.level, spec.kind, spec.title, topic,
        );
        if spec.include_vocabulary {
            prompt.push_str("Include a vocabulary list with translations and examples.\n");
        }
        if spec.include_exercises {
            prompt.push_str("Include practice exercises with answers.\n");
        }
        if !spec.references.is_empty() {
            prompt.push_str("Draw on these references where relevant:\n");
            for reference in &spec.references {
                prompt.push_str(&format!("- {} ({})\n", reference.label, reference.url));
            }
        }
        prompt
    }
}

const SYSTEM_PROMPT: &str = "You are a course author. Respond with a single JSON object with \
     the fields: title, introduction, vocabulary (array of {term, translation, example}), \
     grammar_points (array of strings), exercises (array of {prompt, answer}), sections \
     (array of {heading, body}), estimated_minutes (integer). No prose outside the JSON.";

#[async_trait]
impl ContentProvider for OpenAiProvider {
    #[tracing::instrument(skip(self, spec), fields(topic = %topic))]
    async fn generate_chapter(
        &self,
        spec: &CourseSpec,
        topic: &str,
        chapter_number: u32,
    ) -> Result<ChapterContent, ContentProviderError> {
        if self.api_key.is_empty() {
            return Err(ContentProviderError::NotConfigured(
                "missing API key".to_string(),
            ));
        }

        let request_body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: self.chapter_prompt(spec, topic, chapter_number),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContentProviderError::Timeout(e.to_string())
                } else {
                    ContentProviderError::RequestFailed(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(ContentProviderError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ContentProviderError::Auth(format!(
                    "HTTP {}",
                    response.status()
                )));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ContentProviderError::RequestFailed(format!(
                    "HTTP {}: {}",
                    status, body
                )));
            }
            _ => {}
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ContentProviderError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ContentProviderError::InvalidResponse("no choices".to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| ContentProviderError::InvalidResponse(format!("chapter JSON: {}", e)))
    }
}
