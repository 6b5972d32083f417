//! Gemini text generation provider using the REST API.

use async_trait::async_trait;
use reqwest::Client;

use super::generator::{GeneratorError, Message, Role, TextGenerator};

/// Gemini provider calling `models/{model}:generateContent`.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiGenerator {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    /// Override the endpoint (used by tests and proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, messages: &[Message]) -> Result<String, GeneratorError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = to_request(messages, self.temperature);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api { status, message });
        }

        let body: Response = response.json().await?;
        extract_text(&body)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

// ============================================================================
// Conversions
// ============================================================================

fn to_request(messages: &[Message], temperature: f32) -> Request {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(Part {
                text: msg.content.clone(),
            }),
            Role::User => contents.push(Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            }),
        }
    }

    Request {
        system_instruction: (!system_parts.is_empty()).then_some(SystemInstruction {
            parts: system_parts,
        }),
        contents,
        generation_config: GenerationConfig { temperature },
    }
}

fn extract_text(response: &Response) -> Result<String, GeneratorError> {
    let text = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GeneratorError::Empty);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_splits_system_from_user() {
        let messages = [
            Message::text(Role::System, "You are a tutor."),
            Message::text(Role::User, "Explain photosynthesis."),
        ];
        let request = to_request(&messages, 0.7);

        let system = request.system_instruction.as_ref().unwrap();
        assert_eq!(system.parts.len(), 1);
        assert_eq!(system.parts[0].text, "You are a tutor.");
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[0].parts[0].text, "Explain photosynthesis.");
    }

    #[test]
    fn request_serializes_camel_case() {
        let messages = [
            Message::text(Role::System, "sys"),
            Message::text(Role::User, "hi"),
        ];
        let json = serde_json::to_string(&to_request(&messages, 0.2)).unwrap();

        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"temperature\":0.2"));
    }

    #[test]
    fn request_omits_missing_system_instruction() {
        let messages = [Message::text(Role::User, "hi")];
        let json = serde_json::to_string(&to_request(&messages, 0.7)).unwrap();
        assert!(!json.contains("systemInstruction"));
    }

    #[test]
    fn extracts_candidate_text() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{"text": "Photosynthesis "}, {"text": "converts light."}]
                    }
                }
            ]
        }"#;
        let response: Response = serde_json::from_str(json).unwrap();
        let text = extract_text(&response).unwrap();
        assert_eq!(text, "Photosynthesis converts light.");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let response: Response = serde_json::from_str("{}").unwrap();
        assert!(matches!(extract_text(&response), Err(GeneratorError::Empty)));

        let blank: Response = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#,
        )
        .unwrap();
        assert!(matches!(extract_text(&blank), Err(GeneratorError::Empty)));
    }
}
