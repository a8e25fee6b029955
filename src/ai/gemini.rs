use chrono::NaiveDate;

use super::{AiError, AiResponse, PREVIEW_LIMIT, build_prompt, parse_response, response_schema, truncate};
use crate::config::ClarityConfig;

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ClarityConfig, api_key: impl Into<String>) -> Self {
        Self::new(api_key, config.model.clone(), config.api_base_url.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate(&self, body: &serde_json::Value, content_length: usize) -> Result<serde_json::Value, AiError> {
        let request_error = |source: reqwest::Error| AiError::Request {
            model: self.model.clone(),
            content_length,
            source,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status,
                body: truncate(&text, PREVIEW_LIMIT),
            });
        }

        resp.json().await.map_err(request_error)
    }

    /// Send a brain dump to the model and return the checked extraction.
    pub async fn organize(&self, content: &str, today: NaiveDate) -> Result<AiResponse, AiError> {
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": build_prompt(content, today) }] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseJsonSchema": response_schema(),
            }
        });

        log::info!("Sending brain dump to {} ({} chars)", self.model, content.len());
        let api_resp = self.generate(&body, content.len()).await?;

        let text = response_text(&api_resp).ok_or_else(|| AiError::MissingText {
            preview: truncate(&api_resp.to_string(), PREVIEW_LIMIT),
        })?;
        log::debug!("Model response: {}", truncate(&text, PREVIEW_LIMIT));

        let response = parse_response(&text)?;
        log::info!(
            "Extracted {} tasks and {} plan entries",
            response.tasks.len(),
            response.weekly_plan.len()
        );
        Ok(response)
    }

    /// Verify the API key with a minimal request.
    pub async fn test_api_key(&self) -> Result<(), AiError> {
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Reply with OK" }] }
            ],
            "generationConfig": { "maxOutputTokens": 4 }
        });

        match self.generate(&body, 0).await {
            Ok(_) => Ok(()),
            Err(AiError::Api { status, .. }) if status == 401 || status == 403 => Err(AiError::Api {
                status,
                body: "Invalid API key".to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Concatenated text parts of the first candidate, if any.
pub fn response_text(api_resp: &serde_json::Value) -> Option<String> {
    let parts = api_resp["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate["content"]["parts"].as_array())?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.trim().is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_model() {
        let client = GeminiClient::new("key", "gemini-2.5-flash", "https://example.test/");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn extracts_candidate_text() {
        let resp = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"tasks\":" }, { "text": "[]}" }] } }
            ]
        });
        assert_eq!(response_text(&resp).as_deref(), Some("{\"tasks\":[]}"));
    }

    #[test]
    fn missing_or_blank_text() {
        assert_eq!(response_text(&serde_json::json!({})), None);
        assert_eq!(response_text(&serde_json::json!({ "candidates": [] })), None);
        let blank = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "  " }] } }]
        });
        assert_eq!(response_text(&blank), None);
    }
}
