use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reading_client::domain::MeasureType;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{prompt_for, VisionClient, VisionError};
use crate::images::StoredImage;

/// Client for the Gemini `generateContent` REST endpoint.
///
/// The image is sent inline as base64 next to the text prompt.
pub struct GeminiVisionClient {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiVisionClient {
    pub fn new(endpoint: &str, model: &str, api_key: String, timeout: Duration) -> Result<Self, VisionError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Concatenated text of the first candidate.
fn response_text(resp: GenerateResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait::async_trait]
impl VisionClient for GeminiVisionClient {
    async fn recognize(&self, image: &StoredImage, measure_type: MeasureType) -> Result<String, VisionError> {
        let bytes = tokio::fs::read(&image.path).await?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: image.mime.mime_type(),
                            data: STANDARD.encode(bytes),
                        },
                    },
                    Part::Text {
                        text: prompt_for(measure_type),
                    },
                ],
            }],
        };

        let resp = self
            .http_client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        response_text(parsed).ok_or(VisionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ImageMime;

    #[test]
    fn request_body_uses_inline_image_and_prompt() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: ImageMime::Png.mime_type(),
                            data: STANDARD.encode(b"hello"),
                        },
                    },
                    Part::Text {
                        text: prompt_for(MeasureType::Water),
                    },
                ],
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
        assert!(parts[1]["text"].as_str().unwrap().contains("water meter"));
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"0012"},{"text":"34"}]}},
                              {"content":{"parts":[{"text":"999"}]}}]}"#,
        )
        .unwrap();

        assert_eq!(response_text(resp).as_deref(), Some("001234"));
    }

    #[test]
    fn blank_or_missing_candidates_yield_nothing() {
        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(response_text(empty).is_none());

        let no_content: GenerateResponse = serde_json::from_str(r#"{"candidates":[{}]}"#).unwrap();
        assert!(response_text(no_content).is_none());

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#).unwrap();
        assert!(response_text(blank).is_none());
    }

    #[test]
    fn url_points_at_model_generate_content() {
        let client = GeminiVisionClient::new(
            "https://example.test/v1beta/",
            "gemini-1.5-flash",
            "key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(client.url(), "https://example.test/v1beta/models/gemini-1.5-flash:generateContent");
    }
}
