use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};

use super::{
    GenerativeService, GroundingSource, ImageRequest, ImageResponse, InlineImage, TextRequest,
    TextResponse,
};
use crate::config::StudioConfig;
use crate::util::truncate_text;

/// Google Generative Language transport (`models/*:generateContent`).
pub struct GeminiService {
    api_base: String,
    api_key: Option<String>,
    timeout_s: f64,
    http: HttpClient,
}

impl GeminiService {
    pub fn new(config: &StudioConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_s: config.request_timeout_s,
            http: HttpClient::new(),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn post(&self, model: &str, payload: &Value) -> Result<Value> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        let endpoint = self.endpoint_for_model(model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(Duration::from_secs_f64(self.timeout_s))
            .json(payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        response_json_or_error("Gemini", response)
    }
}

impl GenerativeService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        let payload = text_payload(request);
        let response_payload = self.post(&request.model, &payload)?;
        Ok(TextResponse {
            text: extract_text(&response_payload),
            sources: extract_grounding_sources(&response_payload),
        })
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse> {
        let payload = image_payload(request);
        let response_payload = self.post(&request.model, &payload)?;
        Ok(ImageResponse {
            payloads: extract_image_items(&response_payload),
        })
    }
}

fn user_contents(prompt: &str) -> Value {
    json!([{
        "role": "user",
        "parts": [{ "text": prompt }],
    }])
}

pub(crate) fn text_payload(request: &TextRequest) -> Value {
    let mut payload = Map::new();
    payload.insert("contents".to_string(), user_contents(&request.prompt));
    if let Some(schema) = request.response_schema.as_ref() {
        payload.insert(
            "generationConfig".to_string(),
            json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }),
        );
    }
    if request.search_grounding {
        payload.insert("tools".to_string(), json!([{ "googleSearch": {} }]));
    }
    Value::Object(payload)
}

pub(crate) fn image_payload(request: &ImageRequest) -> Value {
    json!({
        "contents": user_contents(&request.prompt),
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": { "aspectRatio": request.aspect_ratio },
        },
    })
}

fn first_candidate_parts(response_payload: &Value) -> Vec<Value> {
    response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn extract_text(response_payload: &Value) -> String {
    first_candidate_parts(response_payload)
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<&str>>()
        .join("")
        .trim()
        .to_string()
}

pub(crate) fn extract_grounding_sources(response_payload: &Value) -> Vec<GroundingSource> {
    response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(|candidate| candidate.get("groundingMetadata"))
        .and_then(|metadata| metadata.get("groundingChunks"))
        .and_then(Value::as_array)
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| chunk.get("web"))
                .filter_map(|web| {
                    let uri = web.get("uri").and_then(Value::as_str)?.trim();
                    if uri.is_empty() {
                        return None;
                    }
                    let title = web
                        .get("title")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .unwrap_or(uri);
                    Some(GroundingSource {
                        title: title.to_string(),
                        uri: uri.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Inline image parts of a response. Parts whose base64 does not decode are
/// skipped, so a reply with only corrupt parts reads as "no image".
pub(crate) fn extract_image_items(response_payload: &Value) -> Vec<InlineImage> {
    let candidates = response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut out = Vec::new();

    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for part in parts {
            let inline = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let Ok(bytes) = BASE64.decode(data.as_bytes()) else {
                continue;
            };
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            out.push(InlineImage {
                mime_type,
                data: bytes,
            });
        }
    }

    out
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use serde_json::json;

    use super::{
        extract_grounding_sources, extract_image_items, extract_text, image_payload,
        text_payload, GeminiService, BASE64,
    };
    use crate::config::StudioConfig;
    use crate::service::{GenerativeService, ImageRequest, TextRequest};

    #[test]
    fn text_payload_requests_json_with_schema() {
        let payload = text_payload(&TextRequest {
            model: "gemini-3-pro-preview".to_string(),
            prompt: "write".to_string(),
            response_schema: Some(json!({"type": "OBJECT"})),
            search_grounding: false,
        });
        assert_eq!(payload["contents"][0]["parts"][0]["text"], json!("write"));
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            payload["generationConfig"]["responseSchema"],
            json!({"type": "OBJECT"})
        );
        assert!(payload.get("tools").is_none());
    }

    #[test]
    fn grounded_text_payload_enables_google_search() {
        let payload = text_payload(&TextRequest {
            model: "gemini-3-flash-preview".to_string(),
            prompt: "trends".to_string(),
            response_schema: None,
            search_grounding: true,
        });
        assert_eq!(payload["tools"], json!([{"googleSearch": {}}]));
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn image_payload_carries_aspect_ratio() {
        let payload = image_payload(&ImageRequest {
            model: "gemini-2.5-flash-image".to_string(),
            prompt: "spa".to_string(),
            aspect_ratio: "1:1".to_string(),
        });
        assert_eq!(
            payload["generationConfig"]["imageConfig"]["aspectRatio"],
            json!("1:1")
        );
        assert_eq!(
            payload["generationConfig"]["responseModalities"],
            json!(["IMAGE"])
        );
    }

    #[test]
    fn extract_text_joins_first_candidate_parts() {
        let payload = json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"caption\":"}, {"text": "\"hi\"}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        assert_eq!(extract_text(&payload), "{\"caption\":\"hi\"}");
        assert_eq!(extract_text(&json!({})), "");
    }

    #[test]
    fn extract_image_items_accepts_both_key_styles() {
        let payload = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": BASE64.encode([1u8, 2, 3])}},
                    {"inline_data": {"mime_type": "image/jpeg", "data": BASE64.encode([4u8])}}
                ]}
            }]
        });
        let items = extract_image_items(&payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].mime_type.as_deref(), Some("image/png"));
        assert_eq!(items[0].data, vec![1, 2, 3]);
        assert_eq!(items[1].mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn corrupt_inline_parts_are_skipped() {
        let only_corrupt = json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": "!!corrupt!!"}}
            ]}}]
        });
        assert!(extract_image_items(&only_corrupt).is_empty());

        let mixed = json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"data": "!!corrupt!!"}},
                {"inlineData": {"mimeType": "image/png", "data": BASE64.encode([9u8, 9])}}
            ]}}]
        });
        let items = extract_image_items(&mixed);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data, vec![9, 9]);
    }

    #[test]
    fn grounding_sources_fall_back_to_uri_for_title() {
        let payload = json!({
            "candidates": [{
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://a.example", "title": "A"}},
                    {"web": {"uri": "https://b.example"}},
                    {"web": {"uri": "  "}},
                    {"retrievedContext": {}}
                ]}
            }]
        });
        let sources = extract_grounding_sources(&payload);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "A");
        assert_eq!(sources[1].title, "https://b.example");
    }

    #[test]
    fn missing_api_key_fails_before_any_request() {
        let service = GeminiService::new(&StudioConfig::default());
        let err = service
            .generate_image(&ImageRequest {
                model: "gemini-2.5-flash-image".to_string(),
                prompt: "spa".to_string(),
                aspect_ratio: "1:1".to_string(),
            })
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert_eq!(err, "GEMINI_API_KEY or GOOGLE_API_KEY not set");
    }

    #[test]
    fn endpoint_accepts_prefixed_model_names() {
        let service = GeminiService::new(&StudioConfig::default());
        assert_eq!(
            service.endpoint_for_model("models/gemini-2.5-flash"),
            service.endpoint_for_model("gemini-2.5-flash")
        );
    }
}
