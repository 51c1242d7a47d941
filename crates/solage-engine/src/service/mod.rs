use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

mod dryrun;
mod gemini;

pub use dryrun::DryrunService;
pub use gemini::GeminiService;

#[cfg(test)]
pub(crate) use gemini::extract_image_items;

#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    /// JSON schema the response must follow; `None` asks for free text.
    pub response_schema: Option<Value>,
    /// Lets the model ground its answer with web search.
    pub search_grounding: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextResponse {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageResponse {
    pub payloads: Vec<InlineImage>,
}

impl ImageResponse {
    /// First payload that actually carries bytes.
    pub fn first_image(&self) -> Option<&InlineImage> {
        self.payloads.iter().find(|payload| !payload.data.is_empty())
    }
}

/// A generative backend able to answer text and image requests.
///
/// Implementations perform at most one outbound call per method invocation
/// and never retry on their own.
pub trait GenerativeService: Send + Sync {
    fn name(&self) -> &str;
    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse>;
    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse>;
}

#[derive(Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Box<dyn GenerativeService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: GenerativeService + 'static>(&mut self, service: S) {
        self.services
            .insert(service.name().to_string(), Box::new(service));
    }

    pub fn get(&self, name: &str) -> Option<&dyn GenerativeService> {
        self.services.get(name).map(|service| service.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{DryrunService, ImageResponse, InlineImage, ServiceRegistry};

    #[test]
    fn first_image_skips_empty_payloads() {
        let response = ImageResponse {
            payloads: vec![
                InlineImage {
                    mime_type: Some("text/plain".to_string()),
                    data: Vec::new(),
                },
                InlineImage {
                    mime_type: Some("image/png".to_string()),
                    data: vec![1, 2, 3],
                },
            ],
        };
        assert_eq!(
            response.first_image().map(|image| image.data.clone()),
            Some(vec![1, 2, 3])
        );
        assert!(ImageResponse::default().first_image().is_none());
    }

    #[test]
    fn registry_lists_services_by_name() {
        let mut registry = ServiceRegistry::new();
        registry.register(DryrunService);
        assert_eq!(registry.names(), vec!["dryrun"]);
        assert!(registry.get("dryrun").is_some());
        assert!(registry.get("gemini").is_none());
    }
}
