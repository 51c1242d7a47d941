//! Generation pipeline: structured text call, then an optional image call,
//! then composition.
//!
//! Stages advance `Pending -> TextDone -> ImagePending | ImageSkipped ->
//! Composed | Failed`. Text failures abort the run; visual failures are
//! collected as issues on an otherwise successful result.

use std::time::Instant;

use anyhow::{anyhow, Result};
use image::DynamicImage;
use serde_json::{json, Value};
use solage_contracts::catalog::Product;
use solage_contracts::errors::GenerationError;
use solage_contracts::events::EventWriter;
use solage_contracts::models::{Capability, ModelSelection, ModelSelector};
use solage_contracts::selection::{CampaignBrief, Selection, VisualSource};

use crate::assets::{AssetLoader, CatalogAssets};
use crate::compositor::{Artifact, Compositor};
use crate::config::StudioConfig;
use crate::prompt::PromptBuilder;
use crate::response::parse_campaign_content;
use crate::service::{
    DryrunService, GeminiService, GenerativeService, ImageRequest, ServiceRegistry, TextRequest,
};
use crate::trends::{self, TrendReport};
use crate::util::error_chain_text;

const ERROR_TEXT_MAX_CHARS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Pending,
    TextDone,
    ImagePending,
    ImageSkipped,
    Composed,
    Failed,
}

impl PipelineStage {
    pub fn id(self) -> &'static str {
        match self {
            PipelineStage::Pending => "pending",
            PipelineStage::TextDone => "text_done",
            PipelineStage::ImagePending => "image_pending",
            PipelineStage::ImageSkipped => "image_skipped",
            PipelineStage::Composed => "composed",
            PipelineStage::Failed => "failed",
        }
    }
}

/// Outcome of one pipeline run. Replaced wholesale on regeneration.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub caption: String,
    pub comments: Vec<String>,
    pub background_image: Option<DynamicImage>,
    pub final_artifact: Option<Artifact>,
    /// Visual failures that degraded this result.
    pub issues: Vec<GenerationError>,
    pub stages: Vec<PipelineStage>,
    pub text_model: String,
    pub image_model: Option<String>,
}

impl GenerationResult {
    pub fn is_partial(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_issue(&self, kind: &str) -> bool {
        self.issues.iter().any(|issue| issue.kind() == kind)
    }
}

pub struct Orchestrator {
    services: ServiceRegistry,
    assets: Box<dyn AssetLoader>,
    prompts: PromptBuilder,
    compositor: Compositor,
    selector: ModelSelector,
    text_model: ModelSelection,
    image_model: ModelSelection,
    trends_model: ModelSelection,
    events: EventWriter,
}

impl Orchestrator {
    pub fn new(
        config: &StudioConfig,
        services: ServiceRegistry,
        assets: Box<dyn AssetLoader>,
        events: EventWriter,
    ) -> Result<Self> {
        let selector = ModelSelector::new(None);
        let text_model = selector
            .select(config.text_model.as_deref(), Capability::Text)
            .map_err(|err| anyhow!(err))?;
        let image_model = selector
            .select(config.image_model.as_deref(), Capability::Image)
            .map_err(|err| anyhow!(err))?;
        let trends_model = selector
            .select(config.trends_model.as_deref(), Capability::Search)
            .map_err(|err| anyhow!(err))?;
        Ok(Self {
            services,
            assets,
            prompts: PromptBuilder::from_config(config),
            compositor: Compositor::new(config.canvas_size),
            selector,
            text_model,
            image_model,
            trends_model,
            events,
        })
    }

    /// Gemini and dry-run transports with catalog assets resolved from config.
    pub fn from_config(config: &StudioConfig, events: EventWriter) -> Result<Self> {
        let mut services = ServiceRegistry::new();
        services.register(GeminiService::new(config));
        services.register(DryrunService);
        Self::new(
            config,
            services,
            Box::new(CatalogAssets::from_config(config)),
            events,
        )
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn text_model(&self) -> &ModelSelection {
        &self.text_model
    }

    pub fn image_model(&self) -> &ModelSelection {
        &self.image_model
    }

    pub fn trends_model(&self) -> &ModelSelection {
        &self.trends_model
    }

    /// Re-resolves the model used for `capability`; `None` restores the default.
    pub fn set_model(
        &mut self,
        capability: Capability,
        requested: Option<&str>,
    ) -> Result<&ModelSelection, String> {
        let selection = self.selector.select(requested, capability)?;
        let slot = match capability {
            Capability::Text => &mut self.text_model,
            Capability::Image => &mut self.image_model,
            Capability::Search => &mut self.trends_model,
        };
        *slot = selection;
        Ok(&*slot)
    }

    pub fn generate(&self, selection: &Selection) -> Result<GenerationResult, GenerationError> {
        self.generate_with_trends(selection, None)
    }

    pub fn generate_with_trends(
        &self,
        selection: &Selection,
        trends: Option<&TrendReport>,
    ) -> Result<GenerationResult, GenerationError> {
        let brief = match selection.brief() {
            Ok(brief) => brief,
            Err(err) => {
                self.log(
                    "generation_failed",
                    json!({ "kind": err.kind(), "error": err.to_string() }),
                );
                return Err(err);
            }
        };

        let started = Instant::now();
        self.log(
            "generation_started",
            json!({
                "product": brief.product.id,
                "angle": brief.angle.id(),
                "network": brief.network.id(),
                "tone": brief.tone.id(),
                "visual_mode": brief.visual_mode().id(),
                "text_model": self.text_model.model.name,
                "image_model": self.image_model.model.name,
                "text_fallback_reason": self.text_model.fallback_reason,
                "image_fallback_reason": self.image_model.fallback_reason,
                "with_trends": trends.is_some(),
            }),
        );

        let mut stages = Vec::new();
        self.advance(&mut stages, PipelineStage::Pending);
        let outcome = self.run(&brief, trends, &mut stages);
        let latency_s = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(result) => {
                if result.is_partial() {
                    let issues: Vec<Value> = result
                        .issues
                        .iter()
                        .map(|issue| json!({ "kind": issue.kind(), "error": issue.to_string() }))
                        .collect();
                    self.log("generation_degraded", json!({ "issues": issues }));
                }
                let layers: Vec<&str> = result
                    .final_artifact
                    .as_ref()
                    .map(|artifact| artifact.layers.iter().map(|layer| layer.id()).collect())
                    .unwrap_or_default();
                self.log(
                    "generation_finished",
                    json!({
                        "latency_s": latency_s,
                        "comments": result.comments.len(),
                        "layers": layers,
                        "partial": result.is_partial(),
                    }),
                );
            }
            Err(err) => {
                self.advance(&mut stages, PipelineStage::Failed);
                self.log(
                    "generation_failed",
                    json!({
                        "kind": err.kind(),
                        "error": err.to_string(),
                        "latency_s": latency_s,
                    }),
                );
            }
        }
        outcome
    }

    fn run(
        &self,
        brief: &CampaignBrief,
        trends: Option<&TrendReport>,
        stages: &mut Vec<PipelineStage>,
    ) -> Result<GenerationResult, GenerationError> {
        let campaign = self.prompts.campaign_request(brief, trends);
        let text_service = self.service_for(&self.text_model)?;
        let response = text_service
            .generate_text(&TextRequest {
                model: self.text_model.model.name.clone(),
                prompt: campaign.prompt,
                response_schema: Some(campaign.response_schema),
                search_grounding: false,
            })
            .map_err(|err| {
                GenerationError::ServiceUnavailable(error_chain_text(&err, ERROR_TEXT_MAX_CHARS))
            })?;
        let content = parse_campaign_content(&response.text)?;
        self.advance(stages, PipelineStage::TextDone);

        let mut issues = Vec::new();
        let mut background_image = None;
        let mut image_model = None;
        let composed = match &brief.visual {
            VisualSource::GeneratedBackground => {
                self.advance(stages, PipelineStage::ImagePending);
                image_model = Some(self.image_model.model.name.clone());
                background_image = self.request_backdrop(brief, &content.image_prompt, &mut issues)?;
                let overlay = self.load_overlay(&brief.product);
                self.compositor.compose(
                    background_image.as_ref(),
                    overlay.as_ref(),
                    brief.visual_mode(),
                )
            }
            VisualSource::UserPhoto(photo) => {
                self.advance(stages, PipelineStage::ImageSkipped);
                self.compositor
                    .compose(None, Some(photo.image()), brief.visual_mode())
            }
        };

        let final_artifact = match composed {
            Ok(artifact) => {
                self.advance(stages, PipelineStage::Composed);
                Some(artifact)
            }
            Err(err) => {
                self.advance(stages, PipelineStage::Failed);
                issues.push(err);
                None
            }
        };

        Ok(GenerationResult {
            caption: content.caption,
            comments: content.comments,
            background_image,
            final_artifact,
            issues,
            stages: stages.clone(),
            text_model: self.text_model.model.name.clone(),
            image_model,
        })
    }

    /// Transport failures abort the run; a missing or undecodable payload
    /// only degrades it.
    fn request_backdrop(
        &self,
        brief: &CampaignBrief,
        directive: &str,
        issues: &mut Vec<GenerationError>,
    ) -> Result<Option<DynamicImage>, GenerationError> {
        let backdrop = self.prompts.backdrop_request(directive, &brief.product);
        let image_service = self.service_for(&self.image_model)?;
        let response = image_service
            .generate_image(&ImageRequest {
                model: self.image_model.model.name.clone(),
                prompt: backdrop.prompt,
                aspect_ratio: backdrop.aspect_ratio,
            })
            .map_err(|err| {
                GenerationError::ServiceUnavailable(error_chain_text(&err, ERROR_TEXT_MAX_CHARS))
            })?;

        let Some(payload) = response.first_image() else {
            issues.push(GenerationError::ImageGenerationFailed(
                "the image service returned no image payload".to_string(),
            ));
            return Ok(None);
        };
        match image::load_from_memory(&payload.data) {
            Ok(image) => Ok(Some(image)),
            Err(err) => {
                issues.push(GenerationError::ImageGenerationFailed(format!(
                    "image payload ({}) could not be decoded: {err}",
                    payload.mime_type.as_deref().unwrap_or("unknown type")
                )));
                Ok(None)
            }
        }
    }

    /// Missing or unreadable overlays leave the background alone.
    fn load_overlay(&self, product: &Product) -> Option<DynamicImage> {
        match self.assets.load(&product.overlay) {
            Ok(overlay) => overlay,
            Err(err) => {
                self.log(
                    "overlay_unavailable",
                    json!({
                        "product": product.id,
                        "overlay": product.overlay,
                        "error": error_chain_text(&err, ERROR_TEXT_MAX_CHARS),
                    }),
                );
                None
            }
        }
    }

    /// Search-grounded trend notes for a product. Never touches the selection.
    pub fn research_trends(&self, product: &Product) -> Result<TrendReport, GenerationError> {
        let service = self.service_for(&self.trends_model)?;
        trends::research_trends(service, &self.trends_model.model.name, product).map_err(|err| {
            GenerationError::ServiceUnavailable(error_chain_text(&err, ERROR_TEXT_MAX_CHARS))
        })
    }

    fn service_for(
        &self,
        selection: &ModelSelection,
    ) -> Result<&dyn GenerativeService, GenerationError> {
        self.services
            .get(&selection.model.provider)
            .ok_or_else(|| {
                GenerationError::ServiceUnavailable(format!(
                    "no transport registered for provider '{}'",
                    selection.model.provider
                ))
            })
    }

    fn advance(&self, stages: &mut Vec<PipelineStage>, stage: PipelineStage) {
        stages.push(stage);
        self.log("pipeline_stage", json!({ "stage": stage.id() }));
    }

    fn log(&self, event_type: &str, payload: Value) {
        if let Err(err) = self.events.emit_value(event_type, payload) {
            eprintln!("solage-rs: failed to write {event_type} event: {err:#}");
        }
    }
}
