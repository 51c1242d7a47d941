//! Turns a validated brief into the two generation requests.
//!
//! The backdrop request never carries the product: the official cut-out is
//! layered on top by the compositor, so the synthesized scene must stay empty.

use serde_json::{json, Value};
use solage_contracts::catalog::Product;
use solage_contracts::selection::{CampaignBrief, VisualMode};

use crate::config::StudioConfig;
use crate::trends::TrendReport;

pub const BACKDROP_ASPECT_RATIO: &str = "1:1";

/// Appended to every backdrop prompt.
pub const BACKDROP_EXCLUSION: &str = "No text, no lettering, no logo, no product, no bottle, \
no jar, no box, no packaging: only the empty setting. Laboratoires Solage style.";

const TREND_CONTEXT_MAX_CHARS: usize = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRequest {
    pub prompt: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackdropRequest {
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    ambassador_id: String,
    affiliate_base: String,
}

impl PromptBuilder {
    pub fn new(ambassador_id: impl Into<String>, affiliate_base: impl Into<String>) -> Self {
        Self {
            ambassador_id: ambassador_id.into(),
            affiliate_base: affiliate_base.into(),
        }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(config.ambassador_id.clone(), config.affiliate_base.clone())
    }

    /// Canonical affiliate link: `{base}/{product_id}?ref={ambassador}`.
    pub fn affiliate_link(&self, product: &Product) -> String {
        format!(
            "{}/{}?ref={}",
            self.affiliate_base.trim_end_matches('/'),
            product.id,
            self.ambassador_id
        )
    }

    pub fn campaign_request(
        &self,
        brief: &CampaignBrief,
        trends: Option<&TrendReport>,
    ) -> CampaignRequest {
        let product = &brief.product;
        let mut lines = vec![
            "You are the marketing copywriter of Katy, independent ambassador for Laboratoires Solage.".to_string(),
            format!(
                "Write one {} post in French for women over 60.",
                brief.network.name()
            ),
            format!("Network style: {}.", brief.network.style_hint()),
            format!("Product: {}: {}", product.name, product.description),
            format!("Price: {}", product.formatted_price()),
            format!("Key message: {}", brief.angle_text()),
            format!(
                "Tone: {} ({}).",
                brief.tone.name(),
                brief.tone.description()
            ),
            format!(
                "End the caption with this affiliate link on its own line: {}",
                self.affiliate_link(product)
            ),
        ];
        if let Some(report) = trends {
            lines.push(format!(
                "Current trends you may draw on:\n{}",
                report.excerpt(TREND_CONTEXT_MAX_CHARS)
            ));
        }
        lines.push(String::new());
        lines.push("Return JSON with exactly these fields:".to_string());
        lines.push("- caption: the full post text.".to_string());
        lines.push(format!("- imagePrompt: {}", image_prompt_instruction(brief.visual_mode())));
        lines.push(
            "- comments: three short engagement comments the ambassador can post under the publication."
                .to_string(),
        );

        CampaignRequest {
            prompt: lines.join("\n"),
            response_schema: campaign_response_schema(),
        }
    }

    /// Backdrop request for the image service, with product mentions removed.
    pub fn backdrop_request(&self, directive: &str, product: &Product) -> BackdropRequest {
        let scene = scrub_product_mentions(directive, product);
        let scene = if scene.is_empty() {
            crate::response::DEFAULT_BACKDROP.to_string()
        } else {
            scene
        };
        BackdropRequest {
            prompt: format!("Photograph of an empty, luxurious backdrop: {scene}. {BACKDROP_EXCLUSION}"),
            aspect_ratio: BACKDROP_ASPECT_RATIO.to_string(),
        }
    }
}

fn image_prompt_instruction(mode: VisualMode) -> &'static str {
    match mode {
        VisualMode::GeneratedBackground => {
            "a description of an empty BACKGROUND scene only (luxury, zen, spa or nature; Solage colours blue, gold and pink). \
The official product cut-out is added on top afterwards, so never mention the product, its bottle, jar, box or packaging, and include no text."
        }
        VisualMode::UserPhoto => {
            "a short description of a setting that would suit the ambassador's own photo; no text, no product packaging."
        }
    }
}

pub fn campaign_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "caption": { "type": "STRING" },
            "imagePrompt": { "type": "STRING" },
            "comments": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": ["caption", "imagePrompt", "comments"],
    })
}

/// Containers the backdrop must never show, English and French, singular and plural.
const PACKAGING_WORDS: &[&str] = &[
    "bottle", "bottles", "jar", "jars", "box", "boxes", "packaging", "package", "packages",
    "container", "containers", "tube", "tubes", "capsule", "capsules", "pot", "pots", "product",
    "products", "flacon", "flacons", "bouteille", "bouteilles", "boîte", "boîtes", "boite",
    "boites", "emballage", "emballages", "coffret", "coffrets", "gélule", "gélules", "produit",
    "produits",
];

/// Articles and linking words left dangling once the noun after them is dropped.
const CONNECTOR_WORDS: &[&str] = &[
    "a", "an", "the", "its", "their", "and", "with", "of", "un", "une", "le", "la", "les", "son",
    "sa", "ses", "de", "du", "des", "et", "avec",
];

/// Drops product-name and packaging words from a model-written scene
/// description, along with the articles that led into them.
fn scrub_product_mentions(directive: &str, product: &Product) -> String {
    let name_words: Vec<String> = product
        .name
        .split_whitespace()
        .map(normalize_word)
        .filter(|word| word.chars().count() > 2)
        .collect();
    let mut kept: Vec<&str> = Vec::new();
    for word in directive.split_whitespace() {
        let normalized = normalize_word(word);
        if name_words.contains(&normalized) || PACKAGING_WORDS.contains(&normalized.as_str()) {
            while kept
                .last()
                .is_some_and(|last| CONNECTOR_WORDS.contains(&normalize_word(last).as_str()))
            {
                kept.pop();
            }
            continue;
        }
        kept.push(word);
    }
    kept.join(" ")
        .trim_matches(|ch: char| ch == ',' || ch == '.' || ch.is_whitespace())
        .to_string()
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|ch: char| !ch.is_alphanumeric())
        .to_lowercase()
}
