use anyhow::{bail, Result};
use solage_contracts::catalog::Product;

use crate::service::{GenerativeService, GroundingSource, TextRequest};
use crate::util::truncate_text;

/// Search-grounded notes about what is trending for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendReport {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

impl TrendReport {
    pub fn excerpt(&self, max_chars: usize) -> String {
        truncate_text(&self.text, max_chars)
    }
}

pub fn trends_prompt(product: &Product) -> String {
    format!(
        "Give three current wellness trends for: {}. Audience: women over 60. \
Answer in French as three short numbered lines.",
        product.name
    )
}

pub fn research_trends(
    service: &dyn GenerativeService,
    model: &str,
    product: &Product,
) -> Result<TrendReport> {
    let response = service.generate_text(&TextRequest {
        model: model.to_string(),
        prompt: trends_prompt(product),
        response_schema: None,
        search_grounding: true,
    })?;
    let text = response.text.trim();
    if text.is_empty() {
        bail!("trend research returned no text");
    }
    Ok(TrendReport {
        text: text.to_string(),
        sources: response.sources,
    })
}
