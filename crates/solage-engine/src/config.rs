use std::path::PathBuf;

use crate::util::non_empty_env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AFFILIATE_BASE: &str = "https://www.solage.fr/p";
pub const DEFAULT_AMBASSADOR_ID: &str = "katy";

/// Runtime settings for a studio session, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub trends_model: Option<String>,
    pub request_timeout_s: f64,
    pub ambassador_id: String,
    pub affiliate_base: String,
    pub assets_dir: Option<PathBuf>,
    pub canvas_size: u32,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::from_lookup(|_: &str| None)
    }
}

impl StudioConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            api_base: get("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            text_model: get("SOLAGE_TEXT_MODEL"),
            image_model: get("SOLAGE_IMAGE_MODEL"),
            trends_model: get("SOLAGE_TRENDS_MODEL"),
            request_timeout_s: parse_clamped(get("SOLAGE_REQUEST_TIMEOUT"), 90.0, 15.0, 300.0),
            ambassador_id: get("SOLAGE_AMBASSADOR_ID")
                .unwrap_or_else(|| DEFAULT_AMBASSADOR_ID.to_string()),
            affiliate_base: get("SOLAGE_AFFILIATE_BASE")
                .unwrap_or_else(|| DEFAULT_AFFILIATE_BASE.to_string()),
            assets_dir: get("SOLAGE_ASSETS_DIR").map(PathBuf::from),
            canvas_size: parse_clamped(get("SOLAGE_CANVAS_SIZE"), 1024.0, 256.0, 4096.0).round()
                as u32,
        }
    }

    /// Routes every model request to the offline transport.
    pub fn with_dryrun_models(mut self) -> Self {
        self.text_model = Some("dryrun-text-1".to_string());
        self.image_model = Some("dryrun-image-1".to_string());
        self.trends_model = Some("dryrun-text-1".to_string());
        self
    }
}

fn parse_clamped(raw: Option<String>, default: f64, min: f64, max: f64) -> f64 {
    raw.and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
        .clamp(min, max)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{StudioConfig, DEFAULT_API_BASE};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = StudioConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.api_key, None);
        assert_eq!(config.request_timeout_s, 90.0);
        assert_eq!(config.canvas_size, 1024);
        assert_eq!(config.ambassador_id, "katy");
    }

    #[test]
    fn google_key_is_used_when_gemini_key_is_blank() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "  "),
            ("GOOGLE_API_KEY", "g-key"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1/"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.api_base, "http://localhost:9000/v1");
    }

    #[test]
    fn numeric_settings_are_clamped() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("SOLAGE_REQUEST_TIMEOUT", "2"),
            ("SOLAGE_CANVAS_SIZE", "99999"),
        ]));
        assert_eq!(config.request_timeout_s, 15.0);
        assert_eq!(config.canvas_size, 4096);

        let garbage = StudioConfig::from_lookup(lookup(&[("SOLAGE_CANVAS_SIZE", "big")]));
        assert_eq!(garbage.canvas_size, 1024);
    }

    #[test]
    fn dryrun_overrides_every_model() {
        let config = StudioConfig::default().with_dryrun_models();
        assert_eq!(config.text_model.as_deref(), Some("dryrun-text-1"));
        assert_eq!(config.image_model.as_deref(), Some("dryrun-image-1"));
        assert_eq!(config.trends_model.as_deref(), Some("dryrun-text-1"));
    }
}
