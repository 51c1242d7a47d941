use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What an exported campaign looked like when it was written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub session_id: String,
    pub product_id: String,
    pub product_name: String,
    pub angle: String,
    pub network: String,
    pub tone: String,
    pub visual_mode: String,
    pub text_model: String,
    pub image_model: Option<String>,
    pub caption: String,
    pub comments: Vec<String>,
    pub artifact_layers: Vec<String>,
    pub issues: Vec<String>,
}

pub fn write_summary(
    path: &Path,
    summary: &CampaignSummary,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = match serde_json::to_value(summary)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    if let Some(extra) = extra {
        for (key, value) in extra {
            payload.insert(key.clone(), value.clone());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&Value::Object(payload))?)?;
    Ok(())
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{write_summary, CampaignSummary};

    #[test]
    fn write_summary_generates_expected_payload() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("out/summary.json");

        let summary = CampaignSummary {
            session_id: "session-1".to_string(),
            product_id: "detox".to_string(),
            product_name: "Elixir Détox".to_string(),
            angle: "promotional".to_string(),
            network: "insta".to_string(),
            tone: "quick".to_string(),
            visual_mode: "generated-background".to_string(),
            text_model: "gemini-3-pro-preview".to_string(),
            image_model: Some("gemini-2.5-flash-image".to_string()),
            caption: "Bonjour".to_string(),
            comments: vec!["a".to_string(), "b".to_string()],
            artifact_layers: vec!["background".to_string(), "product_overlay".to_string()],
            issues: Vec::new(),
        };
        let mut extra = Map::new();
        extra.insert("extra_key".to_string(), Value::String("extra".to_string()));
        write_summary(&path, &summary, Some(&extra))?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!(parsed["product_id"], json!("detox"));
        assert_eq!(parsed["comments"], json!(["a", "b"]));
        assert_eq!(parsed["artifact_layers"][1], json!("product_overlay"));
        assert_eq!(parsed["extra_key"], json!("extra"));
        assert!(parsed.get("ts").and_then(Value::as_str).is_some());
        Ok(())
    }
}
