//! Shape validation for the structured campaign response.
//!
//! The response is data only: fields are read, nothing inside them is
//! interpreted beyond trimming.

use serde_json::Value;
use solage_contracts::errors::GenerationError;

use crate::util::truncate_text;

/// Backdrop used when the model omits its image directive.
pub const DEFAULT_BACKDROP: &str = "luxury, calm spa scene with soft natural light";

const IMAGE_PROMPT_KEYS: [&str; 3] = ["imagePrompt", "image_prompt", "backgroundPrompt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignContent {
    pub caption: String,
    pub image_prompt: String,
    pub comments: Vec<String>,
}

pub fn parse_campaign_content(raw: &str) -> Result<CampaignContent, GenerationError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "empty response".to_string(),
        ));
    }
    let parsed: Value = serde_json::from_str(body).map_err(|err| {
        GenerationError::MalformedResponse(format!(
            "response is not valid JSON ({err}): {}",
            truncate_text(body, 120)
        ))
    })?;
    let Some(object) = parsed.as_object() else {
        return Err(GenerationError::MalformedResponse(
            "response is not a JSON object".to_string(),
        ));
    };

    let caption = object
        .get("caption")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            GenerationError::MalformedResponse("missing or empty 'caption'".to_string())
        })?
        .to_string();

    let image_prompt = IMAGE_PROMPT_KEYS
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_BACKDROP)
        .to_string();

    let comments = object
        .get("comments")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(CampaignContent {
        caption,
        image_prompt,
        comments,
    })
}

/// Models sometimes wrap JSON in a ```json fence despite the schema.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use solage_contracts::errors::GenerationError;

    use super::{parse_campaign_content, DEFAULT_BACKDROP};

    #[test]
    fn parses_the_three_fields() {
        let content = parse_campaign_content(
            r#"{"caption":" Bonjour ","imagePrompt":"spa scene","comments":["a","b","c"]}"#,
        )
        .unwrap();
        assert_eq!(content.caption, "Bonjour");
        assert_eq!(content.image_prompt, "spa scene");
        assert_eq!(content.comments, vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_caption_is_malformed() {
        let err = parse_campaign_content(r#"{"imagePrompt":"spa","comments":[]}"#).unwrap_err();
        assert_eq!(
            err,
            GenerationError::MalformedResponse("missing or empty 'caption'".to_string())
        );
        assert!(parse_campaign_content(r#"{"caption":"   "}"#).is_err());
        assert!(parse_campaign_content(r#"{"caption":42}"#).is_err());
    }

    #[test]
    fn non_json_and_non_objects_are_malformed() {
        for raw in ["", "Sure! Here is your post:", "[1,2,3]", "\"caption\""] {
            let err = parse_campaign_content(raw).unwrap_err();
            assert!(matches!(err, GenerationError::MalformedResponse(_)), "{raw}");
        }
    }

    #[test]
    fn comments_default_to_empty_and_drop_junk() {
        let absent = parse_campaign_content(r#"{"caption":"x"}"#).unwrap();
        assert!(absent.comments.is_empty());

        let wrong_type = parse_campaign_content(r#"{"caption":"x","comments":"a,b"}"#).unwrap();
        assert!(wrong_type.comments.is_empty());

        let mixed =
            parse_campaign_content(r#"{"caption":"x","comments":["a",1,null," ","b","c","d"]}"#)
                .unwrap();
        assert_eq!(mixed.comments, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn backdrop_falls_back_to_default_or_legacy_key() {
        let absent = parse_campaign_content(r#"{"caption":"x"}"#).unwrap();
        assert_eq!(absent.image_prompt, DEFAULT_BACKDROP);

        let legacy =
            parse_campaign_content(r#"{"caption":"x","backgroundPrompt":"zen garden"}"#).unwrap();
        assert_eq!(legacy.image_prompt, "zen garden");
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"caption\":\"x\",\"comments\":[\"a\"]}\n```";
        let content = parse_campaign_content(raw).unwrap();
        assert_eq!(content.caption, "x");
        assert_eq!(content.comments, vec!["a"]);
    }
}
