use std::io::Cursor;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{
    GenerativeService, ImageRequest, ImageResponse, InlineImage, TextRequest, TextResponse,
};

const DRYRUN_IMAGE_EDGE: u32 = 512;

/// Offline stand-in that answers deterministically from the prompt text.
pub struct DryrunService;

impl GenerativeService for DryrunService {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        let id = short_id(&request.prompt);
        if request.response_schema.is_none() {
            return Ok(TextResponse {
                text: format!(
                    "1. Routines douces du matin ({id}).\n2. Compléments naturels et traçables.\n3. Bien vieillir en mouvement."
                ),
                sources: Vec::new(),
            });
        }
        let headline = request
            .prompt
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("Product:"))
            .map(|line| line.trim_start_matches("Product:").trim())
            .unwrap_or("Solage");
        let text = json!({
            "caption": format!("✨ {headline} ✨\nDry-run caption {id}."),
            "imagePrompt": "soft spa scene with warm morning light, linen and eucalyptus",
            "comments": [
                "Qui a déjà essayé ? 💬",
                "Je vous explique tout en message privé !",
                "Merci pour vos retours si nombreux 💛",
            ],
        });
        Ok(TextResponse {
            text: text.to_string(),
            sources: Vec::new(),
        })
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse> {
        let (r, g, b) = color_from_prompt(&request.prompt);
        let mut image = RgbImage::new(DRYRUN_IMAGE_EDGE, DRYRUN_IMAGE_EDGE);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("dry-run image encode failed")?;
        Ok(ImageResponse {
            payloads: vec![InlineImage {
                mime_type: Some("image/png".to_string()),
                data: bytes,
            }],
        })
    }
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}

fn short_id(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}
