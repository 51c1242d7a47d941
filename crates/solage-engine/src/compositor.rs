//! Layers the synthesized backdrop and the overlay into the final visual.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use solage_contracts::errors::GenerationError;
use solage_contracts::selection::VisualMode;

/// Overlay height as a share of the canvas edge.
pub const OVERLAY_HEIGHT_RATIO: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Background,
    ProductOverlay,
    Photo,
}

impl Layer {
    pub fn id(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::ProductOverlay => "product_overlay",
            Layer::Photo => "photo",
        }
    }
}

/// Final displayable visual, bottom layer first in `layers`.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub image: RgbaImage,
    pub layers: Vec<Layer>,
}

impl Artifact {
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("artifact PNG encode failed")?;
        Ok(bytes)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.encode_png()?)
            .with_context(|| format!("failed writing {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compositor {
    canvas_size: u32,
    overlay_ratio: f64,
}

impl Compositor {
    pub fn new(canvas_size: u32) -> Self {
        Self {
            canvas_size: canvas_size.max(1),
            overlay_ratio: OVERLAY_HEIGHT_RATIO,
        }
    }

    pub fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    /// In `UserPhoto` mode the photo travels in `overlay` and is returned untouched.
    pub fn compose(
        &self,
        background: Option<&DynamicImage>,
        overlay: Option<&DynamicImage>,
        mode: VisualMode,
    ) -> Result<Artifact, GenerationError> {
        match mode {
            VisualMode::UserPhoto => {
                let photo = overlay
                    .or(background)
                    .filter(|image| has_pixels(image))
                    .ok_or_else(|| {
                        GenerationError::CompositionUnavailable(
                            "no captured photo to display".to_string(),
                        )
                    })?;
                Ok(Artifact {
                    image: photo.to_rgba8(),
                    layers: vec![Layer::Photo],
                })
            }
            VisualMode::GeneratedBackground => {
                let background = background.filter(|image| has_pixels(image)).ok_or_else(|| {
                    GenerationError::CompositionUnavailable(
                        "background image is missing".to_string(),
                    )
                })?;
                let mut canvas = background
                    .resize_to_fill(self.canvas_size, self.canvas_size, FilterType::Triangle)
                    .to_rgba8();
                let mut layers = vec![Layer::Background];

                if let Some(overlay) = overlay.filter(|image| has_pixels(image)) {
                    let fitted = self.fit_overlay(overlay);
                    let x = (self.canvas_size.saturating_sub(fitted.width())) / 2;
                    let y = (self.canvas_size.saturating_sub(fitted.height())) / 2;
                    imageops::overlay(&mut canvas, &fitted, i64::from(x), i64::from(y));
                    layers.push(Layer::ProductOverlay);
                }

                Ok(Artifact {
                    image: canvas,
                    layers,
                })
            }
        }
    }

    fn fit_overlay(&self, overlay: &DynamicImage) -> RgbaImage {
        let target_height =
            ((f64::from(self.canvas_size) * self.overlay_ratio).round() as u32).max(1);
        overlay
            .resize(self.canvas_size, target_height, FilterType::Triangle)
            .to_rgba8()
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn has_pixels(image: &DynamicImage) -> bool {
    image.width() > 0 && image.height() > 0
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgba, RgbaImage};
    use solage_contracts::errors::GenerationError;
    use solage_contracts::selection::VisualMode;

    use super::{Compositor, Layer};
    use crate::test_support::solid_image;

    const BLUE: [u8; 4] = [20, 40, 200, 255];
    const RED: [u8; 4] = [220, 10, 10, 255];

    #[test]
    fn overlay_is_centered_at_three_quarters_height() {
        let compositor = Compositor::new(400);
        let background = solid_image(800, 400, BLUE);
        let overlay = solid_image(100, 400, RED);

        let artifact = compositor
            .compose(Some(&background), Some(&overlay), VisualMode::GeneratedBackground)
            .unwrap();
        assert_eq!(artifact.layers, vec![Layer::Background, Layer::ProductOverlay]);
        assert_eq!(artifact.image.dimensions(), (400, 400));

        // 100x400 fitted into 400x300 keeps its aspect: 75x300 at (162, 50).
        assert_eq!(artifact.image.get_pixel(200, 200), &Rgba(RED));
        assert_eq!(artifact.image.get_pixel(163, 51), &Rgba(RED));
        assert_eq!(artifact.image.get_pixel(150, 200), &Rgba(BLUE));
        assert_eq!(artifact.image.get_pixel(200, 20), &Rgba(BLUE));
        assert_eq!(artifact.image.get_pixel(200, 380), &Rgba(BLUE));
    }

    #[test]
    fn transparent_overlay_pixels_keep_the_background() {
        let compositor = Compositor::new(256);
        let background = solid_image(256, 256, BLUE);
        let overlay = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0])));

        let artifact = compositor
            .compose(Some(&background), Some(&overlay), VisualMode::GeneratedBackground)
            .unwrap();
        assert_eq!(artifact.image.get_pixel(128, 128), &Rgba(BLUE));
    }

    #[test]
    fn missing_overlay_leaves_the_background_alone() {
        let compositor = Compositor::new(256);
        let background = solid_image(300, 300, BLUE);
        let artifact = compositor
            .compose(Some(&background), None, VisualMode::GeneratedBackground)
            .unwrap();
        assert_eq!(artifact.layers, vec![Layer::Background]);
        assert_eq!(artifact.image.dimensions(), (256, 256));
    }

    #[test]
    fn missing_background_is_composition_unavailable() {
        let compositor = Compositor::new(256);
        let overlay = solid_image(10, 10, RED);
        let err = compositor
            .compose(None, Some(&overlay), VisualMode::GeneratedBackground)
            .unwrap_err();
        assert!(matches!(err, GenerationError::CompositionUnavailable(_)));

        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(compositor
            .compose(Some(&empty), None, VisualMode::GeneratedBackground)
            .is_err());
    }

    #[test]
    fn photo_mode_returns_the_photo_as_the_only_layer() {
        let compositor = Compositor::new(256);
        let photo = solid_image(64, 48, RED);
        let artifact = compositor
            .compose(None, Some(&photo), VisualMode::UserPhoto)
            .unwrap();
        assert_eq!(artifact.layers, vec![Layer::Photo]);
        assert_eq!(artifact.image, photo.to_rgba8());

        assert!(compositor.compose(None, None, VisualMode::UserPhoto).is_err());
    }

    #[test]
    fn composition_is_pixel_identical_across_calls() {
        let compositor = Compositor::new(300);
        let mut background = RgbaImage::new(640, 480);
        for (x, y, pixel) in background.enumerate_pixels_mut() {
            *pixel = Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
        }
        let background = DynamicImage::ImageRgba8(background);
        let overlay = solid_image(90, 160, [10, 200, 10, 180]);

        let first = compositor
            .compose(Some(&background), Some(&overlay), VisualMode::GeneratedBackground)
            .unwrap();
        let second = compositor
            .compose(Some(&background), Some(&overlay), VisualMode::GeneratedBackground)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn artifacts_save_as_png() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let artifact = Compositor::new(256)
            .compose(Some(&solid_image(8, 8, BLUE)), None, VisualMode::GeneratedBackground)
            .unwrap();
        let path = temp.path().join("out/artifact.png");
        artifact.save(&path)?;
        let reloaded = image::open(&path)?;
        assert_eq!((reloaded.width(), reloaded.height()), (256, 256));
        Ok(())
    }
}
