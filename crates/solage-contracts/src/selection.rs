use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::catalog::{MessagingAngle, Network, Product, Tone};
use crate::errors::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualMode {
    /// Synthesized backdrop with the product cut-out layered on top.
    GeneratedBackground,
    /// The user's captured photo, used as is.
    UserPhoto,
}

impl VisualMode {
    pub fn id(self) -> &'static str {
        match self {
            VisualMode::GeneratedBackground => "generated-background",
            VisualMode::UserPhoto => "user-photo",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "generated-background" | "studio" | "product" => Some(VisualMode::GeneratedBackground),
            "user-photo" | "photo" | "selfie" => Some(VisualMode::UserPhoto),
            _ => None,
        }
    }
}

/// A still frame taken from the camera, owned by the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    image: DynamicImage,
}

impl CapturedPhoto {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// The user's accumulated wizard choices. Every field starts unset.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    product: Option<Product>,
    messaging_angle: Option<MessagingAngle>,
    network: Option<Network>,
    tone: Option<Tone>,
    visual_mode: Option<VisualMode>,
    captured_photo: Option<CapturedPhoto>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn messaging_angle(&self) -> Option<MessagingAngle> {
        self.messaging_angle
    }

    pub fn network(&self) -> Option<Network> {
        self.network
    }

    pub fn tone(&self) -> Option<Tone> {
        self.tone
    }

    pub fn visual_mode(&self) -> Option<VisualMode> {
        self.visual_mode
    }

    pub fn captured_photo(&self) -> Option<&CapturedPhoto> {
        self.captured_photo.as_ref()
    }

    pub fn set_product(&mut self, product: Product) {
        self.product = Some(product);
    }

    pub fn set_messaging_angle(&mut self, angle: MessagingAngle) {
        self.messaging_angle = Some(angle);
    }

    pub fn set_network(&mut self, network: Network) {
        self.network = Some(network);
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.tone = Some(tone);
    }

    /// Switching away from the photo mode drops any captured frame.
    pub fn set_visual_mode(&mut self, mode: VisualMode) {
        if mode == VisualMode::GeneratedBackground {
            self.captured_photo = None;
        }
        self.visual_mode = Some(mode);
    }

    pub fn set_captured_photo(&mut self, photo: CapturedPhoto) {
        self.captured_photo = Some(photo);
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.product.is_none() {
            missing.push("product");
        }
        if self.messaging_angle.is_none() {
            missing.push("messaging_angle");
        }
        if self.network.is_none() {
            missing.push("network");
        }
        if self.tone.is_none() {
            missing.push("tone");
        }
        match self.visual_mode {
            None => missing.push("visual_mode"),
            Some(VisualMode::UserPhoto) if self.captured_photo.is_none() => {
                missing.push("captured_photo")
            }
            Some(_) => {}
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Snapshot the selection into a fully populated brief, or report what is missing.
    pub fn brief(&self) -> Result<CampaignBrief, GenerationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(GenerationError::InvalidSelection(format!(
                "missing {}",
                missing.join(", ")
            )));
        }
        let (Some(product), Some(angle), Some(network), Some(tone), Some(mode)) = (
            self.product.clone(),
            self.messaging_angle,
            self.network,
            self.tone,
            self.visual_mode,
        ) else {
            return Err(GenerationError::InvalidSelection(
                "selection changed while validating".to_string(),
            ));
        };
        let visual = match (mode, self.captured_photo.clone()) {
            (VisualMode::GeneratedBackground, _) => VisualSource::GeneratedBackground,
            (VisualMode::UserPhoto, Some(photo)) => VisualSource::UserPhoto(photo),
            (VisualMode::UserPhoto, None) => {
                return Err(GenerationError::InvalidSelection(
                    "missing captured_photo".to_string(),
                ))
            }
        };
        Ok(CampaignBrief {
            product,
            angle,
            network,
            tone,
            visual,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualSource {
    GeneratedBackground,
    UserPhoto(CapturedPhoto),
}

impl VisualSource {
    pub fn mode(&self) -> VisualMode {
        match self {
            VisualSource::GeneratedBackground => VisualMode::GeneratedBackground,
            VisualSource::UserPhoto(_) => VisualMode::UserPhoto,
        }
    }
}

/// Validated, immutable snapshot of a complete selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignBrief {
    pub product: Product,
    pub angle: MessagingAngle,
    pub network: Network,
    pub tone: Tone,
    pub visual: VisualSource,
}

impl CampaignBrief {
    pub fn angle_text(&self) -> &str {
        self.product.angle_text(self.angle)
    }

    pub fn visual_mode(&self) -> VisualMode {
        self.visual.mode()
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, RgbaImage};

    use super::{CapturedPhoto, Selection, VisualMode, VisualSource};
    use crate::catalog::{Catalog, MessagingAngle, Network, Tone};
    use crate::errors::GenerationError;

    fn filled(mode: VisualMode) -> Selection {
        let catalog = Catalog::default();
        let mut selection = Selection::new();
        if let Some(product) = catalog.get("detox") {
            selection.set_product(product.clone());
        }
        selection.set_messaging_angle(MessagingAngle::Promotional);
        selection.set_network(Network::Instagram);
        selection.set_tone(Tone::Quick);
        selection.set_visual_mode(mode);
        selection
    }

    #[test]
    fn new_selection_reports_every_field_missing() {
        let selection = Selection::new();
        assert_eq!(
            selection.missing_fields(),
            vec!["product", "messaging_angle", "network", "tone", "visual_mode"]
        );
        assert_eq!(
            selection.brief().err(),
            Some(GenerationError::InvalidSelection(
                "missing product, messaging_angle, network, tone, visual_mode".to_string()
            ))
        );
    }

    #[test]
    fn photo_mode_requires_a_captured_photo() {
        let mut selection = filled(VisualMode::UserPhoto);
        assert_eq!(selection.missing_fields(), vec!["captured_photo"]);
        assert!(selection.brief().is_err());

        selection.set_captured_photo(CapturedPhoto::new(DynamicImage::ImageRgba8(
            RgbaImage::new(4, 4),
        )));
        let brief = selection.brief().unwrap();
        assert!(matches!(brief.visual, VisualSource::UserPhoto(_)));
    }

    #[test]
    fn switching_to_generated_background_drops_the_photo() {
        let mut selection = filled(VisualMode::UserPhoto);
        selection.set_captured_photo(CapturedPhoto::new(DynamicImage::ImageRgba8(
            RgbaImage::new(2, 2),
        )));
        selection.set_visual_mode(VisualMode::GeneratedBackground);
        assert!(selection.captured_photo().is_none());
        assert!(selection.is_complete());
    }

    #[test]
    fn brief_resolves_the_angle_text_not_its_id() {
        let brief = filled(VisualMode::GeneratedBackground).brief().unwrap();
        assert!(brief.angle_text().starts_with("Offre de saison"));
        assert_eq!(brief.visual_mode(), VisualMode::GeneratedBackground);
    }

    #[test]
    fn visual_mode_accepts_legacy_aliases() {
        assert_eq!(VisualMode::parse("selfie"), Some(VisualMode::UserPhoto));
        assert_eq!(
            VisualMode::parse("generated-background"),
            Some(VisualMode::GeneratedBackground)
        );
        assert_eq!(VisualMode::parse("video"), None);
    }
}
