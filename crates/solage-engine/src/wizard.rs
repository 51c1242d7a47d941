//! Session controller: owns the selection, the camera stream and the latest
//! result, and walks the user from connection to the generated post.

use chrono::Utc;
use serde_json::{json, Value};
use solage_contracts::catalog::{tone_options, Catalog, MessagingAngle, Network, Tone, ToneOption};
use solage_contracts::errors::{CameraError, GenerationError, WizardError};
use solage_contracts::events::EventWriter;
use solage_contracts::selection::{Selection, VisualMode};
use uuid::Uuid;

use crate::camera::{ActiveStream, CameraManager};
use crate::orchestrator::{GenerationResult, Orchestrator};
use crate::trends::TrendReport;

/// `studio-YYYYMMDD-HHMMSS-xxxxxxxx`, used to tag events and exports.
pub fn new_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "studio-{}-{}",
        Utc::now().format("%Y%m%d-%H%M%S"),
        &suffix[..8]
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Idle,
    Landing,
    ProductChoice,
    AngleChoice,
    NetworkChoice,
    ToneChoice,
    VisualAndPricing,
    /// Terminal: only a reset leaves it.
    Generating,
}

impl WizardStep {
    pub fn index(self) -> i8 {
        match self {
            WizardStep::Idle => -1,
            WizardStep::Landing => 0,
            WizardStep::ProductChoice => 1,
            WizardStep::AngleChoice => 2,
            WizardStep::NetworkChoice => 3,
            WizardStep::ToneChoice => 4,
            WizardStep::VisualAndPricing => 5,
            WizardStep::Generating => 6,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            WizardStep::Idle => "idle",
            WizardStep::Landing => "landing",
            WizardStep::ProductChoice => "product",
            WizardStep::AngleChoice => "angle",
            WizardStep::NetworkChoice => "network",
            WizardStep::ToneChoice => "tone",
            WizardStep::VisualAndPricing => "visual",
            WizardStep::Generating => "result",
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::AngleChoice => WizardStep::ProductChoice,
            WizardStep::NetworkChoice => WizardStep::AngleChoice,
            WizardStep::ToneChoice => WizardStep::NetworkChoice,
            WizardStep::VisualAndPricing => WizardStep::ToneChoice,
            other => other,
        }
    }
}

/// What the result step currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Loading,
    Error(GenerationError),
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    pub price: String,
    pub affiliate_link: String,
}

pub struct Wizard {
    catalog: Catalog,
    orchestrator: Orchestrator,
    camera: Option<CameraManager>,
    events: EventWriter,
    step: WizardStep,
    selection: Selection,
    active_stream: Option<ActiveStream>,
    trends: Option<TrendReport>,
    view: Option<ResultView>,
    result: Option<GenerationResult>,
}

impl Wizard {
    pub fn new(
        catalog: Catalog,
        orchestrator: Orchestrator,
        camera: Option<CameraManager>,
        events: EventWriter,
    ) -> Self {
        let wizard = Self {
            catalog,
            orchestrator,
            camera,
            events,
            step: WizardStep::Idle,
            selection: Selection::new(),
            active_stream: None,
            trends: None,
            view: None,
            result: None,
        };
        wizard.log(
            "session_started",
            json!({
                "products": wizard.catalog.len(),
                "camera": wizard.camera.is_some(),
            }),
        );
        wizard
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    pub fn view(&self) -> Option<&ResultView> {
        self.view.as_ref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn trends(&self) -> Option<&TrendReport> {
        self.trends.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.active_stream.is_some()
    }

    pub fn connect(&mut self) -> Result<WizardStep, WizardError> {
        self.expect_step("connect", WizardStep::Idle)?;
        self.move_to(WizardStep::Landing);
        Ok(self.step)
    }

    pub fn start(&mut self) -> Result<WizardStep, WizardError> {
        self.expect_step("start", WizardStep::Landing)?;
        self.move_to(WizardStep::ProductChoice);
        Ok(self.step)
    }

    pub fn choose_product(&mut self, product_id: &str) -> Result<WizardStep, WizardError> {
        self.expect_step("choose_product", WizardStep::ProductChoice)?;
        let product = self
            .catalog
            .get(product_id.trim())
            .cloned()
            .ok_or_else(|| WizardError::UnknownOption {
                kind: "product",
                value: product_id.to_string(),
            })?;
        if self.selection.product().map(|current| current.id.as_str()) != Some(product.id.as_str()) {
            self.trends = None;
        }
        self.record("product", json!(product.id));
        self.selection.set_product(product);
        self.move_to(WizardStep::AngleChoice);
        Ok(self.step)
    }

    pub fn choose_angle(&mut self, angle: MessagingAngle) -> Result<WizardStep, WizardError> {
        self.expect_step("choose_angle", WizardStep::AngleChoice)?;
        self.selection.set_messaging_angle(angle);
        self.record("messaging_angle", json!(angle.id()));
        self.move_to(WizardStep::NetworkChoice);
        Ok(self.step)
    }

    pub fn choose_network(&mut self, network: Network) -> Result<WizardStep, WizardError> {
        self.expect_step("choose_network", WizardStep::NetworkChoice)?;
        self.selection.set_network(network);
        self.record("network", json!(network.id()));
        self.move_to(WizardStep::ToneChoice);
        Ok(self.step)
    }

    pub fn choose_tone(&mut self, tone: Tone) -> Result<WizardStep, WizardError> {
        self.expect_step("choose_tone", WizardStep::ToneChoice)?;
        self.selection.set_tone(tone);
        self.record("tone", json!(tone.id()));
        self.move_to(WizardStep::VisualAndPricing);
        Ok(self.step)
    }

    /// Tones for the chosen network, with its hinted tone flagged.
    pub fn tone_options(&self) -> Vec<ToneOption> {
        tone_options(self.selection.network())
    }

    pub fn choose_visual_mode(&mut self, mode: VisualMode) -> Result<WizardStep, WizardError> {
        self.expect_step("choose_visual", WizardStep::VisualAndPricing)?;
        if mode == VisualMode::GeneratedBackground {
            self.release_camera("visual_mode_changed");
        }
        self.selection.set_visual_mode(mode);
        self.record("visual_mode", json!(mode.id()));
        Ok(self.step)
    }

    pub fn pricing(&self) -> Option<Pricing> {
        let product = self.selection.product()?;
        Some(Pricing {
            price: product.formatted_price(),
            affiliate_link: self.orchestrator.prompts().affiliate_link(product),
        })
    }

    /// Opens the camera for a selfie; selects the photo mode on success.
    pub fn open_camera(&mut self) -> Result<(), WizardError> {
        self.expect_step("open_camera", WizardStep::VisualAndPricing)?;
        if self.active_stream.is_some() {
            return Err(WizardError::CameraBusy);
        }
        let acquired = match self.camera.as_mut() {
            Some(camera) => camera.acquire(),
            None => Err(CameraError::DeviceUnavailable(
                "no camera device configured".to_string(),
            )),
        };
        let stream = match acquired {
            Ok(stream) => stream,
            Err(err) => {
                self.log("camera_failed", json!({ "stage": "acquire", "error": err.to_string() }));
                return Err(err.into());
            }
        };
        self.log("camera_acquired", json!({ "stream": stream.id() }));
        self.active_stream = Some(stream);
        self.selection.set_visual_mode(VisualMode::UserPhoto);
        self.record("visual_mode", json!(VisualMode::UserPhoto.id()));
        Ok(())
    }

    /// Snapshots a frame into the selection. The stream is released either way.
    pub fn capture_photo(&mut self) -> Result<(u32, u32), WizardError> {
        let Some(stream) = self.active_stream.take() else {
            return Err(WizardError::CameraNotActive);
        };
        let captured = match self.camera.as_mut() {
            Some(camera) => {
                let captured = camera.capture_frame(&stream);
                camera.release(stream);
                captured
            }
            None => Err(CameraError::DeviceUnavailable(
                "no camera device configured".to_string(),
            )),
        };
        self.log("camera_released", json!({ "reason": "captured" }));
        match captured {
            Ok(photo) => {
                let dimensions = photo.dimensions();
                self.selection.set_captured_photo(photo);
                self.log(
                    "photo_captured",
                    json!({ "width": dimensions.0, "height": dimensions.1 }),
                );
                Ok(dimensions)
            }
            Err(err) => {
                self.log("camera_failed", json!({ "stage": "capture", "error": err.to_string() }));
                Err(err.into())
            }
        }
    }

    pub fn cancel_camera(&mut self) -> Result<(), WizardError> {
        if !self.release_camera("cancelled") {
            return Err(WizardError::CameraNotActive);
        }
        Ok(())
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Generating {
            return Err(WizardError::Locked);
        }
        if self.step == WizardStep::VisualAndPricing {
            self.release_camera("step_left");
        }
        let previous = self.step.previous();
        if previous != self.step {
            self.move_to(previous);
        }
        Ok(self.step)
    }

    /// Search-grounded trends for the chosen product. Failures leave the
    /// session untouched.
    pub fn research_trends(&mut self) -> Result<&TrendReport, WizardError> {
        if self.step < WizardStep::AngleChoice || self.step == WizardStep::Generating {
            return Err(self.wrong_step("research_trends"));
        }
        let Some(product) = self.selection.product() else {
            return Err(WizardError::Blocked("choose a product first".to_string()));
        };
        match self.orchestrator.research_trends(product) {
            Ok(report) => {
                self.log(
                    "trends_ready",
                    json!({
                        "product": product.id,
                        "chars": report.text.chars().count(),
                        "sources": report.sources.len(),
                    }),
                );
                Ok(&*self.trends.insert(report))
            }
            Err(err) => {
                self.log(
                    "trends_failed",
                    json!({ "product": product.id, "kind": err.kind(), "error": err.to_string() }),
                );
                Err(err.into())
            }
        }
    }

    /// Enters the terminal step and runs the pipeline. Pipeline failures
    /// are shown in the result view, not returned.
    pub fn generate(&mut self) -> Result<&ResultView, WizardError> {
        self.expect_step("generate", WizardStep::VisualAndPricing)?;
        let missing = self.selection.missing_fields();
        if !missing.is_empty() {
            return Err(WizardError::Blocked(format!("missing {}", missing.join(", "))));
        }
        self.release_camera("generation_started");
        self.move_to(WizardStep::Generating);
        self.view = Some(ResultView::Loading);
        self.result = None;
        self.run_pipeline();
        Ok(self.current_view())
    }

    /// Re-runs the whole pipeline; the previous result survives a failure.
    pub fn regenerate(&mut self) -> Result<&ResultView, WizardError> {
        self.expect_step("regenerate", WizardStep::Generating)?;
        self.run_pipeline();
        Ok(self.current_view())
    }

    pub fn reset(&mut self) {
        self.release_camera("reset");
        self.selection = Selection::new();
        self.trends = None;
        self.view = None;
        self.result = None;
        let from = self.step;
        self.step = WizardStep::Idle;
        self.log("session_reset", json!({ "from": from.id() }));
    }

    fn run_pipeline(&mut self) {
        match self
            .orchestrator
            .generate_with_trends(&self.selection, self.trends.as_ref())
        {
            Ok(result) => {
                self.result = Some(result);
                self.view = Some(ResultView::Ready);
            }
            Err(err) => {
                self.view = Some(ResultView::Error(err));
            }
        }
    }

    fn current_view(&self) -> &ResultView {
        self.view.as_ref().unwrap_or(&ResultView::Loading)
    }

    /// Returns whether a stream was open.
    fn release_camera(&mut self, reason: &str) -> bool {
        let Some(stream) = self.active_stream.take() else {
            return false;
        };
        if let Some(camera) = self.camera.as_mut() {
            camera.release(stream);
        }
        self.log("camera_released", json!({ "reason": reason }));
        true
    }

    fn expect_step(&self, action: &'static str, expected: WizardStep) -> Result<(), WizardError> {
        if self.step != expected {
            return Err(self.wrong_step(action));
        }
        Ok(())
    }

    fn wrong_step(&self, action: &'static str) -> WizardError {
        WizardError::WrongStep {
            action,
            step: self.step.id(),
        }
    }

    fn move_to(&mut self, next: WizardStep) {
        let from = self.step;
        self.step = next;
        self.log(
            "step_changed",
            json!({
                "from": from.id(),
                "to": next.id(),
                "index": next.index(),
            }),
        );
    }

    fn record(&self, field: &str, value: Value) {
        self.log("selection_updated", json!({ "field": field, "value": value }));
    }

    fn log(&self, event_type: &str, payload: Value) {
        if let Err(err) = self.events.emit_value(event_type, payload) {
            eprintln!("solage-rs: failed to write {event_type} event: {err:#}");
        }
    }
}

impl Drop for Wizard {
    fn drop(&mut self) {
        self.release_camera("session_closed");
    }
}
