use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::assets::AssetLoader;
use crate::camera::CameraDevice;
use crate::service::{
    GenerativeService, ImageRequest, ImageResponse, InlineImage, TextRequest, TextResponse,
};
use solage_contracts::errors::CameraError;

pub(crate) fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
}

pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    solid_image(width, height, rgba)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub(crate) fn png_payload(width: u32, height: u32, rgba: [u8; 4]) -> InlineImage {
    InlineImage {
        mime_type: Some("image/png".to_string()),
        data: png_bytes(width, height, rgba),
    }
}

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Fail(String),
}

struct StubState {
    text: Reply<String>,
    images: Reply<Vec<InlineImage>>,
    text_requests: Vec<TextRequest>,
    image_requests: Vec<ImageRequest>,
}

/// Scripted service registered under the `gemini` provider name.
/// Clones share state so a test can keep a handle after registering.
#[derive(Clone)]
pub(crate) struct StubService {
    state: Arc<Mutex<StubState>>,
}

impl StubService {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                text: Reply::Ok(String::new()),
                images: Reply::Ok(Vec::new()),
                text_requests: Vec::new(),
                image_requests: Vec::new(),
            })),
        }
    }

    pub(crate) fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub(crate) fn with_text_failure(self, message: &str) -> Self {
        self.fail_text(message);
        self
    }

    /// Answers every later text request with `text`.
    pub(crate) fn set_text(&self, text: &str) {
        self.state.lock().unwrap().text = Reply::Ok(text.to_string());
    }

    pub(crate) fn fail_text(&self, message: &str) {
        self.state.lock().unwrap().text = Reply::Fail(message.to_string());
    }

    pub(crate) fn with_images(self, payloads: Vec<InlineImage>) -> Self {
        self.state.lock().unwrap().images = Reply::Ok(payloads);
        self
    }

    pub(crate) fn with_image_failure(self, message: &str) -> Self {
        self.state.lock().unwrap().images = Reply::Fail(message.to_string());
        self
    }

    pub(crate) fn text_requests(&self) -> Vec<TextRequest> {
        self.state.lock().unwrap().text_requests.clone()
    }

    pub(crate) fn image_requests(&self) -> Vec<ImageRequest> {
        self.state.lock().unwrap().image_requests.clone()
    }
}

impl GenerativeService for StubService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("stub lock poisoned"))?;
        state.text_requests.push(request.clone());
        match &state.text {
            Reply::Ok(text) => Ok(TextResponse {
                text: text.clone(),
                sources: Vec::new(),
            }),
            Reply::Fail(message) => bail!("{message}"),
        }
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("stub lock poisoned"))?;
        state.image_requests.push(request.clone());
        match &state.images {
            Reply::Ok(payloads) => Ok(ImageResponse {
                payloads: payloads.clone(),
            }),
            Reply::Fail(message) => bail!("{message}"),
        }
    }
}

/// In-memory asset store keyed by catalog overlay reference.
#[derive(Default)]
pub(crate) struct MemoryAssets {
    images: HashMap<String, DynamicImage>,
    failing: bool,
}

impl MemoryAssets {
    pub(crate) fn with(mut self, reference: &str, image: DynamicImage) -> Self {
        self.images.insert(reference.to_string(), image);
        self
    }

    pub(crate) fn failing() -> Self {
        Self {
            images: HashMap::new(),
            failing: true,
        }
    }
}

impl AssetLoader for MemoryAssets {
    fn load(&self, reference: &str) -> Result<Option<DynamicImage>> {
        if self.failing {
            bail!("asset store offline");
        }
        Ok(self.images.get(reference).cloned())
    }
}

#[derive(Debug, Default)]
pub(crate) struct CameraCounters {
    pub(crate) opened: AtomicUsize,
    pub(crate) stopped: AtomicUsize,
    pub(crate) frames: AtomicUsize,
}

impl CameraCounters {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    /// Streams currently held open on the device.
    pub(crate) fn live(&self) -> usize {
        self.opened() - self.stopped()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CameraScript {
    Frames,
    DenyOpen,
    EmptyFrame,
    FailFrame,
}

/// Fake device counting open/stop calls.
pub(crate) struct FakeCamera {
    counters: Arc<CameraCounters>,
    script: CameraScript,
}

impl FakeCamera {
    pub(crate) fn new(script: CameraScript) -> (Self, Arc<CameraCounters>) {
        let counters = Arc::new(CameraCounters::default());
        (
            Self {
                counters: counters.clone(),
                script,
            },
            counters,
        )
    }
}

impl CameraDevice for FakeCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        if matches!(self.script, CameraScript::DenyOpen) {
            return Err(CameraError::PermissionDenied("user refused".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<DynamicImage, CameraError> {
        self.counters.frames.fetch_add(1, Ordering::SeqCst);
        match self.script {
            CameraScript::EmptyFrame => Ok(DynamicImage::ImageRgba8(RgbaImage::new(0, 0))),
            CameraScript::FailFrame => Err(CameraError::DeviceUnavailable(
                "device unplugged".to_string(),
            )),
            _ => Ok(solid_image(64, 48, [200, 180, 160, 255])),
        }
    }

    fn stop(&mut self) {
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
    }
}
