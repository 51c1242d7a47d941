//! Exclusive camera stream handling.
//!
//! `ActiveStream` is a move-only token: `release` consumes it, so a stream
//! cannot be released twice and capturing needs a live token.

use std::io::ErrorKind;
use std::path::PathBuf;

use image::DynamicImage;
use solage_contracts::errors::CameraError;
use solage_contracts::selection::CapturedPhoto;

/// A video-capable capture device.
pub trait CameraDevice: Send {
    fn open(&mut self) -> Result<(), CameraError>;
    /// Snapshot the current frame; the stream keeps running.
    fn read_frame(&mut self) -> Result<DynamicImage, CameraError>;
    fn stop(&mut self);
}

#[must_use = "an acquired stream must be released"]
#[derive(Debug, PartialEq, Eq)]
pub struct ActiveStream {
    id: u64,
}

impl ActiveStream {
    pub fn id(&self) -> u64 {
        self.id
    }
}

pub struct CameraManager {
    device: Box<dyn CameraDevice>,
    open_stream: Option<u64>,
    next_id: u64,
}

impl CameraManager {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device,
            open_stream: None,
            next_id: 1,
        }
    }

    pub fn acquire(&mut self) -> Result<ActiveStream, CameraError> {
        if self.open_stream.is_some() {
            return Err(CameraError::DeviceUnavailable(
                "the device is already streaming".to_string(),
            ));
        }
        self.device.open()?;
        let id = self.next_id;
        self.next_id += 1;
        self.open_stream = Some(id);
        Ok(ActiveStream { id })
    }

    pub fn capture_frame(&mut self, stream: &ActiveStream) -> Result<CapturedPhoto, CameraError> {
        if self.open_stream != Some(stream.id) {
            return Err(CameraError::DeviceUnavailable(format!(
                "stream {} is not open",
                stream.id
            )));
        }
        let frame = self.device.read_frame()?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CameraError::DeviceUnavailable(
                "the stream produced no frame".to_string(),
            ));
        }
        Ok(CapturedPhoto::new(frame))
    }

    pub fn release(&mut self, stream: ActiveStream) {
        if self.open_stream == Some(stream.id) {
            self.device.stop();
            self.open_stream = None;
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.open_stream.is_some()
    }
}

/// Reads frames from an image file; used by the CLI in place of a webcam.
pub struct FileCamera {
    path: PathBuf,
    open: bool,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open: false,
        }
    }
}

impl CameraDevice for FileCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => {
                self.open = true;
                Ok(())
            }
            Ok(_) => Err(CameraError::DeviceUnavailable(format!(
                "{} is not a file",
                self.path.display()
            ))),
            Err(err) => Err(map_io_error(&self.path, err)),
        }
    }

    fn read_frame(&mut self) -> Result<DynamicImage, CameraError> {
        if !self.open {
            return Err(CameraError::DeviceUnavailable("stream stopped".to_string()));
        }
        let bytes = std::fs::read(&self.path).map_err(|err| map_io_error(&self.path, err))?;
        image::load_from_memory(&bytes).map_err(|err| {
            CameraError::DeviceUnavailable(format!(
                "{} is not a readable image: {err}",
                self.path.display()
            ))
        })
    }

    fn stop(&mut self) {
        self.open = false;
    }
}

fn map_io_error(path: &std::path::Path, err: std::io::Error) -> CameraError {
    match err.kind() {
        ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(format!("{}: {err}", path.display()))
        }
        _ => CameraError::DeviceUnavailable(format!("{}: {err}", path.display())),
    }
}
