pub mod assets;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod service;
pub mod trends;
pub mod wizard;

mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use camera::{ActiveStream, CameraDevice, CameraManager, FileCamera};
pub use compositor::{Artifact, Compositor, Layer};
pub use config::StudioConfig;
pub use orchestrator::{GenerationResult, Orchestrator, PipelineStage};
pub use wizard::{Pricing, ResultView, Wizard, WizardStep};
