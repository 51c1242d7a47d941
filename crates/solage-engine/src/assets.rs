use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use reqwest::blocking::Client as HttpClient;
use reqwest::StatusCode;

use crate::config::StudioConfig;
use crate::util::truncate_text;

/// Resolves catalog overlay references (URLs or relative paths) to images.
///
/// `Ok(None)` means the asset does not exist; `Err` means it could not be
/// fetched or decoded.
pub trait AssetLoader: Send + Sync {
    fn load(&self, reference: &str) -> Result<Option<DynamicImage>>;
}

pub struct CatalogAssets {
    root: Option<PathBuf>,
    timeout_s: f64,
    http: HttpClient,
}

impl CatalogAssets {
    pub fn new(root: Option<PathBuf>, timeout_s: f64) -> Self {
        Self {
            root,
            timeout_s,
            http: HttpClient::new(),
        }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(config.assets_dir.clone(), config.request_timeout_s)
    }

    fn resolve_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match self.root.as_ref() {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn download(&self, url: &str) -> Result<Option<DynamicImage>> {
        let response = self
            .http
            .get(url)
            .timeout(Duration::from_secs_f64(self.timeout_s))
            .send()
            .with_context(|| format!("failed downloading overlay ({url})"))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().unwrap_or_default();
            bail!(
                "overlay download failed ({code}): {}",
                truncate_text(&body, 512)
            );
        }
        let bytes = response
            .bytes()
            .context("failed reading overlay bytes")?;
        let image = image::load_from_memory(&bytes)
            .with_context(|| format!("overlay is not a decodable image ({url})"))?;
        Ok(Some(image))
    }
}

impl AssetLoader for CatalogAssets {
    fn load(&self, reference: &str) -> Result<Option<DynamicImage>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return self.download(reference);
        }
        let path = self.resolve_path(reference);
        if !path.exists() {
            return Ok(None);
        }
        let image = image::open(&path)
            .with_context(|| format!("failed reading overlay {}", path.display()))?;
        Ok(Some(image))
    }
}
