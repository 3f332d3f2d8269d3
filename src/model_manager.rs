//! Download and cache management for the ONNX backbone.
//!
//! The backbone lives in a per-user cache directory. Integrity is tracked
//! with a sha256 sidecar written at download time and re-checked before every
//! reuse; a failed check triggers a re-download.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::BuiltinModel;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Model verification failed: {0}")]
    VerificationFailed(String),
}

#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a ModelManager rooted at the default cache directory.
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_models_dir())
    }

    /// Resolution order: `CATEGORIZE_CACHE`, platform cache dir, home
    /// directory, system temp.
    pub fn default_models_dir() -> PathBuf {
        if let Ok(path) = env::var("CATEGORIZE_CACHE") {
            return PathBuf::from(path).join("models");
        }
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("categorize").join("models");
        }
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("categorize").join("models");
        }
        env::temp_dir().join("categorize").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn model_path(&self, model: BuiltinModel) -> PathBuf {
        self.models_dir.join(model.info().name).join("model.onnx")
    }

    fn checksum_path(&self, model: BuiltinModel) -> PathBuf {
        self.model_path(model).with_extension("onnx.sha256")
    }

    pub fn is_downloaded(&self, model: BuiltinModel) -> bool {
        self.model_path(model).exists()
    }

    fn file_sha256(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Compares the cached model against the checksum recorded when it was
    /// downloaded. Returns false when either file is missing or the hashes
    /// disagree.
    pub fn verify(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let model_path = self.model_path(model);
        let checksum_path = self.checksum_path(model);
        if !model_path.exists() || !checksum_path.exists() {
            return Ok(false);
        }
        let expected = fs::read_to_string(&checksum_path)?;
        let actual = Self::file_sha256(&model_path)?;
        Ok(expected.trim() == actual)
    }

    pub async fn download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.info();
        let _lock = self.download_lock.lock().await;

        let model_path = self.model_path(model);
        if let Some(parent) = model_path.parent() {
            fs::create_dir_all(parent)?;
        }

        log::info!(
            "Downloading {} (~{} MB) from {}",
            info.name,
            model.characteristics().model_size_mb,
            info.url
        );
        let response = reqwest::get(info.url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        fs::write(&model_path, &bytes)?;
        fs::write(self.checksum_path(model), &hash)?;

        if !self.verify(model)? {
            return Err(ModelError::VerificationFailed(format!(
                "{} did not verify after writing",
                model_path.display()
            )));
        }
        log::info!("{} downloaded and verified", info.name);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        for path in [self.model_path(model), self.checksum_path(model)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Downloads the backbone if it is missing, re-downloads if verification
    /// fails, and returns the path to the cached file.
    pub async fn ensure_downloaded(&self, model: BuiltinModel) -> Result<PathBuf, ModelError> {
        if !self.is_downloaded(model) {
            log::info!("Backbone not found in cache, downloading...");
            self.download(model).await?;
        } else if !self.verify(model)? {
            log::warn!("Cached backbone failed verification, re-downloading...");
            self.remove_download(model)?;
            self.download(model).await?;
        } else {
            log::info!("Backbone verified from cache");
        }
        Ok(self.model_path(model))
    }
}
