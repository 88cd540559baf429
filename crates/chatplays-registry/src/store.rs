//! Descriptor persistence.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::application::registry::ModuleRegistry;
use crate::domain::descriptor::ModuleDescriptor;

/// Errors raised while loading or saving descriptors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("descriptor store i/o failed: {0}")]
    Io(#[from] io::Error),

    /// The backing file did not hold a descriptor list.
    #[error("descriptor store is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads and saves the full descriptor set.
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Loads every persisted descriptor.
    async fn load(&self) -> Result<Vec<ModuleDescriptor>, StoreError>;

    /// Replaces the persisted set with `descriptors`.
    async fn save(&self, descriptors: &[ModuleDescriptor]) -> Result<(), StoreError>;
}

/// Descriptors kept as a pretty-printed JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. Nothing is read until [`load`].
    ///
    /// [`load`]: DescriptorStore::load
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DescriptorStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<ModuleDescriptor>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "descriptor file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(error) => return Err(error.into()),
        };
        let descriptors: Vec<ModuleDescriptor> = serde_json::from_str(&raw)?;
        info!(
            path = %self.path.display(),
            count = descriptors.len(),
            "loaded module descriptors"
        );
        Ok(descriptors)
    }

    async fn save(&self, descriptors: &[ModuleDescriptor]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(descriptors)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        info!(
            path = %self.path.display(),
            count = descriptors.len(),
            "saved module descriptors"
        );
        Ok(())
    }
}

/// Registers every persisted descriptor with `registry`.
///
/// # Errors
///
/// Returns the store's error; the registry is left untouched.
pub async fn load_into(
    registry: &ModuleRegistry,
    store: &dyn DescriptorStore,
) -> Result<usize, StoreError> {
    let descriptors = store.load().await?;
    for descriptor in &descriptors {
        registry.register(descriptor);
    }
    Ok(descriptors.len())
}

/// Saves the registry's descriptors if anything changed since the last
/// write. Returns whether a write happened.
///
/// # Errors
///
/// Returns the store's error. The data-changed flag is raised again so the
/// next call retries.
pub async fn write_if_changed(
    registry: &ModuleRegistry,
    store: &dyn DescriptorStore,
) -> Result<bool, StoreError> {
    if !registry.take_data_changed() {
        return Ok(false);
    }
    if let Err(error) = store.save(&registry.descriptors()).await {
        warn!(%error, "failed to save module descriptors");
        registry.mark_data_changed();
        return Err(error);
    }
    Ok(true)
}
