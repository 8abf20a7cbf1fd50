//! Local directory delivery target

use std::path::{Component, Path, PathBuf};

use fuelsheet_core::{Delivery, DeliveryError};

/// Writes workbooks to `<dir>/<key>`, returning the file path as locator
#[derive(Clone, Debug)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for `key`; keys must stay inside the directory
    pub fn path_for(&self, key: &str) -> Result<PathBuf, DeliveryError> {
        let relative = Path::new(key);
        let inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if key.trim().is_empty() || !inside || relative.file_name().is_none() {
            return Err(DeliveryError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(relative))
    }
}

impl Delivery for DirectoryDelivery {
    fn deliver(&self, bytes: &[u8], key: &str) -> Result<String, DeliveryError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "workbook delivered");
        Ok(path.display().to_string())
    }
}
