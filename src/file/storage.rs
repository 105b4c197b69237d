//! Attachment byte storage.
//!
//! Attachments live as plain files in one flat directory. Each file is named
//! `{uuid}_{original name}` so names never collide and stay recognisable on
//! disk:
//! ```text
//! {base_path}/
//! ├── 0f9c1e52-8d1b-4c55-9a0e-3f1a7b2c4d11_report.pdf
//! └── 7a2e9b10-1c4d-4f83-b2e6-55d0c9e8a7f3_photo.png
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{MailroomError, Result};

/// Longest original-name suffix kept in a storage name, in characters.
const MAX_NAME_SUFFIX: usize = 100;

/// Flat directory of attachment files.
#[derive(Debug, Clone)]
pub struct AttachmentStorage {
    base_path: PathBuf,
}

impl AttachmentStorage {
    /// Open storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Root directory of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `content` under a fresh storage name and return that name.
    pub async fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let storage_name = Self::generate_storage_name(original_name);
        fs::write(self.path_for(&storage_name)?, content).await?;
        Ok(storage_name)
    }

    /// Read a stored file.
    ///
    /// Fails with [`MailroomError::NotFound`] if the file is missing.
    pub async fn load(&self, storage_name: &str) -> Result<Vec<u8>> {
        match fs::read(self.path_for(storage_name)?).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(MailroomError::NotFound("attachment file".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file. Returns false if it did not exist.
    pub async fn delete(&self, storage_name: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(storage_name)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a stored file exists.
    pub async fn exists(&self, storage_name: &str) -> bool {
        match self.path_for(storage_name) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Resolve a storage name to a path inside the base directory.
    ///
    /// Names that could escape the directory are rejected.
    fn path_for(&self, storage_name: &str) -> Result<PathBuf> {
        if storage_name.is_empty()
            || storage_name.contains(['/', '\\'])
            || storage_name == "."
            || storage_name == ".."
        {
            return Err(MailroomError::Validation(format!(
                "invalid storage name: {storage_name}"
            )));
        }
        Ok(self.base_path.join(storage_name))
    }

    /// Build a `{uuid}_{name}` storage name from an uploaded file name.
    pub fn generate_storage_name(original_name: &str) -> String {
        format!("{}_{}", Uuid::new_v4(), storage_suffix(original_name))
    }
}

/// Reduce an uploaded file name to its final path component.
///
/// Browsers on some platforms send full client paths. Returns "file" when
/// nothing usable remains.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn storage_suffix(original_name: &str) -> String {
    sanitize_file_name(original_name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .take(MAX_NAME_SUFFIX)
        .collect()
}
