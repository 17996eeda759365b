// SPDX-License-Identifier: MIT

//! Local file storage for uploaded step photos.
//!
//! Files live in a flat upload directory; the database stores only the
//! filename. Admin cleanup deletes the files of completed challenges and
//! clears the references (soft delete).

use crate::error::AppError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Accepted upload types, mapped to the stored file extension.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// File storage rooted at the configured upload directory.
#[derive(Clone)]
pub struct StorageService {
    upload_dir: PathBuf,
}

impl StorageService {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_upload_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Failed to create upload dir {}: {}",
                    self.upload_dir.display(),
                    e
                ))
            })
    }

    /// Store an uploaded image and return the generated filename.
    pub async fn save_image(
        &self,
        user_id: Uuid,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let filename = format!("step-{}-{}.{}", user_id, Uuid::new_v4(), extension);
        let path = self.upload_dir.join(&filename);

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write upload {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(%user_id, filename = %filename, size = bytes.len(), "Stored upload");

        Ok(filename)
    }

    /// Size in bytes of a stored file, or None if it is missing.
    pub async fn file_size(&self, filename: &str) -> Option<u64> {
        let path = self.safe_path(filename)?;
        tokio::fs::metadata(path).await.ok().map(|m| m.len())
    }

    /// Delete a stored file, returning the bytes freed.
    ///
    /// A missing file is not an error (it may have been cleaned already);
    /// it frees zero bytes.
    pub async fn delete_file(&self, filename: &str) -> u64 {
        let Some(path) = self.safe_path(filename) else {
            tracing::warn!(filename, "Refusing to delete path outside upload dir");
            return 0;
        };

        let size = match tokio::fs::metadata(&path).await {
            Ok(m) => m.len(),
            Err(_) => return 0,
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => size,
            Err(e) => {
                tracing::warn!(filename, error = %e, "Failed to delete upload");
                0
            }
        }
    }

    /// Join a stored filename onto the upload dir, rejecting anything that
    /// could traverse outside it.
    fn safe_path(&self, filename: &str) -> Option<PathBuf> {
        let name = Path::new(filename);
        if name.components().count() != 1 || filename.contains("..") {
            return None;
        }
        Some(self.upload_dir.join(name))
    }
}

/// Human-readable byte size ("1.5 MB") for admin responses.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
