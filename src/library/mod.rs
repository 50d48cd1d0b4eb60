//! Photo library: the set of uploaded images
//!
//! Uploading and file naming happen elsewhere; the index only needs to list
//! what is stored and read an image's bytes back.

use crate::index::Item;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions accepted as images, lowercase
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Library errors
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid photo identity: {0}")]
    InvalidId(String),

    #[error("Photo not found: {0}")]
    NotFound(String),
}

/// Source of stored photos.
///
/// The listing is assumed stable for the duration of one ingestion run.
#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    /// List every stored photo
    async fn list(&self) -> Result<Vec<Item>, LibraryError>;

    /// Read the raw bytes of one photo
    async fn read(&self, id: &str) -> Result<Vec<u8>, LibraryError>;

    /// Public location of a photo
    fn location(&self, id: &str) -> String;
}

/// Media type for an image identity, from its extension
pub fn media_type_for(id: &str) -> &'static str {
    let ext = Path::new(id)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Whether a file name carries an accepted image extension
pub fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Library over a flat uploads directory
#[derive(Debug, Clone)]
pub struct DiskLibrary {
    root: PathBuf,
    public_prefix: String,
}

impl DiskLibrary {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the uploads directory if missing
    pub async fn ensure_root(&self) -> Result<(), LibraryError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn resolve(&self, id: &str) -> Result<PathBuf, LibraryError> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(LibraryError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id))
    }
}

#[async_trait]
impl PhotoLibrary for DiskLibrary {
    async fn list(&self) -> Result<Vec<Item>, LibraryError> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut items = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_image(&name) {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let uploaded_at: DateTime<Utc> = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            items.push(Item {
                path: self.location(&name),
                id: name,
                size: metadata.len(),
                uploaded_at,
            });
        }

        items.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Listed {} photos in {}", items.len(), self.root.display());
        Ok(items)
    }

    async fn read(&self, id: &str) -> Result<Vec<u8>, LibraryError> {
        let path = self.resolve(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LibraryError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self, id: &str) -> String {
        format!("{}/{}", self.public_prefix, id)
    }
}
