//! In-memory fakes for the photo library and the upstream services

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use cloudsnap::index::{Embedding, IndexEntry, Item, SemanticIndex, VectorStore};
use cloudsnap::library::{LibraryError, PhotoLibrary};
use cloudsnap::upstream::{Captioner, Embedder, UpstreamError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Words the fake embedder maps onto vector axes
pub const VOCABULARY: &[&str] = &["dog", "cat", "beach", "park", "sofa"];

/// Image bytes starting with this marker make the fake captioner fail
pub const UNREADABLE: &str = "unreadable:";

/// Library held in memory. Each photo's bytes are its caption text, so the
/// fake captioner can return them verbatim.
pub struct MemoryLibrary {
    photos: Vec<(String, Vec<u8>)>,
    fail_list: bool,
}

impl MemoryLibrary {
    pub fn new(photos: &[(&str, &str)]) -> Self {
        Self {
            photos: photos
                .iter()
                .map(|(id, caption)| (id.to_string(), caption.as_bytes().to_vec()))
                .collect(),
            fail_list: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            photos: Vec::new(),
            fail_list: true,
        }
    }
}

#[async_trait]
impl PhotoLibrary for MemoryLibrary {
    async fn list(&self) -> Result<Vec<Item>, LibraryError> {
        if self.fail_list {
            return Err(LibraryError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "uploads directory unreadable",
            )));
        }

        Ok(self
            .photos
            .iter()
            .map(|(id, bytes)| Item {
                id: id.clone(),
                path: self.location(id),
                size: bytes.len() as u64,
                uploaded_at: Utc::now(),
            })
            .collect())
    }

    async fn read(&self, id: &str) -> Result<Vec<u8>, LibraryError> {
        self.photos
            .iter()
            .find(|(photo, _)| photo == id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    fn location(&self, id: &str) -> String {
        format!("/uploads/{}", id)
    }
}

/// Captioner returning the image bytes as text
#[derive(Default)]
pub struct EchoCaptioner {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Captioner for EchoCaptioner {
    async fn caption(&self, image: &[u8], _media_type: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = String::from_utf8_lossy(image).to_string();
        if text.starts_with(UNREADABLE) {
            return Err(UpstreamError::Status {
                status: 500,
                body: "vision model unavailable".to_string(),
            });
        }
        Ok(text)
    }
}

/// Embedder counting vocabulary words, plus a constant axis so no vector is zero
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl KeywordEmbedder {
    pub fn failing() -> Self {
        let embedder = Self::default();
        embedder.fail.store(true, Ordering::SeqCst);
        embedder
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn keyword_vector(text: &str) -> Embedding {
    let lower = text.to_lowercase();
    let mut vector: Embedding = VOCABULARY
        .iter()
        .map(|word| lower.matches(word).count() as f32)
        .collect();
    vector.push(0.1);
    vector
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(UpstreamError::RequestFailed("connection refused".to_string()));
        }
        Ok(keyword_vector(text))
    }
}

/// Index over a store pre-filled with the given captions
pub fn seeded_index(embedder: Arc<KeywordEmbedder>, captions: &[(&str, &str)]) -> SemanticIndex {
    let store = VectorStore::new();
    for (id, caption) in captions {
        store.put(
            *id,
            IndexEntry::new(*id, format!("/uploads/{}", id), *caption, keyword_vector(caption)),
        );
    }
    SemanticIndex::with_store(store, embedder)
}
