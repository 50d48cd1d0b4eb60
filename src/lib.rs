//! CloudSnap: photo library with caption-embedding semantic search
//!
//! Stored photos are captioned by a vision model, the captions are embedded
//! into vectors, and natural-language queries are answered by cosine
//! similarity over those vectors, with keyword and random-sample fallbacks.

pub mod api;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod library;
pub mod metrics;
pub mod search;
pub mod telemetry;
pub mod upstream;

pub use config::Config;
pub use error::{Error, Result};
