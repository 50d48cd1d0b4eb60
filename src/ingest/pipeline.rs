//! Caption → embed → store, one photo at a time, as a progress stream

use super::events::{ProgressEvent, ProgressTick, RunFailure, RunSummary};
use super::IngestConfig;
use crate::index::{IndexEntry, SemanticIndex};
use crate::library::{media_type_for, PhotoLibrary};
use crate::metrics::METRICS;
use crate::upstream::Captioner;
use async_stream::stream;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What happened to one photo during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already in the store, nothing recomputed
    AlreadyIndexed,
    /// Captioned, embedded and stored
    Indexed,
    ReadFailed,
    CaptionFailed,
    EmbeddingFailed,
}

impl ItemOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyIndexed => "already_indexed",
            Self::Indexed => "indexed",
            Self::ReadFailed => "read_failed",
            Self::CaptionFailed => "caption_failed",
            Self::EmbeddingFailed => "embedding_failed",
        }
    }

    /// Whether handling this item made at least one upstream call
    fn called_upstream(&self) -> bool {
        matches!(self, Self::Indexed | Self::CaptionFailed | Self::EmbeddingFailed)
    }
}

/// Releases the single-run flag when the run's stream finishes or is dropped
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Ingestion pipeline.
///
/// Items are handled strictly one after another. At most one run is active
/// per pipeline; starting another while one is in flight yields a single
/// `Failed` event. Per-item failures are logged and counted but never end
/// the run, and every successful item is written on its own, so dropping
/// the stream part-way leaves a valid store that the next run resumes from.
#[derive(Clone)]
pub struct IngestionPipeline {
    index: SemanticIndex,
    captioner: Arc<dyn Captioner>,
    library: Arc<dyn PhotoLibrary>,
    config: IngestConfig,
    active: Arc<AtomicBool>,
}

impl IngestionPipeline {
    pub fn new(
        index: SemanticIndex,
        captioner: Arc<dyn Captioner>,
        library: Arc<dyn PhotoLibrary>,
        config: IngestConfig,
    ) -> Self {
        Self {
            index,
            captioner,
            library,
            config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn try_acquire(&self) -> Option<RunGuard> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard(Arc::clone(&self.active)))
    }

    fn already_running() -> BoxStream<'static, ProgressEvent> {
        warn!("Rejected ingestion run: another run is in progress");
        METRICS.record_ingest_run("rejected");
        stream::iter(vec![ProgressEvent::Failed(RunFailure::new(
            "an ingestion run is already in progress",
        ))])
        .boxed()
    }

    /// Index every photo currently in the library
    pub fn run(&self) -> BoxStream<'static, ProgressEvent> {
        let Some(guard) = self.try_acquire() else {
            return Self::already_running();
        };
        let this = self.clone();

        Box::pin(stream! {
            let _guard = guard;

            let ids = match this.library.list().await {
                Ok(items) => items.into_iter().map(|item| item.id).collect::<Vec<_>>(),
                Err(e) => {
                    error!("Cannot enumerate photos for ingestion: {}", e);
                    METRICS.record_ingest_run("failed");
                    yield ProgressEvent::Failed(RunFailure::new(e.to_string()));
                    return;
                }
            };

            let mut events = this.process(ids);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }

    /// Index the given photo identities, in order
    pub fn run_items(&self, ids: Vec<String>) -> BoxStream<'static, ProgressEvent> {
        let Some(guard) = self.try_acquire() else {
            return Self::already_running();
        };
        let this = self.clone();

        Box::pin(stream! {
            let _guard = guard;
            let mut events = this.process(ids);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }

    fn process(self, ids: Vec<String>) -> BoxStream<'static, ProgressEvent> {
        Box::pin(stream! {
            let run_id = Uuid::new_v4();
            let total = ids.len();
            let throttle = self.config.throttle();
            info!("Ingestion run {} started: {} photos", run_id, total);

            let mut processed = 0;
            let mut indexed = 0;
            let mut skipped = 0;
            let mut failed = 0;

            for (position, id) in ids.iter().enumerate() {
                let outcome = self.ingest_one(id).await;
                METRICS.record_ingest_item(outcome.as_str());

                match outcome {
                    ItemOutcome::Indexed => indexed += 1,
                    ItemOutcome::AlreadyIndexed => skipped += 1,
                    _ => failed += 1,
                }
                processed += 1;

                yield ProgressEvent::Progress(ProgressTick::new(processed, total, id.clone()));

                let more = position + 1 < total;
                if more && outcome.called_upstream() && !throttle.is_zero() {
                    tokio::time::sleep(throttle).await;
                }
            }

            METRICS.set_index_entries(self.index.store().size());
            METRICS.record_ingest_run("completed");
            info!(
                "Ingestion run {} complete: {} indexed, {} already indexed, {} failed",
                run_id, indexed, skipped, failed
            );

            yield ProgressEvent::Completed(RunSummary {
                complete: true,
                processed,
                total,
                indexed,
                skipped,
                failed,
            });
        })
    }

    async fn ingest_one(&self, id: &str) -> ItemOutcome {
        let store = self.index.store();
        if store.has(id) {
            debug!("Skipping already indexed photo: {}", id);
            return ItemOutcome::AlreadyIndexed;
        }

        let bytes = match self.library.read(id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", id, e);
                return ItemOutcome::ReadFailed;
            }
        };

        debug!("Captioning {}", id);
        let caption = match self.captioner.caption(&bytes, media_type_for(id)).await {
            Ok(caption) => caption,
            Err(e) => {
                warn!("Failed to caption {}: {}", id, e);
                return ItemOutcome::CaptionFailed;
            }
        };

        debug!("Embedding caption for {}", id);
        let embedding = match self.index.embed(&caption).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Failed to embed caption for {}: {}", id, e);
                return ItemOutcome::EmbeddingFailed;
            }
        };

        store.put(id, IndexEntry::new(id, self.library.location(id), caption, embedding));
        info!("Indexed {}", id);
        ItemOutcome::Indexed
    }
}
