//! Search engine over the semantic index

use super::{SearchConfig, SearchError, SearchMode, SearchResult};
use crate::index::{rank_top_k, IndexEntry, SemanticIndex};
use crate::library::PhotoLibrary;
use crate::metrics::METRICS;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Caption attached to randomly sampled results
pub const BASIC_CAPTION: &str = "Enable smart search for better results";

/// Strategy that produced a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    Similarity,
    Keyword,
    RandomSample,
}

impl SearchStrategy {
    /// Mode reported to the caller. Only similarity ranking counts as smart.
    pub fn mode(&self) -> SearchMode {
        match self {
            Self::Similarity => SearchMode::Smart,
            Self::Keyword | Self::RandomSample => SearchMode::Basic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Keyword => "keyword",
            Self::RandomSample => "random_sample",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// Mode actually used, which may be lower than the one requested
    pub mode: SearchMode,
    pub strategy: SearchStrategy,
}

impl SearchOutcome {
    fn new(strategy: SearchStrategy, results: Vec<SearchResult>) -> Self {
        Self {
            results,
            mode: strategy.mode(),
            strategy,
        }
    }
}

/// Search engine.
///
/// Reads whatever the store holds at query time; entries added by a
/// concurrent ingestion run may or may not be seen.
pub struct SearchEngine {
    index: SemanticIndex,
    library: Arc<dyn PhotoLibrary>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(index: SemanticIndex, library: Arc<dyn PhotoLibrary>, config: SearchConfig) -> Self {
        Self {
            index,
            library,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a query in the requested mode.
    ///
    /// Upstream failures degrade to keyword matching and never surface as
    /// errors. An empty query, a dimension mismatch inside the index, or a
    /// failure to list photos does.
    pub async fn search(&self, query: &str, requested: SearchMode) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let outcome = if requested == SearchMode::Smart && self.index.is_ready() {
            match self.index.embed(query).await {
                Ok(query_vector) => self.rank_by_similarity(&query_vector)?,
                Err(e) => {
                    warn!("Query embedding failed, falling back to keyword match: {}", e);
                    METRICS.record_search_fallback("embedding_failed");
                    self.match_keywords(query)
                }
            }
        } else {
            if requested == SearchMode::Smart {
                debug!("Smart search requested but index is empty");
                METRICS.record_search_fallback("empty_index");
            }
            self.sample_random().await?
        };

        METRICS.record_search(requested.as_str(), outcome.mode.as_str());
        info!(
            "Search '{}' requested={} used={} results={}",
            query,
            requested.as_str(),
            outcome.strategy.as_str(),
            outcome.results.len()
        );

        Ok(outcome)
    }

    fn rank_by_similarity(&self, query_vector: &[f32]) -> Result<SearchOutcome, SearchError> {
        let entries = self.index.store().all_entries();

        let candidates = entries
            .iter()
            .enumerate()
            .map(|(position, (id, entry))| ((id.as_str(), position), entry.embedding.as_slice()));

        let ranked = rank_top_k(query_vector, candidates, self.config.max_results).map_err(|e| {
            error!("Similarity ranking failed: {}", e);
            SearchError::Precondition(e)
        })?;

        let results = ranked
            .into_iter()
            .map(|((_, position), score)| {
                let entry = &entries[position].1;
                SearchResult {
                    filename: entry.id.clone(),
                    path: entry.path.clone(),
                    caption: format!(
                        "{}% match - {}",
                        (score * 100.0).round() as i32,
                        snippet(&entry.caption, self.config.smart_snippet_chars)
                    ),
                    confidence: Some(score),
                }
            })
            .collect();

        Ok(SearchOutcome::new(SearchStrategy::Similarity, results))
    }

    fn match_keywords(&self, query: &str) -> SearchOutcome {
        let needle = query.to_lowercase();

        let mut matches: Vec<Arc<IndexEntry>> = self
            .index
            .store()
            .all_entries()
            .into_iter()
            .map(|(_, entry)| entry)
            .filter(|entry| entry.caption_contains(&needle))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));

        let results = matches
            .into_iter()
            .take(self.config.max_results)
            .map(|entry| SearchResult {
                filename: entry.id.clone(),
                path: entry.path.clone(),
                caption: snippet(&entry.caption, self.config.keyword_snippet_chars),
                confidence: None,
            })
            .collect();

        SearchOutcome::new(SearchStrategy::Keyword, results)
    }

    async fn sample_random(&self) -> Result<SearchOutcome, SearchError> {
        let items = self.library.list().await?;

        let results = {
            let mut rng = rand::thread_rng();
            items
                .choose_multiple(&mut rng, self.config.max_results)
                .map(|item| SearchResult {
                    filename: item.id.clone(),
                    path: item.path.clone(),
                    caption: BASIC_CAPTION.to_string(),
                    confidence: None,
                })
                .collect()
        };

        Ok(SearchOutcome::new(SearchStrategy::RandomSample, results))
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head.trim_end())
    } else {
        head
    }
}
