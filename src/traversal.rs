//! Breadth-first reference traversal.
//!
//! Starting from the root document, every round loads the locations discovered
//! by the previous round:
//! - **Admission**: single writer, check-then-insert into `visited`, in frontier order
//! - **Loading**: semaphore-bounded tokio tasks, one per admitted location
//! - **Absorption**: results consumed in admission order, so `missing` and the next
//!   frontier are deterministic regardless of completion order
//!
//! Every location is inserted into `visited` before its load is attempted and is
//! never loaded again, which bounds the number of rounds by the number of
//! distinct locations even for cyclic reference graphs.

use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::document::Document;
use crate::error::{CheckerError, LoadError, LoadResult, Result};
use crate::loader::{DocumentLoader, LoadedDocument};
use crate::location::Location;
use crate::references::{MalformedReference, ReferenceEntry, extract_references};

/// Traversal configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalConfig {
    /// Maximum number of loads in flight within one round
    pub max_concurrent_fetches: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: num_cpus::get(),
        }
    }
}

/// Engine state as reported to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalPhase {
    /// Before the root is loaded
    Idle,
    /// Root loaded, its references form the first frontier
    Seeded,
    /// Processing a round
    Expanding,
    /// A round produced no new locations
    Done,
}

/// Result of attempting one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationOutcome {
    Found { references: usize },
    Missing { reason: String },
}

/// Progress update for traversal
#[derive(Debug, Clone)]
pub struct TraversalProgress {
    pub phase: TraversalPhase,
    /// 1-based round number, 0 before the first round
    pub round: usize,
    pub location: Option<Location>,
    pub outcome: Option<LocationOutcome>,
}

/// Progress callback type for traversal updates
pub type ProgressCallback = Arc<dyn Fn(TraversalProgress) + Send + Sync>;

/// A location that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingReference {
    pub location: Location,
    pub status: Option<u16>,
    pub reason: String,
}

/// Suspicious tags found in a document that still loaded (advisory mode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspiciousTags {
    pub location: Location,
    pub tags: Vec<String>,
}

/// Reachability report of one traversal. Grows monotonically while the
/// traversal runs and is handed out by value when it ends.
#[derive(Debug, Clone, Default)]
pub struct TraversalResult {
    visited: Vec<Location>,
    visited_set: HashSet<Location>,
    missing: Vec<MissingReference>,
    captured: Vec<ReferenceEntry>,
    captured_set: HashSet<ReferenceEntry>,
    malformed: Vec<MalformedReference>,
    suspicious: Vec<SuspiciousTags>,
    rounds: usize,
}

impl TraversalResult {
    /// Every attempted location, in admission order
    pub fn visited(&self) -> &[Location] {
        &self.visited
    }

    pub fn is_visited(&self, location: &Location) -> bool {
        self.visited_set.contains(location)
    }

    pub fn missing(&self) -> &[MissingReference] {
        &self.missing
    }

    pub fn missing_locations(&self) -> impl Iterator<Item = &Location> {
        self.missing.iter().map(|m| &m.location)
    }

    /// Reference elements from every loaded document, each kept once
    pub fn captured(&self) -> &[ReferenceEntry] {
        &self.captured
    }

    pub fn malformed(&self) -> &[MalformedReference] {
        &self.malformed
    }

    pub fn suspicious(&self) -> &[SuspiciousTags] {
        &self.suspicious
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn total_references(&self) -> usize {
        self.visited.len()
    }

    /// True when no attempted location failed
    pub fn is_success(&self) -> bool {
        self.missing.is_empty()
    }

    /// Insert into `visited` if absent; returns whether the location was admitted
    fn admit(&mut self, location: &Location) -> bool {
        if self.visited_set.insert(location.clone()) {
            self.visited.push(location.clone());
            true
        } else {
            false
        }
    }

    fn record_missing(&mut self, location: Location, error: &LoadError) {
        self.missing.push(MissingReference {
            location,
            status: error.status(),
            reason: error.to_string(),
        });
    }

    fn record_suspicious(&mut self, location: &Location, tags: Vec<String>) {
        if !tags.is_empty() {
            self.suspicious.push(SuspiciousTags {
                location: location.clone(),
                tags,
            });
        }
    }

    /// Capture a document's references and return the locations not yet visited
    fn absorb(&mut self, source: &Location, document: &Document) -> Vec<Location> {
        let mut next = Vec::new();

        for (index, entry) in extract_references(document).into_iter().enumerate() {
            match &entry.uri {
                Some(uri) if !self.visited_set.contains(uri) => next.push(uri.clone()),
                Some(_) => {}
                None => self.malformed.push(MalformedReference {
                    source: source.clone(),
                    ordinal: index + 1,
                }),
            }

            if !self.captured_set.contains(&entry) {
                self.captured_set.insert(entry.clone());
                self.captured.push(entry);
            }
        }

        next
    }
}

/// Breadth-first traversal engine
pub struct TraversalEngine {
    loader: Arc<DocumentLoader>,
    config: TraversalConfig,
    cancelled: Arc<AtomicBool>,
}

impl TraversalEngine {
    pub fn new(loader: Arc<DocumentLoader>, config: TraversalConfig) -> Self {
        Self {
            loader,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag; once set, the traversal stops after in-flight loads
    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub async fn run(&self) -> Result<TraversalResult> {
        self.run_with_progress(None).await
    }

    pub async fn run_with_progress(
        &self,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<TraversalResult> {
        let notify = |progress: TraversalProgress| {
            if let Some(ref callback) = progress_callback {
                callback(progress);
            }
        };
        let marker = |phase: TraversalPhase, round: usize| TraversalProgress {
            phase,
            round,
            location: None,
            outcome: None,
        };

        notify(marker(TraversalPhase::Idle, 0));

        let root_location = self.loader.root().root_location.clone();
        let root = self
            .loader
            .load_root()
            .await
            .map_err(|source| CheckerError::RootUnresolvable {
                location: root_location.to_string(),
                source,
            })?;

        let mut result = TraversalResult::default();
        result.record_suspicious(&root_location, root.suspicious_tags);
        let mut frontier = result.absorb(&root_location, &root.document);

        notify(marker(TraversalPhase::Seeded, 0));

        while !frontier.is_empty() {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(CheckerError::Cancelled {
                    rounds: result.rounds,
                });
            }

            let round = result.rounds + 1;
            notify(marker(TraversalPhase::Expanding, round));

            let admitted: Vec<Location> = frontier
                .into_iter()
                .filter(|location| result.admit(location))
                .collect();

            let outcomes = self.load_round(admitted).await?;
            if outcomes.iter().any(|(_, outcome)| outcome.is_none()) {
                return Err(CheckerError::Cancelled {
                    rounds: result.rounds,
                });
            }
            result.rounds = round;

            let mut next = Vec::new();
            for (location, outcome) in outcomes {
                let Some(outcome) = outcome else { continue };
                let reported = match outcome {
                    Ok(loaded) => {
                        result.record_suspicious(&location, loaded.suspicious_tags);
                        let discovered = result.absorb(&location, &loaded.document);
                        let references = discovered.len();
                        next.extend(discovered);
                        LocationOutcome::Found { references }
                    }
                    Err(error) => {
                        let reason = error.to_string();
                        result.record_missing(location.clone(), &error);
                        LocationOutcome::Missing { reason }
                    }
                };

                notify(TraversalProgress {
                    phase: TraversalPhase::Expanding,
                    round,
                    location: Some(location),
                    outcome: Some(reported),
                });
            }

            frontier = next;
        }

        notify(marker(TraversalPhase::Done, result.rounds));
        Ok(result)
    }

    /// Load admitted locations concurrently; results keep admission order.
    ///
    /// `None` marks a location skipped because cancellation was requested.
    async fn load_round(
        &self,
        admitted: Vec<Location>,
    ) -> Result<Vec<(Location, Option<LoadResult<LoadedDocument>>)>> {
        // Create a semaphore to limit concurrent loads
        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_fetches.max(1),
        ));

        let tasks: Vec<_> = admitted
            .into_iter()
            .map(|location| {
                let loader = Arc::clone(&self.loader);
                let semaphore = Arc::clone(&semaphore);
                let cancelled = Arc::clone(&self.cancelled);

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        CheckerError::Concurrency {
                            details: "Failed to acquire fetch semaphore".to_string(),
                        }
                    })?;

                    if cancelled.load(Ordering::SeqCst) {
                        return Ok((location, None));
                    }

                    let outcome = loader.load(&location).await;
                    Ok::<_, CheckerError>((location, Some(outcome)))
                })
            })
            .collect();

        let task_results = try_join_all(tasks)
            .await
            .map_err(|e| CheckerError::Concurrency {
                details: format!("Task join error: {}", e),
            })?;

        task_results.into_iter().collect()
    }
}
