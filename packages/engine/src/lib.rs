#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region analysis orchestration.
//!
//! [`AnalysisOrchestrator`] drives the per-region pipeline (boundary
//! fetch, point fetch, aggregation) against injected collaborator
//! traits, commits each region to the session store as soon as it
//! completes, and tracks which region is active for display. Regions in
//! one batch run **sequentially**: the upstream services are
//! rate-limited and a burst of concurrent requests risks throttling, so
//! this is a deliberate throughput/robustness trade-off.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use store_map_ai::{PredictionError, PredictionService};
use store_map_analysis::RegionAnalysisStore;
use store_map_grid::GridError;
use store_map_models::{GeoPoint, Hotspot, RegionAnalysis};
use store_map_sources::{BoundarySource, PointSource, SourceError};
use thiserror::Error;

/// Which stage of a region's pipeline was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelinePhase {
    /// Resolving the region name to a bounding box.
    FetchingBoundary,
    /// Querying store locations inside the bounding box.
    FetchingPoints,
    /// Running the density aggregation.
    Aggregating,
}

/// The underlying failure inside a pipeline phase.
#[derive(Debug, Error)]
pub enum PipelineFailure {
    /// An external source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The aggregation rejected malformed point data.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors from orchestration operations.
///
/// Every variant carries the region name (and phase, where applicable)
/// so the caller can present a useful message; the engine itself never
/// formats user-facing text.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A region's analysis pipeline failed, aborting the whole batch.
    #[error("{phase} failed for region {region_name}: {source}")]
    Pipeline {
        /// The region whose pipeline failed.
        region_name: String,
        /// The phase that was running.
        phase: PipelinePhase,
        /// The underlying failure.
        #[source]
        source: PipelineFailure,
    },

    /// The region has no cached analysis.
    #[error("region has not been analyzed: {region_name}")]
    RegionNotFound {
        /// The requested region name.
        region_name: String,
    },

    /// A hotspot prediction failed. The cached analysis is untouched.
    #[error("hotspot prediction failed for region {region_name}: {source}")]
    Prediction {
        /// The region the prediction was for.
        region_name: String,
        /// The underlying prediction failure.
        #[source]
        source: PredictionError,
    },
}

/// Sequences per-region analyses and owns the session's display state.
///
/// Collaborators are injected as trait objects so tests (and alternate
/// deployments) can substitute them. The orchestrator is `Send + Sync`;
/// share it via `Arc` to run a batch and a hotspot request for an
/// already-cached region concurrently.
pub struct AnalysisOrchestrator {
    store: Arc<RegionAnalysisStore>,
    boundary_source: Arc<dyn BoundarySource>,
    point_source: Arc<dyn PointSource>,
    predictor: Arc<dyn PredictionService>,
    /// Raw point lists retained per region for hotspot prompts.
    region_points: RwLock<BTreeMap<String, Arc<Vec<GeoPoint>>>>,
    active_region: RwLock<Option<String>>,
    /// Regions with a prediction request in flight (UI indicator state).
    pending_predictions: Mutex<BTreeSet<String>>,
    /// Whether any batch has completed yet. The very first batch
    /// activates the first *requested* region; later batches rank by
    /// total points. An explicit two-branch policy, not an accident.
    initial_load_done: AtomicBool,
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator over the given store and collaborators.
    #[must_use]
    pub fn new(
        store: Arc<RegionAnalysisStore>,
        boundary_source: Arc<dyn BoundarySource>,
        point_source: Arc<dyn PointSource>,
        predictor: Arc<dyn PredictionService>,
    ) -> Self {
        Self {
            store,
            boundary_source,
            point_source,
            predictor,
            region_points: RwLock::new(BTreeMap::new()),
            active_region: RwLock::new(None),
            pending_predictions: Mutex::new(BTreeSet::new()),
            initial_load_done: AtomicBool::new(false),
        }
    }

    /// The session store backing this orchestrator.
    #[must_use]
    pub fn store(&self) -> &RegionAnalysisStore {
        &self.store
    }

    /// Analyzes the named regions in order, reusing cached results.
    ///
    /// Cache hits skip the fetch/aggregate pipeline entirely — the key
    /// cost-avoidance contract, since the upstream services are slow and
    /// rate-limited. Each cache miss runs the three pipeline phases and
    /// commits via `put` before the next region starts, so a batch
    /// abandoned midway leaves every completed region cached.
    ///
    /// The first failure aborts the batch: no partial result list is
    /// returned, and regions committed earlier in this batch stay in the
    /// store for the caller to re-request cheaply.
    ///
    /// After a successful batch the active region is chosen: the very
    /// first batch of the session activates the first requested name;
    /// every later batch activates the region with the most total
    /// points, first-encountered winning ties.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pipeline`] naming the failed region and
    /// phase.
    pub async fn analyze_regions(
        &self,
        names: &[String],
    ) -> Result<Vec<Arc<RegionAnalysis>>, EngineError> {
        let mut results = Vec::with_capacity(names.len());

        for name in names {
            if let Some(cached) = self.store.get(name) {
                log::debug!("Reusing cached analysis for {name}");
                results.push(cached);
                continue;
            }
            results.push(self.run_pipeline(name).await?);
        }

        if !results.is_empty() {
            let already_loaded = self.initial_load_done.swap(true, Ordering::SeqCst);
            let next_active = if already_loaded {
                rank_by_total_points(&results)
            } else {
                // Initial load: no prior ranking basis, honor the order
                // the caller listed the regions in.
                results[0].region_name.clone()
            };
            log::info!("Active region: {next_active}");
            *self
                .active_region
                .write()
                .expect("active region lock poisoned") = Some(next_active);
        }

        Ok(results)
    }

    /// The currently active region, if any batch has completed.
    ///
    /// # Panics
    ///
    /// Panics if the active-region lock is poisoned.
    #[must_use]
    pub fn active_region(&self) -> Option<String> {
        self.active_region
            .read()
            .expect("active region lock poisoned")
            .clone()
    }

    /// Makes `region_name` the active region.
    ///
    /// Never triggers a re-fetch. Clears the region's pending-prediction
    /// indicator: selection state and annotation state are decoupled
    /// from aggregation state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RegionNotFound`] if the region has no
    /// cached analysis.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn select_region(&self, region_name: &str) -> Result<(), EngineError> {
        if self.store.get(region_name).is_none() {
            return Err(EngineError::RegionNotFound {
                region_name: region_name.to_string(),
            });
        }

        *self
            .active_region
            .write()
            .expect("active region lock poisoned") = Some(region_name.to_string());
        self.pending_predictions
            .lock()
            .expect("pending predictions lock poisoned")
            .remove(region_name);
        Ok(())
    }

    /// Whether a hotspot prediction is currently in flight for a region.
    ///
    /// # Panics
    ///
    /// Panics if the pending-predictions lock is poisoned.
    #[must_use]
    pub fn has_pending_prediction(&self, region_name: &str) -> bool {
        self.pending_predictions
            .lock()
            .expect("pending predictions lock poisoned")
            .contains(region_name)
    }

    /// Requests a hotspot prediction for an already-analyzed region and
    /// annotates the cached analysis with the result.
    ///
    /// The prediction uses the raw point list retained from the region's
    /// aggregation. On failure the store is untouched. Concurrent
    /// requests for the same region all succeed independently; the last
    /// annotation wins, which is acceptable for an advisory prediction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RegionNotFound`] if the region has no
    /// cached analysis, or [`EngineError::Prediction`] if the provider
    /// fails.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn request_hotspot(&self, region_name: &str) -> Result<Hotspot, EngineError> {
        let Some(analysis) = self.store.get(region_name) else {
            return Err(EngineError::RegionNotFound {
                region_name: region_name.to_string(),
            });
        };

        let points = self
            .region_points
            .read()
            .expect("region points lock poisoned")
            .get(region_name)
            .cloned()
            .unwrap_or_default();

        self.pending_predictions
            .lock()
            .expect("pending predictions lock poisoned")
            .insert(region_name.to_string());

        log::info!("Requesting hotspot prediction for {region_name}...");
        let result = self
            .predictor
            .predict(region_name, &points, &analysis.bounding_box)
            .await;

        self.pending_predictions
            .lock()
            .expect("pending predictions lock poisoned")
            .remove(region_name);

        let hotspot = result.map_err(|source| EngineError::Prediction {
            region_name: region_name.to_string(),
            source,
        })?;

        self.store
            .annotate_hotspot(region_name, hotspot.clone())
            .map_err(|_| EngineError::RegionNotFound {
                region_name: region_name.to_string(),
            })?;

        Ok(hotspot)
    }

    /// Runs the three-phase pipeline for one uncached region and commits
    /// the result.
    async fn run_pipeline(&self, name: &str) -> Result<Arc<RegionAnalysis>, EngineError> {
        log::info!("Fetching bounding box for {name}...");
        let bbox = self
            .boundary_source
            .fetch_bounding_box(name)
            .await
            .map_err(|e| pipeline_error(name, PipelinePhase::FetchingBoundary, e))?;

        log::info!("Querying stores in {name}...");
        let points = self
            .point_source
            .fetch_points(&bbox)
            .await
            .map_err(|e| pipeline_error(name, PipelinePhase::FetchingPoints, e))?;

        log::info!("Calculating store density for {name}...");
        let analysis = store_map_analysis::aggregate(name, &points, &bbox)
            .map_err(|e| pipeline_error(name, PipelinePhase::Aggregating, e))?;

        self.region_points
            .write()
            .expect("region points lock poisoned")
            .insert(name.to_string(), Arc::new(points));

        Ok(self.store.put(analysis))
    }
}

fn pipeline_error(
    region_name: &str,
    phase: PipelinePhase,
    source: impl Into<PipelineFailure>,
) -> EngineError {
    EngineError::Pipeline {
        region_name: region_name.to_string(),
        phase,
        source: source.into(),
    }
}

/// Steady-state activation policy: highest `total_points` wins, and a
/// strict comparison keeps the first-encountered region among equal
/// maxima.
fn rank_by_total_points(results: &[Arc<RegionAnalysis>]) -> String {
    let mut best = &results[0];
    for candidate in &results[1..] {
        if candidate.total_points > best.total_points {
            best = candidate;
        }
    }
    best.region_name.clone()
}
