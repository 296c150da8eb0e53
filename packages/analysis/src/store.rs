//! Per-session cache of region analyses.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use store_map_models::{Hotspot, RegionAnalysis};

use crate::StoreError;

/// Session-scoped cache holding at most one [`RegionAnalysis`] per
/// case-sensitive region name.
///
/// An explicit object rather than a module-level singleton, so
/// independent sessions and tests never interfere. Entries are stored
/// behind `Arc` and replaced wholesale on every write: readers holding
/// an analysis keep a consistent snapshot, and concurrent readers never
/// observe a half-updated value. Unbounded — expected cardinality is a
/// few dozen named regions, with no eviction for the session.
#[derive(Debug, Default)]
pub struct RegionAnalysisStore {
    entries: RwLock<BTreeMap<String, Arc<RegionAnalysis>>>,
}

impl RegionAnalysisStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached analysis for `region_name`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    #[must_use]
    pub fn get(&self, region_name: &str) -> Option<Arc<RegionAnalysis>> {
        self.entries
            .read()
            .expect("region store lock poisoned")
            .get(region_name)
            .cloned()
    }

    /// Inserts or replaces the entry for `analysis.region_name` and
    /// returns the stored handle.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn put(&self, analysis: RegionAnalysis) -> Arc<RegionAnalysis> {
        let name = analysis.region_name.clone();
        let stored = Arc::new(analysis);
        self.entries
            .write()
            .expect("region store lock poisoned")
            .insert(name, Arc::clone(&stored));
        stored
    }

    /// Attaches `hotspot` to the cached analysis for `region_name`.
    ///
    /// Replaces the whole cached value with a copy differing only in
    /// `hotspot`; aggregation fields are untouched. Returns the updated
    /// analysis. Under concurrent annotation the last write wins, which
    /// is acceptable for an advisory prediction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RegionNotFound`] if no analysis is cached
    /// under `region_name`; no entry is created in that case.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn annotate_hotspot(
        &self,
        region_name: &str,
        hotspot: Hotspot,
    ) -> Result<Arc<RegionAnalysis>, StoreError> {
        let mut entries = self.entries.write().expect("region store lock poisoned");

        let Some(existing) = entries.get(region_name) else {
            return Err(StoreError::RegionNotFound {
                region_name: region_name.to_string(),
            });
        };

        let mut updated = RegionAnalysis::clone(existing);
        updated.hotspot = Some(hotspot);
        let updated = Arc::new(updated);
        entries.insert(region_name.to_string(), Arc::clone(&updated));

        log::debug!("Annotated hotspot for region {region_name}");
        Ok(updated)
    }

    /// Number of cached regions.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("region store lock poisoned")
            .len()
    }

    /// Whether the store is empty.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use store_map_models::BoundingBox;

    use super::*;

    fn analysis(name: &str, total: u64) -> RegionAnalysis {
        let bbox = BoundingBox::new(6.0, 3.0, 7.0, 4.0);
        RegionAnalysis {
            region_name: name.to_string(),
            total_points: total,
            cells: BTreeMap::new(),
            average_density: 0.0,
            densest_cell: None,
            bounding_box: bbox,
            center: bbox.center(),
            hotspot: None,
        }
    }

    #[test]
    fn get_returns_what_put_stored() {
        let store = RegionAnalysisStore::new();
        store.put(analysis("Lagos", 12));

        let cached = store.get("Lagos").unwrap();
        assert_eq!(cached.total_points, 12);
        assert!(store.get("Rivers").is_none());
    }

    #[test]
    fn put_replaces_by_region_name() {
        let store = RegionAnalysisStore::new();
        store.put(analysis("Lagos", 12));
        store.put(analysis("Lagos", 40));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("Lagos").unwrap().total_points, 40);
    }

    #[test]
    fn region_names_are_case_sensitive() {
        let store = RegionAnalysisStore::new();
        store.put(analysis("Lagos", 12));
        assert!(store.get("lagos").is_none());
    }

    #[test]
    fn annotate_preserves_aggregation_fields() {
        let store = RegionAnalysisStore::new();
        store.put(analysis("Rivers", 7));
        let before = store.get("Rivers").unwrap();

        let hotspot = Hotspot {
            lat: 4.82,
            lon: 7.03,
            reasoning: "High foot traffic near the waterfront".to_string(),
        };
        let updated = store.annotate_hotspot("Rivers", hotspot.clone()).unwrap();

        assert_eq!(updated.hotspot.as_ref(), Some(&hotspot));
        assert_eq!(updated.total_points, before.total_points);
        assert_eq!(updated.cells, before.cells);
        assert!((updated.average_density - before.average_density).abs() < f64::EPSILON);
        // The store now serves the annotated value.
        assert!(store.get("Rivers").unwrap().hotspot.is_some());
    }

    #[test]
    fn annotate_unknown_region_fails_without_creating_entry() {
        let store = RegionAnalysisStore::new();
        let hotspot = Hotspot {
            lat: 6.5,
            lon: 3.3,
            reasoning: "n/a".to_string(),
        };

        let err = store.annotate_hotspot("Kano", hotspot).unwrap_err();
        assert!(matches!(
            err,
            StoreError::RegionNotFound { ref region_name } if region_name == "Kano"
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn readers_keep_their_snapshot_across_annotation() {
        let store = RegionAnalysisStore::new();
        store.put(analysis("Lagos", 3));

        let snapshot = store.get("Lagos").unwrap();
        store
            .annotate_hotspot(
                "Lagos",
                Hotspot {
                    lat: 6.45,
                    lon: 3.40,
                    reasoning: "Dense central cluster".to_string(),
                },
            )
            .unwrap();

        // The earlier reader still sees the pre-annotation value.
        assert!(snapshot.hotspot.is_none());
        assert!(store.get("Lagos").unwrap().hotspot.is_some());
    }
}
