//! Per-zoom flow aggregation over clustered locations.
//!
//! For one zoom level the aggregator:
//!
//! 1. Queries the location index for clusters over the whole world.
//! 2. Maps every original location id to the id of the point representing
//!    it: the synthetic `_sc_<cluster_id>` id for members of a cluster, the
//!    location's own id otherwise.
//! 3. Re-keys every flow through that map and sums magnitudes per ordered
//!    `(origin, dest)` pair. Flows with an endpoint missing from the map are
//!    dropped.
//!
//! Results are memoized per integer zoom in a [`ClusterCache`]. The cache is
//! never updated in place; callers clear it when locations or flows change.

use crate::accessors::FlowAccessors;
use crate::compute::cluster_index::{ClusterEntry, LocationIndex};
use crate::error::Result;
use flowcluster_types::bbox::BoundingBox2D;
use flowcluster_types::cluster::{ClusterPoint, synthetic_cluster_id};
use flowcluster_types::flow::AggregatedFlow;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Original location id → id of the cluster point representing it.
pub type LocationIdToClusterId = FxHashMap<String, String>;

/// Clustered locations and aggregated flows at one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSnapshot {
    pub zoom: i32,
    pub locations: Vec<ClusterPoint>,
    pub flows: Vec<AggregatedFlow>,
}

impl ClusterSnapshot {
    /// Sum of all aggregated magnitudes.
    pub fn total_magnitude(&self) -> f64 {
        self.flows.iter().map(|flow| flow.magnitude).sum()
    }

    pub fn location(&self, id: &str) -> Option<&ClusterPoint> {
        self.locations.iter().find(|location| location.id() == id)
    }

    pub fn flow(&self, origin_id: &str, dest_id: &str) -> Option<&AggregatedFlow> {
        self.flows
            .iter()
            .find(|flow| flow.origin_id == origin_id && flow.dest_id == dest_id)
    }
}

/// Memoized snapshots keyed by integer zoom.
#[derive(Debug, Default, Clone)]
pub struct ClusterCache {
    entries: BTreeMap<i32, Arc<ClusterSnapshot>>,
}

impl ClusterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, zoom: i32) -> Option<&Arc<ClusterSnapshot>> {
        self.entries.get(&zoom)
    }

    pub fn insert(&mut self, zoom: i32, snapshot: Arc<ClusterSnapshot>) {
        self.entries.insert(zoom, snapshot);
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("Clearing {} cached cluster levels", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached zoom levels in ascending order.
    pub fn zoom_levels(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.keys().copied()
    }
}

/// Turn index entries into cluster points and the id remap table.
pub fn cluster_points<I: LocationIndex>(
    index: &I,
    entries: Vec<ClusterEntry>,
) -> Result<(Vec<ClusterPoint>, LocationIdToClusterId)> {
    let mut points = Vec::with_capacity(entries.len());
    let mut location_id_to_cluster_id = LocationIdToClusterId::default();

    for entry in entries {
        match entry {
            ClusterEntry::Cluster {
                cluster_id,
                coordinates,
                point_count,
            } => {
                let unique_id = synthetic_cluster_id(cluster_id);
                let members: Vec<String> = index
                    .get_leaves(cluster_id, usize::MAX, 0)?
                    .into_iter()
                    .map(|leaf| leaf.id)
                    .collect();
                for member in &members {
                    location_id_to_cluster_id.insert(member.clone(), unique_id.clone());
                }
                points.push(ClusterPoint::cluster(
                    cluster_id,
                    coordinates,
                    point_count,
                    members,
                ));
            }
            ClusterEntry::Leaf(location) => {
                location_id_to_cluster_id.insert(location.id.clone(), location.id.clone());
                points.push(ClusterPoint::location(location.id, location.centroid));
            }
        }
    }

    Ok((points, location_id_to_cluster_id))
}

/// Sum flow magnitudes per remapped `(origin, dest)` pair.
///
/// Output order follows the first appearance of each pair in `flows`.
/// Flows with an endpoint missing from the remap table are dropped.
pub fn aggregate_flows<F>(
    flows: &[F],
    accessors: &FlowAccessors<F>,
    location_id_to_cluster_id: &LocationIdToClusterId,
) -> Vec<AggregatedFlow> {
    let mut aggregated: Vec<AggregatedFlow> = Vec::new();
    let mut positions: FxHashMap<(String, String), usize> = FxHashMap::default();
    let mut dropped = 0usize;

    for flow in flows {
        let magnitude = accessors.magnitude(flow);
        let origin_id = accessors.origin_id(flow);
        let dest_id = accessors.dest_id(flow);

        let (Some(origin), Some(dest)) = (
            location_id_to_cluster_id.get(&origin_id),
            location_id_to_cluster_id.get(&dest_id),
        ) else {
            dropped += 1;
            continue;
        };

        let key = (origin.clone(), dest.clone());
        match positions.get(&key) {
            Some(&position) => aggregated[position].magnitude += magnitude,
            None => {
                positions.insert(key, aggregated.len());
                aggregated.push(AggregatedFlow::new(origin.clone(), dest.clone(), magnitude));
            }
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} flows with unresolved endpoints", dropped);
    }

    aggregated
}

/// Clustered locations and aggregated flows at `zoom`, computed at most once
/// per zoom between cache invalidations.
///
/// Returns `Ok(None)` when there is no index, no flows, or `zoom` exceeds
/// `max_zoom`; the caller then renders the unclustered data. Zooms below
/// `min_zoom` share the `min_zoom` entry.
pub fn get_cluster<I: LocationIndex, F>(
    location_index: Option<&I>,
    flows: Option<&[F]>,
    accessors: &FlowAccessors<F>,
    min_zoom: u8,
    max_zoom: u8,
    zoom: i32,
    cache: &mut ClusterCache,
) -> Result<Option<Arc<ClusterSnapshot>>> {
    let (Some(index), Some(flows)) = (location_index, flows) else {
        return Ok(None);
    };
    if zoom > i32::from(max_zoom) {
        return Ok(None);
    }
    let zoom = zoom.max(i32::from(min_zoom));
    if let Some(cached) = cache.get(zoom) {
        return Ok(Some(Arc::clone(cached)));
    }

    let entries = index.get_clusters(&BoundingBox2D::WORLD, zoom);
    let (locations, location_id_to_cluster_id) = cluster_points(index, entries)?;
    let flows = aggregate_flows(flows, accessors, &location_id_to_cluster_id);

    log::debug!(
        "Clustered zoom {}: {} points, {} aggregated flows",
        zoom,
        locations.len(),
        flows.len()
    );

    let snapshot = Arc::new(ClusterSnapshot {
        zoom,
        locations,
        flows,
    });
    cache.insert(zoom, Arc::clone(&snapshot));
    Ok(Some(snapshot))
}
