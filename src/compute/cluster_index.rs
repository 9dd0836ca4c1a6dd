//! Hierarchical point clustering index backed by per-zoom R-trees.
//!
//! Locations are projected into the Web-Mercator unit square and clustered
//! greedily from the deepest zoom level upwards:
//!
//! 1. **Leaf level**: level `max_zoom + 1` holds every input location.
//!
//! 2. **Greedy merge**: for each zoom `z` from `max_zoom` down to `min_zoom`,
//!    every point of level `z + 1` not yet claimed gathers its unclaimed
//!    neighbours within `cluster_radius / (extent * 2^z)`. If the combined
//!    weight reaches `min_points` they become one cluster at their weighted
//!    centroid, otherwise they are carried into level `z` unchanged.
//!
//! 3. **Lookup**: each level is bulk-loaded into an `rstar` R-tree so radius
//!    and bounding box queries stay O(log n + k).
//!
//! Cluster ids encode where the cluster was created, so children and leaves
//! can be found again without storing explicit member lists:
//!
//! ```text
//! id = (index_in_origin_level << 5) + origin_zoom + number_of_input_points
//! ```
//!
//! ## Example
//!
//! ```rust
//! use flowcluster::{BoundingBox2D, ClusterConfig, ClusterIndex, LocationPoint, Point};
//!
//! let points = vec![
//!     LocationPoint::new("a", Point::new(-100.0, 40.0)),
//!     LocationPoint::new("b", Point::new(-99.5, 40.2)),
//!     LocationPoint::new("c", Point::new(10.0, 50.0)),
//! ];
//! let index = ClusterIndex::load(ClusterConfig::default(), points)?;
//!
//! // Far out, "a" and "b" merge; "c" stays on its own.
//! assert_eq!(index.get_clusters(&BoundingBox2D::WORLD, 2).len(), 2);
//! // At the leaf level every location is visible again.
//! assert_eq!(index.get_clusters(&BoundingBox2D::WORLD, 17).len(), 3);
//! # Ok::<(), flowcluster::FlowClusterError>(())
//! ```

use crate::compute::projection::{lat_y, lng_x, x_lng, y_lat};
use crate::config::ClusterConfig;
use crate::error::{FlowClusterError, Result};
use flowcluster_types::bbox::BoundingBox2D;
use flowcluster_types::location::LocationPoint;
use geo::Point;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use smallvec::SmallVec;

/// An entry returned by a clustering query.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterEntry {
    /// An original location that is not merged at the queried zoom.
    Leaf(LocationPoint),
    /// Several locations merged into one point.
    Cluster {
        cluster_id: u64,
        coordinates: Point<f64>,
        point_count: usize,
    },
}

impl ClusterEntry {
    pub fn coordinates(&self) -> Point<f64> {
        match self {
            ClusterEntry::Leaf(point) => point.centroid,
            ClusterEntry::Cluster { coordinates, .. } => *coordinates,
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            ClusterEntry::Leaf(_) => 1,
            ClusterEntry::Cluster { point_count, .. } => *point_count,
        }
    }
}

/// Spatial index queried by the flow aggregator.
///
/// Implementations must be deterministic: the same input and zoom always
/// produce the same partition.
pub trait LocationIndex: Sized {
    /// Build an index over `points`.
    fn build(config: &ClusterConfig, points: Vec<LocationPoint>) -> Result<Self>;

    /// Clusters and unmerged locations inside `bbox` at `zoom`.
    fn get_clusters(&self, bbox: &BoundingBox2D, zoom: i32) -> Vec<ClusterEntry>;

    /// Original locations absorbed into `cluster_id`, skipping `offset` and
    /// returning at most `limit`.
    fn get_leaves(&self, cluster_id: u64, limit: usize, offset: usize)
    -> Result<Vec<LocationPoint>>;
}

type LevelEntry = GeomWithData<[f64; 2], usize>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeKind {
    /// Index into the input points
    Leaf(usize),
    Cluster(u64),
}

#[derive(Debug, Clone, Copy)]
struct ClusterNode {
    x: f64,
    y: f64,
    kind: NodeKind,
    point_count: usize,
    parent_id: Option<u64>,
    /// Claimed while building the level below
    visited: bool,
}

impl ClusterNode {
    fn leaf(x: f64, y: f64, index: usize) -> Self {
        Self {
            x,
            y,
            kind: NodeKind::Leaf(index),
            point_count: 1,
            parent_id: None,
            visited: false,
        }
    }

    fn cluster(x: f64, y: f64, id: u64, point_count: usize) -> Self {
        Self {
            x,
            y,
            kind: NodeKind::Cluster(id),
            point_count,
            parent_id: None,
            visited: false,
        }
    }

    /// Copy carried unchanged into the next level.
    fn carried(&self) -> Self {
        Self {
            visited: false,
            ..*self
        }
    }
}

struct Level {
    nodes: Vec<ClusterNode>,
    tree: RTree<LevelEntry>,
}

impl Level {
    fn new(nodes: Vec<ClusterNode>) -> Self {
        let entries = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| GeomWithData::new([node.x, node.y], i))
            .collect();
        Self {
            nodes,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Indices of nodes within `radius` of `(x, y)`, ascending.
    fn within(&self, x: f64, y: f64, radius: f64) -> SmallVec<[usize; 16]> {
        let mut ids: SmallVec<[usize; 16]> = self
            .tree
            .locate_within_distance([x, y], radius * radius)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Indices of nodes inside a projected rectangle, ascending.
    fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Hierarchical clustering index over a fixed set of locations.
pub struct ClusterIndex {
    config: ClusterConfig,
    points: Vec<LocationPoint>,
    /// `levels[z - min_zoom]` for `z` in `min_zoom..=max_zoom + 1`
    levels: Vec<Level>,
}

impl ClusterIndex {
    /// Project and cluster `points` at every zoom level of `config`.
    ///
    /// Points with non-finite centroids are skipped with a warning.
    pub fn load(config: ClusterConfig, points: Vec<LocationPoint>) -> Result<Self> {
        config.validate()?;

        let mut nodes = Vec::with_capacity(points.len());
        for (i, point) in points.iter().enumerate() {
            let (lng, lat) = (point.centroid.x(), point.centroid.y());
            if !lng.is_finite() || !lat.is_finite() {
                log::warn!(
                    "Skipping location {} with non-finite centroid ({}, {})",
                    point.id,
                    lng,
                    lat
                );
                continue;
            }
            nodes.push(ClusterNode::leaf(lng_x(lng), lat_y(lat), i));
        }

        let total = points.len() as u64;
        let mut levels = Vec::with_capacity(usize::from(config.max_zoom - config.min_zoom) + 2);
        let mut current = Level::new(nodes);

        for zoom in (config.min_zoom..=config.max_zoom).rev() {
            let next = cluster_level(&mut current, zoom, &config, total);
            levels.push(current);
            current = Level::new(next);
        }
        levels.push(current);
        levels.reverse();

        log::debug!(
            "Built cluster index over {} locations for zoom {}..={}",
            points.len(),
            config.min_zoom,
            config.max_zoom
        );

        Ok(Self {
            config,
            points,
            levels,
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Number of input locations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn level(&self, zoom: u8) -> Option<&Level> {
        if zoom < self.config.min_zoom {
            return None;
        }
        self.levels.get(usize::from(zoom - self.config.min_zoom))
    }

    fn clamp_zoom(&self, zoom: i32) -> u8 {
        let min = i32::from(self.config.min_zoom);
        let max = i32::from(self.config.max_zoom) + 1;
        // In range 0..=31 after the clamp.
        zoom.clamp(min, max) as u8
    }

    fn entry(&self, node: &ClusterNode) -> ClusterEntry {
        match node.kind {
            NodeKind::Leaf(index) => ClusterEntry::Leaf(self.points[index].clone()),
            NodeKind::Cluster(cluster_id) => ClusterEntry::Cluster {
                cluster_id,
                coordinates: Point::new(x_lng(node.x), y_lat(node.y)),
                point_count: node.point_count,
            },
        }
    }

    /// Clusters and unmerged locations inside `bbox` at `zoom`.
    ///
    /// - The zoom is clamped to `min_zoom..=max_zoom + 1`.
    /// - Longitudes are wrapped; a box spanning 360° or more covers the world.
    /// - A box crossing the antimeridian is queried as two halves.
    /// - Returns an empty result if coordinates are non-finite.
    pub fn get_clusters(&self, bbox: &BoundingBox2D, zoom: i32) -> Vec<ClusterEntry> {
        if !bbox.is_finite() {
            log::warn!("Rejecting cluster query with non-finite bounding box");
            return Vec::new();
        }

        let mut min_lng = (bbox.min_lng + 180.0).rem_euclid(360.0) - 180.0;
        let min_lat = bbox.min_lat.clamp(-90.0, 90.0);
        let mut max_lng = if bbox.max_lng == 180.0 {
            180.0
        } else {
            (bbox.max_lng + 180.0).rem_euclid(360.0) - 180.0
        };
        let max_lat = bbox.max_lat.clamp(-90.0, 90.0);

        if bbox.max_lng - bbox.min_lng >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut clusters =
                self.get_clusters(&BoundingBox2D::new(min_lng, min_lat, 180.0, max_lat), zoom);
            clusters.extend(
                self.get_clusters(&BoundingBox2D::new(-180.0, min_lat, max_lng, max_lat), zoom),
            );
            return clusters;
        }

        let Some(level) = self.level(self.clamp_zoom(zoom)) else {
            return Vec::new();
        };

        level
            .range(lng_x(min_lng), lat_y(max_lat), lng_x(max_lng), lat_y(min_lat))
            .into_iter()
            .map(|i| self.entry(&level.nodes[i]))
            .collect()
    }

    /// Split a cluster id into its origin level index and origin zoom.
    fn origin(&self, cluster_id: u64) -> Result<(usize, u8)> {
        let total = self.points.len() as u64;
        let relative = cluster_id
            .checked_sub(total)
            .ok_or(FlowClusterError::ClusterNotFound(cluster_id))?;
        let index = usize::try_from(relative >> 5)
            .map_err(|_| FlowClusterError::ClusterNotFound(cluster_id))?;
        Ok((index, (relative % 32) as u8))
    }

    fn child_nodes(&self, cluster_id: u64) -> Result<SmallVec<[ClusterNode; 8]>> {
        let (origin_index, origin_zoom) = self.origin(cluster_id)?;
        if origin_zoom == 0 {
            return Err(FlowClusterError::ClusterNotFound(cluster_id));
        }
        let level = self
            .level(origin_zoom)
            .ok_or(FlowClusterError::ClusterNotFound(cluster_id))?;
        let origin = level
            .nodes
            .get(origin_index)
            .ok_or(FlowClusterError::ClusterNotFound(cluster_id))?;

        let radius = self.config.radius_at(origin_zoom - 1);
        let children: SmallVec<[ClusterNode; 8]> = level
            .within(origin.x, origin.y, radius)
            .into_iter()
            .map(|i| level.nodes[i])
            .filter(|node| node.parent_id == Some(cluster_id))
            .collect();

        if children.is_empty() {
            return Err(FlowClusterError::ClusterNotFound(cluster_id));
        }
        Ok(children)
    }

    /// Direct children of a cluster one zoom level deeper.
    pub fn get_children(&self, cluster_id: u64) -> Result<Vec<ClusterEntry>> {
        Ok(self
            .child_nodes(cluster_id)?
            .iter()
            .map(|node| self.entry(node))
            .collect())
    }

    /// Original locations absorbed into `cluster_id`.
    ///
    /// Pass `usize::MAX` as `limit` to enumerate every leaf.
    pub fn get_leaves(
        &self,
        cluster_id: u64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocationPoint>> {
        let mut leaves = Vec::new();
        self.append_leaves(&mut leaves, cluster_id, limit, offset, 0)?;
        Ok(leaves)
    }

    fn append_leaves(
        &self,
        leaves: &mut Vec<LocationPoint>,
        cluster_id: u64,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> Result<usize> {
        for child in self.child_nodes(cluster_id)? {
            if leaves.len() >= limit {
                break;
            }
            match child.kind {
                NodeKind::Cluster(child_id) => {
                    if skipped + child.point_count <= offset {
                        skipped += child.point_count;
                    } else {
                        skipped = self.append_leaves(leaves, child_id, limit, offset, skipped)?;
                    }
                }
                NodeKind::Leaf(index) => {
                    if skipped < offset {
                        skipped += 1;
                    } else {
                        leaves.push(self.points[index].clone());
                    }
                }
            }
        }
        Ok(skipped)
    }

    /// Smallest zoom at which the cluster splits into more than one child.
    pub fn get_cluster_expansion_zoom(&self, cluster_id: u64) -> Result<u8> {
        let (_, origin_zoom) = self.origin(cluster_id)?;
        let mut expansion_zoom = i32::from(origin_zoom) - 1;
        let mut current = cluster_id;

        while expansion_zoom <= i32::from(self.config.max_zoom) {
            let children = self.child_nodes(current)?;
            expansion_zoom += 1;
            match children.as_slice() {
                [only] => match only.kind {
                    NodeKind::Cluster(child_id) => current = child_id,
                    NodeKind::Leaf(_) => break,
                },
                _ => break,
            }
        }

        Ok(expansion_zoom.max(0) as u8)
    }
}

impl LocationIndex for ClusterIndex {
    fn build(config: &ClusterConfig, points: Vec<LocationPoint>) -> Result<Self> {
        ClusterIndex::load(config.clone(), points)
    }

    fn get_clusters(&self, bbox: &BoundingBox2D, zoom: i32) -> Vec<ClusterEntry> {
        ClusterIndex::get_clusters(self, bbox, zoom)
    }

    fn get_leaves(
        &self,
        cluster_id: u64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocationPoint>> {
        ClusterIndex::get_leaves(self, cluster_id, limit, offset)
    }
}

impl std::fmt::Debug for ClusterIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterIndex")
            .field("config", &self.config)
            .field("points", &self.points.len())
            .field("levels", &self.levels.len())
            .finish()
    }
}

/// Merge the nodes of `level` (zoom + 1) into the node set of `zoom`.
fn cluster_level(
    level: &mut Level,
    zoom: u8,
    config: &ClusterConfig,
    total_points: u64,
) -> Vec<ClusterNode> {
    let radius = config.radius_at(zoom);
    let mut next = Vec::with_capacity(level.nodes.len());

    for i in 0..level.nodes.len() {
        if level.nodes[i].visited {
            continue;
        }
        level.nodes[i].visited = true;

        let origin = level.nodes[i];
        let neighbors = level.within(origin.x, origin.y, radius);

        let mut point_count = origin.point_count;
        for &n in &neighbors {
            if !level.nodes[n].visited {
                point_count += level.nodes[n].point_count;
            }
        }

        if point_count > origin.point_count && point_count >= config.min_points {
            let weight = origin.point_count as f64;
            let mut wx = origin.x * weight;
            let mut wy = origin.y * weight;
            let id = ((i as u64) << 5) + u64::from(zoom) + 1 + total_points;

            for &n in &neighbors {
                let neighbor = &mut level.nodes[n];
                if neighbor.visited {
                    continue;
                }
                neighbor.visited = true;
                let weight = neighbor.point_count as f64;
                wx += neighbor.x * weight;
                wy += neighbor.y * weight;
                neighbor.parent_id = Some(id);
            }

            level.nodes[i].parent_id = Some(id);
            let total = point_count as f64;
            next.push(ClusterNode::cluster(wx / total, wy / total, id, point_count));
        } else {
            next.push(origin.carried());

            if point_count > 1 {
                for &n in &neighbors {
                    let neighbor = &mut level.nodes[n];
                    if neighbor.visited {
                        continue;
                    }
                    neighbor.visited = true;
                    next.push(neighbor.carried());
                }
            }
        }
    }

    next
}
