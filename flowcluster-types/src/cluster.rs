use geo::Point;
use serde::{Deserialize, Serialize};

/// Prefix reserved for synthetic cluster ids. Input location ids must not
/// start with it.
pub const SYNTHETIC_ID_PREFIX: &str = "_sc_";

/// Build the synthetic id for an index cluster.
///
/// ```
/// use flowcluster_types::cluster::synthetic_cluster_id;
///
/// assert_eq!(synthetic_cluster_id(1), "_sc_1");
/// ```
pub fn synthetic_cluster_id(cluster_id: u64) -> String {
    format!("{SYNTHETIC_ID_PREFIX}{cluster_id}")
}

#[inline]
pub fn is_synthetic_id(id: &str) -> bool {
    id.starts_with(SYNTHETIC_ID_PREFIX)
}

/// What a [`ClusterPoint`] stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClusterKind {
    /// An original location shown as-is
    Location,
    /// Several locations merged by the clustering index
    Cluster {
        cluster_id: u64,
        point_count: usize,
        /// Original ids of every leaf absorbed into the cluster
        members: Vec<String>,
    },
}

/// A point rendered by the clustered flow map: either a passthrough location
/// or a synthetic cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    id: String,
    coordinates: Point<f64>,
    kind: ClusterKind,
}

impl ClusterPoint {
    /// A passthrough point keeping its original id.
    pub fn location(id: impl Into<String>, coordinates: Point<f64>) -> Self {
        Self {
            id: id.into(),
            coordinates,
            kind: ClusterKind::Location,
        }
    }

    /// A synthetic cluster point. Its id is [`synthetic_cluster_id`] of the
    /// index cluster id.
    pub fn cluster(
        cluster_id: u64,
        coordinates: Point<f64>,
        point_count: usize,
        members: Vec<String>,
    ) -> Self {
        Self {
            id: synthetic_cluster_id(cluster_id),
            coordinates,
            kind: ClusterKind::Cluster {
                cluster_id,
                point_count,
                members,
            },
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn coordinates(&self) -> Point<f64> {
        self.coordinates
    }

    pub fn kind(&self) -> &ClusterKind {
        &self.kind
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, ClusterKind::Cluster { .. })
    }

    /// Index cluster id, `None` for passthrough locations.
    pub fn cluster_id(&self) -> Option<u64> {
        match self.kind {
            ClusterKind::Cluster { cluster_id, .. } => Some(cluster_id),
            ClusterKind::Location => None,
        }
    }

    /// Number of original locations represented (1 for passthrough points).
    pub fn point_count(&self) -> usize {
        match self.kind {
            ClusterKind::Cluster { point_count, .. } => point_count,
            ClusterKind::Location => 1,
        }
    }

    /// Original location ids represented by this point.
    pub fn members(&self) -> &[String] {
        match &self.kind {
            ClusterKind::Cluster { members, .. } => members,
            ClusterKind::Location => std::slice::from_ref(&self.id),
        }
    }
}
