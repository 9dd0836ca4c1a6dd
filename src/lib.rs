//! Zoom-dependent clustering of origin-destination flow maps.
//!
//! Locations are merged into clusters as the viewport zooms out, flows are
//! re-keyed onto the clusters and summed, and results are cached per integer
//! zoom until the inputs change.
//!
//! ```rust
//! use flowcluster::prelude::*;
//!
//! let props = FlowMapProps::new(LocationAccessors::default(), FlowAccessors::default())
//!     .with_locations(Locations::from(vec![
//!         Location::new("06037", -118.23, 34.32),
//!         Location::new("06059", -117.76, 33.70),
//!         Location::new("36061", -73.97, 40.78),
//!     ]))
//!     .with_flows(vec![
//!         Flow::new("06037", "36061", 120.0),
//!         Flow::new("06059", "36061", 30.0),
//!     ]);
//!
//! let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();
//! layer.update_state(props, 3.0)?;
//!
//! let snapshot = layer.snapshot().unwrap();
//! assert_eq!(snapshot.flows.len(), 1);
//! assert_eq!(snapshot.total_magnitude(), 150.0);
//! # Ok::<(), flowcluster::FlowClusterError>(())
//! ```

pub mod accessors;
pub mod compute;
pub mod config;
pub mod error;
pub mod layer;
pub mod locations;

pub use accessors::{FlowAccessors, LocationAccessors};
pub use config::{ClusterConfig, MAX_SUPPORTED_ZOOM};
pub use error::{FlowClusterError, Result};

pub use compute::aggregate::{
    ClusterCache, ClusterSnapshot, LocationIdToClusterId, aggregate_flows, get_cluster,
};
pub use compute::cluster_index::{ClusterEntry, ClusterIndex, LocationIndex};

pub use layer::{
    ChangeFlags, ClusteredFlowMapLayer, FlowMapData, FlowMapLayer, FlowMapProps,
    PlainFlowMapLayer, RenderedFlow, UpdateTriggers, round_zoom,
};
#[cfg(feature = "sync")]
pub use layer::SyncClusteredFlowMap;

pub use locations::{Locations, build_location_index, get_location_centroids};

pub use geo::Point;

pub use flowcluster_types::bbox::BoundingBox2D;
pub use flowcluster_types::cluster::{
    ClusterKind, ClusterPoint, SYNTHETIC_ID_PREFIX, is_synthetic_id, synthetic_cluster_id,
};
pub use flowcluster_types::flow::{AggregatedFlow, Flow};
pub use flowcluster_types::location::{Location, LocationPoint};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{FlowClusterError, Result};

    pub use geo::Point;

    pub use crate::{ClusterConfig, FlowAccessors, LocationAccessors, Locations};

    pub use crate::{
        ClusterSnapshot, ClusteredFlowMapLayer, FlowMapData, FlowMapLayer, FlowMapProps,
        UpdateTriggers,
    };

    pub use crate::{AggregatedFlow, ClusterPoint, Flow, Location};

    #[cfg(feature = "sync")]
    pub use crate::SyncClusteredFlowMap;
}
