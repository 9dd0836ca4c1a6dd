//! Flow map layers.
//!
//! [`ClusteredFlowMapLayer`] keeps a clustering index and a per-zoom cache of
//! aggregated flows and reacts to each update as follows:
//!
//! | What changed                          | Index    | Cache   |
//! |---------------------------------------|----------|---------|
//! | locations, id/centroid triggers       | rebuilt  | cleared |
//! | clustering options                    | rebuilt  | cleared |
//! | flows, origin/dest/magnitude triggers | kept     | cleared |
//! | rounded zoom only                     | kept     | read    |
//!
//! Locations set to `None` drop the index. Above `max_zoom`, or while no
//! clustered snapshot exists, the layer renders the caller's data as is.
//!
//! ```rust
//! use flowcluster::prelude::*;
//!
//! let locations = vec![
//!     Location::new("a", -100.0, 40.0),
//!     Location::new("b", -99.5, 40.2),
//!     Location::new("c", 10.0, 50.0),
//! ];
//! let flows = vec![Flow::new("a", "c", 5.0), Flow::new("b", "c", 3.0)];
//! let props = FlowMapProps::new(LocationAccessors::default(), FlowAccessors::default())
//!     .with_locations(Locations::from(locations))
//!     .with_flows(flows)
//!     .with_config(ClusterConfig::default().with_max_zoom(8));
//!
//! let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();
//! layer.update_state(props, 2.3)?;
//!
//! let data = layer.render_data().unwrap();
//! assert!(data.is_clustered());
//! assert_eq!(data.rendered_flows().len(), 1);
//! assert_eq!(data.rendered_flows()[0].magnitude, 8.0);
//! # Ok::<(), flowcluster::FlowClusterError>(())
//! ```

mod output;
mod props;
#[cfg(feature = "sync")]
mod sync;

pub use output::{FlowMapData, RenderedFlow};
pub use props::{ChangeFlags, FlowMapProps, UpdateTriggers};
#[cfg(feature = "sync")]
pub use sync::SyncClusteredFlowMap;

use crate::compute::aggregate::{ClusterCache, ClusterSnapshot, get_cluster};
use crate::compute::cluster_index::{ClusterIndex, LocationIndex};
use crate::error::Result;
use crate::locations::build_location_index;
use std::sync::Arc;

/// Integer zoom used for cache keys; halves round up.
#[inline]
pub fn round_zoom(zoom: f64) -> i32 {
    (zoom + 0.5).floor() as i32
}

#[derive(Debug)]
struct ClusterState<I> {
    location_index: Option<I>,
    clusters_cache: ClusterCache,
    z: Option<i32>,
    snapshot: Option<Arc<ClusterSnapshot>>,
}

impl<I> Default for ClusterState<I> {
    fn default() -> Self {
        Self {
            location_index: None,
            clusters_cache: ClusterCache::new(),
            z: None,
            snapshot: None,
        }
    }
}

/// A flow map layer that clusters locations and aggregates flows per zoom.
pub struct ClusteredFlowMapLayer<L, F, I: LocationIndex = ClusterIndex> {
    props: Option<FlowMapProps<L, F>>,
    state: ClusterState<I>,
}

impl<L, F, I: LocationIndex> ClusteredFlowMapLayer<L, F, I> {
    pub fn new() -> Self {
        Self {
            props: None,
            state: ClusterState::default(),
        }
    }

    /// Whether `update_state` with these inputs would do any work.
    pub fn should_update_state(&self, props: &FlowMapProps<L, F>, viewport_zoom: f64) -> bool {
        ChangeFlags::between(self.props.as_ref(), props).any()
            || self.state.z != Some(round_zoom(viewport_zoom))
    }

    /// Apply new props and viewport zoom.
    ///
    /// Nothing is committed unless the whole update succeeds; on error the
    /// previous index, cache, zoom and props stay in place.
    pub fn update_state(&mut self, props: FlowMapProps<L, F>, viewport_zoom: f64) -> Result<()> {
        let changes = ChangeFlags::between(self.props.as_ref(), &props);
        let rebuild = changes.locations_changed || changes.cluster_options_changed;

        let rebuilt_index = if rebuild {
            props.config.validate()?;
            Some(match props.locations() {
                Some(locations) => Some(build_location_index::<L, I>(
                    locations,
                    &props.location_accessors,
                    &props.config,
                )?),
                None => {
                    log::debug!("Locations unset, dropping location index");
                    None
                }
            })
        } else {
            None
        };

        let reset_cache = rebuild || changes.flows_changed;
        let mut cache = if reset_cache {
            ClusterCache::new()
        } else {
            std::mem::take(&mut self.state.clusters_cache)
        };

        let location_index = match &rebuilt_index {
            Some(index) => index.as_ref(),
            None => self.state.location_index.as_ref(),
        };
        let z = round_zoom(viewport_zoom);
        let snapshot = match get_cluster(
            location_index,
            props.flows(),
            &props.flow_accessors,
            props.config.min_zoom,
            props.config.max_zoom,
            z,
            &mut cache,
        ) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if !reset_cache {
                    self.state.clusters_cache = cache;
                }
                return Err(e);
            }
        };

        if let Some(index) = rebuilt_index {
            self.state.location_index = index;
        }
        if reset_cache {
            self.state.clusters_cache.clear();
        }
        self.state.clusters_cache = cache;
        self.state.z = Some(z);
        self.state.snapshot = snapshot;
        self.props = Some(props);
        Ok(())
    }

    /// Data for the renderer, `None` before the first update.
    pub fn render_data(&self) -> Option<FlowMapData<'_, L, F>> {
        let props = self.props.as_ref()?;
        Some(match &self.state.snapshot {
            Some(snapshot) => FlowMapData::Clustered(Arc::clone(snapshot)),
            None => FlowMapData::Unclustered {
                locations: props.locations(),
                flows: props.flows(),
                location_accessors: &props.location_accessors,
                flow_accessors: &props.flow_accessors,
            },
        })
    }

    pub fn props(&self) -> Option<&FlowMapProps<L, F>> {
        self.props.as_ref()
    }

    /// Rounded zoom of the last update.
    pub fn zoom(&self) -> Option<i32> {
        self.state.z
    }

    pub fn location_index(&self) -> Option<&I> {
        self.state.location_index.as_ref()
    }

    pub fn cache(&self) -> &ClusterCache {
        &self.state.clusters_cache
    }

    /// Clustered snapshot of the current zoom, if any.
    pub fn snapshot(&self) -> Option<&Arc<ClusterSnapshot>> {
        self.state.snapshot.as_ref()
    }
}

impl<L, F, I: LocationIndex> Default for ClusteredFlowMapLayer<L, F, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, F, I: LocationIndex + std::fmt::Debug> std::fmt::Debug for ClusteredFlowMapLayer<L, F, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusteredFlowMapLayer")
            .field("props", &self.props)
            .field("state", &self.state)
            .finish()
    }
}

/// A flow map layer that renders its inputs unchanged.
pub struct PlainFlowMapLayer<L, F> {
    props: Option<FlowMapProps<L, F>>,
}

impl<L, F> PlainFlowMapLayer<L, F> {
    pub fn new() -> Self {
        Self { props: None }
    }

    pub fn update_state(&mut self, props: FlowMapProps<L, F>) {
        self.props = Some(props);
    }

    pub fn render_data(&self) -> Option<FlowMapData<'_, L, F>> {
        let props = self.props.as_ref()?;
        Some(FlowMapData::Unclustered {
            locations: props.locations(),
            flows: props.flows(),
            location_accessors: &props.location_accessors,
            flow_accessors: &props.flow_accessors,
        })
    }

    pub fn props(&self) -> Option<&FlowMapProps<L, F>> {
        self.props.as_ref()
    }
}

impl<L, F> Default for PlainFlowMapLayer<L, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, F> std::fmt::Debug for PlainFlowMapLayer<L, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainFlowMapLayer")
            .field("props", &self.props)
            .finish()
    }
}

/// A flow map layer, clustered or not, chosen at construction.
pub enum FlowMapLayer<L, F, I: LocationIndex = ClusterIndex> {
    Plain(PlainFlowMapLayer<L, F>),
    Clustered(ClusteredFlowMapLayer<L, F, I>),
}

impl<L, F, I: LocationIndex> FlowMapLayer<L, F, I> {
    pub fn new(clustering_enabled: bool) -> Self {
        if clustering_enabled {
            FlowMapLayer::Clustered(ClusteredFlowMapLayer::new())
        } else {
            FlowMapLayer::Plain(PlainFlowMapLayer::new())
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, FlowMapLayer::Clustered(_))
    }

    /// Apply new props; the plain layer ignores the zoom.
    pub fn update_state(&mut self, props: FlowMapProps<L, F>, viewport_zoom: f64) -> Result<()> {
        match self {
            FlowMapLayer::Plain(layer) => {
                layer.update_state(props);
                Ok(())
            }
            FlowMapLayer::Clustered(layer) => layer.update_state(props, viewport_zoom),
        }
    }

    pub fn render_data(&self) -> Option<FlowMapData<'_, L, F>> {
        match self {
            FlowMapLayer::Plain(layer) => layer.render_data(),
            FlowMapLayer::Clustered(layer) => layer.render_data(),
        }
    }
}

impl<L, F, I: LocationIndex + std::fmt::Debug> std::fmt::Debug for FlowMapLayer<L, F, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowMapLayer::Plain(layer) => f.debug_tuple("Plain").field(layer).finish(),
            FlowMapLayer::Clustered(layer) => f.debug_tuple("Clustered").field(layer).finish(),
        }
    }
}
