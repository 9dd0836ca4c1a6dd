//! Thread-safe wrapper around a clustered flow map layer.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! flowcluster = { version = "0.1", features = ["sync"] }
//! ```
//!
//! Updates are serialized through one lock, so hosts that observe zoom and
//! data changes on several threads can share a single layer.
//!
//! ```rust
//! use flowcluster::prelude::*;
//! use flowcluster::SyncClusteredFlowMap;
//! use std::thread;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let map: SyncClusteredFlowMap<Location, Flow> = SyncClusteredFlowMap::new();
//! let props = FlowMapProps::new(LocationAccessors::default(), FlowAccessors::default())
//!     .with_locations(Locations::from(vec![Location::new("a", 0.0, 0.0)]))
//!     .with_flows(vec![Flow::new("a", "a", 1.0)]);
//!
//! let worker = map.clone();
//! let worker_props = props.clone();
//! thread::spawn(move || worker.update_state(worker_props, 4.0).unwrap())
//!     .join()
//!     .unwrap();
//!
//! assert_eq!(map.zoom(), Some(4));
//! # Ok(())
//! # }
//! ```

use super::{ClusteredFlowMapLayer, FlowMapData, FlowMapProps};
use crate::compute::aggregate::ClusterSnapshot;
use crate::compute::cluster_index::{ClusterIndex, LocationIndex};
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to a [`ClusteredFlowMapLayer`] behind `Arc<Mutex<_>>`.
///
/// Clones share the same layer, index and cache.
pub struct SyncClusteredFlowMap<L, F, I: LocationIndex = ClusterIndex> {
    inner: Arc<Mutex<ClusteredFlowMapLayer<L, F, I>>>,
}

impl<L, F, I: LocationIndex> SyncClusteredFlowMap<L, F, I> {
    pub fn new() -> Self {
        Self::from_layer(ClusteredFlowMapLayer::new())
    }

    pub fn from_layer(layer: ClusteredFlowMapLayer<L, F, I>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(layer)),
        }
    }

    pub fn should_update_state(&self, props: &FlowMapProps<L, F>, viewport_zoom: f64) -> bool {
        self.inner.lock().should_update_state(props, viewport_zoom)
    }

    pub fn update_state(&self, props: FlowMapProps<L, F>, viewport_zoom: f64) -> Result<()> {
        self.inner.lock().update_state(props, viewport_zoom)
    }

    /// Run `f` on the current render data while holding the lock.
    pub fn with_render_data<R>(&self, f: impl FnOnce(Option<FlowMapData<'_, L, F>>) -> R) -> R {
        let layer = self.inner.lock();
        f(layer.render_data())
    }

    pub fn snapshot(&self) -> Option<Arc<ClusterSnapshot>> {
        self.inner.lock().snapshot().cloned()
    }

    pub fn zoom(&self) -> Option<i32> {
        self.inner.lock().zoom()
    }

    /// Number of zoom levels currently cached.
    pub fn cached_levels(&self) -> usize {
        self.inner.lock().cache().len()
    }
}

impl<L, F, I: LocationIndex> Clone for SyncClusteredFlowMap<L, F, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L, F, I: LocationIndex> Default for SyncClusteredFlowMap<L, F, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, F, I: LocationIndex> std::fmt::Debug for SyncClusteredFlowMap<L, F, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClusteredFlowMap").finish_non_exhaustive()
    }
}
