//! Accessor functions that read ids, centroids and magnitudes out of caller
//! records.
//!
//! Accessors are shared closures, so props can be cloned cheaply and compared
//! across updates. A change in what an accessor *means* cannot be detected
//! from the closure itself; bump the matching counter in
//! [`UpdateTriggers`](crate::layer::UpdateTriggers) instead.

use flowcluster_types::flow::Flow;
use flowcluster_types::location::Location;
use geo::Point;
use std::sync::Arc;

pub type LocationIdFn<L> = Arc<dyn Fn(&L) -> String + Send + Sync>;
pub type LocationCentroidFn<L> = Arc<dyn Fn(&L) -> Point<f64> + Send + Sync>;
pub type FlowEndpointFn<F> = Arc<dyn Fn(&F) -> String + Send + Sync>;
pub type FlowMagnitudeFn<F> = Arc<dyn Fn(&F) -> f64 + Send + Sync>;

/// How to read a location record.
pub struct LocationAccessors<L> {
    pub get_location_id: LocationIdFn<L>,
    pub get_location_centroid: LocationCentroidFn<L>,
}

impl<L> LocationAccessors<L> {
    pub fn new(
        get_location_id: impl Fn(&L) -> String + Send + Sync + 'static,
        get_location_centroid: impl Fn(&L) -> Point<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            get_location_id: Arc::new(get_location_id),
            get_location_centroid: Arc::new(get_location_centroid),
        }
    }

    #[inline]
    pub fn location_id(&self, location: &L) -> String {
        (self.get_location_id)(location)
    }

    #[inline]
    pub fn location_centroid(&self, location: &L) -> Point<f64> {
        (self.get_location_centroid)(location)
    }
}

impl<L> Clone for LocationAccessors<L> {
    fn clone(&self) -> Self {
        Self {
            get_location_id: Arc::clone(&self.get_location_id),
            get_location_centroid: Arc::clone(&self.get_location_centroid),
        }
    }
}

impl Default for LocationAccessors<Location> {
    fn default() -> Self {
        Self::new(|location: &Location| location.id.clone(), |location| location.centroid)
    }
}

/// How to read a flow record.
pub struct FlowAccessors<F> {
    pub get_flow_origin_id: FlowEndpointFn<F>,
    pub get_flow_dest_id: FlowEndpointFn<F>,
    pub get_flow_magnitude: FlowMagnitudeFn<F>,
}

impl<F> FlowAccessors<F> {
    pub fn new(
        get_flow_origin_id: impl Fn(&F) -> String + Send + Sync + 'static,
        get_flow_dest_id: impl Fn(&F) -> String + Send + Sync + 'static,
        get_flow_magnitude: impl Fn(&F) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            get_flow_origin_id: Arc::new(get_flow_origin_id),
            get_flow_dest_id: Arc::new(get_flow_dest_id),
            get_flow_magnitude: Arc::new(get_flow_magnitude),
        }
    }

    #[inline]
    pub fn origin_id(&self, flow: &F) -> String {
        (self.get_flow_origin_id)(flow)
    }

    #[inline]
    pub fn dest_id(&self, flow: &F) -> String {
        (self.get_flow_dest_id)(flow)
    }

    #[inline]
    pub fn magnitude(&self, flow: &F) -> f64 {
        (self.get_flow_magnitude)(flow)
    }
}

impl<F> Clone for FlowAccessors<F> {
    fn clone(&self) -> Self {
        Self {
            get_flow_origin_id: Arc::clone(&self.get_flow_origin_id),
            get_flow_dest_id: Arc::clone(&self.get_flow_dest_id),
            get_flow_magnitude: Arc::clone(&self.get_flow_magnitude),
        }
    }
}

impl Default for FlowAccessors<Flow> {
    fn default() -> Self {
        Self::new(
            |flow: &Flow| flow.origin_id.clone(),
            |flow| flow.dest_id.clone(),
            Flow::magnitude,
        )
    }
}

impl<L> std::fmt::Debug for LocationAccessors<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationAccessors").finish_non_exhaustive()
    }
}

impl<F> std::fmt::Debug for FlowAccessors<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowAccessors").finish_non_exhaustive()
    }
}
