//! Layer inputs and change detection between updates.

use crate::accessors::{FlowAccessors, LocationAccessors};
use crate::config::ClusterConfig;
use crate::locations::Locations;
use std::sync::Arc;

/// Generation counters signalling that an accessor's meaning changed while the
/// closure itself may have stayed the same. Bump a counter to force the
/// matching recomputation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTriggers {
    pub get_location_id: u64,
    pub get_location_centroid: u64,
    pub get_flow_origin_id: u64,
    pub get_flow_dest_id: u64,
    pub get_flow_magnitude: u64,
}

/// Everything a flow map layer is rendered from.
///
/// Data is shared through `Arc`s: passing the same `Arc` again is "no change",
/// passing a new one is a change, whatever its contents.
pub struct FlowMapProps<L, F> {
    pub locations: Option<Arc<Locations<L>>>,
    pub flows: Option<Arc<Vec<F>>>,
    pub location_accessors: LocationAccessors<L>,
    pub flow_accessors: FlowAccessors<F>,
    pub config: ClusterConfig,
    pub update_triggers: UpdateTriggers,
}

impl<L, F> FlowMapProps<L, F> {
    pub fn new(location_accessors: LocationAccessors<L>, flow_accessors: FlowAccessors<F>) -> Self {
        Self {
            locations: None,
            flows: None,
            location_accessors,
            flow_accessors,
            config: ClusterConfig::default(),
            update_triggers: UpdateTriggers::default(),
        }
    }

    pub fn with_locations(mut self, locations: impl Into<Arc<Locations<L>>>) -> Self {
        self.locations = Some(locations.into());
        self
    }

    pub fn with_flows(mut self, flows: impl Into<Arc<Vec<F>>>) -> Self {
        self.flows = Some(flows.into());
        self
    }

    pub fn with_location_accessors(mut self, accessors: LocationAccessors<L>) -> Self {
        self.location_accessors = accessors;
        self
    }

    pub fn with_flow_accessors(mut self, accessors: FlowAccessors<F>) -> Self {
        self.flow_accessors = accessors;
        self
    }

    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_update_triggers(mut self, triggers: UpdateTriggers) -> Self {
        self.update_triggers = triggers;
        self
    }

    pub fn locations(&self) -> Option<&Locations<L>> {
        self.locations.as_deref()
    }

    pub fn flows(&self) -> Option<&[F]> {
        self.flows.as_deref().map(Vec::as_slice)
    }
}

impl<L, F> Clone for FlowMapProps<L, F> {
    fn clone(&self) -> Self {
        Self {
            locations: self.locations.clone(),
            flows: self.flows.clone(),
            location_accessors: self.location_accessors.clone(),
            flow_accessors: self.flow_accessors.clone(),
            config: self.config.clone(),
            update_triggers: self.update_triggers,
        }
    }
}

impl<L, F> std::fmt::Debug for FlowMapProps<L, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowMapProps")
            .field("locations", &self.locations.as_ref().map(|l| l.len()))
            .field("flows", &self.flows.as_ref().map(|f| f.len()))
            .field("config", &self.config)
            .field("update_triggers", &self.update_triggers)
            .finish_non_exhaustive()
    }
}

fn same_arc<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// What changed between two sets of props.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChangeFlags {
    /// Location set or the meaning of its id/centroid extraction
    pub locations_changed: bool,
    /// Flow set or the meaning of its origin/dest/magnitude extraction
    pub flows_changed: bool,
    /// Options the clustering index was built with
    pub cluster_options_changed: bool,
}

impl ChangeFlags {
    /// Compare `new` against the previously applied props. Everything counts
    /// as changed on the first update.
    pub fn between<L, F>(old: Option<&FlowMapProps<L, F>>, new: &FlowMapProps<L, F>) -> Self {
        let Some(old) = old else {
            return Self {
                locations_changed: true,
                flows_changed: true,
                cluster_options_changed: true,
            };
        };
        let (ot, nt) = (&old.update_triggers, &new.update_triggers);

        Self {
            locations_changed: !same_arc(&old.locations, &new.locations)
                || ot.get_location_id != nt.get_location_id
                || ot.get_location_centroid != nt.get_location_centroid,
            flows_changed: !same_arc(&old.flows, &new.flows)
                || ot.get_flow_origin_id != nt.get_flow_origin_id
                || ot.get_flow_dest_id != nt.get_flow_dest_id
                || ot.get_flow_magnitude != nt.get_flow_magnitude,
            cluster_options_changed: old.config != new.config,
        }
    }

    pub fn any(&self) -> bool {
        self.locations_changed || self.flows_changed || self.cluster_options_changed
    }
}
