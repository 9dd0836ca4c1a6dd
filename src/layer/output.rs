//! Data handed to the renderer.
//!
//! Both variants honour the same contract: a list of locations, a list of
//! flows and a way to read ids, coordinates and magnitudes from them.

use crate::accessors::{FlowAccessors, LocationAccessors};
use crate::compute::aggregate::ClusterSnapshot;
use crate::locations::Locations;
use geo::Point;
use std::sync::Arc;

/// A flow reduced to the fields the renderer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFlow {
    pub origin_id: String,
    pub dest_id: String,
    pub magnitude: f64,
}

/// Renderable flow map data.
pub enum FlowMapData<'a, L, F> {
    /// The caller's data, read through the caller's accessors.
    Unclustered {
        locations: Option<&'a Locations<L>>,
        flows: Option<&'a [F]>,
        location_accessors: &'a LocationAccessors<L>,
        flow_accessors: &'a FlowAccessors<F>,
    },
    /// Cluster points and aggregated flows, read field by field.
    Clustered(Arc<ClusterSnapshot>),
}

impl<L, F> FlowMapData<'_, L, F> {
    pub fn is_clustered(&self) -> bool {
        matches!(self, FlowMapData::Clustered(_))
    }

    pub fn snapshot(&self) -> Option<&Arc<ClusterSnapshot>> {
        match self {
            FlowMapData::Clustered(snapshot) => Some(snapshot),
            FlowMapData::Unclustered { .. } => None,
        }
    }

    /// `(id, coordinates)` of every location to draw.
    pub fn location_points(&self) -> Vec<(String, Point<f64>)> {
        match self {
            FlowMapData::Unclustered {
                locations,
                location_accessors,
                ..
            } => locations
                .map(|locations| {
                    locations
                        .items()
                        .iter()
                        .map(|location| {
                            (
                                location_accessors.location_id(location),
                                location_accessors.location_centroid(location),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default(),
            FlowMapData::Clustered(snapshot) => snapshot
                .locations
                .iter()
                .map(|point| (point.id().to_string(), point.coordinates()))
                .collect(),
        }
    }

    /// Every flow to draw.
    pub fn rendered_flows(&self) -> Vec<RenderedFlow> {
        match self {
            FlowMapData::Unclustered {
                flows,
                flow_accessors,
                ..
            } => flows
                .map(|flows| {
                    flows
                        .iter()
                        .map(|flow| RenderedFlow {
                            origin_id: flow_accessors.origin_id(flow),
                            dest_id: flow_accessors.dest_id(flow),
                            magnitude: flow_accessors.magnitude(flow),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            FlowMapData::Clustered(snapshot) => snapshot
                .flows
                .iter()
                .map(|flow| RenderedFlow {
                    origin_id: flow.origin_id.clone(),
                    dest_id: flow.dest_id.clone(),
                    magnitude: flow.magnitude,
                })
                .collect(),
        }
    }
}

impl<L, F> std::fmt::Debug for FlowMapData<'_, L, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowMapData::Unclustered {
                locations, flows, ..
            } => f
                .debug_struct("Unclustered")
                .field("locations", &locations.map(Locations::len))
                .field("flows", &flows.map(<[F]>::len))
                .finish(),
            FlowMapData::Clustered(snapshot) => f
                .debug_tuple("Clustered")
                .field(&snapshot.zoom)
                .finish(),
        }
    }
}
