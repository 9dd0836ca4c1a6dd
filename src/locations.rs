//! Location collections and construction of the clustering index.
//!
//! A flow map accepts its locations either as a plain sequence of records or
//! as a feature collection, in which case the feature list is used.

use crate::accessors::LocationAccessors;
use crate::compute::cluster_index::LocationIndex;
use crate::config::ClusterConfig;
use crate::error::Result;
use flowcluster_types::location::LocationPoint;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// The location input of a flow map.
#[derive(Debug, Clone, PartialEq)]
pub enum Locations<L> {
    Sequence(Vec<L>),
    /// Features of a `{"type": "FeatureCollection", "features": [...]}` object
    FeatureCollection(Vec<L>),
}

impl<L> Locations<L> {
    /// The location records, whichever form they came in.
    pub fn items(&self) -> &[L] {
        match self {
            Locations::Sequence(items) | Locations::FeatureCollection(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

impl<L> From<Vec<L>> for Locations<L> {
    fn from(items: Vec<L>) -> Self {
        Locations::Sequence(items)
    }
}

impl From<geojson::FeatureCollection> for Locations<geojson::Feature> {
    fn from(collection: geojson::FeatureCollection) -> Self {
        Locations::FeatureCollection(collection.features)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLocations<L> {
    Collection {
        #[serde(rename = "type")]
        kind: String,
        features: Vec<L>,
    },
    Sequence(Vec<L>),
}

impl<'de, L: Deserialize<'de>> Deserialize<'de> for Locations<L> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RawLocations::<L>::deserialize(deserializer)? {
            RawLocations::Collection { kind, features } if kind == "FeatureCollection" => {
                Ok(Locations::FeatureCollection(features))
            }
            RawLocations::Collection { kind, .. } => Err(D::Error::custom(format!(
                "expected a FeatureCollection or an array of locations, got type `{}`",
                kind
            ))),
            RawLocations::Sequence(items) => Ok(Locations::Sequence(items)),
        }
    }
}

/// Extract the id and centroid of every location.
pub fn get_location_centroids<L>(
    locations: &Locations<L>,
    accessors: &LocationAccessors<L>,
) -> Vec<LocationPoint> {
    locations
        .items()
        .iter()
        .map(|location| {
            LocationPoint::new(
                accessors.location_id(location),
                accessors.location_centroid(location),
            )
        })
        .collect()
}

/// Build a clustering index over `locations`.
pub fn build_location_index<L, I: LocationIndex>(
    locations: &Locations<L>,
    accessors: &LocationAccessors<L>,
    config: &ClusterConfig,
) -> Result<I> {
    let points = get_location_centroids(locations, accessors);
    log::debug!(
        "Building location index: {} locations, radius {}, zoom {}..={}",
        points.len(),
        config.cluster_radius,
        config.min_zoom,
        config.max_zoom
    );
    I::build(config, points)
}
