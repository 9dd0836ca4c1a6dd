//! GeoJSON loading of locations and flows, and export of clustered snapshots.

use crate::compute::aggregate::ClusterSnapshot;
use crate::error::{FlowClusterError, Result};
use crate::locations::Locations;
use flowcluster_types::cluster::ClusterKind;
use flowcluster_types::flow::Flow;
use flowcluster_types::location::Location;
use geo::Point;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

/// Parses a GeoJSON `FeatureCollection` into typed locations.
///
/// The id comes from `properties.id` (string or number) or the feature id,
/// the centroid from `properties.centroid` (`[lng, lat]`) or a Point geometry.
pub fn parse_locations(json: &str) -> Result<Locations<Location>> {
    let geojson: GeoJson = json
        .parse()
        .map_err(|e| FlowClusterError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => {
            let locations = collection
                .features
                .iter()
                .map(location_from_feature)
                .collect::<Result<Vec<_>>>()?;
            Ok(Locations::FeatureCollection(locations))
        }
        _ => Err(FlowClusterError::InvalidInput(
            "GeoJSON is not a FeatureCollection".to_string(),
        )),
    }
}

/// Converts one location feature.
pub fn location_from_feature(feature: &Feature) -> Result<Location> {
    let id = feature_id(feature)?;

    let centroid = match feature.property("centroid") {
        Some(centroid) => point_from_json(centroid).ok_or_else(|| {
            FlowClusterError::InvalidInput(format!(
                "Location {} has a malformed centroid property",
                id
            ))
        })?,
        None => match feature.geometry.as_ref().map(|geometry| &geometry.value) {
            Some(Value::Point(coords)) if coords.len() >= 2 => Point::new(coords[0], coords[1]),
            _ => {
                return Err(FlowClusterError::InvalidInput(format!(
                    "Location {} has neither a centroid property nor a Point geometry",
                    id
                )));
            }
        },
    };

    let name = feature
        .property("name")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    Ok(Location { id, centroid, name })
}

fn feature_id(feature: &Feature) -> Result<String> {
    match feature.property("id") {
        Some(JsonValue::String(id)) => return Ok(id.clone()),
        Some(JsonValue::Number(id)) => return Ok(id.to_string()),
        Some(other) => {
            return Err(FlowClusterError::InvalidInput(format!(
                "Location id must be a string or number, got {}",
                other
            )));
        }
        None => {}
    }

    match &feature.id {
        Some(Id::String(id)) => Ok(id.clone()),
        Some(Id::Number(id)) => Ok(id.to_string()),
        None => Err(FlowClusterError::InvalidInput(
            "Location feature has no id".to_string(),
        )),
    }
}

fn point_from_json(value: &JsonValue) -> Option<Point<f64>> {
    let coords = value.as_array()?;
    if coords.len() < 2 {
        return None;
    }
    Some(Point::new(coords[0].as_f64()?, coords[1].as_f64()?))
}

/// Parses a JSON array of flows.
pub fn parse_flows(json: &str) -> Result<Vec<Flow>> {
    Ok(serde_json::from_str(json)?)
}

/// Converts a snapshot's locations to Point features.
///
/// Every feature carries `id` and `cluster`; clusters add `point_count`.
pub fn snapshot_to_feature_collection(snapshot: &ClusterSnapshot) -> FeatureCollection {
    let features = snapshot
        .locations
        .iter()
        .map(|point| {
            let coordinates = point.coordinates();
            let mut properties = Map::new();
            properties.insert("id".to_string(), JsonValue::from(point.id()));
            properties.insert("cluster".to_string(), JsonValue::from(point.is_cluster()));
            if let ClusterKind::Cluster {
                cluster_id,
                point_count,
                ..
            } = point.kind()
            {
                properties.insert("cluster_id".to_string(), JsonValue::from(*cluster_id));
                properties.insert("point_count".to_string(), JsonValue::from(*point_count));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    coordinates.x(),
                    coordinates.y(),
                ]))),
                id: Some(Id::String(point.id().to_string())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Serializes a snapshot's locations as a GeoJSON string.
pub fn snapshot_to_geojson(snapshot: &ClusterSnapshot) -> Result<String> {
    Ok(serde_json::to_string(&snapshot_to_feature_collection(
        snapshot,
    ))?)
}
