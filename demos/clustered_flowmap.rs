//! Clustered flow map over a handful of US counties.
//!
//! Loads locations from GeoJSON and flows from JSON, then sweeps the zoom
//! range to show clusters forming and splitting.
//!
//! Run with: RUST_LOG=debug cargo run --example clustered_flowmap

use flowcluster::compute::geojson::{parse_flows, parse_locations, snapshot_to_geojson};
use flowcluster::prelude::*;

const COUNTIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "geometry": null, "properties": {"id": "06037", "name": "Los Angeles", "centroid": [-118.23, 34.32]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "06059", "name": "Orange", "centroid": [-117.76, 33.70]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "06073", "name": "San Diego", "centroid": [-116.74, 33.03]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "06075", "name": "San Francisco", "centroid": [-122.44, 37.76]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "17031", "name": "Cook", "centroid": [-87.82, 41.84]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "36047", "name": "Kings", "centroid": [-73.95, 40.64]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "36061", "name": "New York", "centroid": [-73.97, 40.78]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "34017", "name": "Hudson", "centroid": [-74.08, 40.73]}},
        {"type": "Feature", "geometry": null, "properties": {"id": "48201", "name": "Harris", "centroid": [-95.39, 29.86]}}
    ]
}"#;

const FLOWS: &str = r#"[
    {"origin": "06037", "dest": "36061", "count": 1600},
    {"origin": "06059", "dest": "36061", "count": 420},
    {"origin": "06073", "dest": "36047", "count": 310},
    {"origin": "06075", "dest": "17031", "count": 880},
    {"origin": "36047", "dest": "06037", "count": 1250},
    {"origin": "34017", "dest": "36061", "count": 4900},
    {"origin": "36061", "dest": "34017", "count": 3700},
    {"origin": "48201", "dest": "06037", "count": 760},
    {"origin": "17031", "dest": "48201", "count": 530},
    {"origin": "06037", "dest": "06059", "count": 2100},
    {"origin": "06037", "dest": "99999", "count": 10}
]"#;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Clustered Flow Map ===\n");

    let locations = parse_locations(COUNTIES)?;
    let flows = parse_flows(FLOWS)?;
    println!("Loaded {} locations and {} flows", locations.len(), flows.len());

    let config = ClusterConfig::default()
        .with_cluster_radius(40.0)
        .with_max_zoom(8);
    let props = FlowMapProps::new(LocationAccessors::default(), FlowAccessors::default())
        .with_locations(locations)
        .with_flows(flows)
        .with_config(config);

    let mut layer: FlowMapLayer<Location, Flow> = FlowMapLayer::new(true);

    println!("\n1. Zoom sweep");
    for zoom in 0..=9 {
        layer.update_state(props.clone(), f64::from(zoom))?;
        let Some(data) = layer.render_data() else {
            continue;
        };

        let points = data.location_points();
        let flows = data.rendered_flows();
        let total: f64 = flows.iter().map(|flow| flow.magnitude).sum();
        println!(
            "   zoom {:>2}: {:>2} points, {:>2} flows, total {:>6} ({})",
            zoom,
            points.len(),
            flows.len(),
            total,
            if data.is_clustered() { "clustered" } else { "unclustered" }
        );
    }

    println!("\n2. Busiest flows at zoom 4");
    layer.update_state(props.clone(), 4.0)?;
    if let Some(data) = layer.render_data() {
        let mut flows = data.rendered_flows();
        flows.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        for flow in flows.iter().take(5) {
            println!("   {} -> {}: {}", flow.origin_id, flow.dest_id, flow.magnitude);
        }
    }

    if let FlowMapLayer::Clustered(clustered) = &layer {
        if let Some(snapshot) = clustered.snapshot() {
            println!("\n3. Clusters at zoom {}", snapshot.zoom);
            for point in snapshot.locations.iter().filter(|point| point.is_cluster()) {
                println!("   {} <- {:?}", point.id(), point.members());
            }

            let geojson = snapshot_to_geojson(snapshot)?;
            println!("\n   GeoJSON export: {} bytes", geojson.len());
        }
    }

    println!("\n4. Plain layer for comparison");
    let mut plain: FlowMapLayer<Location, Flow> = FlowMapLayer::new(false);
    plain.update_state(props, 4.0)?;
    if let Some(data) = plain.render_data() {
        println!(
            "   {} points, {} flows",
            data.location_points().len(),
            data.rendered_flows().len()
        );
    }

    Ok(())
}
