use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use flowcluster::{
    BoundingBox2D, ClusterConfig, ClusterIndex, ClusteredFlowMapLayer, Flow, FlowAccessors,
    FlowMapProps, Location, LocationAccessors, LocationIdToClusterId, LocationPoint, Locations,
    aggregate_flows,
};
use std::sync::Arc;

/// Deterministic pseudo-random coordinates spread over the continental US.
fn synthetic_locations(count: usize) -> Vec<Location> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 1_000_000) as f64 / 1_000_000.0
    };
    (0..count)
        .map(|i| Location::new(format!("loc:{}", i), -124.0 + next() * 57.0, 25.0 + next() * 24.0))
        .collect()
}

fn synthetic_flows(locations: usize, count: usize) -> Vec<Flow> {
    (0..count)
        .map(|i| {
            let origin = (i * 7919) % locations;
            let dest = (i * 104_729 + 13) % locations;
            Flow::new(
                format!("loc:{}", origin),
                format!("loc:{}", dest),
                (i % 97) as f64,
            )
        })
        .collect()
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for size in [1_000, 10_000] {
        let points: Vec<LocationPoint> = synthetic_locations(size)
            .iter()
            .map(LocationPoint::from)
            .collect();

        group.bench_with_input(BenchmarkId::new("load", size), &points, |b, points| {
            b.iter(|| {
                ClusterIndex::load(ClusterConfig::default(), black_box(points.clone())).unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    let points: Vec<LocationPoint> = synthetic_locations(10_000)
        .iter()
        .map(LocationPoint::from)
        .collect();
    let index = ClusterIndex::load(ClusterConfig::default(), points).unwrap();

    for zoom in [2, 6, 10] {
        group.bench_with_input(BenchmarkId::new("world_clusters", zoom), &zoom, |b, &zoom| {
            b.iter(|| index.get_clusters(black_box(&BoundingBox2D::WORLD), zoom))
        });
    }

    let regional = BoundingBox2D::new(-80.0, 35.0, -70.0, 45.0);
    group.bench_function("regional_clusters_z6", |b| {
        b.iter(|| index.get_clusters(black_box(&regional), 6))
    });

    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    let flows = synthetic_flows(1_000, 50_000);
    let accessors = FlowAccessors::default();
    let table: LocationIdToClusterId = (0..1_000)
        .map(|i| (format!("loc:{}", i), format!("_sc_{}", i % 40)))
        .collect();

    group.bench_function("aggregate_50k_flows", |b| {
        b.iter(|| aggregate_flows(black_box(&flows), &accessors, &table))
    });

    group.finish();
}

fn benchmark_layer_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("layer_updates");

    let locations = Arc::new(Locations::from(synthetic_locations(3_000)));
    let flows = Arc::new(synthetic_flows(3_000, 20_000));
    let props = || {
        let mut props = FlowMapProps::new(LocationAccessors::default(), FlowAccessors::default())
            .with_config(ClusterConfig::default().with_max_zoom(8));
        props.locations = Some(Arc::clone(&locations));
        props.flows = Some(Arc::clone(&flows));
        props
    };

    group.bench_function("cold_zoom_sweep", |b| {
        b.iter(|| {
            let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();
            for zoom in 0..=8 {
                layer.update_state(props(), f64::from(zoom)).unwrap();
            }
            layer.cache().len()
        })
    });

    let mut warm: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();
    for zoom in 0..=8 {
        warm.update_state(props(), f64::from(zoom)).unwrap();
    }
    group.bench_function("cached_zoom", |b| {
        b.iter(|| warm.update_state(props(), black_box(4.2)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_queries,
    benchmark_aggregation,
    benchmark_layer_updates
);
criterion_main!(benches);
