use flowcluster::{
    AggregatedFlow, BoundingBox2D, ClusterConfig, ClusterEntry, ClusterIndex,
    ClusteredFlowMapLayer, Flow, FlowAccessors, FlowClusterError, FlowMapProps, Location,
    LocationAccessors, LocationIndex, LocationPoint, Locations, Point, Result, UpdateTriggers,
    is_synthetic_id,
};
use std::cell::Cell;
use std::sync::Arc;

thread_local! {
    static BUILDS: Cell<usize> = const { Cell::new(0) };
}

fn builds() -> usize {
    BUILDS.with(Cell::get)
}

/// Real index that counts how often it is built on the current thread.
#[derive(Debug)]
struct CountingIndex(ClusterIndex);

impl LocationIndex for CountingIndex {
    fn build(config: &ClusterConfig, points: Vec<LocationPoint>) -> Result<Self> {
        BUILDS.with(|builds| builds.set(builds.get() + 1));
        Ok(Self(ClusterIndex::build(config, points)?))
    }

    fn get_clusters(&self, bbox: &BoundingBox2D, zoom: i32) -> Vec<ClusterEntry> {
        self.0.get_clusters(bbox, zoom)
    }

    fn get_leaves(
        &self,
        cluster_id: u64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocationPoint>> {
        LocationIndex::get_leaves(&self.0, cluster_id, limit, offset)
    }
}

/// Index that always merges `A` and `B` into cluster 1.
#[derive(Debug)]
struct FixedIndex {
    points: Vec<LocationPoint>,
}

impl FixedIndex {
    fn is_member(point: &LocationPoint) -> bool {
        point.id == "A" || point.id == "B"
    }
}

impl LocationIndex for FixedIndex {
    fn build(_config: &ClusterConfig, points: Vec<LocationPoint>) -> Result<Self> {
        Ok(Self { points })
    }

    fn get_clusters(&self, _bbox: &BoundingBox2D, _zoom: i32) -> Vec<ClusterEntry> {
        let mut entries = vec![ClusterEntry::Cluster {
            cluster_id: 1,
            coordinates: Point::new(-99.75, 40.1),
            point_count: 2,
        }];
        entries.extend(
            self.points
                .iter()
                .filter(|point| !Self::is_member(point))
                .cloned()
                .map(ClusterEntry::Leaf),
        );
        entries
    }

    fn get_leaves(
        &self,
        cluster_id: u64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocationPoint>> {
        if cluster_id != 1 {
            return Err(FlowClusterError::ClusterNotFound(cluster_id));
        }
        Ok(self
            .points
            .iter()
            .filter(|point| Self::is_member(point))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Index reporting one cluster whose leaves cannot be found.
#[derive(Debug)]
struct UnresolvableIndex;

impl LocationIndex for UnresolvableIndex {
    fn build(_config: &ClusterConfig, _points: Vec<LocationPoint>) -> Result<Self> {
        Ok(Self)
    }

    fn get_clusters(&self, _bbox: &BoundingBox2D, _zoom: i32) -> Vec<ClusterEntry> {
        vec![ClusterEntry::Cluster {
            cluster_id: 9,
            coordinates: Point::new(0.0, 0.0),
            point_count: 2,
        }]
    }

    fn get_leaves(
        &self,
        cluster_id: u64,
        _limit: usize,
        _offset: usize,
    ) -> Result<Vec<LocationPoint>> {
        Err(FlowClusterError::ClusterNotFound(cluster_id))
    }
}

fn locations() -> Arc<Locations<Location>> {
    Arc::new(Locations::from(vec![
        Location::new("A", -100.0, 40.0),
        Location::new("B", -99.5, 40.2),
        Location::new("C", 10.0, 50.0),
        Location::new("D", -40.0, -20.0),
    ]))
}

fn flows() -> Arc<Vec<Flow>> {
    Arc::new(vec![
        Flow::new("A", "B", 5.0),
        Flow::new("A", "B", 3.0),
        Flow::new("C", "D", 2.0),
        Flow::new("A", "C", 1.0),
        Flow::new("B", "C", 4.0),
    ])
}

fn props(
    locations: &Arc<Locations<Location>>,
    flows: &Arc<Vec<Flow>>,
) -> FlowMapProps<Location, Flow> {
    let mut props = FlowMapProps::new(LocationAccessors::default(), FlowAccessors::default())
        .with_config(ClusterConfig::default().with_max_zoom(8));
    props.locations = Some(Arc::clone(locations));
    props.flows = Some(Arc::clone(flows));
    props
}

#[test]
fn test_same_zoom_twice_is_pointer_equal() {
    let (locations, flows) = (locations(), flows());
    let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();

    layer.update_state(props(&locations, &flows), 3.0).unwrap();
    let first = Arc::clone(layer.snapshot().unwrap());

    layer.update_state(props(&locations, &flows), 3.2).unwrap();
    let second = Arc::clone(layer.snapshot().unwrap());
    assert!(Arc::ptr_eq(&first, &second));

    // Zooming away and back serves the cached level.
    layer.update_state(props(&locations, &flows), 6.0).unwrap();
    layer.update_state(props(&locations, &flows), 2.6).unwrap();
    assert!(Arc::ptr_eq(&first, layer.snapshot().unwrap()));
    assert_eq!(layer.cache().zoom_levels().collect::<Vec<_>>(), vec![3, 6]);
}

#[test]
fn test_flow_change_clears_cache_but_keeps_index() {
    let (locations, flows) = (locations(), flows());
    let mut layer: ClusteredFlowMapLayer<Location, Flow, CountingIndex> =
        ClusteredFlowMapLayer::new();

    let before = builds();
    layer.update_state(props(&locations, &flows), 2.0).unwrap();
    layer.update_state(props(&locations, &flows), 4.0).unwrap();
    assert_eq!(builds() - before, 1);
    assert_eq!(layer.cache().len(), 2);
    let stale = Arc::clone(layer.snapshot().unwrap());

    let new_flows = Arc::new(vec![Flow::new("A", "C", 10.0)]);
    layer.update_state(props(&locations, &new_flows), 4.0).unwrap();

    assert_eq!(builds() - before, 1);
    assert_eq!(layer.cache().zoom_levels().collect::<Vec<_>>(), vec![4]);
    assert!(!Arc::ptr_eq(&stale, layer.snapshot().unwrap()));
    assert_eq!(layer.snapshot().unwrap().total_magnitude(), 10.0);
}

#[test]
fn test_location_change_rebuilds_index_and_clears_cache() {
    let (locations, flows) = (locations(), flows());
    let mut layer: ClusteredFlowMapLayer<Location, Flow, CountingIndex> =
        ClusteredFlowMapLayer::new();

    let before = builds();
    layer.update_state(props(&locations, &flows), 2.0).unwrap();
    layer.update_state(props(&locations, &flows), 5.0).unwrap();
    assert_eq!(layer.cache().len(), 2);

    // Same contents, new reference: still a change.
    let moved = Arc::new(Locations::from(locations.items().to_vec()));
    layer.update_state(props(&moved, &flows), 5.0).unwrap();

    assert_eq!(builds() - before, 2);
    assert_eq!(layer.cache().zoom_levels().collect::<Vec<_>>(), vec![5]);

    // Same reference, but the centroid or id accessor changed meaning.
    layer.update_state(props(&moved, &flows), 3.0).unwrap();
    let centroid_bumped = props(&moved, &flows).with_update_triggers(UpdateTriggers {
        get_location_centroid: 1,
        ..UpdateTriggers::default()
    });
    layer.update_state(centroid_bumped, 3.0).unwrap();
    assert_eq!(builds() - before, 3);
    assert_eq!(layer.cache().zoom_levels().collect::<Vec<_>>(), vec![3]);

    let id_bumped = props(&moved, &flows).with_update_triggers(UpdateTriggers {
        get_location_centroid: 1,
        get_location_id: 1,
        ..UpdateTriggers::default()
    });
    layer.update_state(id_bumped, 3.0).unwrap();
    assert_eq!(builds() - before, 4);
}

#[test]
fn test_failed_update_keeps_previous_state() {
    let (locations, flows) = (locations(), flows());
    let mut layer: ClusteredFlowMapLayer<Location, Flow, UnresolvableIndex> =
        ClusteredFlowMapLayer::new();

    let err = layer.update_state(props(&locations, &flows), 3.0).unwrap_err();
    assert!(matches!(err, FlowClusterError::ClusterNotFound(9)));
    assert!(layer.location_index().is_none());
    assert!(layer.props().is_none());
    assert!(layer.zoom().is_none());
    assert!(layer.cache().is_empty());

    // Without flows no clusters are resolved, so this update succeeds.
    let mut no_flows = props(&locations, &flows);
    no_flows.flows = None;
    layer.update_state(no_flows, 2.0).unwrap();
    assert!(layer.location_index().is_some());

    let err = layer.update_state(props(&locations, &flows), 4.0);
    assert!(err.is_err());
    assert_eq!(layer.zoom(), Some(2));
    assert!(layer.props().unwrap().flows.is_none());
    assert!(layer.snapshot().is_none());
    assert!(layer.cache().is_empty());
    assert!(!layer.render_data().unwrap().is_clustered());
}

#[test]
fn test_aggregation_with_fixed_clusters() {
    let locations = locations();
    let flows = Arc::new(vec![
        Flow::new("A", "B", 5.0),
        Flow::new("A", "B", 3.0),
        Flow::new("C", "D", 2.0),
    ]);
    let mut layer: ClusteredFlowMapLayer<Location, Flow, FixedIndex> = ClusteredFlowMapLayer::new();
    layer.update_state(props(&locations, &flows), 3.0).unwrap();

    let snapshot = layer.snapshot().unwrap();
    assert_eq!(
        snapshot.flows,
        vec![
            AggregatedFlow::new("_sc_1", "_sc_1", 8.0),
            AggregatedFlow::new("C", "D", 2.0),
        ]
    );
    assert_eq!(snapshot.location("_sc_1").unwrap().point_count(), 2);
}

#[test]
fn test_magnitude_is_conserved_at_every_zoom() {
    let (locations, flows) = (locations(), flows());
    let mut flows_with_unknown = flows.as_ref().clone();
    flows_with_unknown.push(Flow::new("A", "nowhere", 100.0));
    let flows_with_unknown = Arc::new(flows_with_unknown);

    let expected: f64 = flows.iter().map(Flow::magnitude).sum();
    let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();

    for zoom in 0..=8 {
        layer
            .update_state(props(&locations, &flows_with_unknown), f64::from(zoom))
            .unwrap();
        let snapshot = layer.snapshot().unwrap();
        assert_eq!(snapshot.total_magnitude(), expected, "zoom {}", zoom);
    }
}

#[test]
fn test_above_max_zoom_renders_original_data() {
    let (locations, flows) = (locations(), flows());
    let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();
    layer.update_state(props(&locations, &flows), 9.0).unwrap();

    assert!(layer.snapshot().is_none());
    let data = layer.render_data().unwrap();
    assert!(!data.is_clustered());

    let ids: Vec<String> = data.location_points().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["A", "B", "C", "D"]);
    let rendered = data.rendered_flows();
    assert_eq!(rendered.len(), flows.len());
    assert!(rendered.iter().all(|flow| !is_synthetic_id(&flow.origin_id)));
}

#[test]
fn test_output_ids_are_synthetic_or_original() {
    let (locations, flows) = (locations(), flows());
    let originals: Vec<&str> = locations.items().iter().map(|l| l.id.as_str()).collect();
    let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();

    for zoom in 0..=8 {
        layer.update_state(props(&locations, &flows), f64::from(zoom)).unwrap();
        let snapshot = layer.snapshot().unwrap();

        for point in &snapshot.locations {
            if point.is_cluster() {
                assert!(is_synthetic_id(point.id()));
            } else {
                assert!(originals.contains(&point.id()));
            }
        }
        for flow in &snapshot.flows {
            assert!(snapshot.location(&flow.origin_id).is_some());
            assert!(snapshot.location(&flow.dest_id).is_some());
        }
    }
}

#[test]
fn test_flows_inside_a_cluster_become_one_self_loop() {
    let locations = locations();
    let flows = Arc::new(vec![
        Flow::new("A", "B", 5.0),
        Flow::new("B", "A", 2.0),
        Flow::new("A", "A", 1.0),
    ]);
    let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();
    layer.update_state(props(&locations, &flows), 3.0).unwrap();

    let snapshot = layer.snapshot().unwrap();
    assert_eq!(snapshot.flows.len(), 1);
    let flow = &snapshot.flows[0];
    assert!(flow.is_self_loop());
    assert!(is_synthetic_id(&flow.origin_id));
    assert_eq!(flow.magnitude, 8.0);
}

#[test]
fn test_clusters_split_as_zoom_increases() {
    let (locations, flows) = (locations(), flows());
    let mut layer: ClusteredFlowMapLayer<Location, Flow> = ClusteredFlowMapLayer::new();

    layer.update_state(props(&locations, &flows), 5.0).unwrap();
    assert_eq!(layer.snapshot().unwrap().locations.len(), 3);

    layer.update_state(props(&locations, &flows), 6.0).unwrap();
    let snapshot = layer.snapshot().unwrap();
    assert_eq!(snapshot.locations.len(), 4);
    assert_eq!(snapshot.flow("A", "B").unwrap().magnitude, 8.0);
    assert_eq!(snapshot.flow("B", "C").unwrap().magnitude, 4.0);
}
