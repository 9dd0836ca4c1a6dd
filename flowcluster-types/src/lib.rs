//! # flowcluster-types
//!
//! Core data types shared by the flowcluster crates.
//!
//! - **Inputs**: `Location`, `Flow`
//! - **Index points**: `LocationPoint`
//! - **Outputs**: `ClusterPoint`, `AggregatedFlow`
//! - **Query windows**: `BoundingBox2D`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use flowcluster_types::cluster::ClusterPoint;
//! use flowcluster_types::flow::Flow;
//! use geo::Point;
//!
//! let flow = Flow::new("nyc", "bos", 120.0);
//! assert_eq!(flow.magnitude(), 120.0);
//!
//! let cluster = ClusterPoint::cluster(
//!     97,
//!     Point::new(-73.5, 41.5),
//!     2,
//!     vec!["nyc".to_string(), "bos".to_string()],
//! );
//! assert_eq!(cluster.id(), "_sc_97");
//! ```

pub mod bbox;
pub mod cluster;
pub mod flow;
pub mod location;
