//! Compute layer for clustering and aggregation.
//!
//! This module separates the data processing from the layer's state handling.
//! It provides:
//! - Web-Mercator projection helpers
//! - The hierarchical location clustering index
//! - Per-zoom flow aggregation and its cache
//! - GeoJSON import/export
//!
//! Nothing here knows about change detection; the layer decides when to call in.

pub mod aggregate;
pub mod cluster_index;
pub mod geojson;
pub mod projection;
