//! Clustering configuration.
//!
//! Mirrors the options a flow map exposes for its clustering index. All fields
//! have defaults, so an empty JSON object is a valid configuration.
use crate::error::{FlowClusterError, Result};

/// Highest `max_zoom` the cluster id encoding can represent.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Options of the location clustering index.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// Merge radius in pixels; larger values merge more aggressively.
    #[serde(default = "ClusterConfig::default_cluster_radius")]
    pub cluster_radius: f64,

    /// Lowest zoom level at which clusters are generated.
    #[serde(default)]
    pub min_zoom: u8,

    /// Highest zoom level at which clusters are generated. Above it the flow
    /// map renders unclustered data.
    #[serde(default = "ClusterConfig::default_max_zoom")]
    pub max_zoom: u8,

    /// Tile extent the radius is measured against.
    #[serde(default = "ClusterConfig::default_extent")]
    pub extent: u32,

    /// Minimum number of points needed to form a cluster.
    #[serde(default = "ClusterConfig::default_min_points")]
    pub min_points: usize,
}

impl ClusterConfig {
    const fn default_cluster_radius() -> f64 {
        40.0
    }

    const fn default_max_zoom() -> u8 {
        16
    }

    const fn default_extent() -> u32 {
        512
    }

    const fn default_min_points() -> usize {
        2
    }

    pub fn with_cluster_radius(mut self, radius: f64) -> Self {
        self.cluster_radius = radius;
        self
    }

    pub fn with_min_zoom(mut self, zoom: u8) -> Self {
        self.min_zoom = zoom;
        self
    }

    pub fn with_max_zoom(mut self, zoom: u8) -> Self {
        self.max_zoom = zoom;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Merge radius in normalized Web-Mercator units at `zoom`.
    pub fn radius_at(&self, zoom: u8) -> f64 {
        self.cluster_radius / (f64::from(self.extent) * 2f64.powi(i32::from(zoom)))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cluster_radius.is_finite() || self.cluster_radius <= 0.0 {
            return Err(FlowClusterError::InvalidConfig(format!(
                "cluster_radius must be positive and finite, got: {}",
                self.cluster_radius
            )));
        }

        if self.min_zoom > self.max_zoom {
            return Err(FlowClusterError::InvalidConfig(format!(
                "min_zoom ({}) must be <= max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }

        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(FlowClusterError::InvalidConfig(format!(
                "max_zoom must be <= {}, got: {}",
                MAX_SUPPORTED_ZOOM, self.max_zoom
            )));
        }

        if self.extent == 0 {
            return Err(FlowClusterError::InvalidConfig(
                "extent must be greater than zero".to_string(),
            ));
        }

        if self.min_points == 0 {
            return Err(FlowClusterError::InvalidConfig(
                "min_points must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClusterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: ClusterConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_radius: Self::default_cluster_radius(),
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            extent: Self::default_extent(),
            min_points: Self::default_min_points(),
        }
    }
}
