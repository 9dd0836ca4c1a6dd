use geo::Point;
use serde::{Deserialize, Serialize};

/// A longitude/latitude query window.
///
/// Unlike `geo::Rect`, corners are stored as given, so a box with
/// `min_lng > max_lng` can describe a window crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox2D {
    /// The whole Web-Mercator world, as queried by flow map clustering.
    pub const WORLD: Self = Self {
        min_lng: -180.0,
        min_lat: -85.0,
        max_lng: 180.0,
        max_lat: 85.0,
    };

    /// Create a new bounding box from corner coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowcluster_types::bbox::BoundingBox2D;
    ///
    /// let manhattan = BoundingBox2D::new(-74.0479, 40.6829, -73.9067, 40.8820);
    /// assert!(manhattan.is_finite());
    /// ```
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Whether every corner coordinate is finite.
    pub fn is_finite(&self) -> bool {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Whether the window wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lng > self.max_lng
    }

    /// Check if a point lies inside the window (edges inclusive).
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        let lat_ok = (self.min_lat..=self.max_lat).contains(&point.y());
        let lng_ok = if self.crosses_antimeridian() {
            point.x() >= self.min_lng || point.x() <= self.max_lng
        } else {
            (self.min_lng..=self.max_lng).contains(&point.x())
        };
        lat_ok && lng_ok
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::WORLD
    }
}
