use geo::Point;
use serde::{Deserialize, Serialize};

/// A named place with a representative centroid.
///
/// This is the stock location record; any other record type can be used with
/// the flow map as long as id and centroid accessors are supplied for it.
///
/// # Examples
///
/// ```
/// use flowcluster_types::location::Location;
///
/// let nyc = Location::new("36061", -73.97, 40.78).with_name("New York County");
/// assert_eq!(nyc.id, "36061");
/// assert_eq!(nyc.centroid.x(), -73.97);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    /// Longitude/latitude centroid
    pub centroid: Point<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    pub fn new(id: impl Into<String>, lng: f64, lat: f64) -> Self {
        Self {
            id: id.into(),
            centroid: Point::new(lng, lat),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A location reduced to what the clustering index stores: its id and centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub id: String,
    pub centroid: Point<f64>,
}

impl LocationPoint {
    pub fn new(id: impl Into<String>, centroid: Point<f64>) -> Self {
        Self {
            id: id.into(),
            centroid,
        }
    }
}

impl From<&Location> for LocationPoint {
    fn from(location: &Location) -> Self {
        Self::new(location.id.clone(), location.centroid)
    }
}
