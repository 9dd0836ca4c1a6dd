use serde::{Deserialize, Serialize};

/// A directed movement volume between two locations.
///
/// Deserializes from either `{"origin", "dest", "count"}` records or
/// `{"originId", "destId", "magnitude"}` records. A missing magnitude reads
/// as zero.
///
/// # Examples
///
/// ```
/// use flowcluster_types::flow::Flow;
///
/// let flow: Flow = serde_json::from_str(r#"{"origin":"a","dest":"b"}"#).unwrap();
/// assert_eq!(flow.origin_id, "a");
/// assert_eq!(flow.magnitude(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(alias = "origin")]
    pub origin_id: String,
    #[serde(alias = "dest")]
    pub dest_id: String,
    #[serde(default, alias = "count", skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
}

impl Flow {
    pub fn new(origin_id: impl Into<String>, dest_id: impl Into<String>, magnitude: f64) -> Self {
        Self {
            origin_id: origin_id.into(),
            dest_id: dest_id.into(),
            magnitude: Some(magnitude),
        }
    }

    /// Magnitude of the flow, zero when absent.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.magnitude.unwrap_or(0.0)
    }
}

/// A flow between two cluster points, summed over every original flow that
/// maps onto the same ordered pair of endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedFlow {
    pub origin_id: String,
    pub dest_id: String,
    pub magnitude: f64,
}

impl AggregatedFlow {
    pub fn new(origin_id: impl Into<String>, dest_id: impl Into<String>, magnitude: f64) -> Self {
        Self {
            origin_id: origin_id.into(),
            dest_id: dest_id.into(),
            magnitude,
        }
    }

    /// True when both endpoints collapsed into the same point.
    pub fn is_self_loop(&self) -> bool {
        self.origin_id == self.dest_id
    }
}
