use hazardmap_types::cartesian::Rect;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a request scoped to an area: the south-west and the north-east corners as
/// `[longitude, latitude]` pairs.
///
/// ```
/// use hazardmap::refresh::BboxQuery;
///
/// let query = BboxQuery::from([[152.0, -28.0], [153.5, -26.5]]);
/// assert_eq!(
///     serde_json::to_string(&query).unwrap(),
///     r#"{"corner1":[152.0,-28.0],"corner2":[153.5,-26.5]}"#
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BboxQuery {
    /// South-west corner.
    pub corner1: [f64; 2],
    /// North-east corner.
    pub corner2: [f64; 2],
}

impl BboxQuery {
    /// Query of a geographic bounding box, with longitude as `x` and latitude as `y`.
    pub fn from_geo_bbox(bbox: &Rect) -> Self {
        Self {
            corner1: [bbox.x_min(), bbox.y_min()],
            corner2: [bbox.x_max(), bbox.y_max()],
        }
    }

    /// The query as a JSON request body.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "corner1": self.corner1,
            "corner2": self.corner2,
        })
    }
}

impl From<[[f64; 2]; 2]> for BboxQuery {
    fn from([corner1, corner2]: [[f64; 2]; 2]) -> Self {
        Self { corner1, corner2 }
    }
}

impl From<BboxQuery> for [[f64; 2]; 2] {
    fn from(query: BboxQuery) -> Self {
        [query.corner1, query.corner2]
    }
}
