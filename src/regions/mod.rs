//! Region dataset and point-to-region resolution

pub mod dataset;
pub mod geojson;
pub mod index;

pub use index::{MatchPolicy, RegionIndex};

use geo_types::MultiPolygon;

/// Sentinel region name for points no boundary contains.
pub const UNKNOWN_REGION: &str = "Unknown";

/// A named polygonal area, loaded once and never mutated.
///
/// Names are not guaranteed unique across the dataset; lookups are by
/// containment, never by name.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// Boundary in geographic coordinates, (longitude, latitude) order.
    pub boundary: MultiPolygon<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, boundary: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            boundary,
        }
    }
}
