//! GeoJSON feature-collection schema for the region dataset
//!
//! Covers exactly the subset the country dataset uses: Polygon and
//! MultiPolygon features with an `ADMIN` property (falling back to `NAME`).
//! Other geometry types are skipped with a warning rather than rejected,
//! so the loader tolerates stray point features in hand-edited datasets.

use serde::Deserialize;
use serde_json::Value;

use geo_types::{Coord, LineString, MultiPolygon, Polygon};

use crate::core::error::{DominionError, LoadError, Result};
use crate::regions::{Region, UNKNOWN_REGION};

/// A GeoJSON position: `[lon, lat]`, possibly with a trailing altitude.
type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

impl Feature {
    /// `ADMIN`, then `NAME`, then the Unknown sentinel - the dataset's
    /// own property conventions.
    fn name(&self) -> String {
        for key in ["ADMIN", "NAME"] {
            if let Some(Value::String(name)) = self.properties.get(key) {
                return name.clone();
            }
        }
        UNKNOWN_REGION.to_string()
    }
}

/// Parse a GeoJSON document into the region set, validating every ring.
pub fn regions_from_str(text: &str) -> Result<Vec<Region>> {
    let collection: FeatureCollection = serde_json::from_str(text)?;

    let mut regions = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        let name = feature.name();
        let boundary = match &feature.geometry {
            Some(Geometry::Polygon { coordinates }) => {
                MultiPolygon(vec![polygon(&name, coordinates)?])
            }
            Some(Geometry::MultiPolygon { coordinates }) => {
                let polys = coordinates
                    .iter()
                    .map(|rings| polygon(&name, rings))
                    .collect::<std::result::Result<Vec<_>, LoadError>>()?;
                MultiPolygon(polys)
            }
            Some(Geometry::Unsupported) | None => {
                tracing::warn!(region = %name, "skipping feature without polygon geometry");
                continue;
            }
        };
        regions.push(Region::new(name, boundary));
    }
    Ok(regions)
}

fn polygon(name: &str, rings: &[Vec<Position>]) -> std::result::Result<Polygon<f64>, LoadError> {
    let mut converted = rings.iter().map(|r| ring(name, r));
    let exterior = converted.next().ok_or_else(|| LoadError::DegenerateRing {
        region: name.to_string(),
        count: 0,
    })??;
    let interiors = converted.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring(name: &str, positions: &[Position]) -> std::result::Result<LineString<f64>, LoadError> {
    if positions.len() < 4 {
        return Err(LoadError::DegenerateRing {
            region: name.to_string(),
            count: positions.len(),
        });
    }
    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        let (x, y) = match (position.first(), position.get(1)) {
            (Some(&x), Some(&y)) => (x, y),
            _ => {
                return Err(LoadError::Malformed(format!(
                    "region {name:?}: position with fewer than 2 components"
                )))
            }
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(LoadError::NonFiniteCoordinate {
                region: name.to_string(),
            });
        }
        coords.push(Coord { x, y });
    }
    // geo's Polygon constructor silently closes open rings; reject them
    // here instead so malformed data surfaces as a LoadError.
    if coords.first() != coords.last() {
        return Err(LoadError::OpenRing {
            region: name.to_string(),
        });
    }
    Ok(LineString::from(coords))
}

/// Convenience wrapper used by the binary: parse, then reject an unusable
/// dataset early.
pub fn load_regions(text: &str) -> Result<Vec<Region>> {
    let regions = regions_from_str(text)?;
    if regions.is_empty() {
        return Err(DominionError::Load(LoadError::EmptyDataset));
    }
    Ok(regions)
}
