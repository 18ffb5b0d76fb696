//! Point-to-region resolution over the loaded boundary set
//!
//! Containment queries run in two stages: an R-tree over boundary
//! envelopes rejects most regions per query, then the surviving candidates
//! get an exact winding-number containment test. The index is immutable
//! after construction, so queries may run concurrently.

use geo::{BoundingRect, Contains};
use geo_types::Point;
use rstar::{RTree, RTreeObject, AABB};

use crate::core::error::{LoadError, ResolutionError};
use crate::regions::Region;

/// What to do when more than one boundary contains a query point.
///
/// Country datasets carry overlaps (coastal slivers, disputed
/// territories), so the answer for such points depends on policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Resolve to the first containing boundary in dataset order. The
    /// result is order-dependent by contract, not by accident.
    #[default]
    FirstMatch,
    /// Treat a point contained by two boundaries as a per-point
    /// resolution error. Useful for pinning dataset quality in tests.
    ErrorOnOverlap,
}

/// Bounding-box entry for the coarse pre-filter. `slot` preserves dataset
/// order, which `MatchPolicy::FirstMatch` resolves by.
struct BoundaryEnvelope {
    slot: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for BoundaryEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> AABB<[f64; 2]> {
        self.aabb
    }
}

/// Immutable containment index over the named boundary set.
pub struct RegionIndex {
    regions: Vec<Region>,
    tree: RTree<BoundaryEnvelope>,
    policy: MatchPolicy,
}

impl RegionIndex {
    /// Build with the default first-match overlap policy.
    pub fn build(regions: Vec<Region>) -> Result<Self, LoadError> {
        Self::with_policy(regions, MatchPolicy::default())
    }

    pub fn with_policy(regions: Vec<Region>, policy: MatchPolicy) -> Result<Self, LoadError> {
        if regions.is_empty() {
            return Err(LoadError::EmptyDataset);
        }

        let mut envelopes = Vec::with_capacity(regions.len());
        for (slot, region) in regions.iter().enumerate() {
            validate_boundary(region)?;
            let rect = region
                .boundary
                .bounding_rect()
                .ok_or_else(|| LoadError::DegenerateRing {
                    region: region.name.clone(),
                    count: 0,
                })?;
            envelopes.push(BoundaryEnvelope {
                slot,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            });
        }

        Ok(Self {
            regions,
            tree: RTree::bulk_load(envelopes),
            policy,
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Which region contains the point, if any.
    ///
    /// `Ok(None)` is the normal miss outcome, including for finite but
    /// out-of-range coordinates: such input is accepted, not normalized,
    /// and simply matches nothing. Non-finite input is a per-point error.
    pub fn locate(&self, lat: f64, lon: f64) -> Result<Option<&str>, ResolutionError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ResolutionError::NonFiniteCoordinates { lat, lon });
        }

        let point = Point::new(lon, lat);
        let probe = AABB::from_point([lon, lat]);

        let mut hit: Option<usize> = None;
        for envelope in self.tree.locate_in_envelope_intersecting(&probe) {
            if !self.regions[envelope.slot].boundary.contains(&point) {
                continue;
            }
            match (self.policy, hit) {
                (MatchPolicy::FirstMatch, Some(existing)) => {
                    hit = Some(existing.min(envelope.slot));
                }
                (MatchPolicy::ErrorOnOverlap, Some(existing)) => {
                    let (a, b) = (existing.min(envelope.slot), existing.max(envelope.slot));
                    return Err(ResolutionError::AmbiguousContainment {
                        lat,
                        lon,
                        first: self.regions[a].name.clone(),
                        second: self.regions[b].name.clone(),
                    });
                }
                (_, None) => hit = Some(envelope.slot),
            }
        }
        Ok(hit.map(|slot| self.regions[slot].name.as_str()))
    }
}

/// Construction-time boundary validation: every ring closed, at least 4
/// positions, all coordinates finite.
fn validate_boundary(region: &Region) -> Result<(), LoadError> {
    for polygon in &region.boundary.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors().iter()) {
            if ring.0.len() < 4 {
                return Err(LoadError::DegenerateRing {
                    region: region.name.clone(),
                    count: ring.0.len(),
                });
            }
            if ring.0.first() != ring.0.last() {
                return Err(LoadError::OpenRing {
                    region: region.name.clone(),
                });
            }
            if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(LoadError::NonFiniteCoordinate {
                    region: region.name.clone(),
                });
            }
        }
    }
    Ok(())
}
