//! Event -> ResolvedEvent pass over the region index
//!
//! Stateless aside from the index reference. Lookups are independent per
//! event, so they run on the rayon pool; results come back in input order,
//! which the dominance fold depends on.
//!
//! Failure policy is skip-and-continue: an event whose coordinates cannot
//! be evaluated is dropped entirely - it scores nothing, region-wise or
//! total-wise - counted, and logged. One malformed coordinate must not
//! abort the whole timeline.

use rayon::prelude::*;

use crate::core::error::ResolutionError;
use crate::ingest::Event;
use crate::regions::{RegionIndex, UNKNOWN_REGION};

/// An event with its containing region attached: either a name present in
/// the index or the Unknown sentinel, never absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub event: Event,
    pub region: String,
}

impl ResolvedEvent {
    pub fn is_unknown(&self) -> bool {
        self.region == UNKNOWN_REGION
    }
}

/// Output of the resolver pass.
pub struct Resolution {
    /// Resolved events, in input stream order.
    pub events: Vec<ResolvedEvent>,
    /// Events dropped under the skip-and-continue policy.
    pub dropped: u64,
}

pub struct Resolver<'a> {
    index: &'a RegionIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a RegionIndex) -> Self {
        Self { index }
    }

    fn resolve_one(&self, event: Event) -> Result<ResolvedEvent, (Event, ResolutionError)> {
        // The index accepts out-of-range points as plain misses; the
        // resolver treats them as malformed extraction and drops them.
        if event.latitude.abs() > 90.0 || event.longitude.abs() > 180.0 {
            let err = ResolutionError::OutOfRange {
                lat: event.latitude,
                lon: event.longitude,
            };
            return Err((event, err));
        }
        match self.index.locate(event.latitude, event.longitude) {
            Ok(Some(name)) => Ok(ResolvedEvent {
                region: name.to_string(),
                event,
            }),
            Ok(None) => Ok(ResolvedEvent {
                region: UNKNOWN_REGION.to_string(),
                event,
            }),
            Err(err) => Err((event, err)),
        }
    }

    /// Resolve the whole stream, preserving order, dropping failures.
    pub fn resolve(&self, events: Vec<Event>) -> Resolution {
        let outcomes: Vec<_> = events
            .into_par_iter()
            .map(|event| self.resolve_one(event))
            .collect();

        let mut resolved = Vec::with_capacity(outcomes.len());
        let mut dropped = 0u64;
        for outcome in outcomes {
            match outcome {
                Ok(event) => resolved.push(event),
                Err((event, err)) => {
                    dropped += 1;
                    tracing::warn!(user = %event.user, %err, "dropping unresolvable event");
                }
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "events excluded from the timeline");
        }
        Resolution {
            events: resolved,
            dropped,
        }
    }
}
