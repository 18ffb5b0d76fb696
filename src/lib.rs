//! Geodominion - territorial dominance timelines from geotagged chat events

pub mod core;
pub mod dominance;
pub mod emit;
pub mod ingest;
pub mod regions;
pub mod resolver;
