//! Error taxonomy for the pipeline
//!
//! Split along failure semantics: `LoadError` is fatal and aborts before
//! any snapshot is produced, `ResolutionError` is scoped to a single event
//! and recovered by dropping that event. `DominionError` is the umbrella
//! type the binary surfaces.

use thiserror::Error;

/// Fatal problems with the region dataset. Construction-time only.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("region dataset contains no usable boundaries")]
    EmptyDataset,

    #[error("region {region:?}: ring has {count} positions, need at least 4")]
    DegenerateRing { region: String, count: usize },

    #[error("region {region:?}: boundary ring is not closed")]
    OpenRing { region: String },

    #[error("region {region:?}: non-finite coordinate in boundary")]
    NonFiniteCoordinate { region: String },

    #[error("malformed dataset: {0}")]
    Malformed(String),
}

/// A single event whose coordinates cannot be evaluated. Never fatal: the
/// resolver drops the event, counts it and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("non-finite coordinates ({lat}, {lon})")]
    NonFiniteCoordinates { lat: f64, lon: f64 },

    #[error("coordinates ({lat}, {lon}) outside WGS84 range")]
    OutOfRange { lat: f64, lon: f64 },

    #[error("point ({lat}, {lon}) contained by both {first:?} and {second:?}")]
    AmbiguousContainment {
        lat: f64,
        lon: f64,
        first: String,
        second: String,
    },
}

#[derive(Error, Debug)]
pub enum DominionError {
    #[error("region load error: {0}")]
    Load(#[from] LoadError),

    #[error("chat export parse error: {0}")]
    ChatParse(String),

    #[error("palette config error: {0}")]
    Palette(#[from] toml::de::Error),

    #[error("dataset fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DominionError>;
