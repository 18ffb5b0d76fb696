//! Event stream ingestion from a chat export

pub mod chat;

use chrono::NaiveDateTime;

/// One geotagged, user-attributed event. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    pub user: String,
    /// WGS84 degrees. Carried as extracted; range-checking happens in the
    /// resolver.
    pub latitude: f64,
    pub longitude: f64,
}
