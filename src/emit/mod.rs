//! Snapshot Emitter: timeline + resolved events -> render payload
//!
//! Pure transformation. The payload is the transport structure the
//! animation frontend indexes by minute key: markers to draw per step,
//! the region fill colors of the current winners, and the running
//! leaderboard. Maps are BTreeMaps throughout, so serialization order is
//! stable and re-running the pipeline on unchanged input is
//! byte-identical.

pub mod palette;

pub use palette::Palette;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::time::minute_key;
use crate::dominance::Snapshot;
use crate::resolver::ResolvedEvent;

/// One point marker for the map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub user: String,
    pub hex_color: String,
    /// CSS-safe class used by the per-user visibility toggles.
    pub safe_class: String,
    pub popup: String,
}

/// Everything the renderer needs, keyed by minute label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPayload {
    /// Minute labels in ascending order, one per snapshot.
    pub timeline: Vec<String>,
    pub points_by_time: BTreeMap<String, Vec<Marker>>,
    /// Minute -> region -> winning user's hex color.
    pub dominance_by_time: BTreeMap<String, BTreeMap<String, String>>,
    /// Minute -> user -> cumulative count. Zero-count users included.
    pub user_totals_by_time: BTreeMap<String, BTreeMap<String, u64>>,
    pub user_colors: BTreeMap<String, String>,
}

impl RenderPayload {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Replace anything outside `[A-Za-z0-9]` so a user name can be a CSS
/// class.
pub fn sanitize_class_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn marker(resolved: &ResolvedEvent, palette: &Palette) -> Marker {
    let user = &resolved.event.user;
    Marker {
        lat: resolved.event.latitude,
        lon: resolved.event.longitude,
        user: user.clone(),
        hex_color: palette.marker_hex(user).to_string(),
        safe_class: sanitize_class_name(user),
        popup: format!(
            "<b>{user}</b><br>{}<br>{}",
            resolved.region,
            resolved.event.timestamp.format("%H:%M")
        ),
    }
}

/// Serialize the snapshot sequence plus the resolver's per-event output
/// into the render payload. Ascending timestamp order is preserved; both
/// maps are carried at full fidelity.
pub fn emit(snapshots: &[Snapshot], resolved: &[ResolvedEvent], palette: &Palette) -> RenderPayload {
    let timeline: Vec<String> = snapshots
        .iter()
        .map(|snap| minute_key(snap.timestamp))
        .collect();

    let mut points_by_time: BTreeMap<String, Vec<Marker>> = BTreeMap::new();
    for event in resolved {
        points_by_time
            .entry(minute_key(event.event.timestamp))
            .or_default()
            .push(marker(event, palette));
    }

    let mut dominance_by_time = BTreeMap::new();
    let mut user_totals_by_time = BTreeMap::new();
    let mut users: BTreeMap<String, String> = BTreeMap::new();
    for snap in snapshots {
        let key = minute_key(snap.timestamp);
        let colors: BTreeMap<String, String> = snap
            .region_winners
            .iter()
            .map(|(region, user)| (region.clone(), palette.winner_hex(user).to_string()))
            .collect();
        dominance_by_time.insert(key.clone(), colors);
        for user in snap.user_totals.keys() {
            users
                .entry(user.clone())
                .or_insert_with(|| palette.marker_hex(user).to_string());
        }
        user_totals_by_time.insert(key, snap.user_totals.clone());
    }

    RenderPayload {
        timeline,
        points_by_time,
        dominance_by_time,
        user_totals_by_time,
        user_colors: users,
    }
}
