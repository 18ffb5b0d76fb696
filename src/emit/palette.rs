//! Display configuration for the render payload
//!
//! An explicit value threaded into the emitter - the dominance engine
//! never sees colors, it works on opaque user identifiers. Built-in
//! defaults can be overridden (entry by entry) from a TOML file:
//!
//! ```toml
//! fallback = "gray"
//!
//! [colors]
//! teal = "#4DD0E1"
//!
//! [users]
//! Riccardo = "magenta"
//!
//! [aliases]
//! "riki nata" = "Riccardo"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::core::error::Result;

/// Hex used for a region whose winner has no configured color.
const UNCONFIGURED_WINNER_HEX: &str = "#333";

#[derive(Debug, Default, Deserialize)]
struct PaletteFile {
    #[serde(default)]
    colors: BTreeMap<String, String>,
    #[serde(default)]
    users: BTreeMap<String, String>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    fallback: Option<String>,
}

/// User display configuration: named pastel colors, user assignments and
/// the chat-name alias table.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Named color -> hex.
    colors: BTreeMap<String, String>,
    /// User -> named color.
    users: BTreeMap<String, String>,
    /// Raw chat name -> canonical user.
    aliases: BTreeMap<String, String>,
    /// Named color for users without an assignment.
    fallback: String,
}

impl Default for Palette {
    fn default() -> Self {
        let colors = [
            ("beige", "#FFF0B5"),
            ("magenta", "#FF66FF"),
            ("purple", "#DA70D6"),
            ("green", "#76E076"),
            ("red", "#FF6B6B"),
            ("pink", "#FFB6C1"),
            ("orange", "#FFB347"),
            ("brown", "#E0A96D"),
            ("yellow", "#FFF176"),
            ("cyan", "#4DD0E1"),
            ("blue", "#6495ED"),
            ("darkred", "#EF5350"),
            ("cadetblue", "#80DEEA"),
            ("darkgreen", "#66BB6A"),
            ("darkblue", "#5C6BC0"),
            ("gray", "#BDBDBD"),
            ("black", "#757575"),
            ("lightgray", "#E0E0E0"),
        ];
        Self {
            colors: colors
                .into_iter()
                .map(|(name, hex)| (name.to_string(), hex.to_string()))
                .collect(),
            users: BTreeMap::new(),
            aliases: BTreeMap::new(),
            fallback: "gray".to_string(),
        }
    }
}

impl Palette {
    /// Built-in defaults, overlaid with the TOML file when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut palette = Self::default();
        if let Some(path) = path {
            let file: PaletteFile = toml::from_str(&std::fs::read_to_string(path)?)?;
            palette.colors.extend(file.colors);
            palette.users.extend(file.users);
            palette.aliases.extend(file.aliases);
            if let Some(fallback) = file.fallback {
                palette.fallback = fallback;
            }
            tracing::info!(path = %path.display(), "loaded palette overrides");
        }
        Ok(palette)
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Hex for a user's point markers and leaderboard entry; unassigned
    /// users share the fallback color.
    pub fn marker_hex(&self, user: &str) -> &str {
        let name = self
            .users
            .get(user)
            .map_or(self.fallback.as_str(), String::as_str);
        self.colors.get(name).map_or("gray", String::as_str)
    }

    /// Hex a region is painted with when this user controls it.
    /// Unconfigured winners get a neutral fill, not the marker fallback.
    pub fn winner_hex(&self, user: &str) -> &str {
        self.users
            .get(user)
            .and_then(|name| self.colors.get(name))
            .map_or(UNCONFIGURED_WINNER_HEX, String::as_str)
    }
}
