//! Acquisition of the country boundary dataset
//!
//! The high-resolution Natural Earth dataset is ~25 MB, so it is cached on
//! disk after the first download and read back on later runs.

use std::path::Path;

use crate::core::error::Result;

/// High-resolution admin-0 country boundaries.
pub const DEFAULT_DATASET_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_10m_admin_0_countries.geojson";

/// Default on-disk cache location, next to the working directory.
pub const DEFAULT_CACHE_PATH: &str = "world_hires.json";

/// Return the raw GeoJSON text, from the cache when present, otherwise
/// fetched from `url` and written through to `cache`.
pub async fn fetch_dataset(url: &str, cache: &Path) -> Result<String> {
    if cache.exists() {
        tracing::info!(cache = %cache.display(), "reading region dataset from cache");
        return Ok(std::fs::read_to_string(cache)?);
    }

    tracing::info!(%url, "downloading region dataset");
    let body = reqwest::get(url).await?.error_for_status()?.text().await?;
    std::fs::write(cache, &body)?;
    tracing::info!(cache = %cache.display(), bytes = body.len(), "cached region dataset");
    Ok(body)
}
