use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::model::{Coord, Location};

#[derive(Debug, Deserialize)]
struct LocationFile {
    #[serde(default, rename = "location")]
    locations: Vec<LocationEntry>,
}

#[derive(Debug, Deserialize)]
struct LocationEntry {
    name: String,
    /// Defaults to `name`.
    query: Option<String>,
    lat: f64,
    lon: f64,
}

/// Load a list of `[[location]]` tables from a TOML file.
///
/// ```toml
/// [[location]]
/// name = "Chennai"
/// query = "Chennai, Tamil Nadu, IN"
/// lat = 13.0827
/// lon = 80.2707
/// ```
pub fn load_locations(path: &Path) -> Result<Vec<Location>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read locations file: {}", path.display()))?;

    parse_locations(&contents)
        .with_context(|| format!("Invalid locations file: {}", path.display()))
}

pub fn parse_locations(contents: &str) -> Result<Vec<Location>> {
    let file: LocationFile = toml::from_str(contents)?;

    if file.locations.is_empty() {
        bail!("no [[location]] entries found");
    }

    file.locations
        .into_iter()
        .map(|entry| {
            let name = entry.name.trim().to_string();
            if name.is_empty() {
                bail!("location name must not be empty");
            }
            if !(-90.0..=90.0).contains(&entry.lat) || !(-180.0..=180.0).contains(&entry.lon) {
                bail!("coordinates of '{name}' are out of range: {}, {}", entry.lat, entry.lon);
            }

            Ok(Location {
                query: entry.query.unwrap_or_else(|| name.clone()),
                name,
                coord: Coord { lat: entry.lat, lon: entry.lon },
            })
        })
        .collect()
}
