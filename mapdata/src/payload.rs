//! Map payload as served by the map-generation backend.
//!
//! The payload is fetched once per viewer session and is read-only afterwards.
//! Grid-shaped arrays are indexed `[x][y]`.

use crate::error::{Diagnostic, PayloadError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

/// A cell coordinate inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// A building placement. Coordinates are raw payload values and may be out of bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub x: i64,
    pub y: i64,
    /// Kind label emitted by the generator (usually `"building"`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// An influencer record.
///
/// Every field is optional on the wire; display code applies the fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nation: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub experience: Option<f64>,
    #[serde(default)]
    pub level: Option<f64>,
    #[serde(default)]
    pub evolution_steps: Vec<String>,
    /// `[x, y]` placement on the grid; absent when the entity is not on the map.
    #[serde(default)]
    pub location: Option<[i64; 2]>,
    #[serde(default, alias = "path")]
    pub image_path: Option<String>,
    /// Owning country index as assigned by the generator.
    #[serde(default, rename = "map")]
    pub nation_index: Option<u32>,
}

/// Wire shape before any array is interpreted.
///
/// Every key is kept as a raw value so one bad cell or record cannot fail the
/// whole payload.
#[derive(Debug, Default, Deserialize)]
struct RawPayload {
    #[serde(default)]
    map: Option<serde_json::Value>,
    #[serde(default)]
    elevation: Option<serde_json::Value>,
    #[serde(default)]
    terrain: Option<serde_json::Value>,
    #[serde(default)]
    countries: Option<serde_json::Value>,
    #[serde(default)]
    buildings: Option<serde_json::Value>,
    #[serde(default)]
    entity_names: Option<serde_json::Value>,
    /// Either a list of entity records or a grid of image paths.
    #[serde(default)]
    entities: Option<serde_json::Value>,
    #[serde(default)]
    entity_locations: Option<serde_json::Value>,
}

/// A column-major grid whose cells are `None` when the wire value had the wrong type.
pub type CellGrid<T> = Vec<Vec<Option<T>>>;

/// A fetched map payload.
///
/// Only `map` is required. Other arrays that are absent or malformed come
/// through empty (or with `None` cells) and are listed in `diagnostics`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPayload {
    /// Grid dimension markers; cell contents are not used.
    pub map: Vec<Vec<serde_json::Value>>,
    pub elevation: CellGrid<f64>,
    pub terrain: CellGrid<String>,
    pub countries: CellGrid<String>,
    pub buildings: Vec<BuildingRecord>,
    pub entity_names: Option<CellGrid<String>>,
    pub entities: Vec<EntityRecord>,
    /// Problems found while reading the payload.
    pub diagnostics: Vec<Diagnostic>,
}

impl MapPayload {
    /// Parses a payload from the JSON body returned by the map service.
    pub fn from_json_str(body: &str) -> Result<Self, PayloadError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    /// Reads and parses a payload from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PayloadError> {
        let body = std::fs::read_to_string(path)?;
        log::debug!("Read {} bytes of map payload from {}", body.len(), path.display());
        Self::from_json_str(&body)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, PayloadError> {
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return Err(PayloadError::Backend(message.to_string()));
        }

        let raw: RawPayload = serde_json::from_value(value)?;
        let mut diagnostics = Vec::new();

        // Without `map` there are no grid dimensions to render against.
        let map = match raw.map {
            Some(serde_json::Value::Array(columns)) => columns
                .into_iter()
                .map(|column| match column {
                    serde_json::Value::Array(cells) => cells,
                    _ => Vec::new(),
                })
                .collect(),
            _ => return Err(PayloadError::MissingArray("map")),
        };

        let elevation = required_grid("elevation", raw.elevation, |v| v.as_f64(), &mut diagnostics);
        let terrain = required_grid("terrain", raw.terrain, string_cell, &mut diagnostics);
        let countries = required_grid("countries", raw.countries, string_cell, &mut diagnostics);
        let entity_names = raw
            .entity_names
            .map(|value| cell_grid("entity_names", value, string_cell, &mut diagnostics));

        let buildings = match raw.buildings {
            Some(value) => records("buildings", value, &mut diagnostics),
            None => {
                diagnostics.push(Diagnostic::MissingArray { array: "buildings" });
                Vec::new()
            }
        };

        let entities = match (raw.entity_locations, raw.entities) {
            (Some(located), _) => records("entity_locations", located, &mut diagnostics),
            (None, Some(value)) if is_placement_grid(&value) => {
                log::debug!("`entities` carries no entity records");
                Vec::new()
            }
            (None, Some(value)) => records("entities", value, &mut diagnostics),
            (None, None) => Vec::new(),
        };

        Ok(Self {
            map,
            elevation,
            terrain,
            countries,
            buildings,
            entity_names,
            entities,
            diagnostics,
        })
    }

    /// Grid width `W` (number of columns, first index).
    pub fn width(&self) -> usize {
        self.map.len()
    }

    /// Grid height `H` (length of the first column).
    pub fn height(&self) -> usize {
        self.map.first().map_or(0, Vec::len)
    }
}

fn string_cell(value: &serde_json::Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn required_grid<T>(
    array: &'static str,
    value: Option<serde_json::Value>,
    cell: impl Fn(&serde_json::Value) -> Option<T>,
    diagnostics: &mut Vec<Diagnostic>,
) -> CellGrid<T> {
    match value {
        Some(value) => cell_grid(array, value, cell, diagnostics),
        None => {
            diagnostics.push(Diagnostic::MissingArray { array });
            Vec::new()
        }
    }
}

/// Reads a grid cell by cell. A column that is not an array reads as empty.
fn cell_grid<T>(
    array: &'static str,
    value: serde_json::Value,
    cell: impl Fn(&serde_json::Value) -> Option<T>,
    diagnostics: &mut Vec<Diagnostic>,
) -> CellGrid<T> {
    let serde_json::Value::Array(columns) = value else {
        diagnostics.push(Diagnostic::MalformedArray { array });
        return Vec::new();
    };
    columns
        .iter()
        .map(|column| match column.as_array() {
            Some(cells) => cells.iter().map(&cell).collect(),
            None => Vec::new(),
        })
        .collect()
}

/// Reads a list of records, skipping the ones that do not deserialize.
fn records<T: DeserializeOwned>(
    array: &'static str,
    value: serde_json::Value,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<T> {
    let serde_json::Value::Array(items) = value else {
        diagnostics.push(Diagnostic::MalformedArray { array });
        return Vec::new();
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                diagnostics.push(Diagnostic::RecordSkipped {
                    array,
                    index,
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect()
}

/// The `entities` variant that is a matrix of image paths rather than records.
fn is_placement_grid(value: &serde_json::Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .is_some_and(|first| first.is_array())
}

/// Accepts a string or a number, yielding a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
