//! Payload validation.
//!
//! Turns a [`MapPayload`] into a [`MapGrid`] whose cells are known to exist in
//! every grid-shaped array. Mismatches never abort: the affected cell, building
//! or entity is dropped and a [`Diagnostic`] is recorded.

use crate::error::Diagnostic;
use crate::payload::{EntityRecord, GridPos, MapPayload};

/// One validated grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub elevation: f64,
    pub terrain: String,
    pub country: String,
    /// Influencer placed on this cell, from `entity_names` or a located entity.
    pub influencer: Option<String>,
}

/// A building whose coordinates are inside the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub pos: GridPos,
    pub kind: Option<String>,
}

/// An entity with its placement checked against the grid bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub record: EntityRecord,
    /// `None` when the entity is unplaced or its location was out of bounds.
    pub location: Option<GridPos>,
}

/// Validated, immutable view of a map payload.
#[derive(Debug, Clone)]
pub struct MapGrid {
    width: usize,
    height: usize,
    /// Column-major (`x * height + y`), `None` for skipped cells.
    cells: Vec<Option<Cell>>,
    buildings: Vec<Building>,
    entities: Vec<Entity>,
    diagnostics: Vec<Diagnostic>,
}

impl MapGrid {
    /// Validates `payload`. Always succeeds; problems end up in [`MapGrid::diagnostics`].
    pub fn validate(payload: &MapPayload) -> Self {
        let width = payload.width();
        let height = payload.height();
        let mut diagnostics = payload.diagnostics.clone();

        check_shape("map", &payload.map, width, height, &mut diagnostics);
        check_shape("elevation", &payload.elevation, width, height, &mut diagnostics);
        check_shape("terrain", &payload.terrain, width, height, &mut diagnostics);
        check_shape("countries", &payload.countries, width, height, &mut diagnostics);
        if let Some(names) = &payload.entity_names {
            check_shape("entity_names", names, width, height, &mut diagnostics);
        }

        let mut cells = Vec::with_capacity(width * height);
        for x in 0..width {
            for y in 0..height {
                match build_cell(payload, x, y) {
                    Ok(cell) => cells.push(Some(cell)),
                    Err(d) => {
                        diagnostics.push(d);
                        cells.push(None);
                    }
                }
            }
        }

        let mut buildings = Vec::with_capacity(payload.buildings.len());
        for (index, b) in payload.buildings.iter().enumerate() {
            match in_bounds(b.x, b.y, width, height) {
                Some(pos) => buildings.push(Building {
                    pos,
                    kind: b.kind.clone(),
                }),
                None => diagnostics.push(Diagnostic::BuildingOutOfBounds {
                    index,
                    x: b.x,
                    y: b.y,
                    width,
                    height,
                }),
            }
        }

        let mut entities = Vec::with_capacity(payload.entities.len());
        for (index, record) in payload.entities.iter().enumerate() {
            let location = record.location.and_then(|[x, y]| {
                let pos = in_bounds(x, y, width, height);
                if pos.is_none() {
                    diagnostics.push(Diagnostic::EntityOutOfBounds {
                        index,
                        name: record.name.clone().unwrap_or_else(|| "Unknown".to_string()),
                        x,
                        y,
                        width,
                        height,
                    });
                }
                pos
            });
            entities.push(Entity {
                record: record.clone(),
                location,
            });
        }

        // Located entities label their cell when `entity_names` does not.
        for entity in &entities {
            let (Some(pos), Some(name)) = (entity.location, entity.record.name.as_ref()) else {
                continue;
            };
            if let Some(Some(cell)) = cells.get_mut(pos.x * height + pos.y) {
                cell.influencer.get_or_insert_with(|| name.clone());
            }
        }

        for d in &diagnostics {
            log::warn!("Malformed map payload: {}", d);
        }
        log::info!(
            "Validated {}x{} map: {} buildings, {} entities, {} diagnostics",
            width,
            height,
            buildings.len(),
            entities.len(),
            diagnostics.len()
        );

        Self {
            width,
            height,
            cells,
            buildings,
            entities,
            diagnostics,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// The cell at `pos`, or `None` when out of bounds or skipped.
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[pos.x * self.height + pos.y].as_ref()
    }

    /// Iterates valid cells in `[x][y]` order.
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, &Cell)> + '_ {
        let height = self.height.max(1);
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.as_ref()
                .map(|cell| (GridPos::new(i / height, i % height), cell))
        })
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

fn check_shape<T>(
    array: &'static str,
    columns: &[Vec<T>],
    width: usize,
    height: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if columns.len() != width {
        diagnostics.push(Diagnostic::ColumnCountMismatch {
            array,
            expected: width,
            found: columns.len(),
        });
    }
    for (x, column) in columns.iter().enumerate().take(width) {
        if column.len() != height {
            diagnostics.push(Diagnostic::RowLengthMismatch {
                array,
                x,
                expected: height,
                found: column.len(),
            });
        }
    }
}

fn build_cell(payload: &MapPayload, x: usize, y: usize) -> Result<Cell, Diagnostic> {
    if at(&payload.map, x, y).is_none() {
        return Err(Diagnostic::CellSkipped { x, y, array: "map" });
    }
    let elevation = *entry(&payload.elevation, "elevation", x, y)?;
    let terrain = entry(&payload.terrain, "terrain", x, y)?;
    let country = entry(&payload.countries, "countries", x, y)?;

    // Missing names are expected; they never skip the cell.
    let influencer = payload
        .entity_names
        .as_ref()
        .and_then(|names| at(names, x, y))
        .and_then(|n| n.clone());

    Ok(Cell {
        elevation,
        terrain: terrain.clone(),
        country: country.clone(),
        influencer,
    })
}

fn entry<'a, T>(
    columns: &'a [Vec<Option<T>>],
    array: &'static str,
    x: usize,
    y: usize,
) -> Result<&'a T, Diagnostic> {
    match at(columns, x, y) {
        None => Err(Diagnostic::CellSkipped { x, y, array }),
        Some(None) => Err(Diagnostic::CellInvalid { x, y, array }),
        Some(Some(value)) => Ok(value),
    }
}

fn at<T>(columns: &[Vec<T>], x: usize, y: usize) -> Option<&T> {
    columns.get(x).and_then(|c| c.get(y))
}

fn in_bounds(x: i64, y: i64, width: usize, height: usize) -> Option<GridPos> {
    let x = usize::try_from(x).ok()?;
    let y = usize::try_from(y).ok()?;
    (x < width && y < height).then_some(GridPos::new(x, y))
}
