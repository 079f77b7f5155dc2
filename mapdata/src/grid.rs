//! Grid-to-scene resolution.
//!
//! Maps a validated [`MapGrid`] to per-tile render attributes, building
//! primitives and entity markers. The grid is centred on the origin: cell
//! `(x, y)` renders at `(x - W/2, y - H/2)` in the map plane, with `+Z` up.

use crate::error::Diagnostic;
use crate::payload::{GridPos, MapPayload};
use crate::texture::{AssetRegistry, TextureHandle, TextureSelector, country_index};
use crate::validate::MapGrid;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Multiplier from payload elevation to render height.
pub const HEIGHT_SCALE: f32 = 5.0;
/// Thinnest tile ever rendered, even at zero elevation.
pub const MIN_THICKNESS: f32 = 0.1;
/// Building primitive size (footprint x, footprint y, height).
pub const BUILDING_SIZE: [f32; 3] = [0.5, 0.5, 1.5];

/// Tunables for [`GridResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSettings {
    pub height_scale: f32,
    pub min_thickness: f32,
    pub building_size: [f32; 3],
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            height_scale: HEIGHT_SCALE,
            min_thickness: MIN_THICKNESS,
            building_size: BUILDING_SIZE,
        }
    }
}

/// Tile information kept for the selection detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMetadata {
    pub pos: GridPos,
    pub elevation: f64,
    pub terrain: String,
    pub country: String,
    pub influencer: Option<String>,
}

/// Everything needed to draw and pick one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileAttributes {
    pub render_position: Vec2,
    /// Never below the configured minimum thickness.
    pub height: f32,
    pub texture: TextureHandle,
    pub metadata: TileMetadata,
}

impl TileAttributes {
    pub fn pos(&self) -> GridPos {
        self.metadata.pos
    }

    /// Centre of the tile box; the box rests on the map plane.
    pub fn center(&self) -> Vec3 {
        self.render_position.extend(self.height / 2.0)
    }
}

/// Fixed-size structure sitting on top of its tile.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingPrimitive {
    pub pos: GridPos,
    pub center: Vec3,
    pub size: Vec3,
    pub kind: Option<String>,
}

/// Label anchor for an entity placed on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMarker {
    /// Index into the entity list (carousel order).
    pub entity: usize,
    pub pos: GridPos,
    /// Top centre of the tile the entity stands on.
    pub anchor: Vec3,
    pub label: String,
}

/// Output of [`GridResolver::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedMap {
    width: usize,
    height: usize,
    tiles: Vec<TileAttributes>,
    /// Column-major index into `tiles`.
    lookup: Vec<Option<usize>>,
    buildings: Vec<BuildingPrimitive>,
    markers: Vec<EntityMarker>,
    diagnostics: Vec<Diagnostic>,
}

impl ResolvedMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tiles(&self) -> &[TileAttributes] {
        &self.tiles
    }

    /// The resolved tile at `pos`; `None` if out of bounds or skipped.
    pub fn tile(&self, pos: GridPos) -> Option<&TileAttributes> {
        if pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        self.lookup[pos.x * self.height + pos.y].map(|i| &self.tiles[i])
    }

    pub fn buildings(&self) -> &[BuildingPrimitive] {
        &self.buildings
    }

    pub fn markers(&self) -> &[EntityMarker] {
        &self.markers
    }

    /// Malformed-payload conditions found while validating.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Centres grid coordinates around the origin.
pub fn render_position(pos: GridPos, width: usize, height: usize) -> Vec2 {
    Vec2::new(
        pos.x as f32 - width as f32 / 2.0,
        pos.y as f32 - height as f32 / 2.0,
    )
}

/// Resolves map grids into render primitives using an injected texture registry.
pub struct GridResolver<'a, R: AssetRegistry + ?Sized> {
    selector: TextureSelector<'a, R>,
    settings: ResolveSettings,
}

impl<'a, R: AssetRegistry + ?Sized> GridResolver<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self::with_settings(registry, ResolveSettings::default())
    }

    pub fn with_settings(registry: &'a R, settings: ResolveSettings) -> Self {
        Self {
            selector: TextureSelector::new(registry),
            settings,
        }
    }

    pub fn settings(&self) -> &ResolveSettings {
        &self.settings
    }

    /// Tile height for a payload elevation.
    pub fn tile_height(&self, elevation: f64) -> f32 {
        // f32::max also maps NaN to the minimum.
        (elevation as f32 * self.settings.height_scale).max(self.settings.min_thickness)
    }

    /// Validates and resolves a raw payload in one go.
    pub fn resolve_payload(&self, payload: &MapPayload) -> ResolvedMap {
        self.resolve(&MapGrid::validate(payload))
    }

    pub fn resolve(&self, grid: &MapGrid) -> ResolvedMap {
        let (width, height) = (grid.width(), grid.height());
        let mut tiles = Vec::with_capacity(width * height);
        let mut lookup = vec![None; width * height];

        for (pos, cell) in grid.cells() {
            let texture = self
                .selector
                .select(&cell.terrain, country_index(&cell.country));
            lookup[pos.x * height + pos.y] = Some(tiles.len());
            tiles.push(TileAttributes {
                render_position: render_position(pos, width, height),
                height: self.tile_height(cell.elevation),
                texture,
                metadata: TileMetadata {
                    pos,
                    elevation: cell.elevation,
                    terrain: cell.terrain.clone(),
                    country: cell.country.clone(),
                    influencer: cell.influencer.clone(),
                },
            });
        }

        let surface = |pos: GridPos| -> f32 {
            lookup[pos.x * height + pos.y]
                .map_or(self.settings.min_thickness, |i| tiles[i].height)
        };

        let size = Vec3::from_array(self.settings.building_size);
        let buildings: Vec<BuildingPrimitive> = grid
            .buildings()
            .iter()
            .map(|b| BuildingPrimitive {
                pos: b.pos,
                center: render_position(b.pos, width, height)
                    .extend(surface(b.pos) + size.z / 2.0),
                size,
                kind: b.kind.clone(),
            })
            .collect();

        let markers: Vec<EntityMarker> = grid
            .entities()
            .iter()
            .enumerate()
            .filter_map(|(entity, e)| {
                let pos = e.location?;
                Some(EntityMarker {
                    entity,
                    pos,
                    anchor: render_position(pos, width, height).extend(surface(pos)),
                    label: e.record.name.clone().unwrap_or_else(|| "Unknown".to_string()),
                })
            })
            .collect();

        log::debug!(
            "Resolved {} tiles, {} buildings, {} entity markers",
            tiles.len(),
            buildings.len(),
            markers.len()
        );

        ResolvedMap {
            width,
            height,
            tiles,
            lookup,
            buildings,
            markers,
            diagnostics: grid.diagnostics().to_vec(),
        }
    }
}
