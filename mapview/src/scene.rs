//! Render-surface seam.
//!
//! The viewport pushes resolved primitives and camera poses into a
//! [`RenderSurface`]. The concrete engine lives behind this trait; picking a
//! tile from a pointer position is the engine's job and comes back to the
//! viewport as grid coordinates.

use crate::camera::CameraPose;
use mapdata::{BuildingPrimitive, Diagnostic, EntityMarker, TileAttributes};

/// Per-tile instance data for a GPU instance buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileInstance {
    /// Box centre in world space.
    pub center: [f32; 3],
    /// Box height (already clamped to the minimum thickness).
    pub height: f32,
    /// Texture registry index.
    pub texture: u32,
    /// Padding to 16-byte alignment.
    pub _padding: [u32; 3],
}

impl TileInstance {
    pub fn from_tile(tile: &TileAttributes) -> Self {
        Self {
            center: tile.center().to_array(),
            height: tile.height,
            texture: tile.texture.index(),
            _padding: [0; 3],
        }
    }
}

/// Raw bytes of an instance slice, ready for upload.
pub fn instance_bytes(instances: &[TileInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

/// Whatever draws the scene.
pub trait RenderSurface {
    /// Neutral state shown while the payload is pending or failed to load.
    fn show_loading(&mut self);
    fn set_tiles(&mut self, tiles: &[TileAttributes]);
    fn set_buildings(&mut self, buildings: &[BuildingPrimitive]);
    fn set_markers(&mut self, markers: &[EntityMarker]);
    fn show_diagnostics(&mut self, diagnostics: &[Diagnostic]);
    fn set_camera(&mut self, pose: &CameraPose);
}

/// Recording surface used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct SceneBuffer {
    pub loading: bool,
    pub instances: Vec<TileInstance>,
    pub buildings: Vec<BuildingPrimitive>,
    pub markers: Vec<EntityMarker>,
    pub diagnostics: Vec<String>,
    pub camera: Option<CameraPose>,
    /// Number of camera updates received.
    pub camera_updates: usize,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSurface for SceneBuffer {
    fn show_loading(&mut self) {
        self.loading = true;
        self.instances.clear();
        self.buildings.clear();
        self.markers.clear();
    }

    fn set_tiles(&mut self, tiles: &[TileAttributes]) {
        self.loading = false;
        self.instances = tiles.iter().map(TileInstance::from_tile).collect();
    }

    fn set_buildings(&mut self, buildings: &[BuildingPrimitive]) {
        self.buildings = buildings.to_vec();
    }

    fn set_markers(&mut self, markers: &[EntityMarker]) {
        self.markers = markers.to_vec();
    }

    fn show_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        self.diagnostics = diagnostics.iter().map(ToString::to_string).collect();
    }

    fn set_camera(&mut self, pose: &CameraPose) {
        self.camera = Some(*pose);
        self.camera_updates += 1;
    }
}
