//! Viewport orchestration.
//!
//! Wires the payload into the grid resolver and the render surface, tile
//! clicks into the selection, carousel events into the camera, and the global
//! reset gesture into both. Holds its collaborators and nothing else.

use crate::camera::{CameraBusy, CameraController, FlightToken, ResetOutcome};
use crate::config::ViewerConfig;
use crate::frame::{FrameReport, FrameScheduler};
use crate::gesture::{Gesture, GestureHub, GestureSubscription};
use crate::scene::RenderSurface;
use crate::selection::SelectionState;
use glam::Vec2;
use mapdata::{
    AssetRegistry, EntityRecord, GridPos, GridResolver, MapGrid, MapPayload, PayloadError,
    ResolveSettings, ResolvedMap, TileMetadata,
};

pub struct ViewportOrchestrator<S: RenderSurface> {
    surface: S,
    camera: CameraController,
    frames: FrameScheduler,
    selection: SelectionState,
    /// `None` until a payload has loaded.
    map: Option<ResolvedMap>,
    entities: Vec<EntityRecord>,
    resolve: ResolveSettings,
    gestures: GestureSubscription,
}

impl<S: RenderSurface> ViewportOrchestrator<S> {
    /// Creates a viewport in the loading state, subscribed to `hub` for its lifetime.
    pub fn new(mut surface: S, hub: &GestureHub, config: &ViewerConfig) -> Self {
        surface.show_loading();
        let camera = CameraController::new(config.camera);
        surface.set_camera(camera.pose());
        Self {
            surface,
            camera,
            frames: FrameScheduler::new(),
            selection: SelectionState::default(),
            map: None,
            entities: Vec::new(),
            resolve: config.grid,
            gestures: hub.subscribe(),
        }
    }

    /// Resolves `payload` and pushes the scene to the surface.
    pub fn load<R: AssetRegistry + ?Sized>(&mut self, payload: &MapPayload, registry: &R) {
        let grid = MapGrid::validate(payload);
        let map = GridResolver::with_settings(registry, self.resolve).resolve(&grid);

        self.surface.set_tiles(map.tiles());
        self.surface.set_buildings(map.buildings());
        self.surface.set_markers(map.markers());
        if !map.diagnostics().is_empty() {
            self.surface.show_diagnostics(map.diagnostics());
        }

        self.selection = SelectionState::new(grid.entities());
        self.entities = grid.entities().iter().map(|e| e.record.clone()).collect();
        log::info!(
            "Viewport loaded {}x{} map with {} entities",
            map.width(),
            map.height(),
            self.entities.len()
        );
        self.map = Some(map);
    }

    /// Back to the neutral loading state after a failed fetch.
    ///
    /// Nothing from an earlier map survives: selection, carousel and any
    /// flight over it are dropped.
    pub fn load_failed(&mut self, err: &PayloadError) {
        log::warn!("Map payload failed to load: {}", err);
        self.close();
        self.map = None;
        self.selection = SelectionState::default();
        self.entities.clear();
        self.surface.show_loading();
    }

    /// Stops every pending flight continuation. Called on teardown.
    pub fn close(&mut self) {
        self.frames.cancel_all();
        self.camera.cancel();
    }

    pub fn is_loaded(&self) -> bool {
        self.map.is_some()
    }

    /// Handles a pick on tile `pos`. Clicks outside the resolved grid are ignored.
    pub fn click_tile(&mut self, pos: GridPos) -> Option<&TileMetadata> {
        let tile = self.map.as_ref()?.tile(pos);
        match tile {
            Some(tile) => self.selection.select_tile(tile.metadata.clone()),
            None => log::debug!("Click on ({}) outside the resolved grid", pos),
        }
        self.selection.selected()
    }

    pub fn focus_next(&mut self) -> Option<usize> {
        self.selection.focus_next()
    }

    pub fn focus_previous(&mut self) -> Option<usize> {
        self.selection.focus_previous()
    }

    /// Carousel card click: zoom to entity `index` if it is placed.
    pub fn zoom_to_entity(&mut self, index: usize) -> Option<FlightToken> {
        let pos = self.selection.request_zoom(index)?;
        let token = self.camera.fly_to(Vec2::new(pos.x as f32, pos.y as f32));
        self.frames.schedule(token);
        self.surface.set_camera(self.camera.pose());
        Some(token)
    }

    /// Zoom to the focused carousel entity.
    pub fn zoom_to_focused(&mut self) -> Option<FlightToken> {
        let index = self.selection.focus()?;
        self.zoom_to_entity(index)
    }

    /// The reset gesture: home the camera and, if that happened, clear the selection.
    pub fn reset(&mut self) -> ResetOutcome {
        let outcome = self.camera.reset();
        if outcome == ResetOutcome::Applied {
            self.frames.cancel_all();
            self.selection.clear_selection();
            self.surface.set_camera(self.camera.pose());
        }
        outcome
    }

    /// Applies gestures delivered through the hub since the last call.
    pub fn process_gestures(&mut self) -> Vec<ResetOutcome> {
        self.gestures
            .poll()
            .into_iter()
            .map(|gesture| match gesture {
                Gesture::DoubleClick => self.reset(),
            })
            .collect()
    }

    /// One rendered frame: pending gestures, then flight continuations.
    pub fn frame(&mut self) -> FrameReport {
        self.process_gestures();
        let report = self.frames.tick(&mut self.camera);
        if report.stepped > 0 {
            self.surface.set_camera(self.camera.pose());
        }
        report
    }

    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) -> Result<(), CameraBusy> {
        self.camera.orbit(d_azimuth, d_polar)?;
        self.surface.set_camera(self.camera.pose());
        Ok(())
    }

    pub fn pan(&mut self, dx: f32, dy: f32) -> Result<(), CameraBusy> {
        self.camera.pan(dx, dy)?;
        self.surface.set_camera(self.camera.pose());
        Ok(())
    }

    pub fn zoom(&mut self, factor: f32) -> Result<(), CameraBusy> {
        self.camera.zoom(factor)?;
        self.surface.set_camera(self.camera.pose());
        Ok(())
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn map(&self) -> Option<&ResolvedMap> {
        self.map.as_ref()
    }

    /// The entity record under carousel focus.
    pub fn focused_entity(&self) -> Option<&EntityRecord> {
        self.entities.get(self.selection.focus()?)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.pending()
    }
}

impl<S: RenderSurface> Drop for ViewportOrchestrator<S> {
    fn drop(&mut self) {
        // No continuation may touch the camera after teardown.
        self.close();
    }
}
