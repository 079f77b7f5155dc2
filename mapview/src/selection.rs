//! Tile selection and the entity carousel.
//!
//! Pure state: transitions happen only on explicit click or navigation events.

use mapdata::{Entity, GridPos, TileMetadata};

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<TileMetadata>,
    /// Placement of each entity in carousel order.
    placements: Vec<Option<GridPos>>,
    focus: usize,
}

impl SelectionState {
    pub fn new(entities: &[Entity]) -> Self {
        Self {
            selected: None,
            placements: entities.iter().map(|e| e.location).collect(),
            focus: 0,
        }
    }

    /// Replaces the current selection. Bounds are the caller's concern.
    pub fn select_tile(&mut self, metadata: TileMetadata) {
        log::debug!("Selected tile ({})", metadata.pos);
        self.selected = Some(metadata);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&TileMetadata> {
        self.selected.as_ref()
    }

    pub fn entity_count(&self) -> usize {
        self.placements.len()
    }

    /// Focused carousel index; `None` when the carousel is empty.
    pub fn focus(&self) -> Option<usize> {
        (!self.placements.is_empty()).then_some(self.focus)
    }

    pub fn focus_next(&mut self) -> Option<usize> {
        let n = self.placements.len();
        if n > 0 {
            self.focus = (self.focus + 1) % n;
        }
        self.focus()
    }

    pub fn focus_previous(&mut self) -> Option<usize> {
        let n = self.placements.len();
        if n > 0 {
            self.focus = (self.focus + n - 1) % n;
        }
        self.focus()
    }

    /// Where the camera should fly for entity `index`, if it is placed.
    pub fn request_zoom(&self, index: usize) -> Option<GridPos> {
        let target = self.placements.get(index).copied().flatten();
        if target.is_none() {
            log::debug!("Entity {} has no placement; zoom ignored", index);
        }
        target
    }
}
