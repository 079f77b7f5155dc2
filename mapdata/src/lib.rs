//! World map data: the generator payload, its validation, terrain texture
//! selection and grid-to-scene resolution.
//!
//! Nothing in this crate renders or handles input; it produces plain data the
//! viewport hands to a render surface.

pub mod error;
pub mod grid;
pub mod payload;
pub mod texture;
pub mod validate;

pub use error::{Diagnostic, PayloadError};
pub use grid::{
    BuildingPrimitive, EntityMarker, GridResolver, ResolveSettings, ResolvedMap, TileAttributes,
    TileMetadata,
};
pub use payload::{BuildingRecord, EntityRecord, GridPos, MapPayload};
pub use texture::{
    AssetRegistry, TerrainKind, TextureHandle, TextureKey, TextureRegistry, TextureSelector,
};
pub use validate::{Cell, Entity, MapGrid};
