//! Brush catalog for procedural voxel editing.
//!
//! A caller binds a [`BrushSettings`] (brush + size + fill + mask + permissions) and later
//! invokes it at a target block. Every invocation runs synchronously inside one
//! [`EditSession`](brushwork_edit::EditSession): either the whole stroke is committed or
//! nothing is written.
#![forbid(unsafe_code)]

pub mod brush;
pub mod collab;
pub mod config;
mod error;
pub mod heightmap;
pub mod mask;
pub mod pattern;
pub mod presets;
pub mod settings;

pub use brush::{Action, Brush, BrushCtx};
pub use collab::{Host, NullHost, PlayerInfo};
pub use config::BrushLimits;
pub use error::BrushError;
pub use heightmap::HeightMapError;
pub use mask::Mask;
pub use pattern::Pattern;
pub use settings::{BrushSettings, Stroke, StrokeReport};

/// Per-stroke random source. Seeded explicitly so a stroke can be replayed.
pub type StrokeRng = rand_pcg::Pcg64Mcg;
