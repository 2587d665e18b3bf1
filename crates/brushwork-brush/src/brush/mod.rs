//! The brush catalog and the context a brush paints through.

pub mod butcher;
pub mod command;
pub mod copy;
pub mod curve;
pub mod erode;
pub mod gravity;
pub mod recurse;
pub mod scatter;
pub mod shape;
pub mod terrain;

use brushwork_blocks::types::Block;
use brushwork_edit::{BlockSource, EditSession};
use brushwork_geom::{BlockPos, Vec3, shape as geo};

use crate::collab::Host;
use crate::mask::Mask;
use crate::pattern::Pattern;
use crate::settings::StrokeReport;
use crate::{BrushError, BrushLimits, StrokeRng};

/// Which button triggered the stroke. Only a few brushes tell them apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Primary,
    Secondary,
}

pub trait Brush: Send {
    fn name(&self) -> &'static str;

    /// Permission node required on top of whatever the binding adds.
    fn permission(&self) -> Option<&'static str> {
        None
    }

    /// Whether the binding must carry a fill pattern.
    fn needs_fill(&self) -> bool {
        true
    }

    /// Upper bound on blocks one application at `size` may write.
    fn max_changes(&self, size: f64) -> u64 {
        geo::sphere_volume_bound(size)
    }

    /// Largest accepted size; `None` when unlimited.
    fn max_radius(&self, limits: &BrushLimits) -> Option<f64> {
        limits.radius_cap()
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        facing: Vec3,
    ) -> Result<(), BrushError>;
}

/// Everything one application sees. Writes go through the session, so a failed stroke
/// leaves the world untouched.
pub struct BrushCtx<'a, 'w> {
    pub edit: &'a mut EditSession<'w>,
    pub size: f64,
    pub fill: &'a dyn Pattern,
    pub mask: &'a dyn Mask,
    pub rng: &'a mut StrokeRng,
    pub action: Action,
    pub limits: &'a BrushLimits,
    pub host: &'a mut dyn Host,
    pub report: StrokeReport,
}

impl BrushCtx<'_, '_> {
    #[inline]
    pub fn source(&self) -> &dyn BlockSource {
        &*self.edit
    }

    #[inline]
    pub fn block(&self, p: BlockPos) -> Block {
        self.edit.block(p)
    }

    #[inline]
    pub fn test(&self, p: BlockPos) -> bool {
        self.mask.test(&*self.edit, p)
    }

    /// Draw the fill for `p` without writing it.
    #[inline]
    pub fn draw(&mut self, p: BlockPos) -> Block {
        self.fill.apply(p, self.rng)
    }

    /// Write the fill at `p` when the mask accepts it.
    pub fn place(&mut self, p: BlockPos) -> Result<bool, BrushError> {
        if !self.test(p) {
            return Ok(false);
        }
        let b = self.fill.apply(p, self.rng);
        Ok(self.edit.set_block(p, b)?)
    }

    /// Write `b` at `p` when the mask accepts it.
    pub fn place_block(&mut self, p: BlockPos, b: Block) -> Result<bool, BrushError> {
        if !self.test(p) {
            return Ok(false);
        }
        Ok(self.edit.set_block(p, b)?)
    }

    /// Write regardless of the mask; used once a brush has already filtered its targets.
    #[inline]
    pub fn set(&mut self, p: BlockPos, b: Block) -> Result<bool, BrushError> {
        Ok(self.edit.set_block(p, b)?)
    }
}
