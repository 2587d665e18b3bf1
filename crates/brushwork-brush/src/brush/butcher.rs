use brushwork_geom::{BlockPos, Vec3};
use log::debug;

use super::{Brush, BrushCtx};
use crate::collab::ButcherFlags;
use crate::{BrushError, BrushLimits};

/// Removes entities around the target. Never touches blocks.
#[derive(Clone, Debug, Default)]
pub struct ButcherBrush {
    flags: ButcherFlags,
    /// Allow sizes up to the larger of the brush and butcher caps.
    extended_radius: bool,
}

impl ButcherBrush {
    pub fn new(flags: ButcherFlags) -> Self {
        Self {
            flags,
            extended_radius: false,
        }
    }

    pub fn with_extended_radius(mut self, extended: bool) -> Self {
        self.extended_radius = extended;
        self
    }

    pub fn flags(&self) -> &ButcherFlags {
        &self.flags
    }
}

impl Brush for ButcherBrush {
    fn name(&self) -> &'static str {
        "butcher"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.butcher")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, _size: f64) -> u64 {
        0
    }

    fn max_radius(&self, limits: &BrushLimits) -> Option<f64> {
        limits.butcher_radius_cap(self.extended_radius)
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let size = cx.size;
        let query = cx
            .host
            .entities()
            .ok_or(BrushError::MissingCollaborator("entity query"))?;
        let removed = query.remove_matching(target, size, &self.flags);
        debug!("butcher removed {removed} entities");
        cx.report.entities_removed += removed;
        Ok(())
    }
}
