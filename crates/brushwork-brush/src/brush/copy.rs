use brushwork_geom::shape::sphere_volume_bound;
use brushwork_geom::{BlockPos, Region, Vec3};
use brushwork_structures::{Clipboard, Rotation};
use hashbrown::HashSet;
use log::debug;
use rand::Rng;

use super::recurse::{Traversal, grow_region};
use super::{Action, Brush, BrushCtx};
use crate::BrushError;

/// Where a copied object is anchored, and so where it lands relative to the paste target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyAnchor {
    /// The clicked block.
    #[default]
    Clicked,
    /// The minimum corner of the copied bounds.
    Origin,
    /// The block the player stands in, keeping the player's offset to the object.
    Player,
}

/// Primary click copies the object under the cursor, secondary click pastes it.
#[derive(Clone, Debug)]
pub struct CopyPasteBrush {
    anchor: CopyAnchor,
    random_rotate: bool,
    auto_rotate: bool,
    clipboard: Option<Clipboard>,
}

impl CopyPasteBrush {
    pub fn new(anchor: CopyAnchor, random_rotate: bool, auto_rotate: bool) -> Result<Self, BrushError> {
        if random_rotate && auto_rotate {
            return Err(BrushError::config(
                "random and facing-based rotation cannot both be enabled",
            ));
        }
        Ok(Self {
            anchor,
            random_rotate,
            auto_rotate,
            clipboard: None,
        })
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    fn copy(&mut self, cx: &mut BrushCtx<'_, '_>, target: BlockPos) {
        let mask = cx.mask;
        let src = cx.source();
        let found = grow_region(src, target, cx.size, Traversal::BreadthFirst, |p, b| {
            !b.is_air() && mask.test(src, p)
        });
        let Some(&first) = found.first() else {
            debug!("nothing to copy at ({}, {}, {})", target.x, target.y, target.z);
            return;
        };
        let bounds = found.iter().fold(Region::new(first, first), |r, &p| {
            Region::new(r.min.min(p), r.max.max(p))
        });
        let anchor = match self.anchor {
            CopyAnchor::Clicked => target,
            CopyAnchor::Origin => bounds.min,
            CopyAnchor::Player => cx.host.player().position.floor_pos(),
        };
        let members: HashSet<BlockPos> = found.into_iter().collect();
        let clip = Clipboard::capture(src, bounds, anchor, |p, _| members.contains(&p));
        debug!("copied {} blocks", clip.captured_len());
        self.clipboard = Some(clip);
    }
}

impl Brush for CopyPasteBrush {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.copy")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, size: f64) -> u64 {
        let held = self.clipboard.as_ref().map_or(0, |c| c.captured_len() as u64);
        held.max(sphere_volume_bound(size))
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        facing: Vec3,
    ) -> Result<(), BrushError> {
        match cx.action {
            Action::Primary => {
                self.copy(cx, target);
                Ok(())
            }
            Action::Secondary => {
                let Some(clip) = &self.clipboard else {
                    debug!("paste with an empty copy buffer");
                    return Ok(());
                };
                let rotation = if self.random_rotate {
                    Rotation::quarter_turns(cx.rng.random_range(0..4))
                } else if self.auto_rotate {
                    Rotation::from_facing(facing)
                } else {
                    Rotation::NONE
                };
                cx.report.rotation = Some(rotation.degrees());
                clip.paste(cx.edit, target, rotation, false)?;
                Ok(())
            }
        }
    }
}

/// Pastes a fixed clipboard at every click.
#[derive(Clone, Debug)]
pub struct ClipboardBrush {
    clipboard: Clipboard,
    ignore_air: bool,
    /// Land the clipboard's minimum corner on the target instead of its anchor.
    using_origin: bool,
}

impl ClipboardBrush {
    pub fn new(clipboard: Clipboard, ignore_air: bool, using_origin: bool) -> Result<Self, BrushError> {
        if clipboard.is_empty() {
            return Err(BrushError::config("clipboard brush needs a non-empty clipboard"));
        }
        Ok(Self {
            clipboard,
            ignore_air,
            using_origin,
        })
    }
}

impl Brush for ClipboardBrush {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.clipboard")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, _size: f64) -> u64 {
        self.clipboard.captured_len() as u64
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        let at = if self.using_origin {
            target - self.clipboard.bounds().min
        } else {
            target
        };
        self.clipboard
            .paste(cx.edit, at, Rotation::NONE, self.ignore_air)?;
        Ok(())
    }
}
