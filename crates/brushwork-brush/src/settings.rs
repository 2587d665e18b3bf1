//! A bound brush and its invocation.

use std::collections::BTreeSet;

use brushwork_blocks::types::Block;
use brushwork_edit::{EditSession, Extent};
use brushwork_geom::{BlockPos, Vec3};
use log::{debug, info};
use rand::SeedableRng;

use crate::brush::{Action, Brush, BrushCtx};
use crate::collab::Host;
use crate::mask::{AnyMask, Mask};
use crate::pattern::Pattern;
use crate::{BrushError, BrushLimits, StrokeRng};

/// What one stroke did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrokeReport {
    /// Blocks actually changed in the world.
    pub changed: usize,
    /// Rotation in degrees the stroke used, when it picked one.
    pub rotation: Option<f64>,
    pub entities_removed: usize,
    pub commands_run: usize,
}

/// One invocation: where, which way, which button, and the collaborators to use.
pub struct Stroke<'h> {
    pub target: BlockPos,
    pub facing: Vec3,
    pub action: Action,
    pub seed: u64,
    pub host: &'h mut dyn Host,
}

impl<'h> Stroke<'h> {
    pub fn new(target: BlockPos, host: &'h mut dyn Host) -> Self {
        Self {
            target,
            facing: Vec3::new(0.0, 0.0, 1.0),
            action: Action::Primary,
            seed: 0,
            host,
        }
    }

    pub fn facing(mut self, facing: Vec3) -> Self {
        self.facing = facing;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A brush bound with its size, fill, mask and required permissions.
pub struct BrushSettings {
    brush: Box<dyn Brush>,
    size: f64,
    fill: Option<Box<dyn Pattern>>,
    mask: Box<dyn Mask>,
    permissions: BTreeSet<String>,
}

pub struct BrushSettingsBuilder {
    brush: Box<dyn Brush>,
    size: f64,
    fill: Option<Box<dyn Pattern>>,
    mask: Option<Box<dyn Mask>>,
    permissions: BTreeSet<String>,
}

impl BrushSettingsBuilder {
    pub fn size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn fill(mut self, fill: impl Pattern + 'static) -> Self {
        self.fill = Some(Box::new(fill));
        self
    }

    pub fn fill_boxed(mut self, fill: Box<dyn Pattern>) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn mask(mut self, mask: impl Mask + 'static) -> Self {
        self.mask = Some(Box::new(mask));
        self
    }

    pub fn mask_boxed(mut self, mask: Box<dyn Mask>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn permission(mut self, perm: impl Into<String>) -> Self {
        self.permissions.insert(perm.into());
        self
    }

    /// Validate against `limits` and bind.
    pub fn build(self, limits: &BrushLimits) -> Result<BrushSettings, BrushError> {
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(BrushError::config(format!(
                "brush size must be a non-negative number, got {}",
                self.size
            )));
        }
        check_radius(self.brush.as_ref(), self.size, limits)?;
        if self.brush.needs_fill() && self.fill.is_none() {
            return Err(BrushError::config(format!(
                "{} brush needs a fill pattern",
                self.brush.name()
            )));
        }
        let mut permissions = self.permissions;
        if let Some(p) = self.brush.permission() {
            permissions.insert(p.to_string());
        }
        Ok(BrushSettings {
            brush: self.brush,
            size: self.size,
            fill: self.fill,
            mask: self.mask.unwrap_or_else(|| Box::new(AnyMask)),
            permissions,
        })
    }
}

fn check_radius(brush: &dyn Brush, size: f64, limits: &BrushLimits) -> Result<(), BrushError> {
    match brush.max_radius(limits) {
        Some(cap) if size > cap => Err(BrushError::LimitExceeded(format!(
            "{} brush size {size} is above the maximum of {cap}",
            brush.name()
        ))),
        _ => Ok(()),
    }
}

impl BrushSettings {
    pub fn builder(brush: impl Brush + 'static) -> BrushSettingsBuilder {
        Self::builder_boxed(Box::new(brush))
    }

    pub fn builder_boxed(brush: Box<dyn Brush>) -> BrushSettingsBuilder {
        BrushSettingsBuilder {
            brush,
            size: 1.0,
            fill: None,
            mask: None,
            permissions: BTreeSet::new(),
        }
    }

    pub fn brush(&self) -> &dyn Brush {
        self.brush.as_ref()
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Run one stroke against `world`.
    ///
    /// Checks permissions, the radius cap and the brush's write bound before touching
    /// anything. All writes go through one session that is committed only if the brush
    /// succeeds.
    pub fn invoke(
        &mut self,
        world: &mut dyn Extent,
        limits: &BrushLimits,
        stroke: Stroke<'_>,
    ) -> Result<StrokeReport, BrushError> {
        let Stroke {
            target,
            facing,
            action,
            seed,
            host,
        } = stroke;
        if let Some(missing) = self
            .permissions
            .iter()
            .find(|p| !host.player().has_permission(p))
        {
            return Err(BrushError::PermissionDenied(missing.clone()));
        }
        check_radius(self.brush.as_ref(), self.size, limits)?;
        let bound = self.brush.max_changes(self.size);
        if bound > limits.max_changes as u64 {
            return Err(BrushError::LimitExceeded(format!(
                "{} brush of size {} may change {bound} blocks, limit is {}",
                self.brush.name(),
                self.size,
                limits.max_changes
            )));
        }

        let mut rng = StrokeRng::seed_from_u64(seed);
        let mut edit = EditSession::with_limit(world, limits.max_changes);
        let fill: &dyn Pattern = match &self.fill {
            Some(f) => f.as_ref(),
            None => &Block::AIR,
        };
        let mut cx = BrushCtx {
            edit: &mut edit,
            size: self.size,
            fill,
            mask: self.mask.as_ref(),
            rng: &mut rng,
            action,
            limits,
            host,
            report: StrokeReport::default(),
        };
        debug!(
            "{} brush at ({}, {}, {}) size {} {:?}",
            self.brush.name(),
            target.x,
            target.y,
            target.z,
            self.size,
            action
        );
        self.brush.apply(&mut cx, target, facing)?;
        let mut report = cx.report;
        report.changed = edit.commit();
        info!(
            "{} brush changed {} blocks",
            self.brush.name(),
            report.changed
        );
        Ok(report)
    }
}
