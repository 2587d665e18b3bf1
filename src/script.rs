//! Stroke scripts: a flat test world, a player, and brush bindings with the clicks to
//! apply them at.

use std::error::Error;
use std::fs;
use std::path::Path;

use brushwork_blocks::BlockRegistry;
use brushwork_blocks::types::Block;
use brushwork_brush::brush::butcher::ButcherBrush;
use brushwork_brush::brush::command::{CommandBrush, ScatterCommandBrush};
use brushwork_brush::brush::copy::{ClipboardBrush, CopyAnchor, CopyPasteBrush};
use brushwork_brush::brush::curve::{
    CatenaryBrush, DrawOptions, LineBrush, SplineBrush, SplineParams, SurfaceSplineBrush,
};
use brushwork_brush::brush::erode::{BlendBallBrush, ErodeBrush, SmoothBrush};
use brushwork_brush::brush::gravity::GravityBrush;
use brushwork_brush::brush::recurse::RecurseBrush;
use brushwork_brush::brush::scatter::{
    PopulateSchemBrush, ScatterBrush, ShatterBrush, SplatterBrush,
};
use brushwork_brush::brush::shape::{
    BlobBrush, CircleBrush, CylinderBrush, LayerBrush, SphereBrush, SurfaceSphereBrush,
};
use brushwork_brush::brush::terrain::{
    HeightBrush, HeightMode, HeightOptions, PullBrush, StencilBrush,
};
use brushwork_brush::collab::{ButcherFlags, PlayerInfo};
use brushwork_brush::heightmap::{HeightMap, HeightMapLoader, resolve_source};
use brushwork_brush::mask::{
    BlockMask, ExistingBlockMask, InverseMask, Mask, SolidBlockMask, SurfaceMask,
};
use brushwork_brush::pattern::{Pattern, RandomPattern};
use brushwork_brush::{Action, Brush, BrushError, BrushLimits, BrushSettings, presets};
use brushwork_edit::{BlockSource, Extent, MemoryExtent};
use brushwork_geom::{BlockPos, Region, Vec3};
use brushwork_structures::Clipboard;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Script {
    #[serde(default)]
    pub world: WorldSpec,
    #[serde(default)]
    pub player: PlayerSpec,
    #[serde(default)]
    pub strokes: Vec<StrokeSpec>,
}

impl Script {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }
}

/// A square of flat ground centred on the origin.
#[derive(Deserialize, Debug, Clone)]
pub struct WorldSpec {
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    #[serde(default = "default_ground_y")]
    pub ground_y: i32,
    #[serde(default = "default_half_extent")]
    pub half_extent: i32,
    #[serde(default = "default_ground")]
    pub ground: String,
    /// Surface block; the ground block when absent.
    #[serde(default)]
    pub top: Option<String>,
}

fn default_min_y() -> i32 {
    0
}
fn default_max_y() -> i32 {
    63
}
fn default_ground_y() -> i32 {
    16
}
fn default_half_extent() -> i32 {
    24
}
fn default_ground() -> String {
    "stone".to_string()
}

impl Default for WorldSpec {
    fn default() -> Self {
        Self {
            min_y: default_min_y(),
            max_y: default_max_y(),
            ground_y: default_ground_y(),
            half_extent: default_half_extent(),
            ground: default_ground(),
            top: None,
        }
    }
}

impl WorldSpec {
    pub fn build(&self, reg: &BlockRegistry) -> Result<MemoryExtent, BrushError> {
        if self.min_y > self.max_y || !(self.min_y..=self.max_y).contains(&self.ground_y) {
            return Err(BrushError::Configuration(format!(
                "ground_y {} must lie within {}..={}",
                self.ground_y, self.min_y, self.max_y
            )));
        }
        let ground = block(reg, &self.ground)?;
        let top = match &self.top {
            Some(name) => block(reg, name)?,
            None => ground,
        };
        let mut world = MemoryExtent::with_height(self.min_y, self.max_y);
        let h = self.half_extent.max(0);
        for (x, z) in Region::new(BlockPos::new(-h, 0, -h), BlockPos::new(h, 0, h)).columns() {
            for y in self.min_y..self.ground_y {
                world.set_block(BlockPos::new(x, y, z), ground);
            }
            world.set_block(BlockPos::new(x, self.ground_y, z), top);
        }
        Ok(world)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PlayerSpec {
    #[serde(default = "default_player")]
    pub name: String,
    #[serde(default = "default_world_name")]
    pub world: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_permissions")]
    pub permissions: Vec<String>,
}

fn default_player() -> String {
    "builder".to_string()
}
fn default_world_name() -> String {
    "world".to_string()
}
fn default_permissions() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for PlayerSpec {
    fn default() -> Self {
        Self {
            name: default_player(),
            world: default_world_name(),
            position: [0.0; 3],
            permissions: default_permissions(),
        }
    }
}

impl PlayerSpec {
    pub fn to_player(&self) -> PlayerInfo {
        let mut player = PlayerInfo::new(&self.name, &self.world);
        let [x, y, z] = self.position;
        player.position = Vec3::new(x, y, z);
        player.permissions = self.permissions.iter().cloned().collect();
        player
    }
}

/// One brush binding and the clicks applied with it, in order.
#[derive(Deserialize, Debug, Clone)]
pub struct StrokeSpec {
    pub brush: BrushSpec,
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default)]
    pub fill: Option<FillSpec>,
    #[serde(default)]
    pub mask: Option<MaskSpec>,
    /// Extra permission nodes on top of the brush's own.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub clicks: Vec<ClickSpec>,
}

fn default_size() -> f64 {
    1.0
}

#[derive(Deserialize, Debug, Clone)]
pub struct ClickSpec {
    pub at: [i32; 3],
    #[serde(default = "default_facing")]
    pub facing: [f32; 3],
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_facing() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

impl ClickSpec {
    pub fn target(&self) -> BlockPos {
        pos(self.at)
    }

    pub fn facing(&self) -> Vec3 {
        let [x, y, z] = self.facing;
        Vec3::new(x, y, z)
    }
}

/// A single block name or a weighted list.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum FillSpec {
    Block(String),
    Weighted(Vec<WeightedBlock>),
}

#[derive(Deserialize, Debug, Clone)]
pub struct WeightedBlock {
    pub block: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// `#existing`, `#solid`, `#surface`, a block name, or a list of block names.
/// A leading `!` inverts a named mask.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MaskSpec {
    Named(String),
    Blocks(Vec<String>),
}

/// Inclusive world box captured into a clipboard anchored at its bottom centre.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct RegionSpec {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

fn pos([x, y, z]: [i32; 3]) -> BlockPos {
    BlockPos::new(x, y, z)
}

impl RegionSpec {
    fn capture(&self, src: &dyn BlockSource) -> Clipboard {
        let region = Region::new(pos(self.min), pos(self.max));
        let c = region.center();
        let anchor = BlockPos::new(c.x, region.min.y, c.z);
        Clipboard::capture(src, region, anchor, |_, b| !b.is_air())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BrushSpec {
    Sphere {
        #[serde(default)]
        hollow: bool,
    },
    Cylinder {
        #[serde(default = "one_i32")]
        height: i32,
        #[serde(default)]
        hollow: bool,
    },
    Circle,
    Blob {
        #[serde(default = "unit_radius")]
        radius: [f32; 3],
        #[serde(default = "one_f64")]
        frequency: f64,
        #[serde(default = "half")]
        amplitude: f64,
    },
    SurfaceSphere,
    Layer {
        layers: Vec<String>,
    },
    Extinguish,
    Height {
        #[serde(default)]
        mode: HeightMode,
        /// Height map name; empty for the flat default.
        #[serde(default)]
        image: String,
        #[serde(default)]
        clipboard: Option<RegionSpec>,
        #[serde(default)]
        rotation: f64,
        #[serde(default = "one_f64")]
        yscale: f64,
        #[serde(default)]
        random_rotate: bool,
        #[serde(default)]
        layers: bool,
        #[serde(default = "yes")]
        smooth: bool,
    },
    Stencil {
        #[serde(default)]
        image: String,
        #[serde(default)]
        clipboard: Option<RegionSpec>,
        #[serde(default = "one_f64")]
        depth: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        random_rotate: bool,
        #[serde(default)]
        only_white: bool,
    },
    Spline {
        #[serde(default)]
        tension: f64,
        #[serde(default)]
        bias: f64,
        #[serde(default)]
        continuity: f64,
        #[serde(default = "default_quality")]
        quality: f64,
        #[serde(default)]
        shell: bool,
        #[serde(default)]
        select: bool,
    },
    SurfaceSpline {
        #[serde(default)]
        tension: f64,
        #[serde(default)]
        bias: f64,
        #[serde(default)]
        continuity: f64,
        #[serde(default = "default_quality")]
        quality: f64,
    },
    Catenary {
        #[serde(default = "default_length_factor")]
        length_factor: f64,
        #[serde(default)]
        shell: bool,
        #[serde(default)]
        select: bool,
    },
    Line {
        #[serde(default)]
        shell: bool,
        #[serde(default)]
        select: bool,
        #[serde(default)]
        flat: bool,
    },
    Recursive {
        #[serde(default)]
        depth_first: bool,
    },
    Scatter {
        #[serde(default = "default_points")]
        points: usize,
        #[serde(default = "one_f64")]
        distance: f64,
        #[serde(default)]
        overlay: bool,
    },
    Splatter {
        #[serde(default = "default_points")]
        points: usize,
        #[serde(default = "default_points_u32")]
        recursion: u32,
        #[serde(default)]
        solid: bool,
    },
    Shatter {
        #[serde(default = "default_cuts")]
        count: u32,
    },
    Populate {
        regions: Vec<RegionSpec>,
        #[serde(default = "default_points")]
        density: usize,
        #[serde(default)]
        random_rotate: bool,
    },
    Gravity {
        #[serde(default)]
        from_max_y: bool,
    },
    Pull,
    Smooth {
        #[serde(default = "default_smooth_iterations")]
        iterations: u32,
        #[serde(default)]
        natural_only: bool,
    },
    Erode,
    BlendBall,
    Copy {
        #[serde(default)]
        anchor: CopyAnchor,
        #[serde(default)]
        random_rotate: bool,
        #[serde(default)]
        auto_rotate: bool,
    },
    Clipboard {
        region: RegionSpec,
        #[serde(default)]
        ignore_air: bool,
        #[serde(default)]
        using_origin: bool,
    },
    Command {
        commands: String,
        #[serde(default = "one_f64")]
        radius: f64,
    },
    ScatterCommand {
        commands: String,
        #[serde(default = "default_points")]
        points: usize,
        #[serde(default = "one_f64")]
        distance: f64,
        #[serde(default = "one_f64")]
        radius: f64,
    },
    Butcher {
        #[serde(default)]
        flags: String,
        #[serde(default)]
        extended_radius: bool,
    },
}

fn one_i32() -> i32 {
    1
}
fn one_f64() -> f64 {
    1.0
}
fn yes() -> bool {
    true
}
fn half() -> f64 {
    0.5
}
fn unit_radius() -> [f32; 3] {
    [1.0; 3]
}
fn default_length_factor() -> f64 {
    1.2
}
fn default_points() -> usize {
    5
}
fn default_points_u32() -> u32 {
    5
}
fn default_cuts() -> u32 {
    10
}
fn default_smooth_iterations() -> u32 {
    4
}
fn default_quality() -> f64 {
    10.0
}

/// What a binding needs from the run besides its own spec.
pub struct BindEnv<'a> {
    pub registry: &'a BlockRegistry,
    pub loader: &'a dyn HeightMapLoader,
    pub limits: &'a BrushLimits,
    pub world: &'a dyn BlockSource,
}

fn block(reg: &BlockRegistry, name: &str) -> Result<Block, BrushError> {
    reg.block_by_name(name)
        .ok_or_else(|| BrushError::Configuration(format!("unknown block `{name}`")))
}

fn height_source(
    env: &BindEnv<'_>,
    image: &str,
    clipboard: Option<&RegionSpec>,
) -> Result<Option<HeightMap>, BrushError> {
    let clip = clipboard.map(|r| r.capture(env.world));
    Ok(resolve_source(env.loader, image, clip.as_ref())?)
}

impl BrushSpec {
    pub fn build(&self, env: &BindEnv<'_>) -> Result<Box<dyn Brush>, BrushError> {
        let reg = env.registry;
        let brush: Box<dyn Brush> = match self {
            BrushSpec::Sphere { hollow } => Box::new(SphereBrush { hollow: *hollow }),
            BrushSpec::Cylinder { height, hollow } => {
                Box::new(CylinderBrush::new(*height, *hollow)?)
            }
            BrushSpec::Circle => Box::new(CircleBrush),
            BrushSpec::Blob {
                radius,
                frequency,
                amplitude,
            } => {
                let [x, y, z] = *radius;
                Box::new(BlobBrush::new(Vec3::new(x, y, z), *frequency, *amplitude)?)
            }
            BrushSpec::SurfaceSphere => Box::new(SurfaceSphereBrush),
            BrushSpec::Layer { layers } => {
                let layers = layers
                    .iter()
                    .map(|n| block(reg, n))
                    .collect::<Result<Vec<_>, _>>()?;
                Box::new(LayerBrush::new(layers)?)
            }
            // bound separately; see `StrokeSpec::bind`
            BrushSpec::Extinguish => Box::new(SphereBrush::solid()),
            BrushSpec::Height {
                mode,
                image,
                clipboard,
                rotation,
                yscale,
                random_rotate,
                layers,
                smooth,
            } => {
                let source = height_source(env, image, clipboard.as_ref())?;
                let opts = HeightOptions {
                    rotation: *rotation,
                    yscale: *yscale,
                    random_rotate: *random_rotate,
                    layers: *layers,
                    smooth: *smooth,
                };
                Box::new(HeightBrush::new(*mode, source, opts, reg)?)
            }
            BrushSpec::Stencil {
                image,
                clipboard,
                depth,
                rotation,
                random_rotate,
                only_white,
            } => {
                let source = height_source(env, image, clipboard.as_ref())?;
                Box::new(StencilBrush::new(
                    source,
                    *depth,
                    *rotation,
                    *random_rotate,
                    *only_white,
                )?)
            }
            BrushSpec::Spline {
                tension,
                bias,
                continuity,
                quality,
                shell,
                select,
            } => {
                let params = SplineParams {
                    tension: *tension,
                    bias: *bias,
                    continuity: *continuity,
                    quality: *quality,
                };
                let draw = DrawOptions {
                    shell: *shell,
                    select: *select,
                    flat: false,
                };
                Box::new(SplineBrush::new(params, draw)?)
            }
            BrushSpec::SurfaceSpline {
                tension,
                bias,
                continuity,
                quality,
            } => Box::new(SurfaceSplineBrush::new(SplineParams {
                tension: *tension,
                bias: *bias,
                continuity: *continuity,
                quality: *quality,
            })?),
            BrushSpec::Catenary {
                length_factor,
                shell,
                select,
            } => Box::new(CatenaryBrush::new(*length_factor, *shell, *select)?),
            BrushSpec::Line {
                shell,
                select,
                flat,
            } => Box::new(LineBrush::new(DrawOptions {
                shell: *shell,
                select: *select,
                flat: *flat,
            })),
            BrushSpec::Recursive { depth_first } => Box::new(RecurseBrush::new(*depth_first)),
            BrushSpec::Scatter {
                points,
                distance,
                overlay,
            } => Box::new(ScatterBrush::new(*points, *distance, *overlay)?),
            BrushSpec::Splatter {
                points,
                recursion,
                solid,
            } => Box::new(SplatterBrush::new(*points, *recursion, *solid)?),
            BrushSpec::Shatter { count } => Box::new(ShatterBrush::new(*count)?),
            BrushSpec::Populate {
                regions,
                density,
                random_rotate,
            } => {
                let clips = regions.iter().map(|r| r.capture(env.world)).collect();
                Box::new(PopulateSchemBrush::new(clips, *density, *random_rotate)?)
            }
            BrushSpec::Gravity { from_max_y } => Box::new(GravityBrush::new(*from_max_y)),
            BrushSpec::Pull => Box::new(PullBrush),
            BrushSpec::Smooth {
                iterations,
                natural_only,
            } => Box::new(SmoothBrush::new(*iterations, *natural_only, reg)),
            BrushSpec::Erode => Box::new(ErodeBrush::default()),
            BrushSpec::BlendBall => Box::new(BlendBallBrush),
            BrushSpec::Copy {
                anchor,
                random_rotate,
                auto_rotate,
            } => Box::new(CopyPasteBrush::new(*anchor, *random_rotate, *auto_rotate)?),
            BrushSpec::Clipboard {
                region,
                ignore_air,
                using_origin,
            } => Box::new(ClipboardBrush::new(
                region.capture(env.world),
                *ignore_air,
                *using_origin,
            )?),
            BrushSpec::Command { commands, radius } => {
                Box::new(CommandBrush::new(commands.as_str(), *radius)?)
            }
            BrushSpec::ScatterCommand {
                commands,
                points,
                distance,
                radius,
            } => Box::new(ScatterCommandBrush::new(
                *points,
                *distance,
                *radius,
                commands.as_str(),
            )?),
            BrushSpec::Butcher {
                flags,
                extended_radius,
            } => {
                let flags = ButcherFlags::parse(flags).map_err(BrushError::Configuration)?;
                Box::new(ButcherBrush::new(flags).with_extended_radius(*extended_radius))
            }
        };
        Ok(brush)
    }
}

impl MaskSpec {
    pub fn build(&self, reg: &BlockRegistry) -> Result<Box<dyn Mask>, BrushError> {
        match self {
            MaskSpec::Blocks(names) => {
                let ids = names
                    .iter()
                    .map(|n| block(reg, n).map(|b| b.id))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(BlockMask::new(ids)))
            }
            MaskSpec::Named(name) => named_mask(reg, name),
        }
    }
}

fn named_mask(reg: &BlockRegistry, name: &str) -> Result<Box<dyn Mask>, BrushError> {
    if let Some(inner) = name.strip_prefix('!') {
        return Ok(Box::new(InverseMask(named_mask(reg, inner)?)));
    }
    Ok(match name {
        "#existing" => Box::new(ExistingBlockMask),
        "#solid" => Box::new(SolidBlockMask::new(reg)),
        "#surface" => Box::new(SurfaceMask),
        _ => Box::new(BlockMask::new([block(reg, name)?.id])),
    })
}

impl FillSpec {
    pub fn build(&self, reg: &BlockRegistry) -> Result<Box<dyn Pattern>, BrushError> {
        match self {
            FillSpec::Block(name) => Ok(Box::new(block(reg, name)?)),
            FillSpec::Weighted(entries) => {
                let entries = entries
                    .iter()
                    .map(|e| block(reg, &e.block).map(|b| (b, e.weight)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(RandomPattern::new(entries)?))
            }
        }
    }
}

impl StrokeSpec {
    /// Construct and validate the binding. Height maps and clipboards load here, never
    /// during a click.
    pub fn bind(&self, env: &BindEnv<'_>) -> Result<BrushSettings, BrushError> {
        if let BrushSpec::Extinguish = self.brush {
            return presets::extinguish(env.registry, self.size, env.limits);
        }
        let mut builder = BrushSettings::builder_boxed(self.brush.build(env)?).size(self.size);
        if let Some(fill) = &self.fill {
            builder = builder.fill_boxed(fill.build(env.registry)?);
        }
        if let Some(mask) = &self.mask {
            builder = builder.mask_boxed(mask.build(env.registry)?);
        }
        for p in &self.permissions {
            builder = builder.permission(p.as_str());
        }
        builder.build(env.limits)
    }
}
