use std::collections::HashSet;

use brushwork_blocks::BlockRegistry;
use brushwork_blocks::types::Block;
use brushwork_brush::brush::butcher::ButcherBrush;
use brushwork_brush::brush::command::CommandBrush;
use brushwork_brush::brush::copy::{CopyAnchor, CopyPasteBrush};
use brushwork_brush::brush::curve::{
    CatenaryBrush, DrawOptions, LineBrush, SplineBrush, SplineParams, SurfaceSplineBrush,
};
use brushwork_brush::brush::erode::{BlendBallBrush, ErodeBrush, SmoothBrush};
use brushwork_brush::brush::gravity::GravityBrush;
use brushwork_brush::brush::recurse::RecurseBrush;
use brushwork_brush::brush::scatter::{PopulateSchemBrush, ShatterBrush, SplatterBrush};
use brushwork_brush::brush::shape::{CylinderBrush, SphereBrush};
use brushwork_brush::brush::terrain::{HeightBrush, HeightMode, HeightOptions};
use brushwork_brush::collab::{ButcherFlags, CommandExecutor, EntityQuery};
use brushwork_brush::heightmap::{
    CLIPBOARD_SOURCE, HeightMapError, HeightMapLoader, ImageHeightMapLoader, resolve_source,
};
use brushwork_brush::pattern::RandomPattern;
use brushwork_brush::{
    Action, Brush, BrushError, BrushLimits, BrushSettings, Host, NullHost, PlayerInfo, Stroke,
    presets,
};
use brushwork_edit::{BlockSource, Extent, MemoryExtent, surface_y};
use brushwork_geom::{BlockPos, Region, Vec3};
use brushwork_structures::Clipboard;

const STONE: Block = Block::new(1);
const GRASS: Block = Block::new(2);

fn admin() -> NullHost {
    NullHost::new(PlayerInfo::new("tester", "world").with_permission("*"))
}

fn flat_ground(world: &mut MemoryExtent, half: i32, top: i32) {
    for x in -half..=half {
        for z in -half..=half {
            for y in 0..top {
                world.set_block(BlockPos::new(x, y, z), STONE);
            }
            world.set_block(BlockPos::new(x, top, z), GRASS);
        }
    }
}

#[test]
fn sphere_of_radius_two_writes_33_blocks() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(-16, 15);
    let fill = Block::new(7);
    let mut brush = BrushSettings::builder(SphereBrush::solid())
        .size(2.0)
        .fill(fill)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut host))
        .unwrap();
    assert_eq!(report.changed, 33);
    assert_eq!(world.stats().blocks, 33);
    for p in Region::cube(BlockPos::ZERO, 3).iter() {
        let inside = p.x * p.x + p.y * p.y + p.z * p.z <= 4;
        assert_eq!(world.block(p) == fill, inside, "at {p:?}");
    }
}

#[test]
fn recursive_brush_converts_the_plane_within_radius() {
    let limits = BrushLimits::default();
    let a = Block::new(3);
    let b = Block::new(4);
    let plane = |w: &mut MemoryExtent| {
        for x in 0..10 {
            for z in 0..10 {
                w.set_block(BlockPos::new(x, 0, z), a);
            }
        }
    };
    let center = BlockPos::new(5, 0, 5);

    let mut world = MemoryExtent::with_height(-8, 8);
    plane(&mut world);
    let mut brush = BrushSettings::builder(RecurseBrush::default())
        .size(5.0)
        .fill(b)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(center, &mut host))
        .unwrap();
    for x in 0..10 {
        for z in 0..10 {
            let p = BlockPos::new(x, 0, z);
            let expected = if p.distance_sq(center) <= 25 { b } else { a };
            assert_eq!(world.block(p), expected, "at {p:?}");
        }
    }

    // a radius reaching the corners converts all 100
    let mut world = MemoryExtent::with_height(-8, 8);
    plane(&mut world);
    let mut brush = BrushSettings::builder(RecurseBrush::new(true))
        .size(8.0)
        .fill(b)
        .build(&limits)
        .unwrap();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(center, &mut host))
        .unwrap();
    assert_eq!(report.changed, 100);
    assert_eq!(world.stats().blocks, 100);
}

#[test]
fn oversized_stroke_is_rejected_before_writing() {
    let limits = BrushLimits {
        max_changes: 10,
        ..BrushLimits::default()
    };
    let mut world = MemoryExtent::with_height(-16, 15);
    let mut brush = BrushSettings::builder(SphereBrush::solid())
        .size(2.0)
        .fill(STONE)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let err = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut host))
        .unwrap_err();
    assert!(err.is_limit());
    assert_eq!(world.stats().blocks, 0);
}

#[test]
fn huge_size_without_a_radius_cap_is_a_limit_error() {
    let limits = BrushLimits {
        max_brush_radius: -1.0,
        ..BrushLimits::default()
    };
    let reg = BlockRegistry::new();
    let brushes: Vec<Box<dyn Brush>> = vec![
        Box::new(SphereBrush::solid()),
        Box::new(CylinderBrush::new(4, false).unwrap()),
        Box::new(GravityBrush::new(true)),
        Box::new(ErodeBrush::default()),
        Box::new(
            HeightBrush::new(HeightMode::Raise, None, HeightOptions::default(), &reg).unwrap(),
        ),
    ];
    for brush in brushes {
        let mut world = MemoryExtent::with_height(-16, 15);
        let mut settings = BrushSettings::builder_boxed(brush)
            .size(3.0e6)
            .fill(STONE)
            .build(&limits)
            .unwrap();
        let mut host = admin();
        let err = settings
            .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut host))
            .unwrap_err();
        assert!(err.is_limit(), "{err}");
        assert_eq!(world.stats().blocks, 0);
    }
}

#[test]
fn session_budget_aborts_a_long_line_without_writes() {
    let limits = BrushLimits {
        max_changes: 10,
        ..BrushLimits::default()
    };
    let mut world = MemoryExtent::with_height(-16, 15);
    let mut brush = BrushSettings::builder(LineBrush::new(DrawOptions::default()))
        .size(0.0)
        .fill(STONE)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut host))
        .unwrap();
    let err = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(40, 0, 0), &mut host))
        .unwrap_err();
    assert!(err.is_limit());
    assert_eq!(world.stats().blocks, 0);
}

#[test]
fn radius_over_cap_fails_to_bind() {
    let limits = BrushLimits {
        max_brush_radius: 5.0,
        ..BrushLimits::default()
    };
    let err = BrushSettings::builder(SphereBrush::solid())
        .size(6.0)
        .fill(STONE)
        .build(&limits)
        .err();
    assert!(matches!(err, Some(BrushError::LimitExceeded(_))));
}

#[test]
fn missing_fill_fails_to_bind() {
    let err = BrushSettings::builder(SphereBrush::hollow())
        .size(2.0)
        .build(&BrushLimits::default())
        .err();
    assert!(matches!(err, Some(BrushError::Configuration(_))));
}

#[test]
fn missing_permission_is_denied() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(-16, 15);
    let mut brush = BrushSettings::builder(SphereBrush::solid())
        .size(2.0)
        .fill(STONE)
        .permission("server.builders")
        .build(&limits)
        .unwrap();
    let mut host = NullHost::new(PlayerInfo::new("guest", "world").with_permission("worldedit.brush.*"));
    let err = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut host))
        .unwrap_err();
    assert!(matches!(err, BrushError::PermissionDenied(ref p) if p == "server.builders"));
    assert_eq!(world.stats().blocks, 0);
}

#[test]
fn catenary_rejects_short_chains() {
    for factor in [1.0, 0.5, f64::NAN] {
        let err = CatenaryBrush::new(factor, false, false).err();
        assert!(matches!(err, Some(BrushError::Configuration(_))));
    }
    assert!(CatenaryBrush::new(1.2, false, false).is_ok());
}

#[test]
fn copy_then_paste_at_origin_roundtrips() {
    let limits = BrushLimits::default();
    let base = BlockPos::new(4, 10, 4);
    let mut world = MemoryExtent::with_height(0, 31);
    for y in 0..4 {
        world.set_block(base.offset(0, y, 0), Block::new(1 + y as u16));
    }
    world.set_block(base.offset(1, 0, 0), Block::new(9));
    world.set_block(base.offset(1, 1, 0), Block::new(9));

    let mut brush = BrushSettings::builder(CopyPasteBrush::new(CopyAnchor::Origin, false, false).unwrap())
        .size(6.0)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let copied = brush
        .invoke(&mut world, &limits, Stroke::new(base.offset(0, 2, 0), &mut host))
        .unwrap();
    assert_eq!(copied.changed, 0);

    let mut copy = MemoryExtent::with_height(0, 31);
    let report = brush
        .invoke(
            &mut copy,
            &limits,
            Stroke::new(base, &mut host).action(Action::Secondary),
        )
        .unwrap();
    assert_eq!(report.changed, 6);
    assert_eq!(report.rotation, Some(0.0));
    for p in Region::cube(base, 5).iter() {
        assert_eq!(copy.block(p), world.block(p), "at {p:?}");
    }
}

#[test]
fn paste_follows_facing_when_auto_rotating() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 31);
    world.set_block(BlockPos::new(0, 5, 0), STONE);
    world.set_block(BlockPos::new(1, 5, 0), GRASS);
    let mut brush = BrushSettings::builder(CopyPasteBrush::new(CopyAnchor::Clicked, false, true).unwrap())
        .size(3.0)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 5, 0), &mut host))
        .unwrap();
    let report = brush
        .invoke(
            &mut world,
            &limits,
            Stroke::new(BlockPos::new(10, 5, 10), &mut host)
                .action(Action::Secondary)
                .facing(Vec3::new(-1.0, 0.0, 0.0)),
        )
        .unwrap();
    assert_eq!(report.changed, 2);
    assert!(report.rotation.is_some());
    assert!(CopyPasteBrush::new(CopyAnchor::Clicked, true, true).is_err());
}

#[test]
fn height_brush_raises_the_centre() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    let registry = BlockRegistry::new();
    let opts = HeightOptions {
        smooth: false,
        ..HeightOptions::default()
    };
    let height = HeightBrush::new(HeightMode::Raise, None, opts, &registry).unwrap();
    let mut brush = BrushSettings::builder(height).size(4.0).build(&limits).unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 10, 0), &mut host))
        .unwrap();
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(14));
    assert_eq!(world.block(BlockPos::new(0, 14, 0)), GRASS);
    assert_eq!(world.block(BlockPos::new(0, 12, 0)), STONE);
    assert_eq!(surface_y(&world, 6, 0, 63, 0), Some(10));
}

#[test]
fn height_brush_smooths_by_default() {
    assert!(HeightOptions::default().smooth);
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    let registry = BlockRegistry::new();
    let height = HeightBrush::new(HeightMode::Raise, None, HeightOptions::default(), &registry).unwrap();
    let mut brush = BrushSettings::builder(height).size(4.0).build(&limits).unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 10, 0), &mut host))
        .unwrap();
    // the 3x3 mean of 14, four 13s and four diagonals of 12 or 13 rounds to 13
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(13));
    assert_eq!(surface_y(&world, 6, 0, 63, 0), Some(10));
}

#[test]
fn flatten_pulls_a_bump_down() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    for y in 11..=15 {
        world.set_block(BlockPos::new(0, y, 0), STONE);
    }
    let registry = BlockRegistry::new();
    let opts = HeightOptions {
        yscale: 100.0,
        ..HeightOptions::default()
    };
    let cliff = HeightBrush::new(HeightMode::Cliff, None, opts, &registry).unwrap();
    let mut brush = BrushSettings::builder(cliff).size(6.0).build(&limits).unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(1, 10, 0), &mut host))
        .unwrap();
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(10));
}

#[test]
fn gravity_drops_floating_blocks() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 31);
    world.set_block(BlockPos::new(0, 0, 0), STONE);
    world.set_block(BlockPos::new(0, 5, 0), GRASS);
    let mut brush = BrushSettings::builder(GravityBrush::new(false))
        .size(6.0)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 3, 0), &mut host))
        .unwrap();
    assert_eq!(world.block(BlockPos::new(0, 1, 0)), GRASS);
    assert!(world.is_air(BlockPos::new(0, 5, 0)));
    assert_eq!(world.block(BlockPos::new(0, 0, 0)), STONE);
}

fn palette(first: u16, count: u16) -> RandomPattern {
    RandomPattern::new((first..first + count).map(|id| (Block::new(id), 1.0)).collect()).unwrap()
}

/// Distinct blocks on the y = 10 surface other than grass.
fn painted(world: &MemoryExtent, half: i32) -> (usize, HashSet<Block>) {
    let mut count = 0;
    let mut kinds = HashSet::new();
    for x in -half..=half {
        for z in -half..=half {
            let b = world.block(BlockPos::new(x, 10, z));
            if b != GRASS {
                count += 1;
                kinds.insert(b);
            }
        }
    }
    (count, kinds)
}

#[test]
fn spline_collects_until_the_last_point_repeats() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    let spline = SplineBrush::new(SplineParams::default(), DrawOptions::default()).unwrap();
    let mut brush = BrushSettings::builder(spline)
        .size(0.0)
        .fill(STONE)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let mut click = |world: &mut MemoryExtent, at: BlockPos| {
        brush
            .invoke(world, &limits, Stroke::new(at, &mut host))
            .unwrap()
            .changed
    };
    let (a, b) = (BlockPos::new(0, 20, 0), BlockPos::new(6, 20, 0));
    assert_eq!(click(&mut world, a), 0);
    assert_eq!(click(&mut world, b), 0);
    assert_eq!(click(&mut world, b), 7);
    for x in 0..=6 {
        assert_eq!(world.block(BlockPos::new(x, 20, 0)), STONE);
    }

    // a single point ends collection without drawing
    let lone = BlockPos::new(0, 30, 0);
    assert_eq!(click(&mut world, lone), 0);
    assert_eq!(click(&mut world, lone), 0);
    assert_eq!(world.stats().blocks, 7);
    assert!(SplineBrush::new(
        SplineParams {
            tension: 2.0,
            ..SplineParams::default()
        },
        DrawOptions::default()
    )
    .is_err());
}

#[test]
fn surface_spline_follows_the_ground() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    let sand = Block::new(3);
    let spline = SurfaceSplineBrush::new(SplineParams::default()).unwrap();
    let mut brush = BrushSettings::builder(spline)
        .size(0.0)
        .fill(sand)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    for at in [BlockPos::new(-3, 30, 0), BlockPos::new(3, 12, 0), BlockPos::new(3, 12, 0)] {
        brush
            .invoke(&mut world, &limits, Stroke::new(at, &mut host))
            .unwrap();
    }
    for x in -3..=3 {
        assert_eq!(world.block(BlockPos::new(x, 10, 0)), sand, "x = {x}");
        assert!(world.is_air(BlockPos::new(x, 11, 0)));
    }
    assert_eq!(painted(&world, 8).0, 7);
}

#[test]
fn solid_splatter_draws_once_per_blotch() {
    let limits = BrushLimits::default();
    let splat = |solid: bool| {
        let mut world = MemoryExtent::with_height(0, 63);
        flat_ground(&mut world, 8, 10);
        let mut brush = BrushSettings::builder(SplatterBrush::new(1, 3, solid).unwrap())
            .size(6.0)
            .fill(palette(20, 8))
            .build(&limits)
            .unwrap();
        let mut host = admin();
        brush
            .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 10, 0), &mut host).seed(4))
            .unwrap();
        painted(&world, 8)
    };
    let (count, kinds) = splat(true);
    assert!(count > 1, "{count}");
    assert_eq!(kinds.len(), 1);
    let (count, kinds) = splat(false);
    assert!(count > 1, "{count}");
    assert!(kinds.len() > 1);
    assert!(SplatterBrush::new(0, 3, false).is_err());
}

#[test]
fn shatter_fragments_are_single_coloured() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    let centre = BlockPos::new(0, 20, 0);
    for p in Region::cube(centre, 5).iter() {
        if (p - centre).length_sq() <= 25 {
            world.set_block(p, STONE);
        }
    }
    let mut brush = BrushSettings::builder(ShatterBrush::new(2).unwrap())
        .size(5.0)
        .fill(palette(20, 16))
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(centre, &mut host).seed(11))
        .unwrap();
    assert!(report.changed > 0);
    let mut kinds = HashSet::new();
    for p in Region::cube(centre, 6).iter() {
        let b = world.block(p);
        if (p - centre).length_sq() > 25 {
            assert!(b.is_air(), "{p:?} filled outside the ball");
        } else if b != STONE {
            kinds.insert(b);
        }
    }
    // two cuts split the ball into at most four fragments
    assert!((1..=4).contains(&kinds.len()), "{kinds:?}");
    assert!(ShatterBrush::new(0).is_err());
    assert!(ShatterBrush::new(ShatterBrush::MAX_CUTS + 1).is_err());
}

#[test]
fn populate_pastes_clipboards_onto_the_surface() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    let log = Block::new(5);
    let post = Clipboard::from_blocks(&[(BlockPos::ZERO, log), (BlockPos::new(0, 1, 0), log)])
        .unwrap();
    let mut brush = BrushSettings::builder(PopulateSchemBrush::new(vec![post], 3, false).unwrap())
        .size(5.0)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 10, 0), &mut host))
        .unwrap();
    assert_eq!(report.changed, 6);
    let mut posts = 0;
    for x in -8..=8 {
        for z in -8..=8 {
            if world.block(BlockPos::new(x, 11, z)) == log {
                posts += 1;
                assert_eq!(world.block(BlockPos::new(x, 12, z)), log);
                assert_eq!(world.block(BlockPos::new(x, 10, z)), GRASS);
            }
        }
    }
    assert_eq!(posts, 3);
    assert!(PopulateSchemBrush::new(vec![], 3, false).is_err());
}

#[test]
fn erode_strips_a_lone_pillar() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    for y in 11..=13 {
        world.set_block(BlockPos::new(0, y, 0), STONE);
    }
    let mut brush = BrushSettings::builder(ErodeBrush::default())
        .size(3.0)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 12, 0), &mut host))
        .unwrap();
    assert_eq!(report.changed, 3);
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(10));
    assert_eq!(world.block(BlockPos::new(1, 10, 0)), GRASS);
}

#[test]
fn blend_ball_dissolves_a_floating_block() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 63);
    flat_ground(&mut world, 8, 10);
    world.set_block(BlockPos::new(0, 14, 0), STONE);
    let mut brush = BrushSettings::builder(BlendBallBrush)
        .size(2.0)
        .build(&limits)
        .unwrap();
    let mut host = admin();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 14, 0), &mut host))
        .unwrap();
    assert_eq!(report.changed, 1);
    assert!(world.is_air(BlockPos::new(0, 14, 0)));
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(10));
}

#[test]
fn smooth_iterations_are_capped_by_the_limits() {
    let registry = BlockRegistry::new();
    let bumpy = || {
        let mut world = MemoryExtent::with_height(0, 63);
        flat_ground(&mut world, 8, 10);
        world.set_block(BlockPos::new(0, 11, 0), STONE);
        world.set_block(BlockPos::new(0, 12, 0), STONE);
        world
    };
    let smooth = |limits: &BrushLimits, world: &mut MemoryExtent| {
        let mut brush = BrushSettings::builder(SmoothBrush::new(50, false, &registry))
            .size(3.0)
            .build(limits)
            .unwrap();
        let mut host = admin();
        brush
            .invoke(world, limits, Stroke::new(BlockPos::new(0, 10, 0), &mut host))
            .unwrap()
            .changed
    };

    let frozen = BrushLimits {
        max_iterations: 0,
        ..BrushLimits::default()
    };
    let mut world = bumpy();
    assert_eq!(smooth(&frozen, &mut world), 0);
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(12));

    let mut world = bumpy();
    assert!(smooth(&BrushLimits::default(), &mut world) > 0);
    assert_eq!(surface_y(&world, 0, 0, 63, 0), Some(10));
}

#[derive(Default)]
struct CommandLog {
    ran: Vec<String>,
}

impl CommandExecutor for CommandLog {
    fn run(&mut self, _player: &PlayerInfo, command: &str) -> Result<(), String> {
        if command.starts_with("/fail") {
            return Err("refused".to_string());
        }
        self.ran.push(command.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Mobs {
    calls: Vec<(BlockPos, f64)>,
}

impl EntityQuery for Mobs {
    fn remove_matching(&mut self, center: BlockPos, radius: f64, flags: &ButcherFlags) -> usize {
        self.calls.push((center, radius));
        if flags.animals { 5 } else { 3 }
    }
}

struct TestHost {
    player: PlayerInfo,
    commands: CommandLog,
    mobs: Mobs,
    selected: Vec<Region>,
}

impl TestHost {
    fn new() -> Self {
        Self {
            player: PlayerInfo::new("tester", "overworld").with_permission("*"),
            commands: CommandLog::default(),
            mobs: Mobs::default(),
            selected: Vec::new(),
        }
    }
}

impl Host for TestHost {
    fn player(&self) -> &PlayerInfo {
        &self.player
    }

    fn commands(&mut self) -> Option<&mut dyn CommandExecutor> {
        Some(&mut self.commands)
    }

    fn entities(&mut self) -> Option<&mut dyn EntityQuery> {
        Some(&mut self.mobs)
    }

    fn select(&mut self, region: Region) {
        self.selected.push(region);
    }
}

#[test]
fn command_brush_substitutes_placeholders() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 31);
    let cmd = CommandBrush::new("/say {x},{y},{z} {world} {size}; /heal", 2.0).unwrap();
    let mut brush = BrushSettings::builder(cmd).size(3.0).build(&limits).unwrap();
    let mut host = TestHost::new();
    let target = BlockPos::new(1, 2, 3);
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(target, &mut host))
        .unwrap();
    assert_eq!(report.commands_run, 2);
    assert_eq!(report.changed, 0);
    assert_eq!(host.commands.ran, vec!["/say 1,2,3 overworld 3", "/heal"]);
    assert_eq!(host.selected, vec![Region::cube(target, 2)]);
}

#[test]
fn command_failures_and_missing_executor_surface() {
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 31);
    let mut brush = BrushSettings::builder(CommandBrush::new("/fail now", 1.0).unwrap())
        .build(&limits)
        .unwrap();
    let mut host = TestHost::new();
    let err = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut host))
        .unwrap_err();
    assert!(matches!(err, BrushError::Command { ref reason, .. } if reason == "refused"));

    let mut bare = admin();
    let err = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::ZERO, &mut bare))
        .unwrap_err();
    assert!(matches!(err, BrushError::MissingCollaborator(_)));
}

#[test]
fn butcher_radius_uses_the_larger_cap() {
    let limits = BrushLimits {
        max_brush_radius: 10.0,
        butcher_max_radius: 50.0,
        ..BrushLimits::default()
    };
    let flags = ButcherFlags::parse("a").unwrap();
    let err = BrushSettings::builder(ButcherBrush::new(flags))
        .size(30.0)
        .build(&limits)
        .err();
    assert!(matches!(err, Some(BrushError::LimitExceeded(_))));

    let mut brush = BrushSettings::builder(ButcherBrush::new(flags).with_extended_radius(true))
        .size(30.0)
        .build(&limits)
        .unwrap();
    let mut world = MemoryExtent::with_height(0, 31);
    let mut host = TestHost::new();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(3, 4, 5), &mut host))
        .unwrap();
    assert_eq!(report.entities_removed, 5);
    assert_eq!(host.mobs.calls, vec![(BlockPos::new(3, 4, 5), 30.0)]);
}

#[test]
fn extinguisher_only_clears_fire() {
    let registry = BlockRegistry::from_toml_str(
        r#"
[[blocks]]
name = "stone"
solid = true

[[blocks]]
name = "fire"
"#,
    )
    .unwrap();
    let stone = registry.block_by_name("stone").unwrap();
    let fire = registry.block_by_name("fire").unwrap();
    let limits = BrushLimits::default();
    let mut world = MemoryExtent::with_height(0, 31);
    world.set_block(BlockPos::new(0, 5, 0), stone);
    world.set_block(BlockPos::new(0, 6, 0), fire);
    world.set_block(BlockPos::new(1, 5, 0), fire);
    let mut brush = presets::extinguish(&registry, 3.0, &limits).unwrap();
    assert!(brush.permissions().any(|p| p == "worldedit.brush.ex"));
    let mut host = admin();
    let report = brush
        .invoke(&mut world, &limits, Stroke::new(BlockPos::new(0, 5, 0), &mut host))
        .unwrap();
    assert_eq!(report.changed, 2);
    assert_eq!(world.block(BlockPos::new(0, 5, 0)), stone);
    assert_eq!(world.stats().blocks, 1);
}

#[test]
fn image_loader_reads_grayscale_png() {
    let dir = tempfile::tempdir().unwrap();
    let img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_raw(2, 2, vec![0, 65535, 0, 65535])
        .unwrap();
    img.save(dir.path().join("ridge.png")).unwrap();

    let loader = ImageHeightMapLoader::new(dir.path());
    let map = loader.load("ridge").unwrap();
    assert_eq!((map.width(), map.length()), (2, 2));
    assert_eq!(map.get(0, 0), 0.0);
    assert_eq!(map.get(1, 1), 1.0);
    assert!(loader.load("ridge.png").is_ok());

    assert!(matches!(loader.load("missing"), Err(HeightMapError::NotFound(_))));
    assert!(matches!(loader.load("../ridge"), Err(HeightMapError::NotFound(_))));

    // an absolute name must not replace the directory
    let elsewhere = tempfile::tempdir().unwrap();
    let outside = elsewhere.path().join("secret.png");
    img.save(&outside).unwrap();
    let absolute = outside.to_string_lossy().into_owned();
    assert!(matches!(loader.load(&absolute), Err(HeightMapError::NotFound(_))));
    assert!(matches!(loader.load(""), Err(HeightMapError::NotFound(_))));
    assert!(matches!(
        ImageHeightMapLoader::new(elsewhere.path()).load("secret"),
        Ok(_)
    ));
    assert!(matches!(
        loader.load("https://example.invalid/map.png"),
        Err(HeightMapError::Network(_))
    ));
    assert!(resolve_source(&loader, "", None).unwrap().is_none());
    assert!(resolve_source(&loader, CLIPBOARD_SOURCE, None).unwrap().is_none());
    assert!(resolve_source(&loader, "ridge", None).unwrap().is_some());
}
