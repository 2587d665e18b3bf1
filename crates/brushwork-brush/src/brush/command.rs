//! Brushes whose only effect is running commands through the host.

use brushwork_geom::shape::extent;
use brushwork_geom::{BlockPos, Region, Vec3};
use log::debug;

use super::scatter::surface_points;
use super::{Brush, BrushCtx};
use crate::BrushError;

/// Expand `{x} {y} {z} {world} {size}` in one command.
pub fn substitute(command: &str, p: BlockPos, world: &str, size: f64) -> String {
    let size = if size.fract() == 0.0 {
        format!("{}", size as i64)
    } else {
        format!("{size}")
    };
    command
        .replace("{x}", &p.x.to_string())
        .replace("{y}", &p.y.to_string())
        .replace("{z}", &p.z.to_string())
        .replace("{world}", world)
        .replace("{size}", &size)
}

fn parse_radius(radius: f64) -> Result<f64, BrushError> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(BrushError::config(format!(
            "selection radius must be non-negative, got {radius}"
        )));
    }
    Ok(radius)
}

/// Selects the cube of `radius` around `p` and runs each `;`-separated command there.
fn run_at(
    cx: &mut BrushCtx<'_, '_>,
    commands: &str,
    radius: f64,
    p: BlockPos,
) -> Result<(), BrushError> {
    cx.host.select(Region::cube(p, extent(radius)));
    let player = cx.host.player().clone();
    let size = cx.size;
    let exec = cx
        .host
        .commands()
        .ok_or(BrushError::MissingCollaborator("command executor"))?;
    for raw in commands.split(';').map(str::trim).filter(|c| !c.is_empty()) {
        let command = substitute(raw, p, &player.world, size);
        debug!("running `{command}` for {}", player.name);
        exec.run(&player, &command)
            .map_err(|reason| BrushError::Command {
                command: command.clone(),
                reason,
            })?;
        cx.report.commands_run += 1;
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct CommandBrush {
    commands: String,
    radius: f64,
}

impl CommandBrush {
    pub fn new(commands: impl Into<String>, radius: f64) -> Result<Self, BrushError> {
        Ok(Self {
            commands: commands.into(),
            radius: parse_radius(radius)?,
        })
    }
}

impl Brush for CommandBrush {
    fn name(&self) -> &'static str {
        "command"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.command")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, _size: f64) -> u64 {
        0
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        run_at(cx, &self.commands, self.radius, target)
    }
}

/// Runs the commands at scattered surface points instead of the target.
#[derive(Clone, Debug)]
pub struct ScatterCommandBrush {
    points: usize,
    distance: f64,
    radius: f64,
    commands: String,
}

impl ScatterCommandBrush {
    pub fn new(
        points: usize,
        distance: f64,
        radius: f64,
        commands: impl Into<String>,
    ) -> Result<Self, BrushError> {
        if points == 0 {
            return Err(BrushError::config("point count must be at least 1"));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(BrushError::config("point distance must be non-negative"));
        }
        Ok(Self {
            points,
            distance,
            radius: parse_radius(radius)?,
            commands: commands.into(),
        })
    }
}

impl Brush for ScatterCommandBrush {
    fn name(&self) -> &'static str {
        "scatter command"
    }

    fn permission(&self) -> Option<&'static str> {
        Some("worldedit.brush.scattercommand")
    }

    fn needs_fill(&self) -> bool {
        false
    }

    fn max_changes(&self, _size: f64) -> u64 {
        0
    }

    fn apply(
        &mut self,
        cx: &mut BrushCtx<'_, '_>,
        target: BlockPos,
        _facing: Vec3,
    ) -> Result<(), BrushError> {
        for p in surface_points(cx, target, self.points, self.distance) {
            run_at(cx, &self.commands, self.radius, p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_expand() {
        let got = substitute("/tp {x} {y} {z} in {world} r{size}", BlockPos::new(1, -2, 3), "w", 4.0);
        assert_eq!(got, "/tp 1 -2 3 in w r4");
        assert_eq!(substitute("{size}", BlockPos::ZERO, "w", 2.5), "2.5");
    }
}
