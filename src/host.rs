use brushwork_brush::Host;
use brushwork_brush::collab::{ButcherFlags, CommandExecutor, EntityQuery, PlayerInfo};
use brushwork_geom::{BlockPos, Region};
use log::{debug, info};

/// Logs commands instead of running them.
#[derive(Default, Debug)]
pub struct CommandLog {
    pub ran: Vec<String>,
}

impl CommandExecutor for CommandLog {
    fn run(&mut self, player: &PlayerInfo, command: &str) -> Result<(), String> {
        info!("{} runs `{command}`", player.name);
        self.ran.push(command.to_string());
        Ok(())
    }
}

/// The test world has no entities; butcher strokes only log the query.
#[derive(Default, Debug)]
pub struct NoEntities;

impl EntityQuery for NoEntities {
    fn remove_matching(&mut self, center: BlockPos, radius: f64, flags: &ButcherFlags) -> usize {
        info!(
            "butcher at ({}, {}, {}) radius {radius} {flags:?}: no entities",
            center.x, center.y, center.z
        );
        0
    }
}

pub struct ScriptHost {
    player: PlayerInfo,
    pub commands: CommandLog,
    entities: NoEntities,
    pub selection: Option<Region>,
}

impl ScriptHost {
    pub fn new(player: PlayerInfo) -> Self {
        Self {
            player,
            commands: CommandLog::default(),
            entities: NoEntities,
            selection: None,
        }
    }
}

impl Host for ScriptHost {
    fn player(&self) -> &PlayerInfo {
        &self.player
    }

    fn commands(&mut self) -> Option<&mut dyn CommandExecutor> {
        Some(&mut self.commands)
    }

    fn entities(&mut self) -> Option<&mut dyn EntityQuery> {
        Some(&mut self.entities)
    }

    fn select(&mut self, region: Region) {
        debug!("selection now {:?}..{:?}", region.min, region.max);
        self.selection = Some(region);
    }
}
