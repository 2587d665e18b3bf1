//! Things a brush may need from its surroundings besides voxels: who is painting, a way to
//! run commands, an entity index, and a selection to update.

use std::collections::BTreeSet;

use brushwork_geom::{BlockPos, Region, Vec3};

/// The acting player.
#[derive(Clone, Debug, Default)]
pub struct PlayerInfo {
    pub name: String,
    pub world: String,
    /// Eye position, used as a paste anchor.
    pub position: Vec3,
    pub permissions: BTreeSet<String>,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: world.into(),
            ..Self::default()
        }
    }

    pub fn with_permission(mut self, perm: impl Into<String>) -> Self {
        self.permissions.insert(perm.into());
        self
    }

    /// Exact node, `*`, or a `prefix.*` wildcard grant.
    pub fn has_permission(&self, perm: &str) -> bool {
        if self.permissions.contains(perm) || self.permissions.contains("*") {
            return true;
        }
        let mut node = perm;
        while let Some(idx) = node.rfind('.') {
            node = &node[..idx];
            if self.permissions.contains(&format!("{node}.*")) {
                return true;
            }
        }
        false
    }
}

pub trait CommandExecutor {
    fn run(&mut self, player: &PlayerInfo, command: &str) -> Result<(), String>;
}

/// Entity categories the butcher flags select between. Hostile mobs are always eligible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Hostile,
    Pet,
    Npc,
    Golem,
    Animal,
    Ambient,
    ArmorStand,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButcherFlags {
    pub pets: bool,
    pub npcs: bool,
    pub golems: bool,
    pub animals: bool,
    pub ambient: bool,
    /// Also remove entities carrying a name tag.
    pub tagged: bool,
    pub armor_stands: bool,
}

impl ButcherFlags {
    /// Every category at once.
    pub fn compound() -> Self {
        Self {
            pets: true,
            npcs: true,
            golems: true,
            animals: true,
            ambient: true,
            tagged: true,
            armor_stands: true,
        }
    }

    /// Parse single-letter flags: `p n g a b t r`, or `f` for all of them.
    /// `l` (lightning) is accepted and ignored.
    pub fn parse(flags: &str) -> Result<Self, String> {
        let mut out = Self::default();
        for c in flags.chars() {
            match c {
                'p' => out.pets = true,
                'n' => out.npcs = true,
                'g' => out.golems = true,
                'a' => out.animals = true,
                'b' => out.ambient = true,
                't' => out.tagged = true,
                'r' => out.armor_stands = true,
                'f' => out = Self::compound(),
                'l' | '-' => {}
                other => return Err(format!("unknown butcher flag `{other}`")),
            }
        }
        Ok(out)
    }

    pub fn matches(&self, category: EntityCategory, tagged: bool) -> bool {
        if tagged && !self.tagged {
            return false;
        }
        match category {
            EntityCategory::Hostile => true,
            EntityCategory::Pet => self.pets,
            EntityCategory::Npc => self.npcs,
            EntityCategory::Golem => self.golems,
            EntityCategory::Animal => self.animals,
            EntityCategory::Ambient => self.ambient,
            EntityCategory::ArmorStand => self.armor_stands,
        }
    }
}

pub trait EntityQuery {
    /// Remove entities within `radius` of `center` that match `flags`; returns the count.
    fn remove_matching(&mut self, center: BlockPos, radius: f64, flags: &ButcherFlags) -> usize;
}

/// Everything outside the voxel world a stroke can talk to.
pub trait Host {
    fn player(&self) -> &PlayerInfo;

    fn commands(&mut self) -> Option<&mut dyn CommandExecutor> {
        None
    }

    fn entities(&mut self) -> Option<&mut dyn EntityQuery> {
        None
    }

    /// Replace the player's current selection.
    fn select(&mut self, _region: Region) {}
}

/// A player with no collaborators attached.
#[derive(Clone, Debug, Default)]
pub struct NullHost {
    pub player: PlayerInfo,
}

impl NullHost {
    pub fn new(player: PlayerInfo) -> Self {
        Self { player }
    }
}

impl Host for NullHost {
    fn player(&self) -> &PlayerInfo {
        &self.player
    }
}
