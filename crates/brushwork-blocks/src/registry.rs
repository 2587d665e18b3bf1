use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{BlockDef, BlocksConfig};
use super::types::{Block, BlockId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub natural: bool,
    /// Maximum stacked layers for layered blocks; `None` for full blocks.
    pub layers: Option<u8>,
    pub falls: bool,
}

impl BlockType {
    #[inline]
    pub fn is_layered(&self) -> bool {
        self.layers.is_some()
    }
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    // Indexed by id; holes are ids never defined.
    pub blocks: Vec<Option<BlockType>>,
    pub by_name: HashMap<String, BlockId>,
    pub layer_block: Option<BlockId>,
}

impl BlockRegistry {
    /// Registry holding only `air`.
    pub fn new() -> Self {
        let mut reg = Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
            layer_block: None,
        };
        reg.insert(air_type());
        reg
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize).and_then(|b| b.as_ref())
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Default-state block for a registered name.
    pub fn block_by_name(&self, name: &str) -> Option<Block> {
        self.id_by_name(name).map(Block::new)
    }

    #[inline]
    pub fn is_solid(&self, b: Block) -> bool {
        self.get(b.id).map(|t| t.solid).unwrap_or(false)
    }

    #[inline]
    pub fn is_natural(&self, b: Block) -> bool {
        self.get(b.id).map(|t| t.natural).unwrap_or(false)
    }

    /// Ids of every block flagged `natural`.
    pub fn natural_ids(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .flatten()
            .filter(|t| t.natural)
            .map(|t| t.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn load_from_path(blocks_path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let blocks_toml = fs::read_to_string(blocks_path)?;
        Self::from_toml_str(&blocks_toml)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_configs(cfg)
    }

    pub fn from_configs(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        for def in cfg.blocks.into_iter() {
            if def.name == "air" {
                if def.id.is_some_and(|id| id != 0) {
                    return Err("block `air` must use id 0".into());
                }
                continue;
            }
            let id = match def.id {
                Some(0) => return Err(format!("block `{}` uses id 0, reserved for air", def.name).into()),
                Some(id) => id,
                None => reg.next_free_id()?,
            };
            if reg.get(id).is_some() {
                return Err(format!("block `{}` reuses id {}", def.name, id).into());
            }
            if reg.by_name.contains_key(&def.name) {
                return Err(format!("block `{}` defined twice", def.name).into());
            }
            reg.insert(compile(def, id));
        }
        if let Some(name) = cfg.layer_block.as_deref() {
            let id = reg
                .id_by_name(name)
                .ok_or_else(|| format!("layer_block `{name}` is not a defined block"))?;
            if reg.get(id).is_some_and(|t| !t.is_layered()) {
                return Err(format!("layer_block `{name}` has no `layers`").into());
            }
            reg.layer_block = Some(id);
        }
        Ok(reg)
    }

    fn next_free_id(&self) -> Result<BlockId, Box<dyn Error>> {
        let idx = self
            .blocks
            .iter()
            .position(|b| b.is_none())
            .unwrap_or(self.blocks.len());
        BlockId::try_from(idx).map_err(|_| "block id space exhausted".into())
    }

    fn insert(&mut self, ty: BlockType) {
        let idx = ty.id as usize;
        if self.blocks.len() <= idx {
            self.blocks.resize(idx + 1, None);
        }
        self.by_name.insert(ty.name.clone(), ty.id);
        self.blocks[idx] = Some(ty);
    }
}

fn air_type() -> BlockType {
    BlockType {
        id: 0,
        name: "air".into(),
        solid: false,
        natural: false,
        layers: None,
        falls: false,
    }
}

fn compile(def: BlockDef, id: BlockId) -> BlockType {
    BlockType {
        id,
        name: def.name,
        solid: def.solid.unwrap_or(true),
        natural: def.natural.unwrap_or(false),
        layers: def.layers.filter(|&n| n > 0),
        falls: def.falls.unwrap_or(false),
    }
}
