use serde::Deserialize;

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
    // Name of the block used by layered terrain edits (snow layers); optional.
    #[serde(default)]
    pub layer_block: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub solid: Option<bool>,
    // Naturally occurring terrain (stone, dirt, sand, ...). Smoothing may restrict reads to these.
    #[serde(default)]
    pub natural: Option<bool>,
    // Number of sub-block layers the block can stack (e.g. 8 for snow layers). Absent for full blocks.
    #[serde(default)]
    pub layers: Option<u8>,
    // Falls when unsupported (sand, gravel).
    #[serde(default)]
    pub falls: Option<bool>,
}

impl BlockDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            solid: None,
            natural: None,
            layers: None,
            falls: None,
        }
    }
}
