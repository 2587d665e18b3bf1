use serde::{Deserialize, Serialize};

// Compact voxel representation used at runtime
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub state: BlockState,
}

pub type BlockId = u16;
pub type BlockState = u16;

impl Block {
    pub const AIR: Block = Block { id: 0, state: 0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id, state: 0 }
    }

    #[inline]
    pub const fn with_state(id: BlockId, state: BlockState) -> Self {
        Self { id, state }
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }
}
