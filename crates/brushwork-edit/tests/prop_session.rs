use brushwork_blocks::types::Block;
use brushwork_edit::{BlockSource, EditSession, Extent, MemoryExtent, surface_y};
use brushwork_geom::BlockPos;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_write() -> impl Strategy<Value = (BlockPos, Block)> {
    ((-40i32..40, 0i32..64, -40i32..40), 0u16..4)
        .prop_map(|((x, y, z), id)| (BlockPos::new(x, y, z), Block::new(id)))
}

proptest! {
    // Committing a session equals applying the writes directly, last write wins
    #[test]
    fn commit_matches_direct_writes(writes in proptest::collection::vec(arb_write(), 0..200)) {
        let mut direct = MemoryExtent::with_height(0, 63);
        for (p, b) in &writes {
            direct.set_block(*p, *b);
        }
        let mut buffered = MemoryExtent::with_height(0, 63);
        let mut session = EditSession::new(&mut buffered);
        for (p, b) in &writes {
            session.set_block(*p, *b).unwrap();
        }
        session.commit();

        let mut last: HashMap<BlockPos, Block> = HashMap::new();
        for (p, b) in &writes {
            last.insert(*p, *b);
        }
        for p in last.keys() {
            prop_assert_eq!(direct.block(*p), buffered.block(*p));
        }
        prop_assert_eq!(direct.stats().blocks, buffered.stats().blocks);
    }

    // A session that hits its limit can be dropped without touching the world
    #[test]
    fn over_limit_session_is_discardable(writes in proptest::collection::vec(arb_write(), 1..100), limit in 0usize..10) {
        let mut world = MemoryExtent::with_height(0, 63);
        let failed = {
            let mut session = EditSession::with_limit(&mut world, limit);
            writes.iter().any(|(p, b)| session.set_block(*p, *b).is_err())
        };
        if failed {
            prop_assert_eq!(world.stats().blocks, 0);
        }
    }
}

#[test]
fn surface_finds_topmost_block() {
    let mut world = MemoryExtent::with_height(0, 63);
    for y in 0..=10 {
        world.set_block(BlockPos::new(2, y, 2), Block::new(1));
    }
    world.set_block(BlockPos::new(2, 20, 2), Block::new(1));
    assert_eq!(surface_y(&world, 2, 2, 63, 0), Some(20));
    assert_eq!(surface_y(&world, 2, 2, 15, 0), Some(10));
    assert_eq!(surface_y(&world, 3, 2, 63, 0), None);
}
