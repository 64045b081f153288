//! Allocation scenarios run against all three allocators.

use cmem_arena::{ArenaConfig, PoolConfig, PoolMemory, SeglistMemory, StackMemory};
use cmem_core::{AccessMask, Address, Memory, MemoryError};
use cmem_test_utils::{boundary_tag_bytes, random_script, run_script, walk_list, LiveSet, Op};

#[test]
fn all_allocators_share_the_memory_interface() {
    let mut allocators: Vec<Box<dyn Memory>> = vec![
        Box::new(StackMemory::new(64).unwrap()),
        Box::new(PoolMemory::new(16, 4).unwrap()),
        Box::new(SeglistMemory::new(64).unwrap()),
    ];
    for mem in &mut allocators {
        assert_eq!(mem.alloc(0).unwrap(), Address::NULL);
        let p = mem.alloc(12).unwrap();
        assert!(p.0 >= 16);
        assert_eq!(p.0 % 4, 0);
        mem.register_access(AccessMask::BIT32);
        mem.buffer_mut().store::<i32>(p, -7);
        assert_eq!(mem.buffer().view::<i32>().unwrap()[p.word() as usize], -7);
        mem.free(p);
        mem.free(Address::NULL);
        mem.clear();
    }
}

#[test]
fn stack_scope_pattern() {
    let mut mem = StackMemory::new(32).unwrap();
    let outer = mem.alloc(8).unwrap();
    mem.buffer_mut().store::<u32>(outer, 99);

    let mark = mem.top();
    for bytes in [5, 40, 100, 3] {
        mem.alloc(bytes).unwrap();
    }
    mem.free(mark);
    assert_eq!(mem.top(), mark);
    assert_eq!(mem.buffer().load::<u32>(outer), 99);
}

#[test]
fn pool_free_list_length_tracks_frees() {
    let mut mem = PoolMemory::with_config(PoolConfig::new(17, 10).with_max_blocks(10)).unwrap();
    let mut taken = Vec::new();
    for _ in 0..10 {
        taken.push(mem.alloc(17).unwrap());
    }
    assert!(walk_list(mem.buffer().words(), mem.head(), 0).is_empty());
    assert!(matches!(mem.alloc(1), Err(MemoryError::OutOfMemory { .. })));

    for (freed, address) in taken.into_iter().enumerate() {
        mem.free(address);
        assert_eq!(walk_list(mem.buffer().words(), mem.head(), 0).len(), freed + 1);
    }
    assert_eq!(mem.free_count(), 10);
}

#[test]
fn pool_regions_never_overlap() {
    let mut mem = PoolMemory::new(24, 2).unwrap();
    let mut live = LiveSet::new();
    for op in random_script(7, 400, 1..=24, 0.6) {
        match op {
            Op::Alloc(bytes) => {
                live.alloc(&mut mem, bytes).unwrap();
            }
            Op::Free(pick) => {
                live.free(&mut mem, pick);
            }
        }
        live.verify(&mem).unwrap();
    }
}

#[test]
fn seglist_scenario_grows_then_coalesces() {
    let mut mem = SeglistMemory::new(16).unwrap();
    let sizes = |mem: &SeglistMemory| mem.blocks().iter().map(|b| b.size).collect::<Vec<_>>();

    let p1 = mem.alloc(16).unwrap();
    assert_eq!(mem.capacity_words() * 4, 64);
    let p2 = mem.alloc(16).unwrap();
    assert_eq!(mem.capacity_words() * 4, 64);
    let p3 = mem.alloc(123).unwrap();
    assert_eq!(mem.capacity_words() * 4, 16 + 24 + 24 + 136 + 56);
    assert_eq!(boundary_tag_bytes(sizes(&mem)), 256);

    mem.free(p3);
    mem.free(p2);
    mem.free(p1);
    let blocks = mem.blocks();
    assert_eq!(blocks.len(), 1);
    assert!(!blocks[0].taken);
    assert_eq!(boundary_tag_bytes(sizes(&mem)), 256);
}

#[test]
fn seglist_regions_never_overlap() {
    let mut mem = SeglistMemory::new(128).unwrap();
    let mut live = LiveSet::new();
    for op in random_script(11, 600, 1..=700, 0.55) {
        match op {
            Op::Alloc(bytes) => {
                let p = live.alloc(&mut mem, bytes).unwrap();
                assert_eq!(p.0 % 8, 0);
            }
            Op::Free(pick) => {
                live.free(&mut mem, pick);
            }
        }
        live.verify(&mem).unwrap();
        let sizes = mem.blocks().iter().map(|b| b.size).collect::<Vec<_>>();
        assert_eq!(boundary_tag_bytes(sizes), mem.capacity_words() * 4);
    }
}

#[test]
fn scripted_runs_respect_growth_limits() {
    let script = random_script(3, 200, 1..=64, 1.0);
    let mut stack = StackMemory::with_config(ArenaConfig::new(0).with_max_bytes(1024)).unwrap();
    let result = run_script(&mut stack, &script, |mem, _| {
        assert!(mem.capacity_words() * 4 <= 1024);
    });
    assert!(matches!(result, Err(MemoryError::OutOfMemory { capacity: 1024, .. })));

    let mut heap = SeglistMemory::with_config(ArenaConfig::new(64).with_max_bytes(2048)).unwrap();
    let result = run_script(&mut heap, &script, |mem, _| {
        assert!(mem.capacity_words() * 4 <= 2048);
    });
    assert!(matches!(result, Err(MemoryError::OutOfMemory { capacity: 2048, .. })));
}

#[test]
fn growth_bumps_the_buffer_generation() {
    let mut mem = SeglistMemory::new(16).unwrap();
    mem.register_access(AccessMask::ALL);
    let before = mem.buffer().generation();
    mem.alloc(1000).unwrap();
    assert!(mem.buffer().generation() > before);
    assert!(mem.buffer().view::<f32>().is_some());
}
