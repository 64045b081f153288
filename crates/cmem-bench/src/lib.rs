//! Benchmark profiles and utilities for the cmem allocators.
//!
//! Provides deterministic workloads shared by the benchmarks and the demo:
//!
//! - [`heap_trace`]: mixed-size alloc/free churn for the general heap
//! - [`pool_trace`]: churn bounded by a pool's block size
//! - [`lifo_trace`]: push/pop rounds for the stack allocator
//! - [`particle_type`] / [`random_particles`]: a small struct workload for
//!   the ctypes overlay

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cmem_core::AccessType;
use cmem_ctypes::{CType, CTypeError, TypeRegistry, Value};
use cmem_test_utils::script::{random_script, Op};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Mixed-size churn: `len` steps, 60% allocations of 1..=256 bytes.
pub fn heap_trace(seed: u64, len: usize) -> Vec<Op> {
    random_script(seed, len, 1..=256, 0.6)
}

/// Churn whose requests all fit in `block_size` bytes.
pub fn pool_trace(seed: u64, len: usize, block_size: u32) -> Vec<Op> {
    random_script(seed, len, 1..=block_size.max(1), 0.55)
}

/// `rounds` rounds of `depth` pushes of `bytes` bytes followed by popping
/// them again in reverse order.
pub fn lifo_trace(rounds: usize, depth: usize, bytes: u32) -> Vec<Op> {
    let mut ops = Vec::with_capacity(rounds * depth * 2);
    for _ in 0..rounds {
        ops.extend(std::iter::repeat(Op::Alloc(bytes)).take(depth));
        // swap_remove on the last index pops the newest allocation
        ops.extend((0..depth).rev().map(Op::Free));
    }
    ops
}

/// Register `Particle { id: u32, x, y, vx, vy: f32, alive: u8 }`.
pub fn particle_type(registry: &mut TypeRegistry) -> Result<CType, CTypeError> {
    let u32t = registry.number(AccessType::Uint32);
    let f32t = registry.number(AccessType::Float32);
    let u8t = registry.number(AccessType::Uint8);
    registry.define_struct(
        "Particle",
        [
            ("id", u32t),
            ("x", f32t.clone()),
            ("y", f32t.clone()),
            ("vx", f32t.clone()),
            ("vy", f32t),
            ("alive", u8t),
        ],
    )
}

/// `n` particle values with seeded positions and velocities.
///
/// Coordinates are multiples of 1/8 so they survive the `f32` round trip
/// exactly.
pub fn random_particles(seed: u64, n: u32) -> Vec<Value> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut coord = move || Value::Float(f64::from(rng.gen_range(-800i32..=800)) / 8.0);
    (0..n)
        .map(|id| {
            Value::record([
                ("id", Value::Int(i64::from(id))),
                ("x", coord()),
                ("y", coord()),
                ("vx", coord()),
                ("vy", coord()),
                ("alive", Value::Int(1)),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmem_arena::{PoolMemory, SeglistMemory, StackMemory};
    use cmem_ctypes::CArray;
    use cmem_test_utils::script::run_script;

    #[test]
    fn traces_are_deterministic() {
        assert_eq!(heap_trace(7, 200), heap_trace(7, 200));
        assert_eq!(pool_trace(7, 200, 48), pool_trace(7, 200, 48));
        assert!(pool_trace(1, 500, 48)
            .iter()
            .all(|op| !matches!(op, Op::Alloc(b) if *b > 48)));
    }

    #[test]
    fn lifo_trace_unwinds_the_stack() {
        let mut mem = StackMemory::new(64).unwrap();
        let live = run_script(&mut mem, &lifo_trace(3, 10, 24), |_, _| {}).unwrap();
        assert!(live.is_empty());
        assert_eq!(mem.sp(), 4);
    }

    #[test]
    fn traces_replay_without_failure() {
        let mut heap = SeglistMemory::new(256).unwrap();
        run_script(&mut heap, &heap_trace(3, 1000), |_, _| {}).unwrap();
        let mut pool = PoolMemory::new(48, 4).unwrap();
        run_script(&mut pool, &pool_trace(3, 1000, 48), |_, _| {}).unwrap();
    }

    #[test]
    fn particles_fit_their_type() {
        let mut reg = TypeRegistry::new();
        let particle = particle_type(&mut reg).unwrap();
        assert_eq!(particle.bytes(), 24);
        let values = random_particles(11, 16);
        assert_eq!(values, random_particles(11, 16));

        let mut mem = SeglistMemory::new(64).unwrap();
        let ty = reg.array(&particle, 16).unwrap();
        let array = CArray::new(&mut mem, &ty, Some(&Value::Array(values.clone()))).unwrap();
        assert_eq!(array.value(&mem), Value::Array(values));
    }
}
