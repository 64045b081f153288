//! Scripted allocation sequences.

use std::ops::RangeInclusive;

use cmem_core::{Address, Memory, MemoryError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One step of an allocation script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many bytes.
    Alloc(u32),
    /// Free the live allocation at this position (modulo the live count).
    /// Ignored when nothing is live.
    Free(usize),
}

/// Deterministic script of `len` operations.
///
/// Roughly `alloc_ratio` of the steps allocate a size drawn from `sizes`;
/// the rest free a random live allocation.
pub fn random_script(seed: u64, len: usize, sizes: RangeInclusive<u32>, alloc_ratio: f64) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.gen_bool(alloc_ratio) {
                Op::Alloc(rng.gen_range(sizes.clone()))
            } else {
                Op::Free(rng.gen_range(0..usize::MAX))
            }
        })
        .collect()
}

/// Run `ops` against `mem`, calling `check` after every step.
///
/// Returns the addresses still live at the end. Stops at the first failed
/// allocation.
pub fn run_script<M, F>(mem: &mut M, ops: &[Op], mut check: F) -> Result<Vec<Address>, MemoryError>
where
    M: Memory + ?Sized,
    F: FnMut(&M, &[Address]),
{
    let mut live = Vec::new();
    for op in ops {
        match *op {
            Op::Alloc(bytes) => live.push(mem.alloc(bytes)?),
            Op::Free(pick) => {
                if !live.is_empty() {
                    let address = live.swap_remove(pick % live.len());
                    mem.free(address);
                }
            }
        }
        check(mem, &live);
    }
    Ok(live)
}

/// Live allocations stamped with a per-allocation byte pattern.
///
/// If two live regions overlap, writing the second pattern clobbers the
/// first and [`LiveSet::verify`] reports it.
#[derive(Debug, Default)]
pub struct LiveSet {
    entries: Vec<(Address, u32, u8)>,
    next_tag: u8,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Allocate `bytes` from `mem` and stamp the region.
    pub fn alloc<M: Memory + ?Sized>(&mut self, mem: &mut M, bytes: u32) -> Result<Address, MemoryError> {
        let address = mem.alloc(bytes)?;
        self.next_tag = self.next_tag.wrapping_add(1).max(1);
        let tag = self.next_tag;
        mem.buffer_mut().write_bytes(address, &vec![tag; bytes as usize]);
        self.entries.push((address, bytes, tag));
        Ok(address)
    }

    /// Free the entry at `pick` (modulo the live count) and return its address.
    pub fn free<M: Memory + ?Sized>(&mut self, mem: &mut M, pick: usize) -> Option<Address> {
        if self.entries.is_empty() {
            return None;
        }
        let (address, _, _) = self.entries.swap_remove(pick % self.entries.len());
        mem.free(address);
        Some(address)
    }

    /// Check every live region still holds its pattern.
    pub fn verify<M: Memory + ?Sized>(&self, mem: &M) -> Result<(), String> {
        for &(address, bytes, tag) in &self.entries {
            let data = mem.buffer().bytes(address, bytes);
            if let Some(pos) = data.iter().position(|&b| b != tag) {
                return Err(format!(
                    "allocation at {address} ({bytes} bytes) clobbered at offset {pos}"
                ));
            }
        }
        Ok(())
    }

    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.iter().map(|&(address, _, _)| address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_script_is_deterministic() {
        let a = random_script(42, 64, 1..=100, 0.6);
        let b = random_script(42, 64, 1..=100, 0.6);
        assert_eq!(a, b);
        assert_ne!(a, random_script(43, 64, 1..=100, 0.6));
        for op in a {
            if let Op::Alloc(bytes) = op {
                assert!((1..=100).contains(&bytes));
            }
        }
    }
}
