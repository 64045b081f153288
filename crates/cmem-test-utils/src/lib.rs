//! Test helpers shared by the cmem crates.
//!
//! - [`Op`] scripts and [`run_script`] drive any [`Memory`] through a
//!   sequence of allocations and frees.
//! - [`LiveSet`] stamps every live allocation with a byte pattern so
//!   overlapping regions show up as corrupted patterns.
//! - [`walk_list`] and [`boundary_tag_bytes`] inspect raw heap bookkeeping.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod script;

pub use script::{random_script, run_script, LiveSet, Op};

use cmem_core::{Memory, RESERVED_BYTES};

/// Follow an intrusive singly linked list through `words`.
///
/// `head` is the word index of the first node and `next_offset` the word
/// offset of the link inside a node. Stops at 0 or after `words.len()`
/// nodes, so a corrupted cyclic list returns instead of looping.
pub fn walk_list(words: &[u32], head: u32, next_offset: u32) -> Vec<u32> {
    let mut nodes = Vec::new();
    let mut node = head;
    while node != 0 && nodes.len() < words.len() {
        nodes.push(node);
        node = words[(node + next_offset) as usize];
    }
    nodes
}

/// Bytes covered by the reserved prefix plus blocks of the given sizes,
/// each with a two word header.
///
/// For a consistent seglist heap this equals the buffer size.
pub fn boundary_tag_bytes<I: IntoIterator<Item = u32>>(sizes: I) -> usize {
    let words: usize = sizes.into_iter().map(|size| size as usize + 2).sum();
    (RESERVED_BYTES as usize / 4 + words) * 4
}

/// Buffer size of `mem` in bytes.
pub fn capacity_bytes<M: Memory + ?Sized>(mem: &M) -> usize {
    mem.capacity_words() * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_list_follows_links() {
        let words = [0, 0, 0, 0, 6, 0, 8, 0, 0, 0];
        assert_eq!(walk_list(&words, 4, 0), vec![4, 6, 8]);
        assert!(walk_list(&words, 0, 0).is_empty());
    }

    #[test]
    fn walk_list_stops_on_cycle() {
        let words = [0, 0, 0, 0, 5, 4];
        assert_eq!(walk_list(&words, 4, 0).len(), words.len());
    }

    #[test]
    fn boundary_tags_include_headers() {
        assert_eq!(boundary_tag_bytes([2]), 32);
        assert_eq!(boundary_tag_bytes([4, 4, 32, 12]), 256);
    }
}
