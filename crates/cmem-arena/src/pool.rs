//! Fixed-size block allocator.
//!
//! Every block of a [`PoolMemory`] has the same size. Free blocks form an
//! intrusive singly linked list: the first word of a free block holds the
//! word index of the next free block, 0 terminates the list.

use cmem_core::{Address, Memory, MemoryError, WordBuffer, RESERVED_BYTES};
use tracing::{debug, trace, warn};

use crate::config::PoolConfig;

/// Pool of equally sized blocks over a growable word buffer.
///
/// - alloc O(1) (amortised over growth)
/// - free O(1), null safe
/// - 4-byte alignment, first block at byte 16
///
/// Freeing the same block twice links it into the free list twice and
/// corrupts the pool. Nothing checks for this.
#[derive(Clone, Debug)]
pub struct PoolMemory {
    buffer: WordBuffer,
    /// Word index of the first free block, 0 when the list is empty.
    head: u32,
    /// Block size in bytes, multiple of 4.
    block_size: u32,
    /// Block size in words.
    entry_size: u32,
    num_blocks: u32,
    max_blocks: u32,
}

impl PoolMemory {
    /// Create a pool of `initial_blocks` blocks of `block_size` bytes.
    pub fn new(block_size: u32, initial_blocks: u32) -> Result<Self, MemoryError> {
        Self::with_config(PoolConfig::new(block_size, initial_blocks))
    }

    /// Create a pool from an explicit config.
    pub fn with_config(config: PoolConfig) -> Result<Self, MemoryError> {
        let (block_size, max_bytes) = config.validate()?;
        let entry_size = block_size >> 2;
        let words = entry_size as usize * config.initial_blocks as usize
            + (RESERVED_BYTES >> 2) as usize;
        let mut pool = Self {
            buffer: WordBuffer::new(words),
            head: 0,
            block_size,
            entry_size,
            num_blocks: config.initial_blocks,
            max_blocks: max_bytes / block_size,
        };
        pool.clear();
        Ok(pool)
    }

    /// Block size in bytes after alignment.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Block size in words.
    pub fn entry_size(&self) -> u32 {
        self.entry_size
    }

    /// Number of blocks currently backed by the buffer.
    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    /// Upper bound on [`PoolMemory::num_blocks`].
    pub fn max_blocks(&self) -> u32 {
        self.max_blocks
    }

    /// Word index of the free list head, 0 when empty.
    pub fn head(&self) -> u32 {
        self.head
    }

    /// Number of blocks on the free list.
    ///
    /// The walk stops after `num_blocks` steps so a list corrupted by a
    /// double free cannot loop forever.
    pub fn free_count(&self) -> u32 {
        let words = self.buffer.words();
        let mut count = 0;
        let mut block = self.head;
        while block != 0 && count < self.num_blocks {
            count += 1;
            block = words[block as usize];
        }
        count
    }

    /// Link every block in `start..` to its successor, the last one to 0.
    fn link_from(&mut self, start: u32) {
        let entry = self.entry_size as usize;
        let words = self.buffer.words_mut();
        let len = words.len();
        if start as usize >= len {
            return;
        }
        let mut i = start as usize;
        while i < len {
            words[i] = (i + entry) as u32;
            i += entry;
        }
        words[len - entry] = 0;
    }

    fn grow(&mut self) -> Result<(), MemoryError> {
        let new_blocks = self.num_blocks.saturating_mul(2).max(1).min(self.max_blocks);
        if new_blocks == self.num_blocks {
            warn!(
                block_size = self.block_size,
                num_blocks = self.num_blocks,
                "pool memory exhausted"
            );
            return Err(MemoryError::OutOfMemory {
                requested: self.block_size,
                capacity: self.max_blocks * self.block_size,
            });
        }
        let old_words = self.buffer.len_words() as u32;
        let new_words =
            self.entry_size as usize * new_blocks as usize + (RESERVED_BYTES >> 2) as usize;
        self.buffer.grow(new_words);
        self.link_from(old_words);
        self.head = old_words;
        debug!(old_blocks = self.num_blocks, new_blocks, "pool memory grown");
        self.num_blocks = new_blocks;
        self.update_access();
        Ok(())
    }
}

impl Memory for PoolMemory {
    fn alloc(&mut self, bytes: u32) -> Result<Address, MemoryError> {
        if bytes == 0 {
            return Ok(Address::NULL);
        }
        let requested = u64::from(bytes).div_ceil(4) * 4;
        if requested > u64::from(self.block_size) {
            return Err(MemoryError::BlockSizeExceeded {
                requested: requested.min(u64::from(u32::MAX)) as u32,
                block_size: self.block_size,
            });
        }
        if self.head == 0 {
            self.grow()?;
        }
        let block = self.head;
        self.head = self.buffer.words()[block as usize];
        Ok(Address::from_word(block))
    }

    fn free(&mut self, address: Address) {
        if address.is_null() {
            return;
        }
        let block = address.word();
        self.buffer.words_mut()[block as usize] = self.head;
        self.head = block;
    }

    fn clear(&mut self) {
        let start = RESERVED_BYTES >> 2;
        if self.num_blocks == 0 {
            self.head = 0;
        } else {
            self.link_from(start);
            self.head = start;
        }
        trace!(num_blocks = self.num_blocks, "pool memory cleared");
    }

    fn buffer(&self) -> &WordBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut WordBuffer {
        &mut self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_links_all_blocks() {
        let mem = PoolMemory::new(2, 10).unwrap();
        assert_eq!(mem.capacity_words(), 14);
        assert_eq!(mem.head(), 4);
        assert_eq!(mem.free_count(), 10);
        let words = mem.buffer().words();
        for i in 4..13 {
            assert_eq!(words[i], i as u32 + 1);
        }
        assert_eq!(words[13], 0);
    }

    #[test]
    fn entry_size_follows_aligned_block_size() {
        assert_eq!(PoolMemory::new(7, 10).unwrap().entry_size(), 2);
        assert_eq!(PoolMemory::new(8, 10).unwrap().entry_size(), 2);
        assert_eq!(PoolMemory::new(9, 10).unwrap().entry_size(), 3);
        assert_eq!(PoolMemory::new(997, 10).unwrap().entry_size(), 250);
    }

    #[test]
    fn alloc_up_to_block_size() {
        let mut mem = PoolMemory::new(17, 20).unwrap();
        for bytes in 1..=20 {
            let p = mem.alloc(bytes).unwrap();
            assert_eq!(p.0 % 4, 0);
            assert!(p.0 >= RESERVED_BYTES);
        }
        let err = mem.alloc(21).unwrap_err();
        assert_eq!(
            err,
            MemoryError::BlockSizeExceeded {
                requested: 24,
                block_size: 20
            }
        );
    }

    #[test]
    fn alloc_pops_in_address_order() {
        let mut mem = PoolMemory::new(8, 3).unwrap();
        assert_eq!(mem.alloc(8).unwrap(), Address(16));
        assert_eq!(mem.alloc(8).unwrap(), Address(24));
        assert_eq!(mem.alloc(8).unwrap(), Address(32));
        assert_eq!(mem.head(), 0);
    }

    #[test]
    fn grows_by_doubling_until_max_blocks() {
        let mut mem = PoolMemory::with_config(PoolConfig::new(17, 10).with_max_blocks(10)).unwrap();
        for _ in 0..10 {
            mem.alloc(17).unwrap();
        }
        assert!(matches!(mem.alloc(17), Err(MemoryError::OutOfMemory { .. })));

        let mut mem = PoolMemory::new(4, 2).unwrap();
        let generation = mem.buffer().generation();
        for _ in 0..3 {
            mem.alloc(4).unwrap();
        }
        assert_eq!(mem.num_blocks(), 4);
        assert_eq!(mem.capacity_words(), 4 + 4);
        assert!(mem.buffer().generation() > generation);
        assert_eq!(mem.free_count(), 1);
    }

    #[test]
    fn empty_pool_grows_to_one_block() {
        let mut mem = PoolMemory::new(12, 0).unwrap();
        assert_eq!(mem.head(), 0);
        assert_eq!(mem.free_count(), 0);
        let p = mem.alloc(12).unwrap();
        assert_eq!(p, Address(16));
        assert_eq!(mem.num_blocks(), 1);
        let q = mem.alloc(12).unwrap();
        assert_eq!(q, Address(28));
        assert_eq!(mem.num_blocks(), 2);
    }

    #[test]
    fn free_pushes_onto_head() {
        let mut mem = PoolMemory::new(8, 4).unwrap();
        let a = mem.alloc(4).unwrap();
        let b = mem.alloc(4).unwrap();
        mem.free(a);
        assert_eq!(mem.head(), a.word());
        mem.free(b);
        assert_eq!(mem.head(), b.word());
        assert_eq!(mem.alloc(1).unwrap(), b);
        assert_eq!(mem.alloc(1).unwrap(), a);
        mem.free(Address::NULL);
        assert_eq!(mem.free_count(), 2);
    }

    #[test]
    fn clear_restores_full_list() {
        let mut mem = PoolMemory::new(8, 4).unwrap();
        for _ in 0..6 {
            mem.alloc(8).unwrap();
        }
        mem.clear();
        assert_eq!(mem.head(), 4);
        assert_eq!(mem.free_count(), mem.num_blocks());
    }
}
