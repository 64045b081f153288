//! General purpose heap with segregated free lists.
//!
//! [`SeglistMemory`] behaves like `malloc`/`free`: regions of different
//! sizes are allocated and released independently. Free blocks are kept in
//! eight doubly linked lists by size class:
//!
//! ```text
//! list:      0     1      2      3       4        5        6      7
//! bytes:   1-8  9-16  17-32  33-64  65-128  129-256  257-512  >512
//! ```
//!
//! Lists 0 to 6 are LIFO and O(1); list 7 is searched first fit.
//!
//! # Block layout
//!
//! Every block starts with a two word header. The size of the left
//! neighbour lives in the block's own header instead of a footer, which
//! keeps data 8-byte aligned. The highest block is tracked separately as
//! `last`.
//!
//! ```text
//! free block   [ left size | own size | prev in list | next in list | ... ]
//! taken block  [ left size | own size | data ...                          ]
//! ```
//!
//! Sizes are in words and exclude the header. Bit 0 of `own size` marks the
//! block as taken; bit 0 of `left size` mirrors the left neighbour's flag.

use cmem_core::{align8, Address, Memory, MemoryError, WordBuffer, MAX_BYTES, RESERVED_BYTES};
use tracing::{debug, trace, warn};

use crate::config::ArenaConfig;

const PREV_SIZE: u32 = 0;
const SIZE: u32 = 1;
const PREV_LINKED: u32 = 2;
const NEXT_LINKED: u32 = 3;
const DATA: u32 = 2;
const HEADER_SIZE: u32 = 2;

/// Number of segregated free lists.
pub const SEGLIST_SIZE: usize = 8;

/// Smallest block a split may leave behind, in words.
const MIN_SPLIT: u32 = 3;

/// Maps a de Bruijn product of a smeared value to its log2, clamped to the
/// last list. Index 31 only occurs for `u32::MAX`.
const HEAD_IDX: [u8; 32] = [
    0, 7, 1, 7, 7, 7, 2, 7, 7, 7, 7, 7, 7, 7, 3, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 6, 7, 5, 4, 31,
];

fn to_head_index(mut v: u32) -> usize {
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    HEAD_IDX[(v.wrapping_mul(0x07C4_ACDD) >> 27) as usize] as usize
}

/// First list that may hold a block of `size` words.
///
/// Every block in the returned list (and above, except list 7) is at least
/// `size` words long.
pub fn get_from_head(size: u32) -> usize {
    to_head_index(size.wrapping_sub(1)).min(SEGLIST_SIZE - 1)
}

/// List a free block of `size` words belongs to.
///
/// `None` for sizes below 2 words, which never occur as free blocks.
pub fn set_to_head(size: u32) -> Option<usize> {
    if size >= 256 {
        return Some(SEGLIST_SIZE - 1);
    }
    to_head_index(size).checked_sub(1)
}

/// One block of the heap as seen by [`SeglistMemory::blocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Word index of the block header.
    pub index: u32,
    /// Block size in words, header excluded.
    pub size: u32,
    /// Whether the block is allocated.
    pub taken: bool,
}

impl BlockInfo {
    /// Byte address handed out by `alloc` for this block.
    pub fn data_address(&self) -> Address {
        Address::from_word(self.index + DATA)
    }
}

/// Segregated free-list heap over a growable word buffer.
///
/// - alloc O(1) up to 512 bytes, O(k) above for k free blocks in list 7
/// - free O(1), null safe, not double-free safe
/// - 8-byte alignment, first block at byte 16, first data at byte 24
///
/// Allocations are split when the rest can hold another block; freed blocks
/// coalesce with free neighbours on both sides. Writing outside an
/// allocation corrupts the heap.
#[derive(Clone, Debug)]
pub struct SeglistMemory {
    buffer: WordBuffer,
    /// Word index of the first block of each list, 0 for empty.
    heads: [u32; SEGLIST_SIZE],
    /// Word index of the highest block.
    last: u32,
    max_bytes: u32,
}

impl SeglistMemory {
    /// Create a heap with `initial_bytes` usable bytes and the default limit.
    ///
    /// `initial_bytes` must be a multiple of 8 and at least 16.
    pub fn new(initial_bytes: u32) -> Result<Self, MemoryError> {
        Self::with_config(ArenaConfig::new(initial_bytes))
    }

    /// Create a heap from an explicit config.
    pub fn with_config(config: ArenaConfig) -> Result<Self, MemoryError> {
        let max_bytes = config.validate(8, MAX_BYTES - 4)?;
        if config.initial_bytes < 16 {
            return Err(MemoryError::InvalidConfig {
                reason: "initialBytes must be at least 16".to_string(),
            });
        }
        let mut heap = Self {
            buffer: WordBuffer::new(config.initial_words()),
            heads: [0; SEGLIST_SIZE],
            last: 0,
            max_bytes,
        };
        heap.clear();
        Ok(heap)
    }

    /// Growth limit in bytes.
    pub fn max_bytes(&self) -> u32 {
        self.max_bytes
    }

    /// Heads of the eight free lists.
    pub fn heads(&self) -> &[u32; SEGLIST_SIZE] {
        &self.heads
    }

    /// Word index of the highest block.
    pub fn last(&self) -> u32 {
        self.last
    }

    /// `(index, size)` of every free block, per list, in list order.
    pub fn free_lists(&self) -> [Vec<(u32, u32)>; SEGLIST_SIZE] {
        let words = self.words();
        let limit = words.len();
        std::array::from_fn(|list| {
            let mut entries = Vec::new();
            let mut block = self.heads[list];
            while block != 0 && entries.len() < limit {
                entries.push((block, words[(block + SIZE) as usize]));
                block = words[(block + NEXT_LINKED) as usize];
            }
            entries
        })
    }

    /// Every block in address order.
    pub fn blocks(&self) -> Vec<BlockInfo> {
        let mut blocks = Vec::new();
        let mut block = RESERVED_BYTES >> 2;
        while block != 0 {
            let raw = self.word(block + SIZE);
            blocks.push(BlockInfo {
                index: block,
                size: raw & !1,
                taken: raw & 1 == 1,
            });
            block = self.real_next(block);
        }
        blocks
    }

    /// Usable size in bytes of the allocation at `address`.
    ///
    /// Can exceed the requested size by up to 12 bytes: requests are rounded
    /// to 8 bytes and splits never leave fragments below 16 bytes.
    ///
    /// 0 for null and for addresses outside the heap.
    pub fn allocation_size(&self, address: Address) -> u32 {
        match address.word().checked_sub(DATA) {
            Some(block) if block >= RESERVED_BYTES >> 2 && block + SIZE < self.len() => {
                (self.word(block + SIZE) & !1) << 2
            }
            _ => 0,
        }
    }

    fn words(&self) -> &[u32] {
        self.buffer.words()
    }

    fn word(&self, index: u32) -> u32 {
        self.buffer.words()[index as usize]
    }

    fn set_word(&mut self, index: u32, value: u32) {
        self.buffer.words_mut()[index as usize] = value;
    }

    fn len(&self) -> u32 {
        self.buffer.len_words() as u32
    }

    fn size_of(&self, block: u32) -> u32 {
        self.word(block + SIZE)
    }

    fn is_taken(&self, block: u32) -> bool {
        block == 0 || self.word(block + SIZE) & 1 == 1
    }

    fn real_next(&self, block: u32) -> u32 {
        let next =
            u64::from(block) + u64::from(self.word(block + SIZE) & !1) + u64::from(HEADER_SIZE);
        if next < u64::from(self.len()) {
            next as u32
        } else {
            0
        }
    }

    fn real_prev(&self, block: u32) -> u32 {
        let prev = i64::from(block)
            - i64::from(self.word(block + PREV_SIZE) & !1)
            - i64::from(HEADER_SIZE);
        if prev > 3 {
            prev as u32
        } else {
            0
        }
    }

    fn list_of(size: u32) -> usize {
        set_to_head(size).unwrap_or(0)
    }

    fn remove_from_list(&mut self, block: u32, list: usize) {
        let prev = self.word(block + PREV_LINKED);
        let next = self.word(block + NEXT_LINKED);
        if next != 0 {
            self.set_word(next + PREV_LINKED, prev);
        }
        if prev != 0 {
            self.set_word(prev + NEXT_LINKED, next);
        }
        if self.heads[list] == block {
            self.heads[list] = next;
        }
    }

    fn insert_to_list(&mut self, block: u32, list: usize) {
        let next = self.heads[list];
        self.set_word(block + PREV_LINKED, 0);
        self.set_word(block + NEXT_LINKED, next);
        if next != 0 {
            self.set_word(next + PREV_LINKED, block);
        }
        self.heads[list] = block;
    }

    /// Cut `block` down to `size` words and list the rest as a free block.
    fn split_block(&mut self, block: u32, size: u32) {
        let rest = self.size_of(block) - size - HEADER_SIZE;
        let next = self.real_next(block);
        if next != 0 {
            self.set_word(next + PREV_SIZE, rest);
        }
        let new_block = block + size + HEADER_SIZE;
        self.set_word(new_block + PREV_SIZE, size);
        self.set_word(new_block + SIZE, rest);
        self.insert_to_list(new_block, Self::list_of(rest));
        self.set_word(block + SIZE, size);
        if block == self.last {
            self.last = new_block;
        }
    }

    /// Add `words` to the free block `prev`, moving it to another list if
    /// its size class changes.
    fn left_coalesce(&mut self, prev: u32, words: u32) {
        let old_list = Self::list_of(self.size_of(prev));
        let size = self.size_of(prev) + words;
        self.set_word(prev + SIZE, size);
        let new_list = Self::list_of(size);
        if old_list != new_list {
            self.remove_from_list(prev, old_list);
            self.insert_to_list(prev, new_list);
        }
    }

    /// Grow the buffer until a free block of `size` words exists at the top.
    ///
    /// Returns the block and the list it sits in.
    fn grow_for(&mut self, size: u32, bytes: u32) -> Result<(u32, usize), MemoryError> {
        let old_len = u64::from(self.len());
        let last_taken = self.is_taken(self.last);
        let mut requested = old_len + u64::from(size) + u64::from(HEADER_SIZE);
        if !last_taken {
            requested -= u64::from(self.size_of(self.last));
        }
        if requested <= old_len {
            // `last` is free and already big enough, but sits in a list below
            // the first one searched.
            return Ok((self.last, Self::list_of(self.size_of(self.last))));
        }
        let mut new_len = old_len << 1;
        while new_len < requested {
            new_len <<= 1;
        }
        new_len = new_len.min(u64::from(self.max_bytes >> 2));
        if new_len < requested || new_len <= old_len {
            warn!(requested = bytes, max_bytes = self.max_bytes, "seglist memory exhausted");
            return Err(MemoryError::OutOfMemory {
                requested: bytes,
                capacity: self.max_bytes,
            });
        }
        self.buffer.grow(new_len as usize);
        let (old_len, new_len) = (old_len as u32, new_len as u32);

        let found = if last_taken {
            let block = old_len;
            let block_size = new_len - old_len - HEADER_SIZE;
            let last_size = self.size_of(self.last);
            self.set_word(block + PREV_SIZE, last_size);
            self.set_word(block + SIZE, block_size);
            self.last = block;
            let list = Self::list_of(block_size);
            self.insert_to_list(block, list);
            (block, list)
        } else {
            let block = self.last;
            self.left_coalesce(block, new_len - old_len);
            (block, Self::list_of(self.size_of(block)))
        };
        self.update_access();
        debug!(old_words = old_len, new_words = new_len, "seglist memory grown");
        Ok(found)
    }
}

impl Memory for SeglistMemory {
    fn alloc(&mut self, bytes: u32) -> Result<Address, MemoryError> {
        if bytes == 0 {
            return Ok(Address::NULL);
        }
        if bytes > self.max_bytes {
            warn!(requested = bytes, max_bytes = self.max_bytes, "seglist memory exhausted");
            return Err(MemoryError::OutOfMemory {
                requested: bytes,
                capacity: self.max_bytes,
            });
        }
        let size = align8(bytes) >> 2;

        let mut list = get_from_head(size);
        let mut block = self.heads[list];
        while block == 0 && list < SEGLIST_SIZE - 1 {
            list += 1;
            block = self.heads[list];
        }
        if list == SEGLIST_SIZE - 1 {
            block = self.heads[list];
            while block != 0 && self.size_of(block) < size {
                block = self.word(block + NEXT_LINKED);
            }
        }
        if block == 0 {
            (block, list) = self.grow_for(size, bytes)?;
        }

        self.remove_from_list(block, list);
        if self.size_of(block) - size > MIN_SPLIT {
            self.split_block(block, size);
        }
        let next = self.real_next(block);
        if next != 0 {
            let flagged = self.word(next + PREV_SIZE) | 1;
            self.set_word(next + PREV_SIZE, flagged);
        }
        let flagged = self.size_of(block) | 1;
        self.set_word(block + SIZE, flagged);
        Ok(Address::from_word(block + DATA))
    }

    fn free(&mut self, address: Address) {
        if address.is_null() {
            return;
        }
        let block = address.word() - DATA;
        let size = self.size_of(block) & !1;
        self.set_word(block + SIZE, size);

        let real_next = self.real_next(block);
        let real_prev = self.real_prev(block);
        if real_next != 0 {
            let left_size = self.word(real_next + PREV_SIZE) & !1;
            self.set_word(real_next + PREV_SIZE, left_size);
            if !self.is_taken(real_next) {
                let next_size = self.size_of(real_next);
                self.remove_from_list(real_next, Self::list_of(next_size));
                let merged = self.size_of(block) + next_size + HEADER_SIZE;
                self.set_word(block + SIZE, merged);
                if self.last == real_next {
                    self.last = block;
                } else {
                    let after = self.real_next(real_next);
                    if after != 0 {
                        self.set_word(after + PREV_SIZE, merged);
                    }
                }
            }
        }

        if real_prev != 0 && !self.is_taken(real_prev) {
            self.left_coalesce(real_prev, self.size_of(block) + HEADER_SIZE);
            if self.last == block {
                self.last = real_prev;
            } else {
                let after = self.real_next(real_prev);
                if after != 0 {
                    let merged = self.size_of(real_prev);
                    self.set_word(after + PREV_SIZE, merged);
                }
            }
        } else {
            self.insert_to_list(block, Self::list_of(self.size_of(block)));
        }
    }

    fn clear(&mut self) {
        self.heads = [0; SEGLIST_SIZE];
        let start = RESERVED_BYTES >> 2;
        let size = self.len() - start - HEADER_SIZE;
        self.set_word(start + PREV_SIZE, 1);
        self.set_word(start + SIZE, size);
        self.set_word(start + PREV_LINKED, 0);
        self.set_word(start + NEXT_LINKED, 0);
        self.last = start;
        self.heads[Self::list_of(size)] = start;
        trace!(words = self.len(), "seglist memory cleared");
    }

    fn buffer(&self) -> &WordBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut WordBuffer {
        &mut self.buffer
    }
}
