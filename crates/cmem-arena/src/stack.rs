//! Linear bump allocator with LIFO release.
//!
//! [`StackMemory`] works like a call stack in C: `alloc` advances the stack
//! pointer, `free` rewinds it. A typical pattern saves an address, does some
//! work with further allocations and frees the saved address to drop
//! everything at once.

use cmem_core::{align4, Address, Memory, MemoryError, WordBuffer, MAX_BYTES, RESERVED_BYTES};
use tracing::{debug, trace, warn};

use crate::config::ArenaConfig;

/// Bump allocator over a growable word buffer.
///
/// - alloc O(1) (amortised over growth)
/// - free O(1), double-free and null safe
/// - 4-byte alignment, first allocation at byte 16
///
/// There are no bound checks on the returned regions: only pass addresses
/// returned by `alloc` (or a saved [`StackMemory::sp`]) to `free`.
#[derive(Clone, Debug)]
pub struct StackMemory {
    /// Backing storage. Grows on demand, never shrinks.
    buffer: WordBuffer,
    /// Stack pointer: index of the next free word.
    sp: u32,
    /// Growth limit in bytes.
    max_bytes: u32,
}

impl StackMemory {
    /// Create a stack with `initial_bytes` usable bytes and the default limit.
    pub fn new(initial_bytes: u32) -> Result<Self, MemoryError> {
        Self::with_config(ArenaConfig::new(initial_bytes))
    }

    /// Create a stack from an explicit config.
    pub fn with_config(config: ArenaConfig) -> Result<Self, MemoryError> {
        let max_bytes = config.validate(4, MAX_BYTES)?;
        let mut stack = Self {
            buffer: WordBuffer::new(config.initial_words()),
            sp: 0,
            max_bytes,
        };
        stack.clear();
        Ok(stack)
    }

    /// Current stack pointer in words.
    pub fn sp(&self) -> u32 {
        self.sp
    }

    /// Current stack pointer as a byte address, suitable for a later `free`.
    pub fn top(&self) -> Address {
        Address::from_word(self.sp)
    }

    /// Growth limit in bytes.
    pub fn max_bytes(&self) -> u32 {
        self.max_bytes
    }

    /// Bytes currently allocated, excluding the reserved prefix.
    pub fn used_bytes(&self) -> usize {
        (self.sp - RESERVED_BYTES / 4) as usize * 4
    }

    /// Grow the buffer so that word index `needed - 1` is addressable.
    fn grow_to(&mut self, needed: u64, requested: u32) -> Result<(), MemoryError> {
        let old_words = self.buffer.len_words() as u64;
        let mut new_words = (old_words * 2).max(1);
        while new_words < needed {
            new_words <<= 1;
        }
        new_words = new_words.min(u64::from(self.max_bytes >> 2));
        if new_words < needed {
            warn!(requested, max_bytes = self.max_bytes, "stack memory exhausted");
            return Err(MemoryError::OutOfMemory {
                requested,
                capacity: self.max_bytes,
            });
        }
        self.buffer.grow(new_words as usize);
        self.update_access();
        debug!(old_words, new_words, "stack memory grown");
        Ok(())
    }
}

impl Memory for StackMemory {
    fn alloc(&mut self, bytes: u32) -> Result<Address, MemoryError> {
        if bytes == 0 {
            return Ok(Address::NULL);
        }
        let words = if bytes > MAX_BYTES {
            u64::from(bytes).div_ceil(4)
        } else {
            u64::from(align4(bytes) >> 2)
        };
        let new_sp = u64::from(self.sp) + words;
        if new_sp > self.buffer.len_words() as u64 {
            self.grow_to(new_sp, bytes)?;
        }
        let address = Address::from_word(self.sp);
        self.sp = new_sp as u32;
        Ok(address)
    }

    fn free(&mut self, address: Address) {
        if !address.is_null() && address.word() < self.sp {
            self.sp = address.word();
        }
    }

    fn clear(&mut self) {
        self.sp = RESERVED_BYTES >> 2;
        trace!("stack memory cleared");
    }

    fn buffer(&self) -> &WordBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut WordBuffer {
        &mut self.buffer
    }
}
