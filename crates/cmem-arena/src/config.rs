//! Allocator configuration parameters.

use cmem_core::{align4, MemoryError, MAX_BYTES, RESERVED_BYTES};

/// Sizing for [`StackMemory`](crate::StackMemory) and
/// [`SeglistMemory`](crate::SeglistMemory).
///
/// Validated at construction; all values are immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Usable bytes allocated up front, excluding the reserved prefix.
    pub initial_bytes: u32,

    /// Upper bound the buffer may grow to.
    ///
    /// Default: [`ArenaConfig::MAX_BYTES`] (the seglist heap uses 4 bytes
    /// less to stay 8-byte aligned).
    pub max_bytes: Option<u32>,
}

impl ArenaConfig {
    /// Bytes reserved at the start of the buffer so address 0 stays null.
    pub const RESERVED_BYTES: u32 = RESERVED_BYTES;

    /// Largest buffer size any allocator may reach.
    pub const MAX_BYTES: u32 = MAX_BYTES;

    /// Config with `initial_bytes` up front and the default growth limit.
    pub fn new(initial_bytes: u32) -> Self {
        Self {
            initial_bytes,
            max_bytes: None,
        }
    }

    /// Set the growth limit.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u32) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Number of words in the initial buffer, including the reserved prefix.
    pub fn initial_words(&self) -> usize {
        (self.initial_bytes as usize + RESERVED_BYTES as usize) / 4
    }

    /// Check sizes against `alignment` and resolve the growth limit.
    ///
    /// Returns the effective `max_bytes`.
    pub(crate) fn validate(&self, alignment: u32, default_max: u32) -> Result<u32, MemoryError> {
        let max_bytes = self.max_bytes.unwrap_or(default_max);
        if self.initial_bytes % alignment != 0 {
            return Err(MemoryError::InvalidConfig {
                reason: format!("initialBytes must be a multiple of {alignment}"),
            });
        }
        if max_bytes % alignment != 0 {
            return Err(MemoryError::InvalidConfig {
                reason: format!("maxBytes must be a multiple of {alignment}"),
            });
        }
        if u64::from(self.initial_bytes) + u64::from(RESERVED_BYTES) > u64::from(max_bytes) {
            return Err(MemoryError::InvalidConfig {
                reason: format!(
                    "initialBytes ({}) plus the {RESERVED_BYTES} reserved bytes exceeds maxBytes ({max_bytes})",
                    self.initial_bytes
                ),
            });
        }
        Ok(max_bytes)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Sizing for [`PoolMemory`](crate::PoolMemory).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Requested block size in bytes. Rounded up to a multiple of 4.
    pub block_size: u32,

    /// Blocks allocated up front.
    pub initial_blocks: u32,

    /// Upper bound on the number of blocks.
    ///
    /// Default: as many blocks as fit below [`ArenaConfig::MAX_BYTES`].
    pub max_blocks: Option<u32>,
}

impl PoolConfig {
    /// Config for `initial_blocks` blocks of `block_size` bytes, unbounded growth.
    pub fn new(block_size: u32, initial_blocks: u32) -> Self {
        Self {
            block_size,
            initial_blocks,
            max_blocks: None,
        }
    }

    /// Set the block limit.
    #[must_use]
    pub fn with_max_blocks(mut self, max_blocks: u32) -> Self {
        self.max_blocks = Some(max_blocks);
        self
    }

    /// Block size after 4-byte alignment.
    pub fn aligned_block_size(&self) -> u32 {
        align4(self.block_size)
    }

    /// Resolve `(block_size, max_bytes)` and check the sizes are consistent.
    pub(crate) fn validate(&self) -> Result<(u32, u32), MemoryError> {
        if self.block_size == 0 || self.block_size > MAX_BYTES {
            return Err(MemoryError::InvalidConfig {
                reason: format!("blockSize must be in 1..={MAX_BYTES}"),
            });
        }
        let block_size = self.aligned_block_size();
        let max_bytes = match self.max_blocks {
            Some(blocks) => u64::from(blocks) * u64::from(block_size),
            None => u64::from(MAX_BYTES - MAX_BYTES % block_size),
        };
        if max_bytes > u64::from(MAX_BYTES) {
            return Err(MemoryError::InvalidConfig {
                reason: format!("maxBlocks * blockSize exceeds {MAX_BYTES} bytes"),
            });
        }
        let initial_bytes = u64::from(self.initial_blocks) * u64::from(block_size);
        if initial_bytes > max_bytes {
            return Err(MemoryError::InvalidConfig {
                reason: format!(
                    "initial blocks ({}) exceed the block limit ({})",
                    self.initial_blocks,
                    max_bytes / u64::from(block_size)
                ),
            });
        }
        Ok((block_size, max_bytes as u32))
    }
}
