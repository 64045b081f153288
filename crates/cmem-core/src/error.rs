//! Allocator error types.

use std::error::Error;
use std::fmt;

/// Errors raised by the memory managers.
///
/// Every variant is raised synchronously at the offending call and is never
/// retried internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// The request cannot be satisfied even after growing to `max_bytes`.
    OutOfMemory {
        /// Number of bytes requested.
        requested: u32,
        /// Largest buffer size the allocator may grow to, in bytes.
        capacity: u32,
    },
    /// A pool request larger than the pool's fixed block size.
    BlockSizeExceeded {
        /// Number of bytes requested (after 4-byte alignment).
        requested: u32,
        /// The pool's block size in bytes.
        block_size: u32,
    },
    /// Construction parameters were rejected.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::BlockSizeExceeded {
                requested,
                block_size,
            } => {
                write!(
                    f,
                    "blockSize exceeded: requested {requested} bytes, block size {block_size} bytes"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid memory config: {reason}"),
        }
    }
}

impl Error for MemoryError {}
