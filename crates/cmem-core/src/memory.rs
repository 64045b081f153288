//! The allocator interface shared by stack, pool and seglist memory.

use crate::access::AccessMask;
use crate::address::Address;
use crate::buffer::WordBuffer;
use crate::error::MemoryError;

/// Bytes reserved at the start of every buffer. Keeps address 0 free to act
/// as null and gives the first block 16-byte alignment.
pub const RESERVED_BYTES: u32 = 16;

/// Largest usable buffer size. The last 4 bytes below 2^32 are unusable
/// because of 4-byte alignment.
pub const MAX_BYTES: u32 = 0xFFFF_FFFC;

/// A memory manager over one growable [`WordBuffer`].
///
/// Single-threaded by contract: implementations hold no locks and every
/// method runs to completion synchronously.
pub trait Memory {
    /// Allocate `bytes` bytes and return the byte address of the region.
    ///
    /// A zero-byte request returns [`Address::NULL`] without allocating.
    fn alloc(&mut self, bytes: u32) -> Result<Address, MemoryError>;

    /// Release the region at `address`. Freeing null is a no-op; freeing
    /// any other address not returned by `alloc` is unchecked.
    fn free(&mut self, address: Address);

    /// Logically wipe all allocations. The buffer keeps its size.
    fn clear(&mut self);

    /// The backing buffer.
    fn buffer(&self) -> &WordBuffer;

    /// The backing buffer, mutably.
    fn buffer_mut(&mut self) -> &mut WordBuffer;

    /// Install the typed views in `access`.
    fn register_access(&mut self, access: AccessMask) {
        self.buffer_mut().register_access(access);
    }

    /// Re-derive every registered view. Called after growth.
    fn update_access(&mut self) {
        self.buffer_mut().update_access();
    }

    /// Current buffer size in 32-bit words.
    fn capacity_words(&self) -> usize {
        self.buffer().len_words()
    }
}
