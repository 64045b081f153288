//! The growable word buffer shared by every allocator.
//!
//! A [`WordBuffer`] is a `Vec<u32>` plus bookkeeping for which typed views
//! have been requested. Views are reinterpretations of the same storage via
//! `bytemuck`; no data is ever converted when a view is taken.

use bytemuck::{cast_slice, cast_slice_mut};

use crate::access::{AccessMask, AccessType};
use crate::address::Address;
use crate::scalar::Scalar;

/// Contiguous, word-addressable backing storage.
///
/// Growth replaces the storage (`Vec::resize` may move it), so views are
/// never cached: every access re-derives its slice from the current storage.
/// `generation` counts [`WordBuffer::update_access`] calls, which allocators
/// make after every growth.
#[derive(Clone, Debug, Default)]
pub struct WordBuffer {
    /// Backing storage, zero-initialised.
    words: Vec<u32>,
    /// Views that have been requested through `register_access`.
    registered: AccessMask,
    /// Incremented on every `update_access`.
    generation: u64,
}

impl WordBuffer {
    /// Create a zeroed buffer of `words` 32-bit words.
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words],
            registered: AccessMask::EMPTY,
            generation: 0,
        }
    }

    /// Number of 32-bit words in the buffer.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Size of the buffer in bytes.
    pub fn len_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u32>()
    }

    /// Grow the buffer to `words` words, keeping existing contents.
    ///
    /// Requests that would shrink the buffer are ignored. Callers must follow
    /// up with [`WordBuffer::update_access`].
    pub fn grow(&mut self, words: usize) {
        if words > self.words.len() {
            self.words.resize(words, 0);
        }
    }

    /// Install the views in `access`. Idempotent; never touches data.
    pub fn register_access(&mut self, access: AccessMask) {
        self.registered |= access;
    }

    /// Re-derive every registered view after the storage changed.
    pub fn update_access(&mut self) {
        self.generation += 1;
    }

    /// Views registered so far.
    pub fn registered(&self) -> AccessMask {
        self.registered
    }

    /// Number of `update_access` calls so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The native word view.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// The native word view, mutably.
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Typed view over the whole buffer, or `None` if `T`'s access type has
    /// not been registered.
    pub fn view<T: Scalar>(&self) -> Option<&[T]> {
        if self.registered.contains(T::ACCESS) {
            Some(cast_slice(&self.words))
        } else {
            None
        }
    }

    /// Mutable typed view over the whole buffer, or `None` if unregistered.
    pub fn view_mut<T: Scalar>(&mut self) -> Option<&mut [T]> {
        if self.registered.contains(T::ACCESS) {
            Some(cast_slice_mut(&mut self.words))
        } else {
            None
        }
    }

    /// Read the element of type `T` at byte `address`.
    ///
    /// The address is shifted to the element index, so a misaligned address
    /// reads the element containing it.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the buffer.
    pub fn load<T: Scalar>(&self, address: Address) -> T {
        cast_slice::<u32, T>(&self.words)[index_of::<T>(address)]
    }

    /// Write `value` as the element of type `T` at byte `address`.
    ///
    /// # Panics
    ///
    /// Panics if the element lies outside the buffer.
    pub fn store<T: Scalar>(&mut self, address: Address, value: T) {
        cast_slice_mut::<u32, T>(&mut self.words)[index_of::<T>(address)] = value;
    }

    /// Raw unsigned slot at `address` for the given access width.
    pub fn load_slot(&self, access: AccessType, address: Address) -> u32 {
        match access.bytes() {
            1 => u32::from(self.load::<u8>(address)),
            2 => u32::from(self.load::<u16>(address)),
            _ => self.load::<u32>(address),
        }
    }

    /// Write a raw unsigned slot at `address` for the given access width.
    pub fn store_slot(&mut self, access: AccessType, address: Address, value: u32) {
        match access.bytes() {
            1 => self.store::<u8>(address, value as u8),
            2 => self.store::<u16>(address, value as u16),
            _ => self.store::<u32>(address, value),
        }
    }

    /// `len` bytes starting at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the buffer.
    pub fn bytes(&self, address: Address, len: u32) -> &[u8] {
        let start = address.0 as usize;
        &cast_slice::<u32, u8>(&self.words)[start..start + len as usize]
    }

    /// Copy `data` into the buffer starting at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the buffer.
    pub fn write_bytes(&mut self, address: Address, data: &[u8]) {
        let start = address.0 as usize;
        cast_slice_mut::<u32, u8>(&mut self.words)[start..start + data.len()].copy_from_slice(data);
    }
}

fn index_of<T: Scalar>(address: Address) -> usize {
    (address.0 >> T::ACCESS.shift()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_are_none_until_registered() {
        let mut buf = WordBuffer::new(4);
        assert!(buf.view::<u8>().is_none());
        buf.register_access(AccessType::Uint8.into());
        assert_eq!(buf.view::<u8>().map(<[u8]>::len), Some(16));
        assert!(buf.view::<u16>().is_none());
    }

    #[test]
    fn register_is_idempotent_and_keeps_data() {
        let mut buf = WordBuffer::new(2);
        buf.store::<u32>(Address(4), 0xdead_beef);
        buf.register_access(AccessMask::ALL);
        buf.register_access(AccessMask::ALL);
        assert_eq!(buf.registered(), AccessMask::ALL);
        assert_eq!(buf.load::<u32>(Address(4)), 0xdead_beef);
    }

    #[test]
    fn views_alias_the_same_storage() {
        let mut buf = WordBuffer::new(2);
        buf.register_access(AccessMask::ALL);
        buf.store::<u32>(Address(0), 0x0102_0304);
        let bytes = buf.view::<u8>().unwrap();
        assert_eq!(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 0x0102_0304);
        buf.view_mut::<i32>().unwrap()[1] = -1;
        assert_eq!(buf.load::<u16>(Address(6)), 0xffff);
    }

    #[test]
    fn grow_keeps_contents_and_never_shrinks() {
        let mut buf = WordBuffer::new(2);
        buf.store::<f32>(Address(4), 1.5);
        buf.grow(8);
        buf.update_access();
        assert_eq!(buf.len_words(), 8);
        assert_eq!(buf.load::<f32>(Address(4)), 1.5);
        assert_eq!(buf.generation(), 1);
        buf.grow(4);
        assert_eq!(buf.len_words(), 8);
    }

    #[test]
    fn slots_and_bytes() {
        let mut buf = WordBuffer::new(2);
        buf.store_slot(AccessType::Uint16, Address(2), 0x1_2345);
        assert_eq!(buf.load_slot(AccessType::Uint16, Address(2)), 0x2345);
        buf.write_bytes(Address(4), &[1, 2, 3]);
        assert_eq!(buf.bytes(Address(4), 3), &[1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn out_of_range_load_panics() {
        let buf = WordBuffer::new(1);
        let _ = buf.load::<u32>(Address(4));
    }
}
