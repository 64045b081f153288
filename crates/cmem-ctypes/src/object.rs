//! Runtime-typed ctype objects.
//!
//! [`CObject`] is what a pointer dereference, an array element or a struct
//! field hands back when the concrete type is only known from its
//! [`CType`]. Every variant is a thin view (address plus type) over
//! allocator memory.

use cmem_core::{AccessMask, AccessType, Address, Memory, Num, Scalar};

use crate::array::CArray;
use crate::character::{Char, CharUnit, Character, WChar};
use crate::error::CTypeError;
use crate::number::{Float, Int16, Int32, Int8, Number, Uint16, Uint32, Uint8};
use crate::pointer::Pointer;
use crate::structure::Structure;
use crate::types::{CType, CharKind, TypeKind};
use crate::value::Value;

/// A ctype object of any kind.
#[derive(Clone, Debug, PartialEq)]
pub enum CObject {
    /// `uint8_t`.
    Uint8(Uint8),
    /// `uint16_t`.
    Uint16(Uint16),
    /// `uint32_t`.
    Uint32(Uint32),
    /// `int8_t`.
    Int8(Int8),
    /// `int16_t`.
    Int16(Int16),
    /// `int32_t`.
    Int32(Int32),
    /// `float`.
    Float(Float),
    /// One byte character.
    Char(Char),
    /// Two byte character.
    WChar(WChar),
    /// Typed or void pointer.
    Pointer(Pointer),
    /// Fixed-length array.
    Array(CArray),
    /// Struct.
    Struct(Structure),
}

impl CObject {
    /// Non-owning view of type `ty` at `address`. Never allocates.
    pub fn at(ty: &CType, address: Address) -> Self {
        match ty.kind() {
            TypeKind::Number(access) => match access {
                AccessType::Uint8 => Self::Uint8(Number::at(address)),
                AccessType::Uint16 => Self::Uint16(Number::at(address)),
                AccessType::Uint32 => Self::Uint32(Number::at(address)),
                AccessType::Int8 => Self::Int8(Number::at(address)),
                AccessType::Int16 => Self::Int16(Number::at(address)),
                AccessType::Int32 => Self::Int32(Number::at(address)),
                AccessType::Float32 => Self::Float(Number::at(address)),
            },
            TypeKind::Char(CharKind::Char) => Self::Char(Character::at(address)),
            TypeKind::Char(CharKind::WChar) => Self::WChar(Character::at(address)),
            TypeKind::Pointer(_) => Self::Pointer(Pointer::view(ty.clone(), address)),
            TypeKind::Array { .. } => Self::Array(CArray::view(ty.clone(), address)),
            TypeKind::Struct(_) => Self::Struct(Structure::view(ty.clone(), address)),
        }
    }

    /// Allocate an object of type `ty` from `mem`, optionally initialised.
    ///
    /// If the initial value does not fit the type the allocation is
    /// released again before the error is returned.
    pub fn new<M: Memory + ?Sized>(mem: &mut M, ty: &CType, value: Option<&Value>) -> Result<Self, CTypeError> {
        let address = alloc_object(mem, ty.bytes(), ty.access())?;
        let obj = Self::at(ty, address);
        if let Some(v) = value {
            if let Err(e) = obj.set_value(mem, v) {
                mem.free(address);
                return Err(e);
            }
        }
        Ok(obj)
    }

    /// Type descriptor of the object.
    pub fn ctype(&self) -> CType {
        match self {
            Self::Char(_) => CType::character(CharKind::Char),
            Self::WChar(_) => CType::character(CharKind::WChar),
            Self::Pointer(p) => p.ctype().clone(),
            Self::Array(a) => a.ctype().clone(),
            Self::Struct(s) => s.ctype().clone(),
            Self::Uint8(_) => Uint8::ctype(),
            Self::Uint16(_) => Uint16::ctype(),
            Self::Uint32(_) => Uint32::ctype(),
            Self::Int8(_) => Int8::ctype(),
            Self::Int16(_) => Int16::ctype(),
            Self::Int32(_) => Int32::ctype(),
            Self::Float(_) => Float::ctype(),
        }
    }

    /// Typename, e.g. `Int16`, `Uint16*` or `Example[3]`.
    pub fn typename(&self) -> &str {
        match self {
            Self::Uint8(_) => Uint8::typename(),
            Self::Uint16(_) => Uint16::typename(),
            Self::Uint32(_) => Uint32::typename(),
            Self::Int8(_) => Int8::typename(),
            Self::Int16(_) => Int16::typename(),
            Self::Int32(_) => Int32::typename(),
            Self::Float(_) => Float::typename(),
            Self::Char(_) => CharKind::Char.name(),
            Self::WChar(_) => CharKind::WChar.name(),
            Self::Pointer(p) => p.ctype().name(),
            Self::Array(a) => a.ctype().name(),
            Self::Struct(s) => s.ctype().name(),
        }
    }

    /// Address of the object.
    pub fn address(&self) -> Address {
        match self {
            Self::Uint8(n) => n.address(),
            Self::Uint16(n) => n.address(),
            Self::Uint32(n) => n.address(),
            Self::Int8(n) => n.address(),
            Self::Int16(n) => n.address(),
            Self::Int32(n) => n.address(),
            Self::Float(n) => n.address(),
            Self::Char(c) => c.address(),
            Self::WChar(c) => c.address(),
            Self::Pointer(p) => p.address(),
            Self::Array(a) => a.address(),
            Self::Struct(s) => s.address(),
        }
    }

    /// Re-point the object. Struct fields follow.
    pub fn set_address(&mut self, address: Address) {
        match self {
            Self::Uint8(n) => n.set_address(address),
            Self::Uint16(n) => n.set_address(address),
            Self::Uint32(n) => n.set_address(address),
            Self::Int8(n) => n.set_address(address),
            Self::Int16(n) => n.set_address(address),
            Self::Int32(n) => n.set_address(address),
            Self::Float(n) => n.set_address(address),
            Self::Char(c) => c.set_address(address),
            Self::WChar(c) => c.set_address(address),
            Self::Pointer(p) => p.set_address(address),
            Self::Array(a) => a.set_address(address),
            Self::Struct(s) => s.set_address(address),
        }
    }

    /// Size of the object in bytes.
    pub fn byte_len(&self) -> u32 {
        match self {
            Self::Pointer(p) => p.ctype().bytes(),
            Self::Array(a) => a.ctype().bytes(),
            Self::Struct(s) => s.ctype().bytes(),
            Self::Char(_) => 1,
            Self::WChar(_) => 2,
            scalar => scalar.number_access().map_or(0, AccessType::bytes),
        }
    }

    /// Views the object reads and writes through.
    pub fn access(&self) -> AccessMask {
        match self {
            Self::Pointer(_) => AccessType::Uint32.mask(),
            Self::Array(a) => a.ctype().access(),
            Self::Struct(s) => s.ctype().access(),
            Self::Char(_) => AccessType::Uint8.mask(),
            Self::WChar(_) => AccessType::Uint16.mask(),
            scalar => scalar.number_access().map_or(AccessMask::EMPTY, AccessType::mask),
        }
    }

    /// Current value.
    pub fn value<M: Memory + ?Sized>(&self, mem: &M) -> Value {
        match self {
            Self::Uint8(n) => n.value(mem),
            Self::Uint16(n) => n.value(mem),
            Self::Uint32(n) => n.value(mem),
            Self::Int8(n) => n.value(mem),
            Self::Int16(n) => n.value(mem),
            Self::Int32(n) => n.value(mem),
            Self::Float(n) => n.value(mem),
            Self::Char(c) => c.value(mem),
            Self::WChar(c) => c.value(mem),
            Self::Pointer(p) => p.value(mem),
            Self::Array(a) => a.value(mem),
            Self::Struct(s) => s.value(mem),
        }
    }

    /// Store `value`.
    pub fn set_value<M: Memory + ?Sized>(&self, mem: &mut M, value: &Value) -> Result<(), CTypeError> {
        match self {
            Self::Uint8(n) => n.set_value(mem, value),
            Self::Uint16(n) => n.set_value(mem, value),
            Self::Uint32(n) => n.set_value(mem, value),
            Self::Int8(n) => n.set_value(mem, value),
            Self::Int16(n) => n.set_value(mem, value),
            Self::Int32(n) => n.set_value(mem, value),
            Self::Float(n) => n.set_value(mem, value),
            Self::Char(c) => c.set_value(mem, value),
            Self::WChar(c) => c.set_value(mem, value),
            Self::Pointer(p) => p.set_value(mem, value),
            Self::Array(a) => a.set_value(mem, value),
            Self::Struct(s) => s.set_value(mem, value),
        }
    }

    /// Assign the contents of `other`.
    ///
    /// Numbers, characters and pointers convert into each other through
    /// their numeric value. Arrays and structs use their own copy rules.
    /// Any other pairing is assigned value-wise.
    pub fn copy_from<M: Memory + ?Sized>(&self, mem: &mut M, other: &CObject) -> Result<(), CTypeError> {
        match (self, other) {
            (Self::Array(dst), Self::Array(src)) => dst.copy_from(mem, src),
            (Self::Struct(dst), Self::Struct(src)) => dst.copy_from(mem, src),
            _ => {
                if let Some(n) = other.load_num(mem) {
                    if self.store_num(mem, n) {
                        return Ok(());
                    }
                }
                let v = other.value(mem);
                self.set_value(mem, &v)
            }
        }
    }

    /// The object's bytes.
    pub fn bytes<'m, M: Memory + ?Sized>(&self, mem: &'m M) -> &'m [u8] {
        mem.buffer().bytes(self.address(), self.byte_len())
    }

    /// Overwrite memory at the object's address with `data`.
    pub fn set_bytes<M: Memory + ?Sized>(&self, mem: &mut M, data: &[u8]) {
        mem.buffer_mut().write_bytes(self.address(), data);
    }

    /// Typed number view, if this object is a number of element type `T`.
    pub fn as_number<T: Scalar>(&self) -> Option<Number<T>> {
        (self.number_access() == Some(T::ACCESS)).then(|| Number::at(self.address()))
    }

    /// Typed character view, if this object is a character of unit `T`.
    pub fn as_character<T: CharUnit>(&self) -> Option<Character<T>> {
        match (self, T::KIND) {
            (Self::Char(c), CharKind::Char) => Some(Character::at(c.address())),
            (Self::WChar(c), CharKind::WChar) => Some(Character::at(c.address())),
            _ => None,
        }
    }

    /// The pointer, if this object is one.
    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Self::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// The array, if this object is one.
    pub fn as_array(&self) -> Option<&CArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The struct, if this object is one.
    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable struct access, for re-pointing a nested struct.
    pub fn as_structure_mut(&mut self) -> Option<&mut Structure> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    fn number_access(&self) -> Option<AccessType> {
        match self {
            Self::Uint8(_) => Some(AccessType::Uint8),
            Self::Uint16(_) => Some(AccessType::Uint16),
            Self::Uint32(_) => Some(AccessType::Uint32),
            Self::Int8(_) => Some(AccessType::Int8),
            Self::Int16(_) => Some(AccessType::Int16),
            Self::Int32(_) => Some(AccessType::Int32),
            Self::Float(_) => Some(AccessType::Float32),
            _ => None,
        }
    }

    /// Numeric content of a number, character code or pointer address.
    pub(crate) fn load_num<M: Memory + ?Sized>(&self, mem: &M) -> Option<Num> {
        let n = match self {
            Self::Uint8(n) => n.get_num(mem),
            Self::Uint16(n) => n.get_num(mem),
            Self::Uint32(n) => n.get_num(mem),
            Self::Int8(n) => n.get_num(mem),
            Self::Int16(n) => n.get_num(mem),
            Self::Int32(n) => n.get_num(mem),
            Self::Float(n) => n.get_num(mem),
            Self::Char(c) => Num::Int(i64::from(c.code(mem))),
            Self::WChar(c) => Num::Int(i64::from(c.code(mem))),
            Self::Pointer(p) => Num::Int(i64::from(p.get(mem).0)),
            Self::Array(_) | Self::Struct(_) => return None,
        };
        Some(n)
    }

    /// Store a number into a number, character or pointer. Returns false
    /// for arrays and structs.
    pub(crate) fn store_num<M: Memory + ?Sized>(&self, mem: &mut M, n: Num) -> bool {
        match self {
            Self::Uint8(x) => x.set_num(mem, n),
            Self::Uint16(x) => x.set_num(mem, n),
            Self::Uint32(x) => x.set_num(mem, n),
            Self::Int8(x) => x.set_num(mem, n),
            Self::Int16(x) => x.set_num(mem, n),
            Self::Int32(x) => x.set_num(mem, n),
            Self::Float(x) => x.set_num(mem, n),
            Self::Char(c) => c.set_code(mem, n.to_bits32()),
            Self::WChar(c) => c.set_code(mem, n.to_bits32()),
            Self::Pointer(p) => p.set(mem, Address(n.to_bits32())),
            Self::Array(_) | Self::Struct(_) => return false,
        }
        true
    }
}

/// Allocate `bytes` for a new object and install the views it needs.
pub(crate) fn alloc_object<M: Memory + ?Sized>(
    mem: &mut M,
    bytes: u32,
    access: AccessMask,
) -> Result<Address, CTypeError> {
    let address = mem.alloc(bytes)?;
    mem.register_access(access);
    Ok(address)
}

/// Copy `bytes` bytes from `src` to `dst` one slot of the widest width in
/// `access` at a time. Overlapping ranges are read completely before the
/// first write.
pub(crate) fn copy_slots<M: Memory + ?Sized>(
    mem: &mut M,
    access: AccessMask,
    dst: Address,
    src: Address,
    bytes: u32,
) {
    let slot = access.slot_access();
    let step = slot.bytes();
    let slots: Vec<u32> = (0..bytes)
        .step_by(step as usize)
        .map(|off| mem.buffer().load_slot(slot, src.offset(off)))
        .collect();
    let buffer = mem.buffer_mut();
    for (i, value) in (0u32..).zip(slots) {
        buffer.store_slot(slot, dst.offset(i * step), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use cmem_arena::SeglistMemory;

    #[test]
    fn dispatch_by_type() {
        let reg = TypeRegistry::new();
        let obj = CObject::at(reg.get("Int16").unwrap(), Address(32));
        assert!(matches!(obj, CObject::Int16(_)));
        assert_eq!(obj.typename(), "Int16");
        assert_eq!(obj.byte_len(), 2);
        assert_eq!(obj.address(), Address(32));
        assert!(obj.as_number::<i16>().is_some());
        assert!(obj.as_number::<u16>().is_none());

        let w = CObject::at(reg.get("WChar").unwrap(), Address(40));
        assert!(w.as_character::<u16>().is_some());
        assert!(w.as_character::<u8>().is_none());
        assert_eq!(w.ctype().name(), "WChar");
    }

    #[test]
    fn new_frees_on_bad_initial_value() {
        let mut m = SeglistMemory::new(64).unwrap();
        let reg = TypeRegistry::new();
        let before = m.blocks();
        let err = CObject::new(&mut m, reg.get("Int32").unwrap(), Some(&Value::Text("x".into())));
        assert!(matches!(err, Err(CTypeError::ValueMismatch { .. })));
        assert_eq!(m.blocks(), before);
    }

    #[test]
    fn scalars_copy_across_kinds() {
        let mut m = SeglistMemory::new(64).unwrap();
        let reg = TypeRegistry::new();
        let c = CObject::new(&mut m, reg.get("Char").unwrap(), Some(&Value::Char('z'))).unwrap();
        let n = CObject::new(&mut m, reg.get("Uint16").unwrap(), None).unwrap();
        n.copy_from(&mut m, &c).unwrap();
        assert_eq!(n.value(&m), Value::Int(122));

        let f = CObject::new(&mut m, reg.get("Float").unwrap(), Some(&Value::Float(-7.9))).unwrap();
        n.copy_from(&mut m, &f).unwrap();
        assert_eq!(n.value(&m), Value::Int(65529));
        assert_eq!(n.bytes(&m), &65529u16.to_ne_bytes());
    }

    #[test]
    fn slot_copy_handles_overlap() {
        let mut m = SeglistMemory::new(64).unwrap();
        let a = m.alloc(16).unwrap();
        for i in 0..4u32 {
            m.buffer_mut().store(a.offset(i * 4), i + 1);
        }
        copy_slots(&mut m, AccessType::Uint32.mask(), a.offset(4), a, 12);
        let words: Vec<u32> = (0..4).map(|i| m.buffer().load(a.offset(i * 4))).collect();
        assert_eq!(words, vec![1, 1, 2, 3]);
    }
}
