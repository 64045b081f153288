//! Typed and void pointers.
//!
//! A pointer object is a 32-bit slot holding an [`Address`]. Arithmetic is
//! scaled by the pointee's size and wraps modulo 2^32. `void*` can be cast
//! to and from any pointer type but cannot be dereferenced or moved.

use cmem_core::{Address, Memory};

use crate::error::{CTypeError, PointerFault};
use crate::object::{alloc_object, CObject};
use crate::registry::TypeRegistry;
use crate::types::{CType, TypeKind};
use crate::value::Value;

/// A pointer of type `ty` stored at `address`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pointer {
    ty: CType,
    address: Address,
}

impl Pointer {
    /// Allocate a new pointer of type `ty`, optionally pointing at `target`.
    pub fn new<M: Memory + ?Sized>(mem: &mut M, ty: &CType, target: Option<Address>) -> Result<Self, CTypeError> {
        check_pointer(ty)?;
        let address = alloc_object(mem, ty.bytes(), ty.access())?;
        let p = Self::view(ty.clone(), address);
        if let Some(target) = target {
            p.set(mem, target);
        }
        Ok(p)
    }

    /// Non-owning view of a pointer of type `ty` at `address`.
    pub fn at(ty: &CType, address: Address) -> Result<Self, CTypeError> {
        check_pointer(ty)?;
        Ok(Self::view(ty.clone(), address))
    }

    pub(crate) fn view(ty: CType, address: Address) -> Self {
        Self { ty, address }
    }

    /// Pointer type.
    pub fn ctype(&self) -> &CType {
        &self.ty
    }

    /// Pointee type, `None` for `void*`.
    pub fn pointee(&self) -> Option<&CType> {
        self.ty.pointee()
    }

    /// Whether this is a `void*`.
    pub fn is_void(&self) -> bool {
        self.ty.is_void_pointer()
    }

    /// Address of the pointer slot itself.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Re-point the view.
    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    /// Address the pointer holds.
    pub fn get<M: Memory + ?Sized>(&self, mem: &M) -> Address {
        Address(mem.buffer().load::<u32>(self.address))
    }

    /// Make the pointer hold `target`.
    pub fn set<M: Memory + ?Sized>(&self, mem: &mut M, target: Address) {
        mem.buffer_mut().store::<u32>(self.address, target.0);
    }

    /// Held address as [`Value::Int`].
    pub fn value<M: Memory + ?Sized>(&self, mem: &M) -> Value {
        Value::Int(i64::from(self.get(mem).0))
    }

    /// Store an address given as `Int` (or `Float`, truncated).
    pub fn set_value<M: Memory + ?Sized>(&self, mem: &mut M, value: &Value) -> Result<(), CTypeError> {
        let n = value.as_num().ok_or_else(|| CTypeError::ValueMismatch {
            expected: self.ty.name().to_string(),
            found: value.kind().to_string(),
        })?;
        self.set(mem, Address(n.to_bits32()));
        Ok(())
    }

    /// Copy the address held by `other`.
    pub fn copy_from<M: Memory + ?Sized>(&self, mem: &mut M, other: &Pointer) {
        let target = other.get(mem);
        self.set(mem, target);
    }

    /// Non-owning object of the pointee type at the held address.
    pub fn deref<M: Memory + ?Sized>(&self, mem: &M) -> Result<CObject, CTypeError> {
        let pointee = self
            .pointee()
            .ok_or(CTypeError::InvalidPointerOperation(PointerFault::VoidDeref))?;
        let target = self.get(mem);
        if target.is_null() {
            return Err(CTypeError::InvalidPointerOperation(PointerFault::NullDeref));
        }
        Ok(CObject::at(pointee, target))
    }

    /// The same pointer slot reinterpreted as a pointer to `pointee`
    /// (`None` for `void*`).
    pub fn cast(&self, registry: &mut TypeRegistry, pointee: Option<&CType>) -> Pointer {
        Self::view(registry.pointer(pointee), self.address)
    }

    /// Advance by `count` elements (negative moves backwards).
    pub fn add<M: Memory + ?Sized>(&self, mem: &mut M, count: i32) -> Result<(), CTypeError> {
        let pointee = self
            .pointee()
            .ok_or(CTypeError::InvalidPointerOperation(PointerFault::VoidArithmetic))?;
        let delta = i64::from(count) * i64::from(pointee.bytes());
        let target = self.get(mem).offset_signed(delta);
        self.set(mem, target);
        Ok(())
    }

    /// Advance by one element.
    pub fn inc<M: Memory + ?Sized>(&self, mem: &mut M) -> Result<(), CTypeError> {
        self.add(mem, 1)
    }

    /// Move back by one element.
    pub fn dec<M: Memory + ?Sized>(&self, mem: &mut M) -> Result<(), CTypeError> {
        self.add(mem, -1)
    }
}

fn check_pointer(ty: &CType) -> Result<(), CTypeError> {
    match ty.kind() {
        TypeKind::Pointer(_) => Ok(()),
        _ => Err(CTypeError::ValueMismatch {
            expected: "pointer type".to_string(),
            found: ty.name().to_string(),
        }),
    }
}
