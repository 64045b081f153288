//! Fixed-length arrays.
//!
//! Indexing wraps modulo the length instead of failing. Bulk assignment
//! from a shorter or longer source copies as many elements as both sides
//! have and leaves the rest untouched.

use cmem_core::{Address, Memory};

use crate::error::CTypeError;
use crate::object::{alloc_object, copy_slots, CObject};
use crate::types::{CType, TypeKind};
use crate::value::Value;

/// An array of type `ty` at `address`.
#[derive(Clone, Debug, PartialEq)]
pub struct CArray {
    ty: CType,
    element: CType,
    len: u32,
    address: Address,
}

impl CArray {
    /// Allocate a new array of type `ty`, optionally initialised from a
    /// sequence, a string (for character arrays) or nothing.
    pub fn new<M: Memory + ?Sized>(mem: &mut M, ty: &CType, value: Option<&Value>) -> Result<Self, CTypeError> {
        check_array(ty)?;
        let address = alloc_object(mem, ty.bytes(), ty.access())?;
        let array = Self::view(ty.clone(), address);
        if let Some(v) = value {
            if let Err(e) = array.set_value(mem, v) {
                mem.free(address);
                return Err(e);
            }
        }
        Ok(array)
    }

    /// Allocate a new array of type `ty` holding a copy of `source`.
    pub fn new_from<M: Memory + ?Sized>(mem: &mut M, ty: &CType, source: &CArray) -> Result<Self, CTypeError> {
        let array = Self::new(mem, ty, None)?;
        array.copy_from(mem, source)?;
        Ok(array)
    }

    /// Non-owning view of an array of type `ty` at `address`.
    pub fn at(ty: &CType, address: Address) -> Result<Self, CTypeError> {
        check_array(ty)?;
        Ok(Self::view(ty.clone(), address))
    }

    pub(crate) fn view(ty: CType, address: Address) -> Self {
        let (element, len) = match ty.kind() {
            TypeKind::Array { element, len } => (element.clone(), *len),
            _ => (ty.clone(), 1),
        };
        Self {
            ty,
            element,
            len,
            address,
        }
    }

    /// Array type.
    pub fn ctype(&self) -> &CType {
        &self.ty
    }

    /// Element type.
    pub fn element_type(&self) -> &CType {
        &self.element
    }

    /// Number of elements.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Always false: arrays have at least one element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of element 0.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Re-point the view.
    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    /// Address of element `index % len`.
    pub fn element_address(&self, index: u32) -> Address {
        self.address.offset((index % self.len) * self.element.bytes())
    }

    /// View of element `index % len`.
    pub fn element(&self, index: u32) -> CObject {
        CObject::at(&self.element, self.element_address(index))
    }

    /// All elements in order.
    pub fn elements(&self) -> impl Iterator<Item = CObject> + '_ {
        (0..self.len).map(|i| self.element(i))
    }

    /// Value of element `index % len`.
    pub fn get<M: Memory + ?Sized>(&self, mem: &M, index: u32) -> Value {
        self.element(index).value(mem)
    }

    /// Store into element `index % len`.
    pub fn set<M: Memory + ?Sized>(&self, mem: &mut M, index: u32, value: &Value) -> Result<(), CTypeError> {
        self.element(index).set_value(mem, value)
    }

    /// Every element's value as [`Value::Array`].
    pub fn value<M: Memory + ?Sized>(&self, mem: &M) -> Value {
        Value::Array(self.elements().map(|e| e.value(mem)).collect())
    }

    /// Assign from a sequence (extra items are ignored) or a string, one
    /// character per element.
    pub fn set_value<M: Memory + ?Sized>(&self, mem: &mut M, value: &Value) -> Result<(), CTypeError> {
        match value {
            Value::Array(items) => {
                for (i, item) in (0..self.len).zip(items) {
                    self.set(mem, i, item)?;
                }
                Ok(())
            }
            Value::Text(s) => {
                for (i, c) in (0..self.len).zip(s.chars()) {
                    self.set(mem, i, &Value::Char(c))?;
                }
                Ok(())
            }
            other => Err(CTypeError::ValueMismatch {
                expected: self.ty.name().to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    /// Copy the first `min(self.len, other.len)` elements of `other`.
    ///
    /// Arrays of the same element type copy raw slots. Numbers, characters
    /// and pointers convert element by element; other element pairings are
    /// assigned value-wise.
    pub fn copy_from<M: Memory + ?Sized>(&self, mem: &mut M, other: &CArray) -> Result<(), CTypeError> {
        let n = self.len.min(other.len);
        if self.element == other.element {
            copy_slots(
                mem,
                self.element.access(),
                self.address,
                other.address,
                n * self.element.bytes(),
            );
            return Ok(());
        }
        for i in 0..n {
            self.element(i).copy_from(mem, &other.element(i))?;
        }
        Ok(())
    }

    /// Reverse the elements in place.
    pub fn reverse<M: Memory + ?Sized>(&self, mem: &mut M) {
        let slot = self.element.access().slot_access();
        let step = slot.bytes();
        let slots_per_element = self.element.bytes() / step;
        let buffer = mem.buffer_mut();
        for i in 0..self.len / 2 {
            let a = self.element_address(i);
            let b = self.element_address(self.len - 1 - i);
            for s in 0..slots_per_element {
                let (pa, pb) = (a.offset(s * step), b.offset(s * step));
                let va = buffer.load_slot(slot, pa);
                let vb = buffer.load_slot(slot, pb);
                buffer.store_slot(slot, pa, vb);
                buffer.store_slot(slot, pb, va);
            }
        }
    }
}

fn check_array(ty: &CType) -> Result<(), CTypeError> {
    match ty.kind() {
        TypeKind::Array { .. } => Ok(()),
        _ => Err(CTypeError::ValueMismatch {
            expected: "array type".to_string(),
            found: ty.name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::types::CharKind;
    use cmem_arena::SeglistMemory;
    use cmem_core::AccessType;

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn create_from_longer_sequence() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let ty = reg.array(&reg.number(AccessType::Uint16), 5).unwrap();
        let data = [1, 2, 3, 4, 65535, 66, 77];
        let ar = CArray::new(&mut m, &ty, Some(&ints(&data))).unwrap();
        assert_eq!(ar.len(), 5);
        assert_eq!(ar.value(&m), ints(&data[..5]));
        for i in 0..5 {
            assert_eq!(ar.get(&m, i), Value::Int(data[i as usize]));
        }
        ar.set(&mut m, 4, &Value::Int(65537)).unwrap();
        assert_eq!(ar.get(&m, 4), Value::Int(1));
        m.free(ar.address());
    }

    #[test]
    fn create_from_other_array_truncates() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let u16t = reg.number(AccessType::Uint16);
        let a5 = reg.array(&u16t, 5).unwrap();
        let a3 = reg.array(&u16t, 3).unwrap();
        let ar = CArray::new(&mut m, &a5, Some(&ints(&[1, 2, 3, 4, 65535]))).unwrap();
        let ar2 = CArray::new_from(&mut m, &a3, &ar).unwrap();
        assert_eq!(ar2.len(), 3);
        assert_ne!(ar2.ctype(), ar.ctype());
        assert_eq!(ar2.value(&m), ints(&[1, 2, 3]));

        // the longer side keeps its tail
        let big = CArray::new(&mut m, &a5, Some(&ints(&[9, 9, 9, 9, 9]))).unwrap();
        big.copy_from(&mut m, &ar2).unwrap();
        assert_eq!(big.value(&m), ints(&[1, 2, 3, 9, 9]));
    }

    #[test]
    fn index_wraps() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let ty = reg.array(&reg.number(AccessType::Int8), 3).unwrap();
        let ar = CArray::new(&mut m, &ty, Some(&ints(&[10, 20, 30]))).unwrap();
        assert_eq!(ar.get(&m, 4), Value::Int(20));
        ar.set(&mut m, 6, &Value::Int(-1)).unwrap();
        assert_eq!(ar.get(&m, 0), Value::Int(-1));
    }

    #[test]
    fn converts_between_element_types() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let bytes = reg.array(&reg.number(AccessType::Uint8), 4).unwrap();
        let floats = reg.array(&reg.number(AccessType::Float32), 4).unwrap();
        let f = CArray::new(&mut m, &floats, None).unwrap();
        f.set_value(
            &mut m,
            &Value::Array([1.9, -1.0, 300.0, 0.5].map(Value::Float).to_vec()),
        )
        .unwrap();
        let b = CArray::new_from(&mut m, &bytes, &f).unwrap();
        assert_eq!(b.value(&m), ints(&[1, 255, 44, 0]));
    }

    #[test]
    fn char_arrays_take_strings() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let ty = reg.array(&reg.character(CharKind::Char), 4).unwrap();
        let s = CArray::new(&mut m, &ty, Some(&Value::Text("hello".into()))).unwrap();
        assert_eq!(
            s.value(&m),
            Value::Array("hell".chars().map(Value::Char).collect())
        );
        s.reverse(&mut m);
        assert_eq!(s.get(&m, 0), Value::Char('l'));
        assert_eq!(s.get(&m, 3), Value::Char('h'));
    }

    #[test]
    fn reverse_odd_and_even_lengths() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let i32t = reg.number(AccessType::Int32);
        let odd = CArray::new(&mut m, &reg.array(&i32t, 5).unwrap(), Some(&ints(&[1, 2, 3, 4, 5]))).unwrap();
        odd.reverse(&mut m);
        assert_eq!(odd.value(&m), ints(&[5, 4, 3, 2, 1]));
        let even = CArray::new(&mut m, &reg.array(&i32t, 2).unwrap(), Some(&ints(&[-7, 8]))).unwrap();
        even.reverse(&mut m);
        assert_eq!(even.value(&m), ints(&[8, -7]));
    }

    #[test]
    fn rejects_scalars_and_non_array_types() {
        let mut m = SeglistMemory::new(16).unwrap();
        let mut reg = TypeRegistry::new();
        let ty = reg.array(&reg.number(AccessType::Int8), 3).unwrap();
        let before = m.blocks();
        assert!(CArray::new(&mut m, &ty, Some(&Value::Int(1))).is_err());
        assert_eq!(m.blocks(), before);
        assert!(CArray::at(&reg.number(AccessType::Int8), Address(16)).is_err());
    }
}
