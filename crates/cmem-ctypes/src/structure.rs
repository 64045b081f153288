//! Structs.
//!
//! A [`Structure`] owns one field view per declared field, created once
//! when the view is built. Moving the struct with
//! [`set_address`](Structure::set_address) re-points those views instead of
//! rebuilding them.

use cmem_core::{Address, Memory};
use indexmap::IndexMap;

use crate::error::CTypeError;
use crate::layout::{FieldLayout, StructLayout};
use crate::object::{alloc_object, copy_slots, CObject};
use crate::types::{CType, TypeKind};
use crate::value::Value;

/// A struct of type `ty` at `address`.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    ty: CType,
    address: Address,
    fields: Vec<CObject>,
}

impl Structure {
    /// Allocate a new struct of type `ty`, optionally initialised from a
    /// [`Value::Struct`].
    pub fn new<M: Memory + ?Sized>(mem: &mut M, ty: &CType, value: Option<&Value>) -> Result<Self, CTypeError> {
        check_struct(ty)?;
        let address = alloc_object(mem, ty.bytes(), ty.access())?;
        let s = Self::view(ty.clone(), address);
        if let Some(v) = value {
            if let Err(e) = s.set_value(mem, v) {
                mem.free(address);
                return Err(e);
            }
        }
        Ok(s)
    }

    /// Non-owning view of a struct of type `ty` at `address`.
    pub fn at(ty: &CType, address: Address) -> Result<Self, CTypeError> {
        check_struct(ty)?;
        Ok(Self::view(ty.clone(), address))
    }

    pub(crate) fn view(ty: CType, address: Address) -> Self {
        let fields = match ty.kind() {
            TypeKind::Struct(layout) => layout
                .fields()
                .iter()
                .map(|f| CObject::at(&f.ty, address.offset(f.offset)))
                .collect(),
            _ => Vec::new(),
        };
        Self { ty, address, fields }
    }

    /// Struct type.
    pub fn ctype(&self) -> &CType {
        &self.ty
    }

    /// Address of the struct.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Move the view to `address`, re-pointing every field view.
    pub fn set_address(&mut self, address: Address) {
        for field in &mut self.fields {
            let offset = field.address().0.wrapping_sub(self.address.0);
            field.set_address(address.offset(offset));
        }
        self.address = address;
    }

    /// View of field `name`.
    pub fn field(&self, name: &str) -> Option<&CObject> {
        let position = self.ty.layout()?.position(name)?;
        self.fields.get(position)
    }

    /// Field names and views in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &CObject)> + '_ {
        self.layouts()
            .iter()
            .map(|f| f.name.as_str())
            .zip(&self.fields)
    }

    /// Value of field `name`.
    pub fn field_value<M: Memory + ?Sized>(&self, mem: &M, name: &str) -> Result<Value, CTypeError> {
        Ok(self.require(name)?.value(mem))
    }

    /// Store into field `name`.
    pub fn set_field<M: Memory + ?Sized>(&self, mem: &mut M, name: &str, value: &Value) -> Result<(), CTypeError> {
        self.require(name)?.set_value(mem, value)
    }

    /// Every field's value, in declaration order.
    pub fn value<M: Memory + ?Sized>(&self, mem: &M) -> Value {
        let map: IndexMap<String, Value> = self
            .fields()
            .map(|(name, obj)| (name.to_string(), obj.value(mem)))
            .collect();
        Value::Struct(map)
    }

    /// Assign the fields present in a [`Value::Struct`]; other fields keep
    /// their contents and keys naming no field are ignored.
    pub fn set_value<M: Memory + ?Sized>(&self, mem: &mut M, value: &Value) -> Result<(), CTypeError> {
        let Value::Struct(map) = value else {
            return Err(CTypeError::ValueMismatch {
                expected: self.ty.name().to_string(),
                found: value.kind().to_string(),
            });
        };
        for (name, obj) in self.fields() {
            if let Some(v) = map.get(name) {
                obj.set_value(mem, v)?;
            }
        }
        Ok(())
    }

    /// Assign `other`: a raw slot copy for the same struct type, field
    /// values matched by name otherwise.
    pub fn copy_from<M: Memory + ?Sized>(&self, mem: &mut M, other: &Structure) -> Result<(), CTypeError> {
        if self.ty == other.ty {
            copy_slots(mem, self.ty.access(), self.address, other.address, self.ty.bytes());
            return Ok(());
        }
        let v = other.value(mem);
        self.set_value(mem, &v)
    }

    fn layouts(&self) -> &[FieldLayout] {
        self.ty.layout().map(StructLayout::fields).unwrap_or_default()
    }

    fn require(&self, name: &str) -> Result<&CObject, CTypeError> {
        self.field(name).ok_or_else(|| CTypeError::UnknownField {
            structure: self.ty.name().to_string(),
            field: name.to_string(),
        })
    }
}

fn check_struct(ty: &CType) -> Result<(), CTypeError> {
    match ty.kind() {
        TypeKind::Struct(_) => Ok(()),
        _ => Err(CTypeError::ValueMismatch {
            expected: "struct type".to_string(),
            found: ty.name().to_string(),
        }),
    }
}
