//! Typename registry.
//!
//! Every ctype is identified by its typename. The registry starts out with
//! the primitives and `void*`, creates pointer and array types on demand
//! (returning the identical descriptor for repeated requests) and rejects
//! struct definitions whose name is taken.

use cmem_core::{AccessMask, AccessType};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::CTypeError;
use crate::layout::StructLayout;
use crate::types::{number_name, CType, CharKind, TypeKind};

/// Typename to type descriptor map.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    types: IndexMap<String, CType>,
}

impl TypeRegistry {
    /// Registry holding the seven numeric primitives, `Char`, `WChar` and
    /// `void*`.
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        let builtins = AccessType::ALL
            .into_iter()
            .map(CType::number)
            .chain([CharKind::Char, CharKind::WChar].map(CType::character))
            .chain(std::iter::once(CType::void_pointer()));
        for ty in builtins {
            types.insert(ty.name().to_string(), ty);
        }
        Self { types }
    }

    /// Type registered under `name`.
    pub fn get(&self, name: &str) -> Option<&CType> {
        self.types.get(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: the builtins are registered on construction.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CType> {
        self.types.values()
    }

    /// Numeric primitive stored through `access`.
    pub fn number(&self, access: AccessType) -> CType {
        self.types
            .get(number_name(access))
            .cloned()
            .unwrap_or_else(|| CType::number(access))
    }

    /// Character primitive.
    pub fn character(&self, kind: CharKind) -> CType {
        self.types
            .get(kind.name())
            .cloned()
            .unwrap_or_else(|| CType::character(kind))
    }

    /// The untyped pointer.
    pub fn void_pointer(&self) -> CType {
        self.types
            .get("void*")
            .cloned()
            .unwrap_or_else(CType::void_pointer)
    }

    /// Pointer to `pointee`, or `void*` for `None`.
    ///
    /// Repeated calls for the same pointee return the identical descriptor.
    /// Pointers to pointers are built by passing a pointer type.
    pub fn pointer(&mut self, pointee: Option<&CType>) -> CType {
        let Some(pointee) = pointee else {
            return self.void_pointer();
        };
        let name = format!("{}*", pointee.name());
        if let Some(ty) = self.types.get(&name) {
            return ty.clone();
        }
        let ty = CType::from_parts(
            name.clone(),
            4,
            AccessType::Uint32.mask(),
            TypeKind::Pointer(Some(pointee.clone())),
        );
        trace!(typename = %name, "registered pointer type");
        self.types.insert(name, ty.clone());
        ty
    }

    /// Array of `len` elements of `element`.
    ///
    /// Repeated calls return the identical descriptor. Fails for `len == 0`
    /// or a total size beyond 32 bits.
    pub fn array(&mut self, element: &CType, len: u32) -> Result<CType, CTypeError> {
        let name = format!("{}[{len}]", element.name());
        if let Some(ty) = self.types.get(&name) {
            return Ok(ty.clone());
        }
        if len == 0 {
            return Err(CTypeError::InvalidLayout {
                name,
                reason: "array length must be at least 1".to_string(),
            });
        }
        let Some(bytes) = element.bytes().checked_mul(len) else {
            return Err(CTypeError::InvalidLayout {
                name,
                reason: "array size exceeds 32 bits".to_string(),
            });
        };
        let ty = CType::from_parts(
            name.clone(),
            bytes,
            element.access(),
            TypeKind::Array {
                element: element.clone(),
                len,
            },
        );
        trace!(typename = %name, bytes, "registered array type");
        self.types.insert(name, ty.clone());
        Ok(ty)
    }

    /// Define a struct type called `name` with the given fields in order.
    ///
    /// The layout is computed here, once. The name must be unused and must
    /// not contain `*` or `[`, which are reserved for derived typenames.
    pub fn define_struct<S, I>(&mut self, name: &str, fields: I) -> Result<CType, CTypeError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, CType)>,
    {
        if self.types.contains_key(name) {
            return Err(CTypeError::DuplicateType {
                name: name.to_string(),
            });
        }
        if name.is_empty() || name.contains(['*', '[', ']']) {
            return Err(CTypeError::InvalidLayout {
                name: name.to_string(),
                reason: "typename must be non-empty and free of '*', '[' and ']'".to_string(),
            });
        }
        let layout = StructLayout::compute(name, fields.into_iter().map(|(n, t)| (n.into(), t)))?;
        debug!(
            typename = name,
            bytes = layout.bytes(),
            fields = layout.fields().len(),
            "struct layout computed"
        );
        let ty = CType::from_parts(
            name.to_string(),
            layout.bytes(),
            layout.access(),
            TypeKind::Struct(layout),
        );
        self.types.insert(name.to_string(), ty.clone());
        Ok(ty)
    }

    /// Access footprint of every registered type combined.
    pub fn access(&self) -> AccessMask {
        self.types.values().fold(AccessMask::EMPTY, |m, t| m | t.access())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
