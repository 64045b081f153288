//! Struct layout computation.
//!
//! Fields are placed in declaration order. Each field starts at an offset
//! its widest access can address: 4-byte aligned if the field touches any
//! 32-bit view, 2-byte aligned for 16-bit views, unaligned otherwise. The
//! total size is padded to the struct's own widest access so that arrays of
//! the struct stay aligned.
//!
//! ```text
//! fields  [a: Int8, b: Int32, c: Int8, d: Int32, e: Int16]
//! bytes   [X---     XXXX      X---     XXXX      XX**    ]  = 20
//!
//! fields  [a: Int8, c: Int8, e: Int16, b: Int32, d: Int32]
//! bytes   [X        X        XX        XXXX      XXXX    ]  = 12
//! ```
//!
//! `-` is padding before a field, `*` padding at the end. Grouping fields
//! by width avoids both.

use cmem_core::AccessMask;
use smallvec::SmallVec;

use crate::error::CTypeError;
use crate::types::CType;

/// Placement of one struct field.
#[derive(Clone, Debug)]
pub struct FieldLayout {
    /// Field name, unique within the struct.
    pub name: String,
    /// Field type.
    pub ty: CType,
    /// Byte offset from the start of the struct.
    pub offset: u32,
}

/// Offsets, total size and access footprint of a struct type, computed
/// once when the type is defined.
#[derive(Clone, Debug)]
pub struct StructLayout {
    fields: SmallVec<[FieldLayout; 4]>,
    bytes: u32,
    access: AccessMask,
}

impl StructLayout {
    /// Lay out the fields of struct `name` in order.
    ///
    /// Fails with [`CTypeError::InvalidLayout`] on an empty field list, a
    /// repeated field name or a size that does not fit in 32 bits.
    pub fn compute<I>(name: &str, fields: I) -> Result<Self, CTypeError>
    where
        I: IntoIterator<Item = (String, CType)>,
    {
        let invalid = |reason: String| CTypeError::InvalidLayout {
            name: name.to_string(),
            reason,
        };
        let mut placed: SmallVec<[FieldLayout; 4]> = SmallVec::new();
        let mut access = AccessMask::EMPTY;
        let mut offset: u64 = 0;
        for (field, ty) in fields {
            if placed.iter().any(|f| f.name == field) {
                return Err(invalid(format!("duplicate field '{field}'")));
            }
            offset = align_to(offset, ty.access().alignment());
            access |= ty.access();
            let bytes = ty.bytes();
            placed.push(FieldLayout {
                name: field,
                ty,
                offset: offset as u32,
            });
            offset += u64::from(bytes);
            if offset > u64::from(u32::MAX) {
                return Err(invalid("struct size exceeds 32 bits".to_string()));
            }
        }
        if placed.is_empty() {
            return Err(invalid("a struct needs at least one field".to_string()));
        }
        let bytes = align_to(offset, access.alignment());
        if bytes > u64::from(u32::MAX) {
            return Err(invalid("struct size exceeds 32 bits".to_string()));
        }
        Ok(Self {
            fields: placed,
            bytes: bytes as u32,
            access,
        })
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Field called `name`.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of field `name` in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Total size in bytes, padding included.
    pub fn bytes(&self) -> u32 {
        self.bytes
    }

    /// Union of every field's access footprint.
    pub fn access(&self) -> AccessMask {
        self.access
    }
}

fn align_to(offset: u64, alignment: u32) -> u64 {
    let mask = u64::from(alignment) - 1;
    (offset + mask) & !mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmem_core::AccessType;

    fn num(access: AccessType) -> CType {
        CType::number(access)
    }

    fn offsets(layout: &StructLayout) -> Vec<u32> {
        layout.fields().iter().map(|f| f.offset).collect()
    }

    #[test]
    fn fields_align_to_their_access_width() {
        let layout = StructLayout::compute("S", [
            ("a".to_string(), num(AccessType::Int8)),
            ("b".to_string(), num(AccessType::Int16)),
            ("c".to_string(), num(AccessType::Int32)),
        ])
        .unwrap();
        assert_eq!(offsets(&layout), vec![0, 2, 4]);
        assert_eq!(layout.bytes(), 8);
        assert_eq!(layout.field("c").map(|f| f.offset), Some(4));
        assert_eq!(layout.position("b"), Some(1));
    }

    #[test]
    fn grouping_by_width_saves_padding() {
        let spread = StructLayout::compute("S", [
            ("a".to_string(), num(AccessType::Int8)),
            ("b".to_string(), num(AccessType::Int32)),
            ("c".to_string(), num(AccessType::Int8)),
            ("d".to_string(), num(AccessType::Int32)),
            ("e".to_string(), num(AccessType::Int16)),
        ])
        .unwrap();
        assert_eq!(offsets(&spread), vec![0, 4, 8, 12, 16]);
        assert_eq!(spread.bytes(), 20);

        let grouped = StructLayout::compute("S", [
            ("a".to_string(), num(AccessType::Int8)),
            ("c".to_string(), num(AccessType::Int8)),
            ("e".to_string(), num(AccessType::Int16)),
            ("b".to_string(), num(AccessType::Int32)),
            ("d".to_string(), num(AccessType::Int32)),
        ])
        .unwrap();
        assert_eq!(offsets(&grouped), vec![0, 1, 2, 4, 8]);
        assert_eq!(grouped.bytes(), 12);
    }

    #[test]
    fn size_pads_to_coarsest_access() {
        let layout = StructLayout::compute("S", [
            ("x".to_string(), num(AccessType::Uint16)),
            ("y".to_string(), num(AccessType::Uint8)),
        ])
        .unwrap();
        assert_eq!(layout.bytes(), 4);

        let bytes_only = StructLayout::compute("S", [
            ("x".to_string(), num(AccessType::Uint8)),
            ("y".to_string(), num(AccessType::Int8)),
            ("z".to_string(), num(AccessType::Uint8)),
        ])
        .unwrap();
        assert_eq!(bytes_only.bytes(), 3);
    }

    #[test]
    fn rejects_empty_and_duplicate_fields() {
        let empty = StructLayout::compute("Empty", Vec::<(String, CType)>::new());
        assert!(matches!(
            empty,
            Err(CTypeError::InvalidLayout { ref name, .. }) if name == "Empty"
        ));
        let dup = StructLayout::compute(
            "Dup",
            [
                ("a".to_string(), num(AccessType::Int8)),
                ("a".to_string(), num(AccessType::Int8)),
            ],
        );
        match dup {
            Err(CTypeError::InvalidLayout { name, reason }) => {
                assert_eq!(name, "Dup");
                assert_eq!(reason, "duplicate field 'a'");
            }
            other => panic!("expected InvalidLayout, got {other:?}"),
        }
    }
}
