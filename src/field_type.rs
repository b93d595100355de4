//! The field type model the BTR traverses.
//!
//! `FieldType` plays the role the source's opaque, reference-counted type
//! handles play: the reader only ever matches on its discriminant and calls
//! the introspection methods below, the same way [`crate::btr`] would call
//! into a foreign metadata system. Handles are shared via [`Rc`] rather than
//! [`std::sync::Arc`] since the whole decoder is explicitly single-threaded
//! (see the concurrency model in the crate docs).

use std::rc::Rc;

use crate::byte_order::{ByteOrder, DeclaredByteOrder};

/// Discriminant returned by [`FieldType::type_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeId {
    Integer,
    Float,
    Enum,
    String,
    Struct,
    Array,
    Sequence,
    Variant,
}

#[derive(Debug, Clone)]
pub struct IntegerType {
    pub size_bits: u8,
    pub is_signed: bool,
    pub byte_order: ByteOrder,
    pub alignment_bits: u32,
}

impl IntegerType {
    pub fn new(
        size_bits: u8,
        is_signed: bool,
        byte_order: DeclaredByteOrder,
        alignment_bits: u32,
    ) -> Self {
        Self {
            size_bits,
            is_signed,
            byte_order: byte_order.into(),
            alignment_bits,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FloatType {
    pub exp_bits: u8,
    pub mant_bits: u8,
    pub byte_order: ByteOrder,
    pub alignment_bits: u32,
}

impl FloatType {
    pub fn new(exp_bits: u8, mant_bits: u8, byte_order: DeclaredByteOrder, alignment_bits: u32) -> Self {
        Self {
            exp_bits,
            mant_bits,
            byte_order: byte_order.into(),
            alignment_bits,
        }
    }

    pub fn size_bits(&self) -> u32 {
        self.exp_bits as u32 + self.mant_bits as u32
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub container: IntegerType,
}

#[derive(Debug, Clone, Default)]
pub struct StringType;

#[derive(Debug, Clone)]
pub struct StructType {
    pub name: Option<String>,
    pub fields: Vec<(String, Rc<FieldType>)>,
    pub alignment_bits: u32,
}

#[derive(Debug, Clone)]
pub struct ArrayType {
    pub element: Rc<FieldType>,
    pub length: u64,
    pub alignment_bits: u32,
}

#[derive(Debug, Clone)]
pub struct SequenceType {
    pub element: Rc<FieldType>,
    pub alignment_bits: u32,
}

#[derive(Debug, Clone)]
pub struct VariantType {
    pub fields: Vec<(String, Rc<FieldType>)>,
}

/// An opaque, reference-counted field type handle.
///
/// The BTR consumes instances of this type purely through the introspection
/// methods below; it never needs a representation beyond "which kind is
/// this, and what are its structural children".
#[derive(Debug, Clone)]
pub enum FieldType {
    Integer(IntegerType),
    Float(FloatType),
    Enum(EnumType),
    String(StringType),
    Struct(StructType),
    Array(ArrayType),
    Sequence(SequenceType),
    Variant(VariantType),
}

impl FieldType {
    pub fn type_id(&self) -> TypeId {
        match self {
            FieldType::Integer(_) => TypeId::Integer,
            FieldType::Float(_) => TypeId::Float,
            FieldType::Enum(_) => TypeId::Enum,
            FieldType::String(_) => TypeId::String,
            FieldType::Struct(_) => TypeId::Struct,
            FieldType::Array(_) => TypeId::Array,
            FieldType::Sequence(_) => TypeId::Sequence,
            FieldType::Variant(_) => TypeId::Variant,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(
            self.type_id(),
            TypeId::Struct | TypeId::Array | TypeId::Sequence | TypeId::Variant
        )
    }

    /// Alignment in bits, from the start of the enclosing packet. Strings
    /// are always byte-aligned; variants carry no declared alignment of
    /// their own (the selected alternative's alignment applies instead), so
    /// `1` (no-op) is reported here.
    pub fn alignment_bits(&self) -> u32 {
        match self {
            FieldType::Integer(i) => i.alignment_bits,
            FieldType::Float(f) => f.alignment_bits,
            FieldType::Enum(e) => e.container.alignment_bits,
            FieldType::String(_) => 8,
            FieldType::Struct(s) => s.alignment_bits,
            FieldType::Array(a) => a.alignment_bits,
            FieldType::Sequence(s) => s.alignment_bits,
            FieldType::Variant(_) => 1,
        }
    }

    /// Effective byte order, for the leaf kinds that have one.
    pub fn byte_order(&self) -> Option<ByteOrder> {
        match self {
            FieldType::Integer(i) => Some(i.byte_order),
            FieldType::Float(f) => Some(f.byte_order),
            FieldType::Enum(e) => Some(e.container.byte_order),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&IntegerType> {
        match self {
            FieldType::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&FloatType> {
        match self {
            FieldType::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            FieldType::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            FieldType::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            FieldType::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceType> {
        match self {
            FieldType::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&VariantType> {
        match self {
            FieldType::Variant(v) => Some(v),
            _ => None,
        }
    }

    /// Number of named children, for Struct and Variant.
    pub fn field_count(&self) -> Option<usize> {
        match self {
            FieldType::Struct(s) => Some(s.fields.len()),
            FieldType::Variant(v) => Some(v.fields.len()),
            _ => None,
        }
    }

    /// Named child at `index`, for Struct and Variant.
    pub fn field_at(&self, index: usize) -> Option<(&str, &Rc<FieldType>)> {
        match self {
            FieldType::Struct(s) => s.fields.get(index).map(|(n, t)| (n.as_str(), t)),
            FieldType::Variant(v) => v.fields.get(index).map(|(n, t)| (n.as_str(), t)),
            _ => None,
        }
    }
}
