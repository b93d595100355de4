//! Byte order handling for leaf fields.
//!
//! Field types declare one of [`DeclaredByteOrder::BigEndian`],
//! [`DeclaredByteOrder::Network`] or [`DeclaredByteOrder::LittleEndian`].
//! `Network` is normalized to big-endian as soon as a field type is built, so
//! the rest of the reader only ever has to reason about two effective values
//! ([`ByteOrder`]), keeping the contiguity rule in `btr` a total function.

/// Effective byte order used by the bitfield codec and the contiguity rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

/// Byte order as a field type may declare it, before `Network` is folded
/// into [`ByteOrder::BigEndian`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredByteOrder {
    BigEndian,
    Network,
    LittleEndian,
}

impl From<DeclaredByteOrder> for ByteOrder {
    fn from(declared: DeclaredByteOrder) -> Self {
        match declared {
            DeclaredByteOrder::BigEndian | DeclaredByteOrder::Network => ByteOrder::BigEndian,
            DeclaredByteOrder::LittleEndian => ByteOrder::LittleEndian,
        }
    }
}

/// Byte order of the most recently completed leaf. A distinct `Unknown`
/// variant (rather than an `Option`) keeps intent explicit at every call
/// site: this is a third state, not the absence of one of two others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LastByteOrder {
    Unknown,
    Known(ByteOrder),
}

impl Default for LastByteOrder {
    fn default() -> Self {
        LastByteOrder::Unknown
    }
}
