use thiserror;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error reported by the medium producing bytes for a stream reader.
    #[error("medium error: {0}")]
    Medium(String),
    /// Two sub-byte-adjacent leaves declared incompatible byte orders.
    #[error("conflicting byte order across adjacent sub-byte fields")]
    ByteOrderMix,
    /// A float field's (exponent, mantissa) width isn't IEEE-754 binary32 or binary64.
    #[error("unsupported float representation: {exp_bits} exponent bits, {mant_bits} mantissa bits")]
    UnsupportedFloat { exp_bits: u8, mant_bits: u8 },
    /// An integer/enum field's size falls outside 1..=64 bits.
    #[error("field size {0} bits is out of the supported 1..=64 range")]
    BadFieldSize(u32),
    /// The sequence-length callback returned a negative length.
    #[error("sequence length callback returned a negative length: {0}")]
    BadLength(i64),
    /// The variant-selector callback could not resolve an alternative.
    #[error("variant selector callback could not resolve an alternative")]
    BadVariant,
    /// A user callback reported failure.
    #[error("callback failed: {0}")]
    CallbackFailure(String),
    /// An internal invariant was violated; this indicates a bug in the reader.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}
