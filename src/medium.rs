//! The byte-producing abstraction the stream reader drives.

/// Outcome of a single [`Medium::get_next_bytes`] request.
#[derive(Debug)]
pub enum MediumStatus {
    /// Up to the requested number of bytes, continuing where the previous
    /// `Ok` left off. A short read is permitted.
    Ok(Vec<u8>),
    /// No bytes are available right now, but more may arrive later.
    Again,
    /// No further byte will ever be available from this medium.
    Eos,
    /// The medium failed; carries a human-readable description.
    Error(String),
    /// The request itself was invalid (e.g. zero-sized).
    Inval,
}

/// A source of bytes for a [`crate::stream_reader::StreamReader`] to decode.
///
/// Implementations own their position; each call picks up where the
/// previous one left off. Returning owned buffers (rather than a borrowed
/// slice valid "until the next call") avoids a self-referential borrow
/// between the medium and the stream reader holding it.
pub trait Medium {
    fn get_next_bytes(&mut self, request_size_bytes: usize) -> MediumStatus;
}
