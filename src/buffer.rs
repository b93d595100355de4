//! A transient view over the bytes handed to one `start`/`resume` call.
//!
//! Unlike the source's pointer-plus-offset view, which is long-lived and
//! re-pointed at a new address on every buffer publish, this view borrows
//! the caller's slice for the duration of a single call only. The one piece
//! of state that must outlive the borrow — the packet-relative bit position
//! — lives on [`crate::btr::BinaryTypeReader`] itself as a plain `u64` and is
//! folded back in when the view is constructed and flushed out when it is
//! dropped. See the crate's `DESIGN.md` for why this sidesteps a
//! self-referential borrow that the original pointer-based contract does not
//! have to deal with in C.

use crate::error::{Error, Result};

pub(crate) struct InputBufferView<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) first_bit_offset: u32,
    pub(crate) cursor_bits: u64,
    pub(crate) valid_bits: u64,
}

impl<'a> InputBufferView<'a> {
    pub(crate) fn new(bytes: &'a [u8], first_bit_offset: u32, valid_bits: u64) -> Self {
        Self {
            bytes,
            first_bit_offset,
            cursor_bits: 0,
            valid_bits,
        }
    }

    pub(crate) fn available(&self) -> u64 {
        self.valid_bits - self.cursor_bits
    }

    pub(crate) fn consume(&mut self, k: u64) -> Result<()> {
        if k > self.available() {
            return Err(Error::Invariant(format!(
                "attempted to consume {k} bits with only {} available",
                self.available()
            )));
        }
        self.cursor_bits += k;
        Ok(())
    }

    /// Absolute bit address of the cursor within `self.bytes`.
    pub(crate) fn bit_at_cursor(&self) -> u64 {
        self.first_bit_offset as u64 + self.cursor_bits
    }
}
