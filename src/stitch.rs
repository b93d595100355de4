//! The 16-byte scratch region used to assemble a single atomic field that
//! straddles an input-buffer boundary.
//!
//! Sized for the worst case: a 64-bit field starting at bit offset 7 spans
//! 9 bytes; 16 leaves headroom without ever needing to grow, which would
//! reintroduce the heap allocation this exists to avoid on the hot resume
//! path.

use crate::buffer::InputBufferView;
use crate::error::Result;

pub(crate) struct StitchBuffer {
    bytes: [u8; 16],
    start_bit_offset: u32,
    held_bits: u32,
}

impl StitchBuffer {
    pub(crate) fn new() -> Self {
        Self {
            bytes: [0; 16],
            start_bit_offset: 0,
            held_bits: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.start_bit_offset = 0;
        self.held_bits = 0;
    }

    pub(crate) fn held_bits(&self) -> u32 {
        self.held_bits
    }

    pub(crate) fn start_bit_offset(&self) -> u64 {
        self.start_bit_offset as u64
    }

    pub(crate) fn bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    pub(crate) fn set_from_remaining(&mut self, view: &mut InputBufferView) -> Result<()> {
        self.reset();
        self.start_bit_offset = (view.bit_at_cursor() % 8) as u32;
        self.append_from_remaining(view)
    }

    /// Copy the next full bytes needed to hold `k` more bits, advancing both
    /// `held_bits` and the input cursor by `k`.
    pub(crate) fn append_from_buf(&mut self, view: &mut InputBufferView, k: u32) -> Result<()> {
        let start = self.start_bit_offset as u64;
        let held = self.held_bits as u64;
        let first_byte = ((start + held) / 8) as usize;
        let last_byte = ((start + held + k as u64 + 7) / 8) as usize;
        let nbytes = last_byte - first_byte;

        if nbytes > 0 {
            let src_floor = (view.bit_at_cursor() / 8) as usize;
            self.bytes[first_byte..first_byte + nbytes]
                .copy_from_slice(&view.bytes[src_floor..src_floor + nbytes]);
        }

        view.consume(k as u64)?;
        self.held_bits += k;
        Ok(())
    }

    pub(crate) fn append_from_remaining(&mut self, view: &mut InputBufferView) -> Result<()> {
        let available = view.available() as u32;
        self.append_from_buf(view, available)
    }
}
