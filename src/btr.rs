//! The core state machine: six states driving traversal, alignment, and
//! bit-granular decoding, suspending on `Eof` and resuming exactly where it
//! left off.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::bitfield;
use crate::buffer::InputBufferView;
use crate::byte_order::LastByteOrder;
use crate::callbacks::Callbacks;
use crate::error::{Error, Result};
use crate::field_type::FieldType;
use crate::stack::VisitStack;
use crate::stitch::StitchBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NextField,
    AlignBasic,
    AlignCompound,
    ReadBasicBegin,
    ReadBasicContinue,
    Done,
}

/// Result of a `start`/`resume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtrOutcome {
    Done { bits_consumed: u64 },
    Eof { bits_consumed: u64 },
}

enum Step {
    Continue,
    Eof,
}

fn ceil_to_multiple(pos: u64, align: u64) -> u64 {
    if align <= 1 {
        return pos;
    }
    pos.div_ceil(align) * align
}

/// A resumable, single-threaded, bit-granular CTF field decoder.
///
/// Not `Send`/`Sync`: it holds `Rc<FieldType>` handles, by design (see the
/// crate's concurrency model).
pub struct BinaryTypeReader {
    state: State,
    stack: VisitStack,
    stitch: StitchBuffer,
    current_basic: Option<Rc<FieldType>>,
    last_byte_order: LastByteOrder,
    packet_bit_offset: u64,
}

impl Default for BinaryTypeReader {
    fn default() -> Self {
        Self {
            state: State::Done,
            stack: VisitStack::default(),
            stitch: StitchBuffer::new(),
            current_basic: None,
            last_byte_order: LastByteOrder::Unknown,
            packet_bit_offset: 0,
        }
    }
}

impl BinaryTypeReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute bit position within the enclosing packet, based on where the
    /// persisted offset plus the current call's cursor land.
    fn packet_position(&self, view: &InputBufferView) -> u64 {
        self.packet_bit_offset + view.cursor_bits
    }

    /// Begin decoding `root_type` from a fresh buffer, discarding any
    /// in-progress decode. Returns `Eof` if the root could not be completed
    /// from this buffer alone.
    pub fn start(
        &mut self,
        root_type: Rc<FieldType>,
        bytes: &[u8],
        first_bit_offset: u32,
        valid_bits: u64,
        callbacks: &mut dyn Callbacks,
    ) -> Result<BtrOutcome> {
        self.stack.clear();
        self.stitch.reset();
        self.current_basic = None;
        self.last_byte_order = LastByteOrder::Unknown;
        self.packet_bit_offset = 0;

        if root_type.is_compound() {
            callbacks.compound_begin(&root_type)?;
            let base_len = self.resolve_base_len(&root_type, callbacks)?;
            self.stack.push(root_type, base_len);
            self.state = State::AlignCompound;
        } else {
            self.current_basic = Some(root_type);
            self.state = State::AlignBasic;
        }

        self.run(bytes, first_bit_offset, valid_bits, callbacks)
    }

    /// Continue decoding with the next chunk of bytes for the in-progress
    /// field. Must not be called after `start` unless a prior call returned
    /// `Eof`.
    pub fn resume(
        &mut self,
        bytes: &[u8],
        first_bit_offset: u32,
        valid_bits: u64,
        callbacks: &mut dyn Callbacks,
    ) -> Result<BtrOutcome> {
        self.run(bytes, first_bit_offset, valid_bits, callbacks)
    }

    fn run(
        &mut self,
        bytes: &[u8],
        first_bit_offset: u32,
        valid_bits: u64,
        callbacks: &mut dyn Callbacks,
    ) -> Result<BtrOutcome> {
        let mut view = InputBufferView::new(bytes, first_bit_offset, valid_bits);
        loop {
            if self.state == State::Done {
                self.packet_bit_offset += view.cursor_bits;
                debug!(bits_consumed = view.cursor_bits, "btr done");
                return Ok(BtrOutcome::Done {
                    bits_consumed: view.cursor_bits,
                });
            }
            match self.step(&mut view, callbacks) {
                Ok(Step::Continue) => continue,
                Ok(Step::Eof) => {
                    self.packet_bit_offset += view.cursor_bits;
                    trace!(bits_consumed = view.cursor_bits, state = ?self.state, "btr suspended");
                    return Ok(BtrOutcome::Eof {
                        bits_consumed: view.cursor_bits,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "btr error");
                    return Err(e);
                }
            }
        }
    }

    fn step(
        &mut self,
        view: &mut InputBufferView,
        callbacks: &mut dyn Callbacks,
    ) -> Result<Step> {
        match self.state {
            State::Done => unreachable!("run() returns before stepping a Done state"),
            State::NextField => {
                self.handle_next_field(callbacks)?;
                Ok(Step::Continue)
            }
            State::AlignBasic => self.do_align(view, true),
            State::AlignCompound => self.do_align(view, false),
            State::ReadBasicBegin => {
                let ty = self.current_basic.clone().expect("leaf type set before ReadBasicBegin");
                match &*ty {
                    FieldType::String(_) => self.handle_string(view, &ty, callbacks, true),
                    _ => self.handle_basic_begin(view, &ty, callbacks),
                }
            }
            State::ReadBasicContinue => {
                let ty = self.current_basic.clone().expect("leaf type set before ReadBasicContinue");
                match &*ty {
                    FieldType::String(_) => self.handle_string(view, &ty, callbacks, false),
                    _ => self.handle_basic_continue(view, &ty, callbacks),
                }
            }
        }
    }

    fn do_align(&mut self, view: &mut InputBufferView, for_basic: bool) -> Result<Step> {
        let align = if for_basic {
            self.current_basic
                .as_ref()
                .expect("leaf type set before AlignBasic")
                .alignment_bits()
        } else {
            self.stack
                .top()
                .expect("a compound frame is on the stack before AlignCompound")
                .base_type
                .alignment_bits()
        } as u64;
        let align = if align == 0 { 1 } else { align };

        let pos = self.packet_position(view);
        let target = ceil_to_multiple(pos, align);
        let skip = target - pos;

        if skip == 0 {
            self.state = if for_basic {
                State::ReadBasicBegin
            } else {
                State::NextField
            };
            return Ok(Step::Continue);
        }

        if view.available() == 0 {
            return Ok(Step::Eof);
        }

        let consume_n = view.available().min(skip);
        view.consume(consume_n)?;

        if self.packet_position(view) == target {
            self.state = if for_basic {
                State::ReadBasicBegin
            } else {
                State::NextField
            };
            Ok(Step::Continue)
        } else {
            Ok(Step::Eof)
        }
    }

    fn handle_next_field(&mut self, callbacks: &mut dyn Callbacks) -> Result<()> {
        loop {
            if self.stack.is_empty() {
                self.state = State::Done;
                return Ok(());
            }
            let frame_done = {
                let top = self.stack.top().expect("stack non-empty");
                top.index == top.base_len
            };
            if frame_done {
                let frame = self.stack.pop().expect("stack non-empty");
                callbacks.compound_end(&frame.base_type)?;
                if self.stack.is_empty() {
                    self.state = State::Done;
                    return Ok(());
                }
                continue;
            }
            break;
        }

        let top_type = self.stack.top().expect("stack non-empty").base_type.clone();
        let top_index = self.stack.top().expect("stack non-empty").index as usize;

        let child = match &*top_type {
            FieldType::Struct(s) => s.fields[top_index].1.clone(),
            FieldType::Array(a) => a.element.clone(),
            FieldType::Sequence(s) => s.element.clone(),
            FieldType::Variant(_) => callbacks
                .get_variant_type(&top_type)?
                .ok_or(Error::BadVariant)?,
            _ => {
                return Err(Error::Invariant(
                    "non-compound field type found on the visit stack".into(),
                ))
            }
        };

        if child.is_compound() {
            callbacks.compound_begin(&child)?;
            let base_len = self.resolve_base_len(&child, callbacks)?;
            self.stack
                .top_mut()
                .expect("stack non-empty")
                .index += 1;
            self.stack.push(child, base_len);
            self.state = State::AlignCompound;
        } else {
            self.current_basic = Some(child);
            self.state = State::AlignBasic;
        }
        Ok(())
    }

    fn resolve_base_len(
        &mut self,
        ty: &Rc<FieldType>,
        callbacks: &mut dyn Callbacks,
    ) -> Result<u64> {
        match &**ty {
            FieldType::Struct(s) => Ok(s.fields.len() as u64),
            FieldType::Array(a) => Ok(a.length),
            FieldType::Sequence(_) => {
                let n = callbacks.get_sequence_length(ty)?;
                if n < 0 {
                    return Err(Error::BadLength(n));
                }
                Ok(n as u64)
            }
            FieldType::Variant(_) => Ok(1),
            _ => Err(Error::Invariant(
                "resolve_base_len called on a non-compound field type".into(),
            )),
        }
    }

    fn finish_leaf(&mut self) {
        if self.stack.is_empty() {
            self.state = State::Done;
        } else {
            self.stack.top_mut().expect("stack non-empty").index += 1;
            self.state = State::NextField;
        }
    }

    fn handle_basic_begin(
        &mut self,
        view: &mut InputBufferView,
        ty: &Rc<FieldType>,
        callbacks: &mut dyn Callbacks,
    ) -> Result<Step> {
        let size_bits = leaf_size_bits(ty)?;
        let byte_order = ty.byte_order().expect("leaf field types declare a byte order");

        check_contiguity(self.packet_position(view), self.last_byte_order, byte_order)?;

        if (size_bits as u64) <= view.available() {
            let bit_at = view.bit_at_cursor();
            let raw = bitfield::read(view.bytes, bit_at, size_bits, byte_order)?;
            view.consume(size_bits as u64)?;
            dispatch_leaf(ty, raw, callbacks)?;
            self.last_byte_order = LastByteOrder::Known(byte_order);
            self.finish_leaf();
            Ok(Step::Continue)
        } else {
            self.stitch.set_from_remaining(view)?;
            self.state = State::ReadBasicContinue;
            Ok(Step::Eof)
        }
    }

    fn handle_basic_continue(
        &mut self,
        view: &mut InputBufferView,
        ty: &Rc<FieldType>,
        callbacks: &mut dyn Callbacks,
    ) -> Result<Step> {
        if view.available() == 0 {
            return Ok(Step::Eof);
        }
        let size_bits = leaf_size_bits(ty)?;
        let byte_order = ty.byte_order().expect("leaf field types declare a byte order");
        let need = size_bits as u64 - self.stitch.held_bits() as u64;

        if need <= view.available() {
            self.stitch.append_from_buf(view, need as u32)?;
            let raw = bitfield::read(
                self.stitch.bytes(),
                self.stitch.start_bit_offset(),
                size_bits,
                byte_order,
            )?;
            dispatch_leaf(ty, raw, callbacks)?;
            self.last_byte_order = LastByteOrder::Known(byte_order);
            self.finish_leaf();
            Ok(Step::Continue)
        } else {
            self.stitch.append_from_remaining(view)?;
            Ok(Step::Eof)
        }
    }

    fn handle_string(
        &mut self,
        view: &mut InputBufferView,
        ty: &Rc<FieldType>,
        callbacks: &mut dyn Callbacks,
        first_entry: bool,
    ) -> Result<Step> {
        if first_entry {
            callbacks.string_begin(ty)?;
        }
        if view.available() == 0 {
            self.state = State::ReadBasicContinue;
            return Ok(Step::Eof);
        }

        // 8-bit aligned and byte-granular media guarantee available() here
        // is always a whole number of bytes.
        let start_byte = (view.bit_at_cursor() / 8) as usize;
        let avail_bytes = (view.available() / 8) as usize;
        let slice = &view.bytes[start_byte..start_byte + avail_bytes];

        match slice.iter().position(|&b| b == 0) {
            None => {
                if !slice.is_empty() {
                    callbacks.string(slice, ty)?;
                }
                view.consume(avail_bytes as u64 * 8)?;
                self.state = State::ReadBasicContinue;
                Ok(Step::Eof)
            }
            Some(k) => {
                if k > 0 {
                    callbacks.string(&slice[..k], ty)?;
                }
                callbacks.string_end(ty)?;
                view.consume((k as u64 + 1) * 8)?;
                self.last_byte_order = LastByteOrder::Unknown;
                self.finish_leaf();
                Ok(Step::Continue)
            }
        }
    }
}

fn check_contiguity(
    pos: u64,
    last: LastByteOrder,
    next: crate::byte_order::ByteOrder,
) -> Result<()> {
    if pos % 8 != 0 {
        if let LastByteOrder::Known(last) = last {
            if last != next {
                return Err(Error::ByteOrderMix);
            }
        }
    }
    Ok(())
}

fn leaf_size_bits(ty: &Rc<FieldType>) -> Result<u32> {
    match &**ty {
        FieldType::Integer(i) => Ok(i.size_bits as u32),
        FieldType::Enum(e) => Ok(e.container.size_bits as u32),
        FieldType::Float(f) => Ok(f.size_bits()),
        _ => Err(Error::Invariant(
            "leaf_size_bits called on a non-leaf field type".into(),
        )),
    }
}

fn dispatch_leaf(
    ty: &Rc<FieldType>,
    raw: u64,
    callbacks: &mut dyn Callbacks,
) -> Result<()> {
    match &**ty {
        FieldType::Integer(i) => {
            if i.is_signed {
                callbacks.signed_int(bitfield::sign_extend(raw, i.size_bits as u32), ty)
            } else {
                callbacks.unsigned_int(raw, ty)
            }
        }
        FieldType::Enum(e) => {
            if e.container.is_signed {
                callbacks.signed_enum(bitfield::sign_extend(raw, e.container.size_bits as u32), ty)
            } else {
                callbacks.unsigned_enum(raw, ty)
            }
        }
        FieldType::Float(f) => {
            let v = bitfield::decode_float(raw, f.exp_bits, f.mant_bits)?;
            callbacks.floating_point(v, ty)
        }
        _ => Err(Error::Invariant(
            "dispatch_leaf called on a non-leaf field type".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_order::DeclaredByteOrder;
    use crate::field_type::{ArrayType, FloatType, IntegerType, SequenceType, StructType, VariantType};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        CompoundBegin,
        CompoundEnd,
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        StringBegin,
        StringChunk(Vec<u8>),
        StringEnd,
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<Event>>,
        sequence_length: Option<i64>,
        variant_type: Option<Rc<FieldType>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }
    }

    impl Callbacks for Recorder {
        fn signed_int(&mut self, value: i64, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::Signed(value));
            Ok(())
        }
        fn unsigned_int(&mut self, value: u64, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::Unsigned(value));
            Ok(())
        }
        fn floating_point(&mut self, value: f64, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::Float(value));
            Ok(())
        }
        fn string_begin(&mut self, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::StringBegin);
            Ok(())
        }
        fn string(&mut self, chunk: &[u8], _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::StringChunk(chunk.to_vec()));
            Ok(())
        }
        fn string_end(&mut self, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::StringEnd);
            Ok(())
        }
        fn compound_begin(&mut self, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::CompoundBegin);
            Ok(())
        }
        fn compound_end(&mut self, _ty: &Rc<FieldType>) -> Result<()> {
            self.events.borrow_mut().push(Event::CompoundEnd);
            Ok(())
        }
        fn get_sequence_length(&mut self, _ty: &Rc<FieldType>) -> Result<i64> {
            self.sequence_length
                .ok_or_else(|| Error::CallbackFailure("no sequence length configured".into()))
        }
        fn get_variant_type(&mut self, _ty: &Rc<FieldType>) -> Result<Option<Rc<FieldType>>> {
            Ok(self.variant_type.clone())
        }
    }

    fn u16_le() -> Rc<FieldType> {
        Rc::new(FieldType::Integer(IntegerType::new(16, false, DeclaredByteOrder::LittleEndian, 8)))
    }

    fn f32_be() -> Rc<FieldType> {
        Rc::new(FieldType::Float(FloatType::new(8, 24, DeclaredByteOrder::BigEndian, 8)))
    }

    #[test]
    fn mid_float_split_big_endian() {
        // Scenario 1: struct { a: u16 LE, b: f32 BE }, split mid-float.
        let root = Rc::new(FieldType::Struct(StructType {
            name: None,
            fields: vec![("a".into(), u16_le()), ("b".into(), f32_be())],
            alignment_bits: 8,
        }));

        let bytes = [0xAAu8, 0xBB, 0x40, 0x49, 0x0F, 0xD0];
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder::default();

        let outcome = reader.start(root.clone(), &bytes[..4], 0, 32, &mut cb).unwrap();
        assert!(matches!(outcome, BtrOutcome::Eof { .. }));

        let outcome = reader.resume(&bytes[4..], 0, 16, &mut cb).unwrap();
        assert!(matches!(outcome, BtrOutcome::Done { .. }));

        let events = cb.events();
        assert_eq!(events[0], Event::CompoundBegin);
        assert_eq!(events[1], Event::Unsigned(0xBBAA));
        match &events[2] {
            Event::Float(f) => assert!((f - 3.14159_f64).abs() < 1e-5),
            other => panic!("expected Float, got {other:?}"),
        }
        assert_eq!(events[3], Event::CompoundEnd);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn sequence_length_via_callback() {
        // Scenario 2: struct { n: u8, s: seq<u8> len=n }, query returns 3.
        let n_ty = Rc::new(FieldType::Integer(IntegerType::new(8, false, DeclaredByteOrder::BigEndian, 8)));
        let elem = Rc::new(FieldType::Integer(IntegerType::new(8, false, DeclaredByteOrder::BigEndian, 8)));
        let seq_ty = Rc::new(FieldType::Sequence(SequenceType { element: elem, alignment_bits: 8 }));
        let root = Rc::new(FieldType::Struct(StructType {
            name: None,
            fields: vec![("n".into(), n_ty), ("s".into(), seq_ty)],
            alignment_bits: 8,
        }));

        let bytes = [0x03u8, 0x11, 0x22, 0x33];
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder { sequence_length: Some(3), ..Default::default() };

        let outcome = reader.start(root, &bytes, 0, 32, &mut cb).unwrap();
        assert!(matches!(outcome, BtrOutcome::Done { .. }));

        let events = cb.events();
        assert_eq!(
            events,
            vec![
                Event::CompoundBegin,
                Event::Unsigned(3),
                Event::CompoundBegin,
                Event::Unsigned(0x11),
                Event::Unsigned(0x22),
                Event::Unsigned(0x33),
                Event::CompoundEnd,
                Event::CompoundEnd,
            ]
        );
    }

    #[test]
    fn variant_selection() {
        // Scenario 3: variant { a: i5 BE, b: u11 BE, c: string }, tag picks b.
        let a = Rc::new(FieldType::Integer(IntegerType::new(5, true, DeclaredByteOrder::BigEndian, 1)));
        let b = Rc::new(FieldType::Integer(IntegerType::new(11, false, DeclaredByteOrder::BigEndian, 1)));
        let c = Rc::new(FieldType::String(Default::default()));
        let variant = Rc::new(FieldType::Variant(VariantType {
            fields: vec![("a".into(), a), ("b".into(), b.clone()), ("c".into(), c)],
        }));

        let bytes = [0x7Fu8, 0xE0];
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder { variant_type: Some(b), ..Default::default() };

        let outcome = reader.start(variant, &bytes, 0, 11, &mut cb).unwrap();
        match outcome {
            BtrOutcome::Done { bits_consumed } => assert_eq!(bits_consumed, 11),
            other => panic!("expected Done, got {other:?}"),
        }

        let events = cb.events();
        assert_eq!(events, vec![Event::CompoundBegin, Event::Unsigned(1023), Event::CompoundEnd]);
    }

    #[test]
    fn string_across_three_buffers() {
        let ty = Rc::new(FieldType::String(Default::default()));
        let payload = b"abcdefghij\0"; // 10-char identifier plus terminator, 11 bytes
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder::default();

        let o1 = reader.start(ty.clone(), &payload[..4], 0, 32, &mut cb).unwrap();
        assert!(matches!(o1, BtrOutcome::Eof { .. }));
        let o2 = reader.resume(&payload[4..8], 0, 32, &mut cb).unwrap();
        assert!(matches!(o2, BtrOutcome::Eof { .. }));
        let o3 = reader.resume(&payload[8..11], 0, 24, &mut cb).unwrap();
        match o3 {
            BtrOutcome::Done { bits_consumed } => assert_eq!(bits_consumed, 24),
            other => panic!("expected Done, got {other:?}"),
        }

        let events = cb.events();
        assert_eq!(events[0], Event::StringBegin);
        let mut reconstructed = Vec::new();
        for e in &events[1..events.len() - 1] {
            match e {
                Event::StringChunk(c) => reconstructed.extend_from_slice(c),
                other => panic!("expected StringChunk, got {other:?}"),
            }
        }
        assert_eq!(reconstructed, b"abcdefghij");
        assert_eq!(*events.last().unwrap(), Event::StringEnd);
    }

    #[test]
    fn sub_byte_resume() {
        // Scenario 5: u3 LE at bit offset 7, only 1 bit available at first.
        let ty = Rc::new(FieldType::Integer(IntegerType::new(3, false, DeclaredByteOrder::LittleEndian, 1)));
        let first = [0x3Au8];
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder::default();

        let o1 = reader.start(ty.clone(), &first, 7, 1, &mut cb).unwrap();
        match o1 {
            BtrOutcome::Eof { bits_consumed } => assert_eq!(bits_consumed, 1),
            other => panic!("expected Eof, got {other:?}"),
        }

        let second = [0x3Au8];
        let o2 = reader.resume(&second, 0, 8, &mut cb).unwrap();
        match o2 {
            BtrOutcome::Done { bits_consumed } => assert_eq!(bits_consumed, 2),
            other => panic!("expected Done, got {other:?}"),
        }

        assert_eq!(cb.events(), vec![Event::Unsigned(4)]);
    }

    #[test]
    fn byte_order_mix_is_rejected() {
        // Scenario 6: two adjacent u4 leaves sharing a byte, BE then LE.
        let be = Rc::new(FieldType::Integer(IntegerType::new(4, false, DeclaredByteOrder::BigEndian, 1)));
        let le = Rc::new(FieldType::Integer(IntegerType::new(4, false, DeclaredByteOrder::LittleEndian, 1)));
        let root = Rc::new(FieldType::Struct(StructType {
            name: None,
            fields: vec![("a".into(), be), ("b".into(), le)],
            alignment_bits: 1,
        }));

        let bytes = [0xABu8];
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder::default();

        let result = reader.start(root, &bytes, 0, 8, &mut cb);
        assert!(matches!(result, Err(Error::ByteOrderMix)));
        assert_eq!(cb.events(), vec![Event::CompoundBegin, Event::Unsigned(0xA)]);
    }

    #[test]
    fn resumption_fidelity_across_arbitrary_split_points() {
        let root = Rc::new(FieldType::Struct(StructType {
            name: None,
            fields: vec![("a".into(), u16_le()), ("b".into(), f32_be())],
            alignment_bits: 8,
        }));
        let bytes = [0xAAu8, 0xBB, 0x40, 0x49, 0x0F, 0xD0];

        let mut whole_reader = BinaryTypeReader::new();
        let mut whole_cb = Recorder::default();
        whole_reader.start(root.clone(), &bytes, 0, 48, &mut whole_cb).unwrap();
        let baseline = whole_cb.events();

        for split in 1..bytes.len() {
            let mut reader = BinaryTypeReader::new();
            let mut cb = Recorder::default();
            let o1 = reader
                .start(root.clone(), &bytes[..split], 0, split as u64 * 8, &mut cb)
                .unwrap();
            let total = if let BtrOutcome::Eof { bits_consumed } = o1 {
                let o2 = reader
                    .resume(&bytes[split..], 0, (bytes.len() - split) as u64 * 8, &mut cb)
                    .unwrap();
                match o2 {
                    BtrOutcome::Done { bits_consumed: more } => bits_consumed + more,
                    other => panic!("expected Done, got {other:?}"),
                }
            } else if let BtrOutcome::Done { bits_consumed } = o1 {
                bits_consumed
            } else {
                unreachable!()
            };
            assert_eq!(total, 48, "split at {split} consumed the wrong bit count");
            assert_eq!(cb.events(), baseline, "split at {split} diverged from the single-call trace");
        }
    }

    #[test]
    fn array_of_fixed_length() {
        let elem = Rc::new(FieldType::Integer(IntegerType::new(8, false, DeclaredByteOrder::BigEndian, 8)));
        let arr = Rc::new(FieldType::Array(ArrayType { element: elem, length: 3, alignment_bits: 8 }));
        let bytes = [0x01u8, 0x02, 0x03];
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder::default();
        let outcome = reader.start(arr, &bytes, 0, 24, &mut cb).unwrap();
        assert!(matches!(outcome, BtrOutcome::Done { .. }));
        assert_eq!(
            cb.events(),
            vec![
                Event::CompoundBegin,
                Event::Unsigned(1),
                Event::Unsigned(2),
                Event::Unsigned(3),
                Event::CompoundEnd,
            ]
        );
    }

    #[test]
    fn signed_integer_is_sign_extended() {
        let ty = Rc::new(FieldType::Integer(IntegerType::new(8, true, DeclaredByteOrder::BigEndian, 8)));
        let bytes = [0xFFu8]; // -1 as i8
        let mut reader = BinaryTypeReader::new();
        let mut cb = Recorder::default();
        reader.start(ty, &bytes, 0, 8, &mut cb).unwrap();
        assert_eq!(cb.events(), vec![Event::Signed(-1)]);
    }
}
