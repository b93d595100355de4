//! Drives a [`BinaryTypeReader`] through the fixed cycle of CTF packet
//! entities — packet header, packet context, then event header/context/
//! payload repeated for each event — by pulling bytes from a [`Medium`].

use std::rc::Rc;

use tracing::{debug, trace};

use crate::btr::{BinaryTypeReader, BtrOutcome};
use crate::callbacks::Callbacks;
use crate::error::{Error, Result};
use crate::field_type::FieldType;
use crate::medium::{Medium, MediumStatus};
use crate::metadata::{EventClass, Metadata, StreamClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    TracePacketHeader,
    StreamPacketContext,
    StreamEventHeader,
    StreamEventContext,
    EventContext,
    EventPayload,
}

impl Entity {
    fn next(self) -> Entity {
        match self {
            Entity::TracePacketHeader => Entity::StreamPacketContext,
            Entity::StreamPacketContext => Entity::StreamEventHeader,
            Entity::StreamEventHeader => Entity::StreamEventContext,
            Entity::StreamEventContext => Entity::EventContext,
            Entity::EventContext => Entity::EventPayload,
            Entity::EventPayload => Entity::StreamEventHeader,
        }
    }

    fn uses_bookkeeping_shim(self) -> bool {
        matches!(
            self,
            Entity::TracePacketHeader | Entity::StreamPacketContext | Entity::StreamEventHeader
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalState {
    Init,
    Decode,
}

/// Outcome of a single [`StreamReader`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Done,
    NoEntity,
    Again,
    Eos,
}

struct ShadowFrame {
    ty: Rc<FieldType>,
    index: usize,
}

/// Wraps the caller's [`Callbacks`] for the duration of decoding a
/// `TracePacketHeader`, `StreamPacketContext`, or `StreamEventHeader` entity,
/// mirroring the BTR's own traversal in a lockstep shadow stack so it can
/// resolve field *names* (which the BTR's own callback signatures never
/// carry) and capture `stream_id`, `packet_size`, `content_size`, and the
/// event `id`.
struct PacketBookkeeping<'a> {
    inner: &'a mut dyn Callbacks,
    shadow_stack: &'a mut Vec<ShadowFrame>,
    stream_id: &'a mut Option<u64>,
    packet_size_bits: &'a mut Option<u64>,
    content_size_bits: &'a mut Option<u64>,
    event_id: &'a mut Option<u64>,
}

impl<'a> PacketBookkeeping<'a> {
    fn record_leaf(&mut self, value: Option<u64>) {
        if let Some(top) = self.shadow_stack.last_mut() {
            if let (Some((name, _)), Some(v)) = (top.ty.field_at(top.index), value) {
                match name {
                    "stream_id" => *self.stream_id = Some(v),
                    "packet_size" => *self.packet_size_bits = Some(v),
                    "content_size" => *self.content_size_bits = Some(v),
                    "id" => *self.event_id = Some(v),
                    _ => {}
                }
            }
            top.index += 1;
        }
    }
}

impl<'a> Callbacks for PacketBookkeeping<'a> {
    fn signed_int(&mut self, value: i64, ty: &Rc<FieldType>) -> Result<()> {
        self.record_leaf(Some(value as u64));
        self.inner.signed_int(value, ty)
    }

    fn unsigned_int(&mut self, value: u64, ty: &Rc<FieldType>) -> Result<()> {
        self.record_leaf(Some(value));
        self.inner.unsigned_int(value, ty)
    }

    fn floating_point(&mut self, value: f64, ty: &Rc<FieldType>) -> Result<()> {
        self.record_leaf(None);
        self.inner.floating_point(value, ty)
    }

    fn signed_enum(&mut self, value: i64, ty: &Rc<FieldType>) -> Result<()> {
        self.record_leaf(Some(value as u64));
        self.inner.signed_enum(value, ty)
    }

    fn unsigned_enum(&mut self, value: u64, ty: &Rc<FieldType>) -> Result<()> {
        self.record_leaf(Some(value));
        self.inner.unsigned_enum(value, ty)
    }

    fn string_begin(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        self.inner.string_begin(ty)
    }

    fn string(&mut self, chunk: &[u8], ty: &Rc<FieldType>) -> Result<()> {
        self.inner.string(chunk, ty)
    }

    fn string_end(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        self.record_leaf(None);
        self.inner.string_end(ty)
    }

    fn compound_begin(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        if let Some(top) = self.shadow_stack.last_mut() {
            top.index += 1;
        }
        self.shadow_stack.push(ShadowFrame { ty: ty.clone(), index: 0 });
        self.inner.compound_begin(ty)
    }

    fn compound_end(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        self.shadow_stack.pop();
        self.inner.compound_end(ty)
    }

    fn get_sequence_length(&mut self, ty: &Rc<FieldType>) -> Result<i64> {
        self.inner.get_sequence_length(ty)
    }

    fn get_variant_type(&mut self, ty: &Rc<FieldType>) -> Result<Option<Rc<FieldType>>> {
        self.inner.get_variant_type(ty)
    }
}

/// Drives a BTR through whole CTF packets, pulling bytes from `M` on demand.
pub struct StreamReader<M: Medium> {
    btr: BinaryTypeReader,
    medium: M,
    metadata: Metadata,
    request_size_bytes: usize,

    entity: Entity,
    global_state: GlobalState,
    pending_root: Option<Rc<FieldType>>,

    shadow_stack: Vec<ShadowFrame>,
    captured_stream_id: Option<u64>,
    captured_packet_size_bits: Option<u64>,
    captured_content_size_bits: Option<u64>,
    captured_event_id: Option<u64>,
}

impl<M: Medium> StreamReader<M> {
    pub fn new(medium: M, metadata: Metadata, request_size_bytes: usize) -> Self {
        Self {
            btr: BinaryTypeReader::new(),
            medium,
            metadata,
            request_size_bytes,
            entity: Entity::TracePacketHeader,
            global_state: GlobalState::Init,
            pending_root: None,
            shadow_stack: Vec::new(),
            captured_stream_id: None,
            captured_packet_size_bits: None,
            captured_content_size_bits: None,
            captured_event_id: None,
        }
    }

    pub fn packet_size_bits(&self) -> Option<u64> {
        self.captured_packet_size_bits
    }

    pub fn content_size_bits(&self) -> Option<u64> {
        self.captured_content_size_bits
    }

    pub fn get_header(&mut self, callbacks: &mut dyn Callbacks) -> Result<StreamStatus> {
        self.advance(callbacks)
    }

    pub fn get_context(&mut self, callbacks: &mut dyn Callbacks) -> Result<StreamStatus> {
        self.advance(callbacks)
    }

    /// Decode one whole event: header, stream event context, event context,
    /// and payload, looping internally over sub-entities that have no
    /// registered field type. A medium `Again`/`Eos` in the middle of an
    /// event suspends the call; the next `get_next_event` resumes exactly
    /// where it left off.
    pub fn get_next_event(&mut self, callbacks: &mut dyn Callbacks) -> Result<StreamStatus> {
        loop {
            let current = self.entity;
            match self.advance(callbacks)? {
                StreamStatus::Done | StreamStatus::NoEntity
                    if current == Entity::EventPayload =>
                {
                    return Ok(StreamStatus::Done)
                }
                StreamStatus::Done | StreamStatus::NoEntity => continue,
                other => return Ok(other),
            }
        }
    }

    fn resolved_stream_class(&self) -> Option<&StreamClass> {
        self.metadata.stream_class_by_id(self.captured_stream_id)
    }

    fn resolved_event_class(&self) -> Option<&EventClass> {
        self.resolved_stream_class()
            .and_then(|sc| sc.event_class_by_id(self.captured_event_id))
    }

    fn field_type_for_entity(&self, entity: Entity) -> Option<Rc<FieldType>> {
        match entity {
            Entity::TracePacketHeader => self.metadata.trace_class.packet_header.clone(),
            Entity::StreamPacketContext => {
                self.resolved_stream_class().and_then(|sc| sc.packet_context.clone())
            }
            Entity::StreamEventHeader => {
                self.resolved_stream_class().and_then(|sc| sc.event_header.clone())
            }
            Entity::StreamEventContext => {
                self.resolved_stream_class().and_then(|sc| sc.event_context.clone())
            }
            Entity::EventContext => self.resolved_event_class().and_then(|ec| ec.context.clone()),
            Entity::EventPayload => self.resolved_event_class().and_then(|ec| ec.payload.clone()),
        }
    }

    fn dispatch_start(
        &mut self,
        ty: &Rc<FieldType>,
        bytes: &[u8],
        callbacks: &mut dyn Callbacks,
    ) -> Result<BtrOutcome> {
        let valid_bits = bytes.len() as u64 * 8;
        if self.entity.uses_bookkeeping_shim() {
            self.shadow_stack.clear();
            let StreamReader {
                btr,
                shadow_stack,
                captured_stream_id,
                captured_packet_size_bits,
                captured_content_size_bits,
                captured_event_id,
                ..
            } = self;
            let mut shim = PacketBookkeeping {
                inner: callbacks,
                shadow_stack,
                stream_id: captured_stream_id,
                packet_size_bits: captured_packet_size_bits,
                content_size_bits: captured_content_size_bits,
                event_id: captured_event_id,
            };
            btr.start(ty.clone(), bytes, 0, valid_bits, &mut shim)
        } else {
            self.btr.start(ty.clone(), bytes, 0, valid_bits, callbacks)
        }
    }

    fn dispatch_resume(&mut self, bytes: &[u8], callbacks: &mut dyn Callbacks) -> Result<BtrOutcome> {
        let valid_bits = bytes.len() as u64 * 8;
        if self.entity.uses_bookkeeping_shim() {
            let StreamReader {
                btr,
                shadow_stack,
                captured_stream_id,
                captured_packet_size_bits,
                captured_content_size_bits,
                captured_event_id,
                ..
            } = self;
            let mut shim = PacketBookkeeping {
                inner: callbacks,
                shadow_stack,
                stream_id: captured_stream_id,
                packet_size_bits: captured_packet_size_bits,
                content_size_bits: captured_content_size_bits,
                event_id: captured_event_id,
            };
            btr.resume(bytes, 0, valid_bits, &mut shim)
        } else {
            self.btr.resume(bytes, 0, valid_bits, callbacks)
        }
    }

    fn advance(&mut self, callbacks: &mut dyn Callbacks) -> Result<StreamStatus> {
        if self.global_state == GlobalState::Init {
            if self.entity == Entity::TracePacketHeader {
                self.captured_stream_id = None;
                self.captured_packet_size_bits = None;
                self.captured_content_size_bits = None;
            }
            if self.entity == Entity::StreamEventHeader {
                self.captured_event_id = None;
            }
            let ty = match self.field_type_for_entity(self.entity) {
                Some(ty) => ty,
                None => {
                    trace!(entity = ?self.entity, "no field type registered, skipping entity");
                    self.entity = self.entity.next();
                    return Ok(StreamStatus::NoEntity);
                }
            };
            self.pending_root = Some(ty);
            self.global_state = GlobalState::Decode;
        }

        loop {
            match self.medium.get_next_bytes(self.request_size_bytes) {
                MediumStatus::Ok(bytes) => {
                    let outcome = match self.pending_root.take() {
                        Some(ty) => self.dispatch_start(&ty, &bytes, callbacks)?,
                        None => self.dispatch_resume(&bytes, callbacks)?,
                    };
                    match outcome {
                        BtrOutcome::Done { .. } => {
                            debug!(entity = ?self.entity, "entity decoded");
                            self.entity = self.entity.next();
                            self.global_state = GlobalState::Init;
                            return Ok(StreamStatus::Done);
                        }
                        BtrOutcome::Eof { .. } => continue,
                    }
                }
                MediumStatus::Again => return Ok(StreamStatus::Again),
                MediumStatus::Eos => return Ok(StreamStatus::Eos),
                MediumStatus::Error(e) => return Err(Error::Medium(e)),
                MediumStatus::Inval => {
                    return Err(Error::Medium("medium reported an invalid request".into()))
                }
            }
        }
    }
}
