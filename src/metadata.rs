//! Minimal trace/stream/event class records: just enough field-type
//! bundling to drive the stream reader, not a full metadata-description
//! parser.

use std::rc::Rc;

use crate::field_type::FieldType;

#[derive(Debug, Clone, Default)]
pub struct EventClass {
    pub id: Option<u64>,
    pub context: Option<Rc<FieldType>>,
    pub payload: Option<Rc<FieldType>>,
}

#[derive(Debug, Clone, Default)]
pub struct StreamClass {
    pub id: Option<u64>,
    pub packet_context: Option<Rc<FieldType>>,
    pub event_header: Option<Rc<FieldType>>,
    pub event_context: Option<Rc<FieldType>>,
    pub event_classes: Vec<EventClass>,
}

impl StreamClass {
    /// Resolve the event class for a captured event `id`, captured from the
    /// `StreamEventHeader` entity. With a single registered event class,
    /// that one is always used regardless of whether (or to what) `id`
    /// resolved — the single-event assumption.
    pub fn event_class_by_id(&self, id: Option<u64>) -> Option<&EventClass> {
        match id {
            Some(id) => self
                .event_classes
                .iter()
                .find(|e| e.id == Some(id))
                .or_else(|| {
                    if self.event_classes.len() == 1 {
                        self.event_classes.first()
                    } else {
                        None
                    }
                }),
            None if self.event_classes.len() == 1 => self.event_classes.first(),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TraceClass {
    pub packet_header: Option<Rc<FieldType>>,
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub trace_class: TraceClass,
    pub stream_classes: Vec<StreamClass>,
}

impl Metadata {
    /// Resolve the stream class for a captured `stream_id`. With a single
    /// registered stream class, that one is always used regardless of
    /// whether (or to what) `stream_id` resolved — the single-stream
    /// assumption.
    pub fn stream_class_by_id(&self, stream_id: Option<u64>) -> Option<&StreamClass> {
        match stream_id {
            Some(id) => self
                .stream_classes
                .iter()
                .find(|s| s.id == Some(id))
                .or_else(|| {
                    if self.stream_classes.len() == 1 {
                        self.stream_classes.first()
                    } else {
                        None
                    }
                }),
            None if self.stream_classes.len() == 1 => self.stream_classes.first(),
            None => None,
        }
    }
}
