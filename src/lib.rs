//! A resumable, bit-granular decoder for the Common Trace Format (CTF).
//!
//! The [`btr`] module holds the core engine: a state machine that walks
//! arbitrarily nested CTF field types (integers, floats, strings, structs,
//! arrays, sequences, and variants) at bit granularity, honouring per-field
//! alignment and byte order, and suspending cleanly whenever the caller's
//! input buffer runs out mid-field. [`stream_reader`] composes it with a
//! pluggable [`medium::Medium`] to decode whole CTF packets.
//!
//! ```no_run
//! use std::rc::Rc;
//! use ctf_btr::btr::BinaryTypeReader;
//! use ctf_btr::byte_order::DeclaredByteOrder;
//! use ctf_btr::callbacks::Callbacks;
//! use ctf_btr::field_type::{FieldType, IntegerType};
//!
//! struct PrintingCallbacks;
//! impl Callbacks for PrintingCallbacks {
//!     fn unsigned_int(&mut self, value: u64, _ty: &Rc<FieldType>) -> ctf_btr::error::Result<()> {
//!         println!("{value}");
//!         Ok(())
//!     }
//!     fn get_sequence_length(&mut self, _ty: &Rc<FieldType>) -> ctf_btr::error::Result<i64> {
//!         Ok(0)
//!     }
//!     fn get_variant_type(&mut self, _ty: &Rc<FieldType>) -> ctf_btr::error::Result<Option<Rc<FieldType>>> {
//!         Ok(None)
//!     }
//! }
//!
//! let u8_type = Rc::new(FieldType::Integer(IntegerType::new(8, false, DeclaredByteOrder::BigEndian, 8)));
//! let mut reader = BinaryTypeReader::new();
//! let mut callbacks = PrintingCallbacks;
//! reader.start(u8_type, &[42], 0, 8, &mut callbacks).unwrap();
//! ```

pub mod bitfield;
pub mod btr;
pub mod byte_order;
pub mod callbacks;
pub mod error;
pub mod field_type;
pub mod medium;
pub mod metadata;
pub mod stream_reader;

mod buffer;
mod stack;
mod stitch;

pub use crate::btr::{BinaryTypeReader, BtrOutcome};
pub use crate::callbacks::Callbacks;
pub use crate::error::{Error, Result};
pub use crate::field_type::FieldType;
pub use crate::medium::{Medium, MediumStatus};
pub use crate::metadata::{EventClass, Metadata, StreamClass, TraceClass};
pub use crate::stream_reader::{StreamReader, StreamStatus};
