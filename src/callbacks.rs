//! The callback table a BTR consumer implements.
//!
//! Every notification hook has a no-op (or integer-forwarding) default, so a
//! consumer overrides only what it cares about — the dependency-injection
//! pattern the state machine needs without resorting to subclassing. The two
//! query hooks, `get_sequence_length` and `get_variant_type`, have no useful
//! default: a consumer whose metadata never uses sequences or variants will
//! simply never have them called.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::field_type::FieldType;

#[allow(unused_variables)]
pub trait Callbacks {
    fn signed_int(&mut self, value: i64, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    fn unsigned_int(&mut self, value: u64, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    fn floating_point(&mut self, value: f64, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    /// Defaults to `signed_int`, so a consumer that doesn't care about the
    /// enum/integer distinction only has to implement one hook.
    fn signed_enum(&mut self, value: i64, ty: &Rc<FieldType>) -> Result<()> {
        self.signed_int(value, ty)
    }

    fn unsigned_enum(&mut self, value: u64, ty: &Rc<FieldType>) -> Result<()> {
        self.unsigned_int(value, ty)
    }

    fn string_begin(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    fn string(&mut self, chunk: &[u8], ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    fn string_end(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    fn compound_begin(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    fn compound_end(&mut self, ty: &Rc<FieldType>) -> Result<()> {
        Ok(())
    }

    /// Resolve the length of a sequence about to be pushed onto the visit
    /// stack. A negative return is turned into `Error::BadLength` by the
    /// caller; there is no sensible default.
    fn get_sequence_length(&mut self, ty: &Rc<FieldType>) -> Result<i64> {
        Err(Error::CallbackFailure(
            "get_sequence_length is not implemented".into(),
        ))
    }

    /// Resolve the currently selected alternative of a variant. `Ok(None)`
    /// is turned into `Error::BadVariant` by the caller; there is no
    /// sensible default.
    fn get_variant_type(&mut self, ty: &Rc<FieldType>) -> Result<Option<Rc<FieldType>>> {
        Err(Error::CallbackFailure(
            "get_variant_type is not implemented".into(),
        ))
    }
}
