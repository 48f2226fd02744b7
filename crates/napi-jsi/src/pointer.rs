//! Node-API backed pointer values.
//!
//! A view carries the raw `napi_value` slot in its [`RawHandle`] bits. An
//! owning value carries a [`NapiRefPointer`], which releases its engine
//! reference exactly once when invalidated.

use std::any::Any;
use std::rc::{Rc, Weak};

use jsi_core::{JsiError, JsiResult, OwnedPointer, PointerRef, PointerValue, RawHandle};
use napi_env::{NapiRef, NapiValue, NodeApi};
use tracing::warn;

/// Owning engine reference.
///
/// Holds the environment weakly so outstanding values never keep a dropped
/// engine alive.
pub(crate) struct NapiRefPointer {
    env: Weak<dyn NodeApi>,
    reference: NapiRef,
}

impl NapiRefPointer {
    pub(crate) fn new(env: &Rc<dyn NodeApi>, reference: NapiRef) -> Self {
        Self {
            env: Rc::downgrade(env),
            reference,
        }
    }

    pub(crate) fn reference(&self) -> NapiRef {
        self.reference
    }
}

impl OwnedPointer for NapiRefPointer {
    fn invalidate(self: Box<Self>) {
        let Some(env) = self.env.upgrade() else {
            return;
        };
        if let Err(status) = env.reference_unref(self.reference) {
            warn!(status = status.code(), "failed to release reference");
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// What a pointer value resolves to on the engine side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NapiHandle {
    Value(NapiValue),
    Ref(NapiRef),
}

pub(crate) fn handle_of(pv: &PointerValue) -> JsiResult<NapiHandle> {
    match pv.kind() {
        PointerRef::View(handle) => Ok(NapiHandle::Value(value_of_raw(handle))),
        PointerRef::Owning(owned) => owned
            .as_any()
            .downcast_ref::<NapiRefPointer>()
            .map(|pointer| NapiHandle::Ref(pointer.reference()))
            .ok_or_else(|| JsiError::native("Pointer value does not belong to a NodeApi runtime")),
    }
}

pub(crate) fn view(value: NapiValue) -> PointerValue {
    PointerValue::view(RawHandle::from_bits(u64::from(value.raw())))
}

fn value_of_raw(handle: RawHandle) -> NapiValue {
    // Views are only ever built from 32-bit slots.
    NapiValue::from_raw(handle.bits() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_round_trips_slot() {
        let pv = view(NapiValue::from_raw(41));
        assert_eq!(handle_of(&pv).unwrap(), NapiHandle::Value(NapiValue::from_raw(41)));
    }

    #[test]
    fn test_foreign_owning_pointer_rejected() {
        struct Foreign;

        impl OwnedPointer for Foreign {
            fn invalidate(self: Box<Self>) {}

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let pv = PointerValue::owning(Box::new(Foreign));
        assert!(handle_of(&pv).is_err());
    }
}
