//! Lifetime-bearing payload of strings, symbols, objects and property names.
//!
//! A [`PointerValue`] is either a *view* of an engine handle that belongs to
//! the current native frame, or an *owning* engine reference that must be
//! released exactly once. The distinction is a variant, not a type hierarchy,
//! so every consumer has to say which one it is dealing with.

use std::any::Any;
use std::fmt;

/// Opaque engine handle bits.
///
/// The runtime that produced the handle is the only party able to interpret
/// it. For Node-API engines this is the index of a `napi_value` slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(u64);

impl RawHandle {
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({:#x})", self.0)
    }
}

/// An engine-level persistent reference owned by a [`PointerValue`].
///
/// `invalidate` consumes the box, which makes a second release impossible.
/// Dropping the box without calling it leaks the engine reference but never
/// releases it twice.
pub trait OwnedPointer: Any {
    /// Release the engine reference.
    fn invalidate(self: Box<Self>);

    fn as_any(&self) -> &dyn Any;
}

/// Borrowed inspection of a [`PointerValue`].
#[derive(Clone, Copy)]
pub enum PointerRef<'a> {
    View(RawHandle),
    Owning(&'a dyn OwnedPointer),
}

enum Slot {
    View(RawHandle),
    Owning(Option<Box<dyn OwnedPointer>>),
}

/// Payload shared by all pointer types.
///
/// Views are stored inline (no allocation) and invalidating them does
/// nothing. Owning values hold a boxed engine reference that is released when
/// the `PointerValue` is dropped.
pub struct PointerValue {
    slot: Slot,
}

impl PointerValue {
    /// Wrap a frame-local engine handle without taking ownership.
    pub fn view(handle: RawHandle) -> Self {
        Self {
            slot: Slot::View(handle),
        }
    }

    /// Take ownership of an engine reference.
    pub fn owning(owned: Box<dyn OwnedPointer>) -> Self {
        Self {
            slot: Slot::Owning(Some(owned)),
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self.slot, Slot::View(_))
    }

    pub fn kind(&self) -> PointerRef<'_> {
        match &self.slot {
            Slot::View(handle) => PointerRef::View(*handle),
            Slot::Owning(Some(owned)) => PointerRef::Owning(owned.as_ref()),
            // The slot is only emptied inside `drop`.
            Slot::Owning(None) => unreachable!("pointer value used after invalidation"),
        }
    }

    /// Downcast the owned reference to the runtime's concrete type.
    pub fn owned<T: OwnedPointer>(&self) -> Option<&T> {
        match self.kind() {
            PointerRef::Owning(owned) => owned.as_any().downcast_ref::<T>(),
            PointerRef::View(_) => None,
        }
    }
}

impl Drop for PointerValue {
    fn drop(&mut self) {
        if let Slot::Owning(owned) = &mut self.slot {
            if let Some(owned) = owned.take() {
                owned.invalidate();
            }
        }
    }
}

impl fmt::Debug for PointerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::View(handle) => f.debug_tuple("View").field(handle).finish(),
            Slot::Owning(_) => f.write_str("Owning"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<u32>>);

    impl OwnedPointer for Counted {
        fn invalidate(self: Box<Self>) {
            self.0.set(self.0.get() + 1);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_owning_invalidated_once_on_drop() {
        let released = Rc::new(Cell::new(0));
        let value = PointerValue::owning(Box::new(Counted(released.clone())));
        assert!(!value.is_view());
        assert!(value.owned::<Counted>().is_some());
        drop(value);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_view_is_inert() {
        let value = PointerValue::view(RawHandle::from_bits(7));
        assert!(value.is_view());
        assert!(value.owned::<Counted>().is_none());
        match value.kind() {
            PointerRef::View(handle) => assert_eq!(handle.bits(), 7),
            PointerRef::Owning(_) => panic!("expected a view"),
        }
    }
}
