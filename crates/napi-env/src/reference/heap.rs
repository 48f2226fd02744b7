//! Object heap with mark-sweep collection.
//!
//! Objects live in slots addressed by [`ObjectId`]. Collection marks from a
//! caller-supplied root set and frees every unmarked slot. Freed objects
//! are handed back to the caller so that their finalizers (external data
//! drops) run after the engine state is released.

use std::any::Any;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::ast::FunctionDef;
use super::realm::Builtin;
use super::value::{ObjectId, PropKey, Val};
use crate::api::{BackingStore, NapiCallback};
use crate::status::PropertyAttributes;

pub(crate) type PropMap = IndexMap<PropKey, Property, FxBuildHasher>;

#[derive(Clone, Debug)]
pub(crate) struct Property {
    pub(crate) value: Val,
    pub(crate) attributes: PropertyAttributes,
}

impl Property {
    /// What plain assignment creates.
    pub(crate) fn data(value: Val) -> Self {
        Self {
            value,
            attributes: PropertyAttributes::ALL,
        }
    }

    /// Writable and configurable, not enumerable: builtin methods.
    pub(crate) fn hidden(value: Val) -> Self {
        Self {
            value,
            attributes: PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE,
        }
    }
}

#[derive(Clone)]
pub(crate) enum FunctionKind {
    Native {
        callback: NapiCallback,
        data: Option<Rc<dyn Any>>,
    },
    Builtin(Builtin),
    Script {
        def: Rc<FunctionDef>,
        env: Option<ObjectId>,
    },
}

pub(crate) enum ObjectKind {
    Ordinary,
    Array(Vec<Val>),
    ArrayBuffer(BackingStore),
    Error,
    Function(FunctionKind),
    External(Rc<dyn Any>),
    Proxy {
        target: ObjectId,
        handler: ObjectId,
    },
    /// Variable scope of a running function; bindings live in `props`.
    Env {
        parent: Option<ObjectId>,
        this: Val,
    },
}

pub(crate) struct HeapObject {
    pub(crate) proto: Option<ObjectId>,
    pub(crate) props: PropMap,
    pub(crate) kind: ObjectKind,
}

impl HeapObject {
    pub(crate) fn new(proto: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            proto,
            props: PropMap::default(),
            kind,
        }
    }

    fn trace(&self, out: &mut Vec<ObjectId>) {
        out.extend(self.proto);
        out.extend(self.props.values().filter_map(|p| p.value.as_object()));
        match &self.kind {
            ObjectKind::Array(elements) => out.extend(elements.iter().filter_map(Val::as_object)),
            ObjectKind::Function(FunctionKind::Script { env, .. }) => out.extend(*env),
            ObjectKind::Proxy { target, handler } => {
                out.push(*target);
                out.push(*handler);
            }
            ObjectKind::Env { parent, this } => {
                out.extend(*parent);
                out.extend(this.as_object());
            }
            ObjectKind::Ordinary
            | ObjectKind::ArrayBuffer(_)
            | ObjectKind::Error
            | ObjectKind::Function(_)
            | ObjectKind::External(_) => {}
        }
    }
}

/// Outcome of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GcStats {
    pub live: usize,
    pub freed: usize,
}

#[derive(Default)]
pub(crate) struct Heap {
    slots: Vec<Option<HeapObject>>,
    free: Vec<u32>,
    live: usize,
    pub(crate) allocated_since_gc: usize,
}

impl Heap {
    pub(crate) fn alloc(&mut self, object: HeapObject) -> ObjectId {
        self.live += 1;
        self.allocated_since_gc += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(object);
                ObjectId(index)
            }
            None => {
                self.slots.push(Some(object));
                ObjectId((self.slots.len() - 1) as u32)
            }
        }
    }

    pub(crate) fn is_live(&self, id: ObjectId) -> bool {
        self.slots.get(id.0 as usize).is_some_and(Option::is_some)
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live
    }

    /// Mark from `roots`, free everything else and return the freed objects.
    pub(crate) fn collect(
        &mut self,
        roots: Vec<ObjectId>,
    ) -> (Vec<ObjectId>, Vec<HeapObject>) {
        let mut marks = vec![false; self.slots.len()];
        let mut worklist = roots;
        while let Some(id) = worklist.pop() {
            let index = id.0 as usize;
            if marks.get(index).copied().unwrap_or(true) {
                continue;
            }
            if let Some(object) = &self.slots[index] {
                marks[index] = true;
                object.trace(&mut worklist);
            }
        }

        let mut freed_ids = Vec::new();
        let mut freed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_some() && !marks[index] {
                if let Some(object) = slot.take() {
                    freed.push(object);
                }
                freed_ids.push(ObjectId(index as u32));
                self.free.push(index as u32);
            }
        }
        self.live -= freed.len();
        self.allocated_since_gc = 0;
        (freed_ids, freed)
    }
}

impl Index<ObjectId> for Heap {
    type Output = HeapObject;

    fn index(&self, id: ObjectId) -> &HeapObject {
        match self.slots.get(id.0 as usize) {
            Some(Some(object)) => object,
            _ => panic!("dangling object id #{}", id.0),
        }
    }
}

impl IndexMut<ObjectId> for Heap {
    fn index_mut(&mut self, id: ObjectId) -> &mut HeapObject {
        match self.slots.get_mut(id.0 as usize) {
            Some(Some(object)) => object,
            _ => panic!("dangling object id #{}", id.0),
        }
    }
}
