//! An in-process engine implementing [`NodeApi`](crate::NodeApi).
//!
//! `ReferenceEnv` runs a small script subset with a tree-walking evaluator
//! over a mark-sweep heap. It exists so the adapter can be driven end to end
//! without linking a production engine.

mod ast;
mod codec;
mod config;
mod heap;
mod interp;
mod lexer;
mod napi;
mod ops;
mod parser;
mod realm;
mod value;

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

pub use codec::CodecError;
pub use config::EnvConfig;
pub use heap::GcStats;

use heap::{Heap, HeapObject};
use realm::Realm;
use value::{ObjectId, Val};

use crate::api::NapiRef;

/// A thrown script value unwinding through the evaluator.
#[derive(Debug, Clone)]
pub(crate) struct Thrown(pub(crate) Val);

pub(crate) type JsResult<T> = Result<T, Thrown>;

struct RefEntry {
    /// `None` once a weak referent has been swept.
    value: Option<Val>,
    count: u32,
    /// Key in the unique string table, for interned refs.
    interned: Option<Rc<str>>,
}

struct EnvState {
    heap: Heap,
    realm: Realm,
    handles: Vec<Val>,
    /// Handle stack length at each open handle scope.
    handle_scopes: Vec<usize>,
    refs: Vec<Option<RefEntry>>,
    free_refs: Vec<u32>,
    interned: FxHashMap<Rc<str>, NapiRef>,
    pending_exception: Option<Val>,
    env_depth: u32,
    exec_depth: u32,
    call_depth: u32,
    source_urls: Vec<Rc<str>>,
}

/// Reference Node-API environment.
///
/// Single threaded: the type is neither `Send` nor `Sync`.
pub struct ReferenceEnv {
    state: RefCell<EnvState>,
    config: EnvConfig,
    _not_send: PhantomData<*mut ()>,
}

impl ReferenceEnv {
    pub fn new() -> Self {
        Self::with_config(EnvConfig::default())
    }

    pub fn with_config(config: EnvConfig) -> Self {
        let mut heap = Heap::default();
        let realm = Realm::new(&mut heap);
        Self {
            state: RefCell::new(EnvState {
                heap,
                realm,
                handles: Vec::new(),
                handle_scopes: Vec::new(),
                refs: Vec::new(),
                free_refs: Vec::new(),
                interned: FxHashMap::default(),
                pending_exception: None,
                env_depth: 0,
                exec_depth: 0,
                call_depth: 0,
                source_urls: Vec::new(),
            }),
            config,
            _not_send: PhantomData,
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Run a full collection.
    ///
    /// Returns `None` while a script or an env scope is active, since live
    /// evaluator temporaries are not rooted.
    pub fn collect_garbage(&self) -> Option<GcStats> {
        let freed = {
            let mut state = self.state.borrow_mut();
            if state.exec_depth > 0 || state.env_depth > 0 {
                return None;
            }
            state.collect()
        };
        let stats = GcStats {
            live: self.live_objects(),
            freed: freed.len(),
        };
        tracing::trace!(live = stats.live, freed = stats.freed, "garbage collected");
        // External finalizers may call back into the environment.
        drop(freed);
        Some(stats)
    }

    /// Objects currently on the heap, builtins included.
    pub fn live_objects(&self) -> usize {
        self.state.borrow().heap.live_count()
    }

    /// Handles not yet released by a scope.
    pub fn open_handle_count(&self) -> usize {
        self.state.borrow().handles.len()
    }

    /// References that have not been deleted.
    pub fn live_references(&self) -> usize {
        let state = self.state.borrow();
        state.refs.iter().filter(|entry| entry.is_some()).count()
    }

    pub(crate) fn realm(&self) -> Realm {
        self.state.borrow().realm
    }

    pub(crate) fn alloc(&self, object: HeapObject) -> ObjectId {
        self.state.borrow_mut().heap.alloc(object)
    }

    pub(crate) fn with_object<R>(&self, id: ObjectId, f: impl FnOnce(&HeapObject) -> R) -> R {
        f(&self.state.borrow().heap[id])
    }

    pub(crate) fn with_object_mut<R>(
        &self,
        id: ObjectId,
        f: impl FnOnce(&mut HeapObject) -> R,
    ) -> R {
        f(&mut self.state.borrow_mut().heap[id])
    }

    pub(crate) fn current_source_url(&self) -> Option<Rc<str>> {
        self.state.borrow().source_urls.last().cloned()
    }

    fn maybe_collect(&self) {
        let due = {
            let state = self.state.borrow();
            self.config.gc_threshold > 0
                && state.heap.allocated_since_gc >= self.config.gc_threshold
        };
        if due {
            self.collect_garbage();
        }
    }
}

impl Default for ReferenceEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvState {
    fn roots(&self) -> Vec<ObjectId> {
        let mut roots = self.realm.roots();
        roots.extend(self.handles.iter().filter_map(Val::as_object));
        roots.extend(
            self.refs
                .iter()
                .flatten()
                .filter(|entry| entry.count > 0)
                .filter_map(|entry| entry.value.as_ref().and_then(Val::as_object)),
        );
        roots.extend(self.pending_exception.as_ref().and_then(Val::as_object));
        roots
    }

    /// Sweep and clear weak references to swept objects.
    fn collect(&mut self) -> Vec<HeapObject> {
        let roots = self.roots();
        let (freed_ids, freed) = self.heap.collect(roots);
        if !freed_ids.is_empty() {
            let swept: FxHashSet<ObjectId> = freed_ids.into_iter().collect();
            for entry in self.refs.iter_mut().flatten() {
                if let Some(Val::Object(id)) = entry.value {
                    if swept.contains(&id) {
                        entry.value = None;
                    }
                }
            }
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_env_has_builtins() {
        let env = ReferenceEnv::new();
        assert!(env.live_objects() > 10);
        assert_eq!(env.open_handle_count(), 0);
        assert_eq!(env.live_references(), 0);
    }

    #[test]
    fn test_builtins_survive_collection() {
        let env = ReferenceEnv::new();
        let before = env.live_objects();
        let stats = env.collect_garbage().expect("idle env collects");
        assert_eq!(stats.freed, 0);
        assert_eq!(env.live_objects(), before);
    }
}
