//! The runtime contract every engine adapter implements.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use crate::error::{JsError, JsiResult};
use crate::object::{Array, ArrayBuffer, Function, Object, WeakObject};
use crate::pointer::PointerValue;
use crate::string::{JsiString, PropNameId, Symbol};
use crate::value::Value;

/// Raw script or bytecode bytes.
///
/// Implementations never need to be null-terminated; consumers always use
/// the slice length.
pub trait Buffer {
    fn data(&self) -> &[u8];

    fn size(&self) -> usize {
        self.data().len()
    }
}

/// A [`Buffer`] over an owned string.
#[derive(Debug, Clone)]
pub struct StringBuffer(String);

impl StringBuffer {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }
}

impl Buffer for StringBuffer {
    fn data(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Opaque result of [`Runtime::prepare_javascript`].
pub trait PreparedJavaScript: Any {
    fn as_any(&self) -> &dyn Any;
}

/// Backing store of an `ArrayBuffer`.
///
/// Holding the store does not keep the buffer object alive.
pub type ArrayBufferStorage = Rc<RefCell<Vec<u8>>>;

/// Native callable exposed to scripts as a function.
pub type HostFunction = Rc<dyn Fn(&dyn Runtime, &Value, &[Value]) -> JsiResult<Value>>;

/// Native object exposed to scripts.
///
/// Implementations must not retain the runtime reference past the call.
pub trait HostObject {
    fn get(&self, _rt: &dyn Runtime, _name: &PropNameId) -> JsiResult<Value> {
        Ok(Value::Undefined)
    }

    fn set(&self, rt: &dyn Runtime, name: &PropNameId, _value: &Value) -> JsiResult<()> {
        let message = format!(
            "TypeError: Cannot assign to property '{}' on HostObject with default setter",
            name.utf8(rt)?
        );
        Err(JsError::new(rt, &message)?.into())
    }

    fn get_property_names(&self, _rt: &dyn Runtime) -> JsiResult<Vec<PropNameId>> {
        Ok(Vec::new())
    }
}

/// Marker returned by [`Runtime::push_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeState(u64);

impl ScopeState {
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }
}

/// The engine-neutral interpreter-embedding interface.
///
/// A runtime is bound to one thread. Pointer values handed out by a runtime
/// must be dropped before the runtime itself.
pub trait Runtime {
    fn evaluate_javascript(&self, buffer: Rc<dyn Buffer>, source_url: &str) -> JsiResult<Value>;

    fn prepare_javascript(
        &self,
        buffer: Rc<dyn Buffer>,
        source_url: String,
    ) -> JsiResult<Rc<dyn PreparedJavaScript>>;

    fn evaluate_prepared_javascript(&self, js: &Rc<dyn PreparedJavaScript>) -> JsiResult<Value>;

    /// Returns `true` once the microtask queue is empty.
    fn drain_microtasks(&self, max_microtasks_hint: i32) -> JsiResult<bool>;

    fn global(&self) -> JsiResult<Object>;

    fn description(&self) -> String;

    fn is_inspectable(&self) -> bool;

    fn clone_symbol(&self, pv: &PointerValue) -> JsiResult<PointerValue>;
    fn clone_string(&self, pv: &PointerValue) -> JsiResult<PointerValue>;
    fn clone_object(&self, pv: &PointerValue) -> JsiResult<PointerValue>;
    fn clone_prop_name_id(&self, pv: &PointerValue) -> JsiResult<PointerValue>;

    fn create_prop_name_id_from_ascii(&self, ascii: &[u8]) -> JsiResult<PropNameId>;
    fn create_prop_name_id_from_utf8(&self, utf8: &[u8]) -> JsiResult<PropNameId>;
    fn create_prop_name_id_from_string(&self, text: &JsiString) -> JsiResult<PropNameId>;
    fn create_prop_name_id_from_symbol(&self, symbol: &Symbol) -> JsiResult<PropNameId>;
    /// Text of a string name; symbol names read as `Symbol(description)`.
    fn prop_name_id_to_utf8(&self, id: &PropNameId) -> JsiResult<String>;
    fn compare_prop_name_ids(&self, a: &PropNameId, b: &PropNameId) -> JsiResult<bool>;

    fn symbol_to_string(&self, symbol: &Symbol) -> JsiResult<String>;

    fn create_string_from_ascii(&self, ascii: &[u8]) -> JsiResult<JsiString>;
    fn create_string_from_utf8(&self, utf8: &[u8]) -> JsiResult<JsiString>;
    fn string_to_utf8(&self, text: &JsiString) -> JsiResult<String>;

    fn create_object(&self) -> JsiResult<Object>;
    fn create_object_with_host_object(&self, host: Rc<dyn HostObject>) -> JsiResult<Object>;
    fn get_host_object(&self, obj: &Object) -> JsiResult<Rc<dyn HostObject>>;
    fn get_host_function(&self, func: &Function) -> JsiResult<HostFunction>;

    fn get_property(&self, obj: &Object, name: &PropNameId) -> JsiResult<Value>;
    fn get_property_with_string(&self, obj: &Object, name: &JsiString) -> JsiResult<Value>;
    fn has_property(&self, obj: &Object, name: &PropNameId) -> JsiResult<bool>;
    fn has_property_with_string(&self, obj: &Object, name: &JsiString) -> JsiResult<bool>;
    fn set_property_value(&self, obj: &Object, name: &PropNameId, value: &Value)
    -> JsiResult<()>;
    fn set_property_value_with_string(
        &self,
        obj: &Object,
        name: &JsiString,
        value: &Value,
    ) -> JsiResult<()>;

    fn is_array(&self, obj: &Object) -> JsiResult<bool>;
    fn is_array_buffer(&self, obj: &Object) -> JsiResult<bool>;
    fn is_function(&self, obj: &Object) -> JsiResult<bool>;
    fn is_host_object(&self, obj: &Object) -> JsiResult<bool>;
    fn is_host_function(&self, func: &Function) -> JsiResult<bool>;

    /// Enumerable, non-symbol names including inherited ones.
    fn get_property_names(&self, obj: &Object) -> JsiResult<Array>;

    fn create_weak_object(&self, obj: &Object) -> JsiResult<WeakObject>;
    /// `undefined` once the referent has been collected.
    fn lock_weak_object(&self, weak: &WeakObject) -> JsiResult<Value>;

    fn create_array(&self, length: usize) -> JsiResult<Array>;
    fn array_size(&self, array: &Array) -> JsiResult<usize>;
    fn array_buffer_size(&self, buffer: &ArrayBuffer) -> JsiResult<usize>;
    fn array_buffer_data(&self, buffer: &ArrayBuffer) -> JsiResult<ArrayBufferStorage>;
    fn get_value_at_index(&self, array: &Array, index: usize) -> JsiResult<Value>;
    fn set_value_at_index(&self, array: &Array, index: usize, value: &Value) -> JsiResult<()>;

    fn create_function_from_host_function(
        &self,
        name: &PropNameId,
        param_count: u32,
        func: HostFunction,
    ) -> JsiResult<Function>;
    fn call(&self, func: &Function, this: &Value, args: &[Value]) -> JsiResult<Value>;
    fn call_as_constructor(&self, func: &Function, args: &[Value]) -> JsiResult<Value>;

    fn push_scope(&self) -> JsiResult<ScopeState>;
    fn pop_scope(&self, state: ScopeState) -> JsiResult<()>;

    fn strict_equals_symbol(&self, a: &Symbol, b: &Symbol) -> JsiResult<bool>;
    fn strict_equals_string(&self, a: &JsiString, b: &JsiString) -> JsiResult<bool>;
    fn strict_equals_object(&self, a: &Object, b: &Object) -> JsiResult<bool>;

    fn instance_of(&self, obj: &Object, func: &Function) -> JsiResult<bool>;
}

/// Convenience entry points available on every runtime.
pub trait RuntimeExt: Runtime {
    /// Evaluate source text.
    fn evaluate_script(&self, source: &str, source_url: &str) -> JsiResult<Value> {
        self.evaluate_javascript(Rc::new(StringBuffer::new(source)), source_url)
    }
}

impl<T: Runtime + ?Sized> RuntimeExt for T {}

/// RAII handle scope.
///
/// Engine handles created while the scope is alive are released in bulk
/// when it drops. Scopes must be dropped in reverse creation order.
pub struct Scope<'rt> {
    rt: &'rt dyn Runtime,
    state: Option<ScopeState>,
}

impl<'rt> Scope<'rt> {
    pub fn new(rt: &'rt dyn Runtime) -> JsiResult<Self> {
        let state = rt.push_scope()?;
        Ok(Self {
            rt,
            state: Some(state),
        })
    }

    /// Run `f` inside a fresh scope.
    pub fn call_in_scope<R>(rt: &dyn Runtime, f: impl FnOnce() -> R) -> JsiResult<R> {
        let _scope = Scope::new(rt)?;
        Ok(f())
    }

    /// Pop the scope now, reporting failure instead of logging it.
    pub fn close(mut self) -> JsiResult<()> {
        match self.state.take() {
            Some(state) => self.rt.pop_scope(state),
            None => Ok(()),
        }
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if let Err(err) = self.rt.pop_scope(state) {
                warn!(error = %err, "failed to pop scope");
            }
        }
    }
}
