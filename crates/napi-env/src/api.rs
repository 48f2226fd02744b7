//! The Node-API contract.
//!
//! [`NodeApi`] mirrors the `napi_*` function table an engine exposes. Each
//! primitive reports failure with a [`NapiStatus`]; when script code threw,
//! the status is [`NapiStatus::PendingException`] and the thrown value waits
//! in the environment until [`NodeApi::get_and_clear_last_exception`].

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::status::{
    KeyCollectionMode, KeyConversion, KeyFilter, NapiResult, NapiValueType, PropertyAttributes,
};

/// Engine handle valid until the enclosing handle scope closes (`napi_value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NapiValue(u32);

impl NapiValue {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Persistent, reference-counted engine reference (`napi_ext_ref`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NapiRef(u32);

impl NapiRef {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Marker returned by [`NodeApi::open_handle_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NapiHandleScope(u32);

impl NapiHandleScope {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Marker returned by [`NodeApi::open_env_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NapiEnvScope(u32);

impl NapiEnvScope {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Shared backing store of an `ArrayBuffer`.
pub type BackingStore = Rc<RefCell<Vec<u8>>>;

/// Native callback entry point.
///
/// Returning `None` yields `undefined` to the script.
pub type NapiCallback = fn(env: &dyn NodeApi, info: &NapiCallbackInfo) -> Option<NapiValue>;

/// Arguments of a native callback (`napi_get_cb_info`).
pub struct NapiCallbackInfo {
    this: NapiValue,
    args: SmallVec<[NapiValue; 8]>,
    new_target: Option<NapiValue>,
    data: Option<Rc<dyn Any>>,
}

impl NapiCallbackInfo {
    pub fn new(
        this: NapiValue,
        args: SmallVec<[NapiValue; 8]>,
        new_target: Option<NapiValue>,
        data: Option<Rc<dyn Any>>,
    ) -> Self {
        Self {
            this,
            args,
            new_target,
            data,
        }
    }

    pub fn this(&self) -> NapiValue {
        self.this
    }

    pub fn args(&self) -> &[NapiValue] {
        &self.args
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// Set when invoked through `new`.
    pub fn new_target(&self) -> Option<NapiValue> {
        self.new_target
    }

    /// Data attached when the function was created.
    pub fn data(&self) -> Option<&Rc<dyn Any>> {
        self.data.as_ref()
    }
}

/// Data property for [`NodeApi::define_properties`].
#[derive(Debug, Clone, Copy)]
pub struct NapiPropertyDescriptor {
    pub name: NapiValue,
    pub value: NapiValue,
    pub attributes: PropertyAttributes,
}

/// A Node-API environment.
///
/// Implementations are single threaded and must tolerate re-entrant calls
/// from inside native callbacks.
pub trait NodeApi {
    // Environment and handle scopes.
    fn open_env_scope(&self) -> NapiResult<NapiEnvScope>;
    fn close_env_scope(&self, scope: NapiEnvScope) -> NapiResult<()>;
    fn open_handle_scope(&self) -> NapiResult<NapiHandleScope>;
    fn close_handle_scope(&self, scope: NapiHandleScope) -> NapiResult<()>;

    // References.
    fn create_reference(&self, value: NapiValue) -> NapiResult<NapiRef>;
    fn create_weak_reference(&self, value: NapiValue) -> NapiResult<NapiRef>;
    fn reference_ref(&self, reference: NapiRef) -> NapiResult<()>;
    /// Deletes the reference once its count reaches zero.
    fn reference_unref(&self, reference: NapiRef) -> NapiResult<()>;
    /// `None` when a weak referent has been collected.
    fn get_reference_value(&self, reference: NapiRef) -> NapiResult<Option<NapiValue>>;
    /// Interned reference for the string held by `value`.
    fn get_unique_string_ref(&self, value: NapiValue) -> NapiResult<NapiRef>;
    fn get_unique_string_utf8_ref(&self, utf8: &[u8]) -> NapiResult<NapiRef>;

    // Primitive values.
    fn get_undefined(&self) -> NapiResult<NapiValue>;
    fn get_null(&self) -> NapiResult<NapiValue>;
    fn get_global(&self) -> NapiResult<NapiValue>;
    fn get_boolean(&self, value: bool) -> NapiResult<NapiValue>;
    fn get_value_bool(&self, value: NapiValue) -> NapiResult<bool>;
    fn create_double(&self, value: f64) -> NapiResult<NapiValue>;
    fn get_value_double(&self, value: NapiValue) -> NapiResult<f64>;
    fn create_string_latin1(&self, latin1: &[u8]) -> NapiResult<NapiValue>;
    fn create_string_utf8(&self, utf8: &[u8]) -> NapiResult<NapiValue>;
    fn get_value_string_utf8(&self, value: NapiValue) -> NapiResult<String>;
    fn create_symbol(&self, description: Option<NapiValue>) -> NapiResult<NapiValue>;
    fn type_of(&self, value: NapiValue) -> NapiResult<NapiValueType>;
    fn strict_equals(&self, a: NapiValue, b: NapiValue) -> NapiResult<bool>;

    // Objects.
    fn create_object(&self) -> NapiResult<NapiValue>;
    fn get_property(&self, object: NapiValue, key: NapiValue) -> NapiResult<NapiValue>;
    fn set_property(&self, object: NapiValue, key: NapiValue, value: NapiValue) -> NapiResult<()>;
    fn has_property(&self, object: NapiValue, key: NapiValue) -> NapiResult<bool>;
    fn define_properties(
        &self,
        object: NapiValue,
        properties: &[NapiPropertyDescriptor],
    ) -> NapiResult<()>;
    fn get_all_property_names(
        &self,
        object: NapiValue,
        mode: KeyCollectionMode,
        filter: KeyFilter,
        conversion: KeyConversion,
    ) -> NapiResult<NapiValue>;
    fn instance_of(&self, object: NapiValue, constructor: NapiValue) -> NapiResult<bool>;

    // Arrays and array buffers.
    fn create_array_with_length(&self, length: usize) -> NapiResult<NapiValue>;
    fn get_array_length(&self, array: NapiValue) -> NapiResult<u32>;
    fn get_element(&self, object: NapiValue, index: u32) -> NapiResult<NapiValue>;
    fn set_element(&self, object: NapiValue, index: u32, value: NapiValue) -> NapiResult<()>;
    fn is_array(&self, value: NapiValue) -> NapiResult<bool>;
    fn is_arraybuffer(&self, value: NapiValue) -> NapiResult<bool>;
    fn get_arraybuffer_info(&self, value: NapiValue) -> NapiResult<(BackingStore, usize)>;

    // Functions.
    fn create_function(
        &self,
        name: &str,
        callback: NapiCallback,
        data: Option<Rc<dyn Any>>,
    ) -> NapiResult<NapiValue>;
    fn call_function(
        &self,
        this: NapiValue,
        func: NapiValue,
        args: &[NapiValue],
    ) -> NapiResult<NapiValue>;
    fn new_instance(&self, constructor: NapiValue, args: &[NapiValue]) -> NapiResult<NapiValue>;

    // Externals. Dropping the last holder of `data` is the finalizer.
    fn create_external(&self, data: Rc<dyn Any>) -> NapiResult<NapiValue>;
    fn get_value_external(&self, value: NapiValue) -> NapiResult<Rc<dyn Any>>;

    // Exceptions.
    fn throw(&self, error: NapiValue) -> NapiResult<()>;
    fn throw_error(&self, code: Option<&str>, message: &str) -> NapiResult<()>;
    fn is_exception_pending(&self) -> NapiResult<bool>;
    /// `undefined` when nothing is pending.
    fn get_and_clear_last_exception(&self) -> NapiResult<NapiValue>;

    // Scripts.
    fn run_script(&self, source: NapiValue, source_url: &str) -> NapiResult<NapiValue>;
    fn serialize_script(&self, source: NapiValue, source_url: &str) -> NapiResult<Vec<u8>>;
    fn run_serialized_script(
        &self,
        buffer: &[u8],
        source: NapiValue,
        source_url: &str,
    ) -> NapiResult<NapiValue>;
}
