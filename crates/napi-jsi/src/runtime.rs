//! [`NapiJsiRuntime`]: the JSI runtime over a Node-API environment.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use jsi_core::{
    Array, ArrayBuffer, ArrayBufferStorage, Buffer, Function, HostFunction, HostObject, JsiError,
    JsiResult, JsiString, Object, PointerValue, PreparedJavaScript, PropNameId, Runtime, ScopeState,
    Symbol, Value, WeakObject,
};
use napi_env::{
    KeyCollectionMode, KeyConversion, KeyFilter, NapiEnvScope, NapiHandleScope,
    NapiPropertyDescriptor, NapiRef, NapiValue, NapiValueType, NodeApi, PropertyAttributes,
};
use tracing::{debug, trace, warn};

use crate::args::NapiValueArgs;
use crate::cache::{CachedValues, NapiRefHolder, PropertyIds};
use crate::config::RuntimeConfig;
use crate::error::{fatal, status_error};
use crate::host::{HostFunctionWrapper, HostObjectHolder, host_function_callback};
use crate::pointer::{NapiHandle, NapiRefPointer, handle_of};
use crate::script::{NapiPreparedJavaScript, VectorBuffer};

/// Opens an env scope for the duration of one runtime operation.
pub(crate) struct EnvScope<'a> {
    env: &'a dyn NodeApi,
    scope: NapiEnvScope,
}

impl<'a> EnvScope<'a> {
    pub(crate) fn open(env: &'a dyn NodeApi) -> Self {
        match env.open_env_scope() {
            Ok(scope) => Self { env, scope },
            Err(status) => fatal(&format!("Cannot open the env scope: {status}")),
        }
    }
}

impl Drop for EnvScope<'_> {
    fn drop(&mut self) {
        if let Err(status) = self.env.close_env_scope(self.scope) {
            warn!(status = status.code(), "failed to close env scope");
        }
    }
}

pub(crate) struct RuntimeInner {
    // Cached references are released before `env` drops.
    pub(crate) property_id: PropertyIds,
    pub(crate) value: CachedValues,
    pub(crate) pending_js_error: Cell<bool>,
    pub(crate) config: RuntimeConfig,
    pub(crate) env: Rc<dyn NodeApi>,
}

/// A [`Runtime`] backed by any [`NodeApi`] environment.
///
/// Every operation runs inside an env scope. Values handed out are owning
/// engine references; values passed into host callbacks are views valid for
/// the duration of the callback.
pub struct NapiJsiRuntime {
    inner: Rc<RuntimeInner>,
}

impl NapiJsiRuntime {
    pub fn new(env: Rc<dyn NodeApi>) -> JsiResult<Self> {
        Self::with_config(env, RuntimeConfig::default())
    }

    pub fn with_config(env: Rc<dyn NodeApi>, config: RuntimeConfig) -> JsiResult<Self> {
        let (property_id, value) = {
            let _scope = EnvScope::open(env.as_ref());
            let property_id = PropertyIds::new(&env).map_err(status_error)?;
            let value = CachedValues::new(&env, &property_id).map_err(status_error)?;
            (property_id, value)
        };
        debug!(description = %config.description, "created NodeApi JSI runtime");
        Ok(Self {
            inner: Rc::new(RuntimeInner {
                property_id,
                value,
                pending_js_error: Cell::new(false),
                config,
                env,
            }),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// The environment this runtime drives.
    pub fn env(&self) -> &Rc<dyn NodeApi> {
        &self.inner.env
    }

    pub(crate) fn from_inner(inner: Rc<RuntimeInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn inner(&self) -> &RuntimeInner {
        &self.inner
    }

    pub(crate) fn api(&self) -> &dyn NodeApi {
        self.inner.env.as_ref()
    }

    pub(crate) fn env_scope(&self) -> EnvScope<'_> {
        EnvScope::open(self.api())
    }

    /// Handle of a cached reference in the current scope.
    pub(crate) fn resolve(&self, holder: &NapiRefHolder) -> JsiResult<NapiValue> {
        self.check(holder.value(self.api()))
    }

    pub(crate) fn owning(&self, reference: NapiRef) -> PointerValue {
        PointerValue::owning(Box::new(NapiRefPointer::new(&self.inner.env, reference)))
    }

    /// Take a strong reference to `value`.
    pub(crate) fn make_pointer(&self, value: NapiValue) -> JsiResult<PointerValue> {
        let reference = self.check(self.api().create_reference(value))?;
        Ok(self.owning(reference))
    }

    pub(crate) fn napi_value_of(&self, pv: &PointerValue) -> JsiResult<NapiValue> {
        match handle_of(pv)? {
            NapiHandle::Value(value) => Ok(value),
            NapiHandle::Ref(reference) => self
                .check(self.api().get_reference_value(reference))?
                .ok_or_else(|| JsiError::native("Referenced value has been collected")),
        }
    }

    pub(crate) fn value_to_napi(&self, value: &Value) -> JsiResult<NapiValue> {
        let cached = &self.inner.value;
        match value {
            Value::Undefined => self.resolve(&cached.undefined),
            Value::Null => self.resolve(&cached.null),
            Value::Bool(true) => self.resolve(&cached.true_value),
            Value::Bool(false) => self.resolve(&cached.false_value),
            Value::Number(n) => self.check(self.api().create_double(*n)),
            Value::Symbol(symbol) => self.napi_value_of(symbol.pointer()),
            Value::String(text) => self.napi_value_of(text.pointer()),
            Value::Object(obj) => self.napi_value_of(obj.pointer()),
        }
    }

    /// Owning conversion of an engine value.
    pub(crate) fn to_jsi_value(&self, value: NapiValue) -> JsiResult<Value> {
        self.wrap_value(value, |value| self.make_pointer(value))
    }

    /// Frame-local conversion that allocates no engine reference.
    pub(crate) fn value_view(&self, value: NapiValue) -> JsiResult<Value> {
        self.wrap_value(value, |value| Ok(crate::pointer::view(value)))
    }

    fn wrap_value(
        &self,
        value: NapiValue,
        pointer: impl FnOnce(NapiValue) -> JsiResult<PointerValue>,
    ) -> JsiResult<Value> {
        let env = self.api();
        Ok(match self.check(env.type_of(value))? {
            NapiValueType::Undefined => Value::Undefined,
            NapiValueType::Null => Value::Null,
            NapiValueType::Boolean => Value::Bool(self.check(env.get_value_bool(value))?),
            NapiValueType::Number => Value::Number(self.check(env.get_value_double(value))?),
            NapiValueType::String => Value::String(JsiString::from_pointer(pointer(value)?)),
            NapiValueType::Symbol => Value::Symbol(Symbol::from_pointer(pointer(value)?)),
            NapiValueType::Object
            | NapiValueType::Function
            | NapiValueType::External
            | NapiValueType::Bigint => Value::Object(Object::from_pointer(pointer(value)?)),
        })
    }

    pub(crate) fn napi_value_args(&self, args: &[Value]) -> JsiResult<NapiValueArgs> {
        args.iter().map(|arg| self.value_to_napi(arg)).collect()
    }

    fn clone_pointer(&self, pv: &PointerValue, intern: bool) -> JsiResult<PointerValue> {
        let env = self.api();
        let reference = match handle_of(pv)? {
            NapiHandle::Ref(reference) => {
                self.check(env.reference_ref(reference))?;
                reference
            }
            NapiHandle::Value(value)
                if intern && self.check(env.type_of(value))? == NapiValueType::String =>
            {
                self.check(env.get_unique_string_ref(value))?
            }
            NapiHandle::Value(value) => self.check(env.create_reference(value))?,
        };
        Ok(self.owning(reference))
    }

    /// Data of the external stored under `marker`, if any.
    pub(crate) fn external_data(
        &self,
        object: NapiValue,
        marker: &NapiRefHolder,
    ) -> JsiResult<Option<Rc<dyn std::any::Any>>> {
        let env = self.api();
        let holder = self.check(env.get_property(object, self.resolve(marker)?))?;
        if self.check(env.type_of(holder))? != NapiValueType::External {
            return Ok(None);
        }
        self.check(env.get_value_external(holder)).map(Some)
    }

    pub(crate) fn host_object_of(&self, object: NapiValue) -> JsiResult<Rc<dyn HostObject>> {
        let data = self.external_data(object, &self.inner.property_id.host_object_symbol)?;
        data.as_ref()
            .and_then(|data| data.downcast_ref::<HostObjectHolder>())
            .map(|holder| holder.host())
            .ok_or_else(|| JsiError::native("Cannot get HostObjects."))
    }

    fn host_function_of(&self, func: &Function) -> JsiResult<Option<HostFunction>> {
        let object = self.napi_value_of(func.pointer())?;
        let data = self.external_data(object, &self.inner.property_id.host_function_symbol)?;
        Ok(data
            .as_ref()
            .and_then(|data| data.downcast_ref::<HostFunctionWrapper>())
            .map(|wrapper| wrapper.host_function()))
    }

    fn proxy_constructor(&self) -> JsiResult<NapiValue> {
        let holder = self.inner.value.proxy_constructor.get_or_try_init(|| {
            trace!("caching Proxy constructor");
            let global = self.resolve(&self.inner.value.global)?;
            let name = self.resolve(&self.inner.property_id.proxy)?;
            let ctor = self.check(self.api().get_property(global, name))?;
            self.check(NapiRefHolder::from_value(&self.inner.env, ctor))
        })?;
        self.resolve(holder)
    }

    fn symbol_to_string_function(&self) -> JsiResult<NapiValue> {
        let holder = self.inner.value.symbol_to_string.get_or_try_init(|| {
            trace!("caching Symbol.prototype.toString");
            let env = self.api();
            let ids = &self.inner.property_id;
            let global = self.resolve(&self.inner.value.global)?;
            let ctor = self.check(env.get_property(global, self.resolve(&ids.symbol)?))?;
            let prototype = self.check(env.get_property(ctor, self.resolve(&ids.prototype)?))?;
            let to_string = self.check(env.get_property(prototype, self.resolve(&ids.to_string)?))?;
            self.check(NapiRefHolder::from_value(&self.inner.env, to_string))
        })?;
        self.resolve(holder)
    }

    /// `Symbol.prototype.toString` applied to `symbol`.
    pub(crate) fn symbol_text(&self, symbol: NapiValue) -> JsiResult<String> {
        let env = self.api();
        let to_string = self.symbol_to_string_function()?;
        let text = self.check(env.call_function(symbol, to_string, &[]))?;
        self.check(env.get_value_string_utf8(text))
    }

    /// Function named after `name` whose `length` is `param_count`.
    pub(crate) fn create_external_function(
        &self,
        name: NapiValue,
        param_count: u32,
        callback: napi_env::NapiCallback,
        data: Rc<dyn std::any::Any>,
    ) -> JsiResult<NapiValue> {
        let env = self.api();
        let func_name = self.check(env.get_value_string_utf8(name))?;
        let function = self.check(env.create_function(&func_name, callback, Some(data)))?;
        let length = self.check(env.create_double(f64::from(param_count)))?;
        let property = NapiPropertyDescriptor {
            name: self.resolve(&self.inner.property_id.length)?,
            value: length,
            attributes: PropertyAttributes::DEFAULT,
        };
        self.check(env.define_properties(function, &[property]))?;
        Ok(function)
    }

    pub(crate) fn index(index: usize) -> JsiResult<u32> {
        u32::try_from(index).map_err(|_| JsiError::native(format!("Array index {index} is out of range")))
    }
}

impl Runtime for NapiJsiRuntime {
    fn evaluate_javascript(&self, buffer: Rc<dyn Buffer>, source_url: &str) -> JsiResult<Value> {
        let _scope = self.env_scope();
        debug!(source_url, size = buffer.size(), "evaluating script");
        let env = self.api();
        let script = self.check(env.create_string_utf8(buffer.data()))?;
        let result = self.check(env.run_script(script, source_url))?;
        self.to_jsi_value(result)
    }

    fn prepare_javascript(
        &self,
        buffer: Rc<dyn Buffer>,
        source_url: String,
    ) -> JsiResult<Rc<dyn PreparedJavaScript>> {
        let _scope = self.env_scope();
        let env = self.api();
        let source = self.check(env.create_string_utf8(buffer.data()))?;
        let serialized = self.check(env.serialize_script(source, &source_url))?;
        debug!(
            source_url = %source_url,
            source_size = buffer.size(),
            serialized_size = serialized.len(),
            "prepared script"
        );
        Ok(Rc::new(NapiPreparedJavaScript::new(
            VectorBuffer::new(serialized),
            buffer,
            source_url,
        )))
    }

    fn evaluate_prepared_javascript(&self, js: &Rc<dyn PreparedJavaScript>) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let prepared = js
            .as_any()
            .downcast_ref::<NapiPreparedJavaScript>()
            .ok_or_else(|| JsiError::native("Prepared script was not created by a NodeApi runtime"))?;
        debug!(source_url = prepared.source_url(), "evaluating prepared script");
        let env = self.api();
        let source = self.check(env.create_string_utf8(prepared.source_buffer().data()))?;
        let result = self.check(env.run_serialized_script(
            prepared.serialized_buffer().data(),
            source,
            prepared.source_url(),
        ))?;
        self.to_jsi_value(result)
    }

    fn drain_microtasks(&self, _max_microtasks_hint: i32) -> JsiResult<bool> {
        Ok(true)
    }

    fn global(&self) -> JsiResult<Object> {
        let _scope = self.env_scope();
        let reference = self.inner.value.global.reference();
        self.check(self.api().reference_ref(reference))?;
        Ok(Object::from_pointer(self.owning(reference)))
    }

    fn description(&self) -> String {
        self.inner.config.description.clone()
    }

    fn is_inspectable(&self) -> bool {
        self.inner.config.inspectable
    }

    fn clone_symbol(&self, pv: &PointerValue) -> JsiResult<PointerValue> {
        let _scope = self.env_scope();
        self.clone_pointer(pv, false)
    }

    fn clone_string(&self, pv: &PointerValue) -> JsiResult<PointerValue> {
        let _scope = self.env_scope();
        self.clone_pointer(pv, false)
    }

    fn clone_object(&self, pv: &PointerValue) -> JsiResult<PointerValue> {
        let _scope = self.env_scope();
        self.clone_pointer(pv, false)
    }

    fn clone_prop_name_id(&self, pv: &PointerValue) -> JsiResult<PointerValue> {
        let _scope = self.env_scope();
        self.clone_pointer(pv, true)
    }

    fn create_prop_name_id_from_ascii(&self, ascii: &[u8]) -> JsiResult<PropNameId> {
        let _scope = self.env_scope();
        let env = self.api();
        let text = self.check(env.create_string_latin1(ascii))?;
        let unique = self.check(env.get_unique_string_ref(text))?;
        Ok(PropNameId::from_pointer(self.owning(unique)))
    }

    fn create_prop_name_id_from_utf8(&self, utf8: &[u8]) -> JsiResult<PropNameId> {
        let _scope = self.env_scope();
        let unique = self.check(self.api().get_unique_string_utf8_ref(utf8))?;
        Ok(PropNameId::from_pointer(self.owning(unique)))
    }

    fn create_prop_name_id_from_string(&self, text: &JsiString) -> JsiResult<PropNameId> {
        let _scope = self.env_scope();
        let value = self.napi_value_of(text.pointer())?;
        let unique = self.check(self.api().get_unique_string_ref(value))?;
        Ok(PropNameId::from_pointer(self.owning(unique)))
    }

    fn create_prop_name_id_from_symbol(&self, symbol: &Symbol) -> JsiResult<PropNameId> {
        let _scope = self.env_scope();
        Ok(PropNameId::from_pointer(self.clone_pointer(symbol.pointer(), false)?))
    }

    fn prop_name_id_to_utf8(&self, id: &PropNameId) -> JsiResult<String> {
        let _scope = self.env_scope();
        let value = self.napi_value_of(id.pointer())?;
        if self.check(self.api().type_of(value))? == NapiValueType::Symbol {
            return self.symbol_text(value);
        }
        self.check(self.api().get_value_string_utf8(value))
    }

    fn compare_prop_name_ids(&self, a: &PropNameId, b: &PropNameId) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let a = self.napi_value_of(a.pointer())?;
        let b = self.napi_value_of(b.pointer())?;
        self.check(self.api().strict_equals(a, b))
    }

    fn symbol_to_string(&self, symbol: &Symbol) -> JsiResult<String> {
        let _scope = self.env_scope();
        self.symbol_text(self.napi_value_of(symbol.pointer())?)
    }

    fn create_string_from_ascii(&self, ascii: &[u8]) -> JsiResult<JsiString> {
        let _scope = self.env_scope();
        let value = self.check(self.api().create_string_latin1(ascii))?;
        Ok(JsiString::from_pointer(self.make_pointer(value)?))
    }

    fn create_string_from_utf8(&self, utf8: &[u8]) -> JsiResult<JsiString> {
        let _scope = self.env_scope();
        let value = self.check(self.api().create_string_utf8(utf8))?;
        Ok(JsiString::from_pointer(self.make_pointer(value)?))
    }

    fn string_to_utf8(&self, text: &JsiString) -> JsiResult<String> {
        let _scope = self.env_scope();
        let value = self.napi_value_of(text.pointer())?;
        self.check(self.api().get_value_string_utf8(value))
    }

    fn create_object(&self) -> JsiResult<Object> {
        let _scope = self.env_scope();
        let value = self.check(self.api().create_object())?;
        Ok(Object::from_pointer(self.make_pointer(value)?))
    }

    fn create_object_with_host_object(&self, host: Rc<dyn HostObject>) -> JsiResult<Object> {
        // The host object lives in an external stored on the proxy target
        // under the marker symbol; the shared handler routes every trap to it.
        let _scope = self.env_scope();
        let env = self.api();
        let holder = self.check(env.create_external(Rc::new(HostObjectHolder::new(host))))?;
        let target = self.check(env.create_object())?;
        let marker = self.resolve(&self.inner.property_id.host_object_symbol)?;
        self.check(env.set_property(target, marker, holder))?;
        let ctor = self.proxy_constructor()?;
        let handler = self.host_object_proxy_handler()?;
        let proxy = self.check(env.new_instance(ctor, &[target, handler]))?;
        Ok(Object::from_pointer(self.make_pointer(proxy)?))
    }

    fn get_host_object(&self, obj: &Object) -> JsiResult<Rc<dyn HostObject>> {
        let _scope = self.env_scope();
        self.host_object_of(self.napi_value_of(obj.pointer())?)
    }

    fn get_host_function(&self, func: &Function) -> JsiResult<HostFunction> {
        let _scope = self.env_scope();
        self.host_function_of(func)?.ok_or_else(|| {
            JsiError::native("getHostFunction() can only be called with HostFunction.")
        })
    }

    fn get_property(&self, obj: &Object, name: &PropNameId) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let key = self.napi_value_of(name.pointer())?;
        let value = self.check(self.api().get_property(object, key))?;
        self.to_jsi_value(value)
    }

    fn get_property_with_string(&self, obj: &Object, name: &JsiString) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let key = self.napi_value_of(name.pointer())?;
        let value = self.check(self.api().get_property(object, key))?;
        self.to_jsi_value(value)
    }

    fn has_property(&self, obj: &Object, name: &PropNameId) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let key = self.napi_value_of(name.pointer())?;
        self.check(self.api().has_property(object, key))
    }

    fn has_property_with_string(&self, obj: &Object, name: &JsiString) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let key = self.napi_value_of(name.pointer())?;
        self.check(self.api().has_property(object, key))
    }

    fn set_property_value(
        &self,
        obj: &Object,
        name: &PropNameId,
        value: &Value,
    ) -> JsiResult<()> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let key = self.napi_value_of(name.pointer())?;
        let value = self.value_to_napi(value)?;
        self.check(self.api().set_property(object, key, value))
    }

    fn set_property_value_with_string(
        &self,
        obj: &Object,
        name: &JsiString,
        value: &Value,
    ) -> JsiResult<()> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let key = self.napi_value_of(name.pointer())?;
        let value = self.value_to_napi(value)?;
        self.check(self.api().set_property(object, key, value))
    }

    fn is_array(&self, obj: &Object) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        self.check(self.api().is_array(object))
    }

    fn is_array_buffer(&self, obj: &Object) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        self.check(self.api().is_arraybuffer(object))
    }

    fn is_function(&self, obj: &Object) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        Ok(self.check(self.api().type_of(object))? == NapiValueType::Function)
    }

    fn is_host_object(&self, obj: &Object) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let data = self.external_data(object, &self.inner.property_id.host_object_symbol)?;
        Ok(data.is_some_and(|data| data.is::<HostObjectHolder>()))
    }

    fn is_host_function(&self, func: &Function) -> JsiResult<bool> {
        let _scope = self.env_scope();
        Ok(self.host_function_of(func)?.is_some())
    }

    fn get_property_names(&self, obj: &Object) -> JsiResult<Array> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let names = self.check(self.api().get_all_property_names(
            object,
            KeyCollectionMode::IncludePrototypes,
            KeyFilter::ENUMERABLE | KeyFilter::SKIP_SYMBOLS,
            KeyConversion::NumbersToStrings,
        ))?;
        Ok(Array::from_pointer(self.make_pointer(names)?))
    }

    fn create_weak_object(&self, obj: &Object) -> JsiResult<WeakObject> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let weak = self.check(self.api().create_weak_reference(object))?;
        Ok(WeakObject::from_pointer(self.owning(weak)))
    }

    fn lock_weak_object(&self, weak: &WeakObject) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let value = match handle_of(weak.pointer())? {
            NapiHandle::Value(value) => Some(value),
            NapiHandle::Ref(reference) => self.check(self.api().get_reference_value(reference))?,
        };
        match value {
            Some(value) => self.to_jsi_value(value),
            None => Ok(Value::Undefined),
        }
    }

    fn create_array(&self, length: usize) -> JsiResult<Array> {
        let _scope = self.env_scope();
        let array = self.check(self.api().create_array_with_length(length))?;
        Ok(Array::from_pointer(self.make_pointer(array)?))
    }

    fn array_size(&self, array: &Array) -> JsiResult<usize> {
        let _scope = self.env_scope();
        let array = self.napi_value_of(array.pointer())?;
        Ok(self.check(self.api().get_array_length(array))? as usize)
    }

    fn array_buffer_size(&self, buffer: &ArrayBuffer) -> JsiResult<usize> {
        let _scope = self.env_scope();
        let buffer = self.napi_value_of(buffer.pointer())?;
        let (_, size) = self.check(self.api().get_arraybuffer_info(buffer))?;
        Ok(size)
    }

    fn array_buffer_data(&self, buffer: &ArrayBuffer) -> JsiResult<ArrayBufferStorage> {
        let _scope = self.env_scope();
        let buffer = self.napi_value_of(buffer.pointer())?;
        let (store, _) = self.check(self.api().get_arraybuffer_info(buffer))?;
        Ok(store)
    }

    fn get_value_at_index(&self, array: &Array, index: usize) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let array = self.napi_value_of(array.pointer())?;
        let element = self.check(self.api().get_element(array, Self::index(index)?))?;
        self.to_jsi_value(element)
    }

    fn set_value_at_index(&self, array: &Array, index: usize, value: &Value) -> JsiResult<()> {
        let _scope = self.env_scope();
        let array = self.napi_value_of(array.pointer())?;
        let value = self.value_to_napi(value)?;
        self.check(self.api().set_element(array, Self::index(index)?, value))
    }

    fn create_function_from_host_function(
        &self,
        name: &PropNameId,
        param_count: u32,
        func: HostFunction,
    ) -> JsiResult<Function> {
        let _scope = self.env_scope();
        let env = self.api();
        let wrapper = Rc::new(HostFunctionWrapper::new(self.downgrade(), func));
        let name = self.napi_value_of(name.pointer())?;
        let function =
            self.create_external_function(name, param_count, host_function_callback, wrapper.clone())?;
        let holder = self.check(env.create_external(wrapper))?;
        let marker = NapiPropertyDescriptor {
            name: self.resolve(&self.inner.property_id.host_function_symbol)?,
            value: holder,
            attributes: PropertyAttributes::DEFAULT,
        };
        self.check(env.define_properties(function, &[marker]))?;
        Ok(Function::from_pointer(self.make_pointer(function)?))
    }

    fn call(&self, func: &Function, this: &Value, args: &[Value]) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let this = self.value_to_napi(this)?;
        let function = self.napi_value_of(func.pointer())?;
        let args = self.napi_value_args(args)?;
        let result = self.check(self.api().call_function(this, function, &args))?;
        self.to_jsi_value(result)
    }

    fn call_as_constructor(&self, func: &Function, args: &[Value]) -> JsiResult<Value> {
        let _scope = self.env_scope();
        let function = self.napi_value_of(func.pointer())?;
        let args = self.napi_value_args(args)?;
        let result = self.check(self.api().new_instance(function, &args))?;
        self.to_jsi_value(result)
    }

    fn push_scope(&self) -> JsiResult<ScopeState> {
        let _scope = self.env_scope();
        let scope = self.check(self.api().open_handle_scope())?;
        Ok(ScopeState::from_bits(u64::from(scope.raw())))
    }

    fn pop_scope(&self, state: ScopeState) -> JsiResult<()> {
        let _scope = self.env_scope();
        let scope = u32::try_from(state.bits())
            .map(NapiHandleScope::from_raw)
            .map_err(|_| JsiError::native("Scope state was not created by this runtime"))?;
        self.check(self.api().close_handle_scope(scope))
    }

    fn strict_equals_symbol(&self, a: &Symbol, b: &Symbol) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let a = self.napi_value_of(a.pointer())?;
        let b = self.napi_value_of(b.pointer())?;
        self.check(self.api().strict_equals(a, b))
    }

    fn strict_equals_string(&self, a: &JsiString, b: &JsiString) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let a = self.napi_value_of(a.pointer())?;
        let b = self.napi_value_of(b.pointer())?;
        self.check(self.api().strict_equals(a, b))
    }

    fn strict_equals_object(&self, a: &Object, b: &Object) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let a = self.napi_value_of(a.pointer())?;
        let b = self.napi_value_of(b.pointer())?;
        self.check(self.api().strict_equals(a, b))
    }

    fn instance_of(&self, obj: &Object, func: &Function) -> JsiResult<bool> {
        let _scope = self.env_scope();
        let object = self.napi_value_of(obj.pointer())?;
        let ctor = self.napi_value_of(func.pointer())?;
        self.check(self.api().instance_of(object, ctor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsi_core::RuntimeExt;
    use napi_env::ReferenceEnv;

    fn runtime() -> (Rc<ReferenceEnv>, NapiJsiRuntime) {
        let env = Rc::new(ReferenceEnv::new());
        let rt = NapiJsiRuntime::new(env.clone()).unwrap();
        (env, rt)
    }

    #[test]
    fn test_results_are_owning() {
        let (_env, rt) = runtime();
        let value = rt.evaluate_script("({})", "owning.js").unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.pointer().is_view());
    }

    #[test]
    fn test_views_allocate_no_reference() {
        let (env, rt) = runtime();
        let _scope = rt.env_scope();
        let before = env.live_references();
        let object = rt.api().create_object().unwrap();
        let view = rt.value_view(object).unwrap();
        assert!(view.as_object().unwrap().pointer().is_view());
        assert_eq!(env.live_references(), before);

        let owned = rt.to_jsi_value(object).unwrap();
        assert_eq!(env.live_references(), before + 1);
        drop(owned);
        assert_eq!(env.live_references(), before);
    }

    #[test]
    fn test_operations_leave_no_open_env_scope() {
        let (env, rt) = runtime();
        rt.evaluate_script("var x = 1", "scope.js").unwrap();
        let _ = rt.create_object().unwrap();
        // Handles are dropped once the outermost env scope closes.
        assert_eq!(env.open_handle_count(), 0);
    }

    #[test]
    fn test_index_out_of_range() {
        assert!(NapiJsiRuntime::index(usize::MAX).is_err());
        assert_eq!(NapiJsiRuntime::index(7).unwrap(), 7);
    }
}
