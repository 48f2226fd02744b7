//! [`NodeApi`] surface of the reference engine.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::codec;
use super::heap::{FunctionKind, ObjectKind, Property};
use super::realm::ErrorKind;
use super::value::{PropKey, SymbolData, Val};
use super::{JsResult, RefEntry, ReferenceEnv, Thrown};
use crate::api::{
    BackingStore, NapiCallback, NapiEnvScope, NapiHandleScope, NapiPropertyDescriptor, NapiRef,
    NapiValue, NodeApi,
};
use crate::status::{
    KeyCollectionMode, KeyConversion, KeyFilter, NapiResult, NapiStatus, NapiValueType,
};

impl ReferenceEnv {
    pub(crate) fn push_handle(&self, value: Val) -> NapiValue {
        let mut state = self.state.borrow_mut();
        state.handles.push(value);
        NapiValue::from_raw((state.handles.len() - 1) as u32)
    }

    fn resolve(&self, value: NapiValue) -> NapiResult<Val> {
        self.state
            .borrow()
            .handles
            .get(value.raw() as usize)
            .cloned()
            .ok_or(NapiStatus::InvalidArg)
    }

    fn resolve_object(&self, value: NapiValue) -> NapiResult<super::value::ObjectId> {
        self.resolve(value)?
            .as_object()
            .ok_or(NapiStatus::ObjectExpected)
    }

    fn resolve_string(&self, value: NapiValue) -> NapiResult<Rc<str>> {
        match self.resolve(value)? {
            Val::Str(s) => Ok(s),
            _ => Err(NapiStatus::StringExpected),
        }
    }

    fn resolve_key(&self, value: NapiValue) -> NapiResult<PropKey> {
        let key = self.resolve(value)?;
        self.run_js(|| self.to_property_key(&key))
    }

    /// Run an operation that may execute script. A throw becomes the pending
    /// exception and `PendingException` is reported.
    fn run_js<T>(&self, op: impl FnOnce() -> JsResult<T>) -> NapiResult<T> {
        {
            let mut state = self.state.borrow_mut();
            if state.pending_exception.is_some() {
                return Err(NapiStatus::PendingException);
            }
            state.exec_depth += 1;
        }
        let result = op();
        let mut state = self.state.borrow_mut();
        state.exec_depth -= 1;
        result.map_err(|Thrown(exception)| {
            state.pending_exception = Some(exception);
            NapiStatus::PendingException
        })
    }

    fn reference_entry<R>(
        &self,
        reference: NapiRef,
        f: impl FnOnce(&mut RefEntry) -> R,
    ) -> NapiResult<R> {
        let mut state = self.state.borrow_mut();
        state
            .refs
            .get_mut(reference.raw() as usize)
            .and_then(Option::as_mut)
            .map(f)
            .ok_or(NapiStatus::InvalidArg)
    }

    fn new_reference(&self, value: Val, count: u32, interned: Option<Rc<str>>) -> NapiRef {
        let mut state = self.state.borrow_mut();
        let entry = RefEntry {
            value: Some(value),
            count,
            interned,
        };
        match state.free_refs.pop() {
            Some(index) => {
                state.refs[index as usize] = Some(entry);
                NapiRef::from_raw(index)
            }
            None => {
                state.refs.push(Some(entry));
                NapiRef::from_raw((state.refs.len() - 1) as u32)
            }
        }
    }

    fn delete_reference(&self, reference: NapiRef) {
        let mut state = self.state.borrow_mut();
        let index = reference.raw() as usize;
        if let Some(entry) = state.refs.get_mut(index).and_then(Option::take) {
            if let Some(key) = entry.interned {
                state.interned.remove(&key);
            }
            state.free_refs.push(index as u32);
        }
    }

    fn intern(&self, text: Rc<str>) -> NapiRef {
        let existing = self.state.borrow().interned.get(&text).copied();
        if let Some(reference) = existing {
            if self.reference_entry(reference, |entry| entry.count += 1).is_ok() {
                return reference;
            }
        }
        let reference = self.new_reference(Val::Str(text.clone()), 1, Some(text.clone()));
        self.state.borrow_mut().interned.insert(text, reference);
        reference
    }

    fn collect_property_names(
        &self,
        id: super::value::ObjectId,
        mode: KeyCollectionMode,
        filter: KeyFilter,
    ) -> JsResult<Vec<Val>> {
        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(holder) = current {
            for key in self.own_keys(holder)? {
                let skipped = match key {
                    PropKey::Str(_) => filter.contains(KeyFilter::SKIP_STRINGS),
                    PropKey::Symbol(_) => filter.contains(KeyFilter::SKIP_SYMBOLS),
                };
                if skipped || !seen.insert(key.clone()) {
                    continue;
                }
                let Some(property) = self.get_own_property(holder, &key)? else {
                    continue;
                };
                let attributes = property.attributes;
                if (filter.contains(KeyFilter::ENUMERABLE) && !attributes.enumerable())
                    || (filter.contains(KeyFilter::WRITABLE) && !attributes.writable())
                    || (filter.contains(KeyFilter::CONFIGURABLE) && !attributes.configurable())
                {
                    continue;
                }
                names.push(key.to_val());
            }
            current = match mode {
                KeyCollectionMode::OwnOnly => None,
                KeyCollectionMode::IncludePrototypes => self.get_prototype(holder),
            };
        }
        Ok(names)
    }
}

impl NodeApi for ReferenceEnv {
    fn open_env_scope(&self) -> NapiResult<NapiEnvScope> {
        let mut state = self.state.borrow_mut();
        state.env_depth += 1;
        Ok(NapiEnvScope::from_raw(state.env_depth))
    }

    fn close_env_scope(&self, scope: NapiEnvScope) -> NapiResult<()> {
        let released = {
            let mut state = self.state.borrow_mut();
            if scope.raw() != state.env_depth || state.env_depth == 0 {
                return Err(NapiStatus::InvalidArg);
            }
            state.env_depth -= 1;
            let released = state.env_depth == 0 && state.handle_scopes.is_empty();
            if released {
                state.handles.clear();
            }
            released && state.exec_depth == 0
        };
        if released {
            self.maybe_collect();
        }
        Ok(())
    }

    fn open_handle_scope(&self) -> NapiResult<NapiHandleScope> {
        let mut state = self.state.borrow_mut();
        let mark = state.handles.len();
        state.handle_scopes.push(mark);
        Ok(NapiHandleScope::from_raw((state.handle_scopes.len() - 1) as u32))
    }

    fn close_handle_scope(&self, scope: NapiHandleScope) -> NapiResult<()> {
        let mut state = self.state.borrow_mut();
        if state.handle_scopes.len().checked_sub(1) != Some(scope.raw() as usize) {
            return Err(NapiStatus::HandleScopeMismatch);
        }
        if let Some(mark) = state.handle_scopes.pop() {
            state.handles.truncate(mark);
        }
        Ok(())
    }

    fn create_reference(&self, value: NapiValue) -> NapiResult<NapiRef> {
        let value = self.resolve(value)?;
        Ok(self.new_reference(value, 1, None))
    }

    fn create_weak_reference(&self, value: NapiValue) -> NapiResult<NapiRef> {
        let value = self.resolve(value)?;
        Ok(self.new_reference(value, 0, None))
    }

    fn reference_ref(&self, reference: NapiRef) -> NapiResult<()> {
        self.reference_entry(reference, |entry| entry.count += 1)
    }

    fn reference_unref(&self, reference: NapiRef) -> NapiResult<()> {
        let remaining = self.reference_entry(reference, |entry| {
            entry.count = entry.count.saturating_sub(1);
            entry.count
        })?;
        if remaining == 0 {
            self.delete_reference(reference);
        }
        Ok(())
    }

    fn get_reference_value(&self, reference: NapiRef) -> NapiResult<Option<NapiValue>> {
        let value = self.reference_entry(reference, |entry| entry.value.clone())?;
        Ok(value.map(|value| self.push_handle(value)))
    }

    fn get_unique_string_ref(&self, value: NapiValue) -> NapiResult<NapiRef> {
        let text = self.resolve_string(value)?;
        Ok(self.intern(text))
    }

    fn get_unique_string_utf8_ref(&self, utf8: &[u8]) -> NapiResult<NapiRef> {
        let text = std::str::from_utf8(utf8).map_err(|_| NapiStatus::InvalidArg)?;
        Ok(self.intern(Rc::from(text)))
    }

    fn get_undefined(&self) -> NapiResult<NapiValue> {
        Ok(self.push_handle(Val::Undefined))
    }

    fn get_null(&self) -> NapiResult<NapiValue> {
        Ok(self.push_handle(Val::Null))
    }

    fn get_global(&self) -> NapiResult<NapiValue> {
        let global = self.realm().global;
        Ok(self.push_handle(Val::Object(global)))
    }

    fn get_boolean(&self, value: bool) -> NapiResult<NapiValue> {
        Ok(self.push_handle(Val::Bool(value)))
    }

    fn get_value_bool(&self, value: NapiValue) -> NapiResult<bool> {
        match self.resolve(value)? {
            Val::Bool(b) => Ok(b),
            _ => Err(NapiStatus::BooleanExpected),
        }
    }

    fn create_double(&self, value: f64) -> NapiResult<NapiValue> {
        Ok(self.push_handle(Val::Number(value)))
    }

    fn get_value_double(&self, value: NapiValue) -> NapiResult<f64> {
        match self.resolve(value)? {
            Val::Number(n) => Ok(n),
            _ => Err(NapiStatus::NumberExpected),
        }
    }

    fn create_string_latin1(&self, latin1: &[u8]) -> NapiResult<NapiValue> {
        let text: String = latin1.iter().map(|&byte| char::from(byte)).collect();
        Ok(self.push_handle(Val::str(&text)))
    }

    fn create_string_utf8(&self, utf8: &[u8]) -> NapiResult<NapiValue> {
        let text = String::from_utf8_lossy(utf8);
        Ok(self.push_handle(Val::str(&text)))
    }

    fn get_value_string_utf8(&self, value: NapiValue) -> NapiResult<String> {
        Ok(self.resolve_string(value)?.to_string())
    }

    fn create_symbol(&self, description: Option<NapiValue>) -> NapiResult<NapiValue> {
        let description = description
            .map(|value| self.resolve_string(value))
            .transpose()?;
        Ok(self.push_handle(Val::Symbol(Rc::new(SymbolData { description }))))
    }

    fn type_of(&self, value: NapiValue) -> NapiResult<NapiValueType> {
        let value = self.resolve(value)?;
        Ok(self.value_type(&value))
    }

    fn strict_equals(&self, a: NapiValue, b: NapiValue) -> NapiResult<bool> {
        Ok(self.resolve(a)?.strict_equals(&self.resolve(b)?))
    }

    fn create_object(&self) -> NapiResult<NapiValue> {
        let object = Val::Object(self.new_object());
        Ok(self.push_handle(object))
    }

    fn get_property(&self, object: NapiValue, key: NapiValue) -> NapiResult<NapiValue> {
        let object = self.resolve(object)?;
        if object.is_nullish() {
            return Err(NapiStatus::ObjectExpected);
        }
        let key = self.resolve_key(key)?;
        let value = self.run_js(|| self.get(&object, &key))?;
        Ok(self.push_handle(value))
    }

    fn set_property(&self, object: NapiValue, key: NapiValue, value: NapiValue) -> NapiResult<()> {
        let id = self.resolve_object(object)?;
        let key = self.resolve_key(key)?;
        let value = self.resolve(value)?;
        self.run_js(|| self.set_on(id, key, value, &Val::Object(id)))
    }

    fn has_property(&self, object: NapiValue, key: NapiValue) -> NapiResult<bool> {
        let id = self.resolve_object(object)?;
        let key = self.resolve_key(key)?;
        self.run_js(|| self.has(id, &key))
    }

    fn define_properties(
        &self,
        object: NapiValue,
        properties: &[NapiPropertyDescriptor],
    ) -> NapiResult<()> {
        let id = self.resolve_object(object)?;
        for descriptor in properties {
            let key = match self.resolve(descriptor.name)? {
                Val::Str(s) => PropKey::Str(s),
                Val::Symbol(symbol) => PropKey::Symbol(symbol),
                _ => return Err(NapiStatus::NameExpected),
            };
            let value = self.resolve(descriptor.value)?;
            self.define_own_property(
                id,
                key,
                Property {
                    value,
                    attributes: descriptor.attributes,
                },
            );
        }
        Ok(())
    }

    fn get_all_property_names(
        &self,
        object: NapiValue,
        mode: KeyCollectionMode,
        filter: KeyFilter,
        _conversion: KeyConversion,
    ) -> NapiResult<NapiValue> {
        let id = self.resolve_object(object)?;
        let names = self.run_js(|| self.collect_property_names(id, mode, filter))?;
        let array = self.create_array(names);
        Ok(self.push_handle(array))
    }

    fn instance_of(&self, object: NapiValue, constructor: NapiValue) -> NapiResult<bool> {
        let object = self.resolve(object)?;
        let constructor = self.resolve(constructor)?;
        if !self.is_callable(&constructor) {
            return Err(NapiStatus::FunctionExpected);
        }
        self.run_js(|| self.value_instance_of(&object, &constructor))
    }

    fn create_array_with_length(&self, length: usize) -> NapiResult<NapiValue> {
        let array = self.create_array(vec![Val::Undefined; length]);
        Ok(self.push_handle(array))
    }

    fn get_array_length(&self, array: NapiValue) -> NapiResult<u32> {
        let id = self.resolve_object(array).map_err(|_| NapiStatus::ArrayExpected)?;
        self.with_object(id, |obj| match &obj.kind {
            ObjectKind::Array(elements) => Ok(elements.len() as u32),
            _ => Err(NapiStatus::ArrayExpected),
        })
    }

    fn get_element(&self, object: NapiValue, index: u32) -> NapiResult<NapiValue> {
        let object = self.resolve(object)?;
        if !matches!(object, Val::Object(_)) {
            return Err(NapiStatus::ObjectExpected);
        }
        let key = PropKey::str(&index.to_string());
        let value = self.run_js(|| self.get(&object, &key))?;
        Ok(self.push_handle(value))
    }

    fn set_element(&self, object: NapiValue, index: u32, value: NapiValue) -> NapiResult<()> {
        let id = self.resolve_object(object)?;
        let value = self.resolve(value)?;
        let key = PropKey::str(&index.to_string());
        self.run_js(|| self.set_on(id, key, value, &Val::Object(id)))
    }

    fn is_array(&self, value: NapiValue) -> NapiResult<bool> {
        let value = self.resolve(value)?;
        Ok(self.is_array_value(&value))
    }

    fn is_arraybuffer(&self, value: NapiValue) -> NapiResult<bool> {
        Ok(match self.resolve(value)? {
            Val::Object(id) => {
                self.with_object(id, |obj| matches!(obj.kind, ObjectKind::ArrayBuffer(_)))
            }
            _ => false,
        })
    }

    fn get_arraybuffer_info(&self, value: NapiValue) -> NapiResult<(BackingStore, usize)> {
        let id = self
            .resolve_object(value)
            .map_err(|_| NapiStatus::ArraybufferExpected)?;
        self.with_object(id, |obj| match &obj.kind {
            ObjectKind::ArrayBuffer(store) => {
                let length = store.borrow().len();
                Ok((store.clone(), length))
            }
            _ => Err(NapiStatus::ArraybufferExpected),
        })
    }

    fn create_function(
        &self,
        name: &str,
        callback: NapiCallback,
        data: Option<Rc<dyn Any>>,
    ) -> NapiResult<NapiValue> {
        let function =
            self.create_function_object(FunctionKind::Native { callback, data }, name, 0);
        Ok(self.push_handle(function))
    }

    fn call_function(
        &self,
        this: NapiValue,
        func: NapiValue,
        args: &[NapiValue],
    ) -> NapiResult<NapiValue> {
        let this = self.resolve(this)?;
        let func = self.resolve(func)?;
        if !self.is_callable(&func) {
            return Err(NapiStatus::FunctionExpected);
        }
        let args = args
            .iter()
            .map(|&arg| self.resolve(arg))
            .collect::<NapiResult<Vec<_>>>()?;
        let result = self.run_js(|| self.call(&func, this, &args))?;
        Ok(self.push_handle(result))
    }

    fn new_instance(&self, constructor: NapiValue, args: &[NapiValue]) -> NapiResult<NapiValue> {
        let constructor = self.resolve(constructor)?;
        if !self.is_callable(&constructor) {
            return Err(NapiStatus::FunctionExpected);
        }
        let args = args
            .iter()
            .map(|&arg| self.resolve(arg))
            .collect::<NapiResult<Vec<_>>>()?;
        let result = self.run_js(|| self.construct(&constructor, &args))?;
        Ok(self.push_handle(result))
    }

    fn create_external(&self, data: Rc<dyn Any>) -> NapiResult<NapiValue> {
        let external = self.new_external(data);
        Ok(self.push_handle(external))
    }

    fn get_value_external(&self, value: NapiValue) -> NapiResult<Rc<dyn Any>> {
        let id = self.resolve_object(value).map_err(|_| NapiStatus::InvalidArg)?;
        self.with_object(id, |obj| match &obj.kind {
            ObjectKind::External(data) => Ok(data.clone()),
            _ => Err(NapiStatus::InvalidArg),
        })
    }

    fn throw(&self, error: NapiValue) -> NapiResult<()> {
        let error = self.resolve(error)?;
        self.state.borrow_mut().pending_exception = Some(error);
        Ok(())
    }

    fn throw_error(&self, code: Option<&str>, message: &str) -> NapiResult<()> {
        let error = self.make_error(ErrorKind::Error, Some(message));
        if let (Some(code), Val::Object(id)) = (code, &error) {
            self.with_object_mut(*id, |obj| {
                obj.props
                    .insert(PropKey::str("code"), Property::data(Val::str(code)));
            });
        }
        self.state.borrow_mut().pending_exception = Some(error);
        Ok(())
    }

    fn is_exception_pending(&self) -> NapiResult<bool> {
        Ok(self.state.borrow().pending_exception.is_some())
    }

    fn get_and_clear_last_exception(&self) -> NapiResult<NapiValue> {
        let exception = self.state.borrow_mut().pending_exception.take();
        Ok(self.push_handle(exception.unwrap_or(Val::Undefined)))
    }

    fn run_script(&self, source: NapiValue, source_url: &str) -> NapiResult<NapiValue> {
        let source = self.resolve_string(source)?;
        let result = self.run_js(|| {
            let program = self.compile(&source)?;
            self.run_program(&program, source_url)
        })?;
        Ok(self.push_handle(result))
    }

    fn serialize_script(&self, source: NapiValue, source_url: &str) -> NapiResult<Vec<u8>> {
        let source = self.resolve_string(source)?;
        let program = self.run_js(|| self.compile(&source))?;
        let bytes = codec::encode(&source, &program).map_err(|err| {
            tracing::warn!(source_url, error = %err, "failed to serialize script");
            NapiStatus::GenericFailure
        })?;
        tracing::trace!(source_url, bytes = bytes.len(), "serialized script");
        Ok(bytes)
    }

    fn run_serialized_script(
        &self,
        buffer: &[u8],
        source: NapiValue,
        source_url: &str,
    ) -> NapiResult<NapiValue> {
        let source = self.resolve_string(source)?;
        let decoded = codec::decode(buffer, &source).map_err(|err| {
            tracing::debug!(source_url, error = %err, "rejected serialized script");
            NapiStatus::InvalidArg
        })?;
        let result = self.run_js(|| {
            let program = match decoded.program {
                Some(program) => Rc::new(program),
                None => self.compile(&source)?,
            };
            self.run_program(&program, source_url)
        })?;
        Ok(self.push_handle(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NapiCallbackInfo;

    fn script(env: &ReferenceEnv, source: &str) -> NapiResult<NapiValue> {
        let source = env.create_string_utf8(source.as_bytes())?;
        env.run_script(source, "test.js")
    }

    #[test]
    fn test_run_script_returns_completion_value() {
        let env = ReferenceEnv::new();
        let value = script(&env, "1 + 2").expect("runs");
        assert_eq!(env.get_value_double(value), Ok(3.0));
    }

    #[test]
    fn test_throw_sets_pending_exception() {
        let env = ReferenceEnv::new();
        assert_eq!(
            script(&env, "throw new Error('x')"),
            Err(NapiStatus::PendingException)
        );
        assert_eq!(env.is_exception_pending(), Ok(true));
        // Script execution refuses to start while an exception is pending.
        assert_eq!(script(&env, "1"), Err(NapiStatus::PendingException));
        let exception = env.get_and_clear_last_exception().expect("exception");
        let key = env.create_string_utf8(b"message").expect("key");
        let message = env.get_property(exception, key).expect("message");
        assert_eq!(env.get_value_string_utf8(message).as_deref(), Ok("x"));
        assert_eq!(env.is_exception_pending(), Ok(false));
    }

    #[test]
    fn test_handle_scope_releases_handles() {
        let env = ReferenceEnv::new();
        let scope = env.open_handle_scope().expect("scope");
        for _ in 0..5 {
            env.create_object().expect("object");
        }
        assert_eq!(env.open_handle_count(), 5);
        env.close_handle_scope(scope).expect("close");
        assert_eq!(env.open_handle_count(), 0);
    }

    #[test]
    fn test_handle_scope_mismatch() {
        let env = ReferenceEnv::new();
        let outer = env.open_handle_scope().expect("outer");
        let inner = env.open_handle_scope().expect("inner");
        assert_eq!(
            env.close_handle_scope(outer),
            Err(NapiStatus::HandleScopeMismatch)
        );
        env.close_handle_scope(inner).expect("inner closes");
        env.close_handle_scope(outer).expect("outer closes");
    }

    #[test]
    fn test_unique_strings_share_a_reference() {
        let env = ReferenceEnv::new();
        let a = env.get_unique_string_utf8_ref(b"name").expect("ref");
        let value = env.create_string_utf8(b"name").expect("string");
        let b = env.get_unique_string_ref(value).expect("ref");
        assert_eq!(a, b);
        env.reference_unref(a).expect("unref");
        assert_eq!(env.live_references(), 1);
        env.reference_unref(b).expect("unref");
        assert_eq!(env.live_references(), 0);
        let c = env.get_unique_string_utf8_ref(b"name").expect("ref");
        assert!(env.get_reference_value(c).expect("value").is_some());
    }

    #[test]
    fn test_weak_reference_cleared_by_collection() {
        let env = ReferenceEnv::new();
        let object = env.create_object().expect("object");
        let strong = env.create_reference(object).expect("strong");
        let weak = env.create_weak_reference(object).expect("weak");

        // Handles at base level are released by closing the outermost env scope.
        let scope = env.open_env_scope().expect("env scope");
        env.close_env_scope(scope).expect("close env scope");
        env.collect_garbage().expect("collects");
        assert!(env.get_reference_value(weak).expect("weak").is_some());

        env.reference_unref(strong).expect("unref");
        env.collect_garbage().expect("collects");
        assert_eq!(env.get_reference_value(weak), Ok(None));
    }

    #[test]
    fn test_native_callback_sees_arguments() {
        fn add(env: &dyn NodeApi, info: &NapiCallbackInfo) -> Option<NapiValue> {
            let sum: f64 = info
                .args()
                .iter()
                .filter_map(|&arg| env.get_value_double(arg).ok())
                .sum();
            env.create_double(sum).ok()
        }
        let env = ReferenceEnv::new();
        let function = env.create_function("add", add, None).expect("function");
        let undefined = env.get_undefined().expect("undefined");
        let one = env.create_double(1.0).expect("1");
        let two = env.create_double(2.0).expect("2");
        let result = env
            .call_function(undefined, function, &[one, two])
            .expect("call");
        assert_eq!(env.get_value_double(result), Ok(3.0));
    }

    #[test]
    fn test_native_callback_exception_propagates() {
        fn fail(env: &dyn NodeApi, _info: &NapiCallbackInfo) -> Option<NapiValue> {
            env.throw_error(Some("E_FAIL"), "native failure").ok()?;
            None
        }
        let env = ReferenceEnv::new();
        let function = env.create_function("fail", fail, None).expect("function");
        let global = env.get_global().expect("global");
        let name = env.create_string_utf8(b"fail").expect("name");
        env.set_property(global, name, function).expect("install");
        let result = script(&env, "var r; try { fail(); } catch (e) { r = e.code + ':' + e.message; } r")
            .expect("caught in script");
        assert_eq!(
            env.get_value_string_utf8(result).as_deref(),
            Ok("E_FAIL:native failure")
        );
    }

    #[test]
    fn test_serialized_script_round_trip() {
        let env = ReferenceEnv::new();
        let source = env.create_string_utf8(b"var x = 20; x + 22").expect("source");
        let bytes = env.serialize_script(source, "a.js").expect("serialize");
        let result = env
            .run_serialized_script(&bytes, source, "a.js")
            .expect("run");
        assert_eq!(env.get_value_double(result), Ok(42.0));
        assert_eq!(
            env.run_serialized_script(b"junk", source, "a.js"),
            Err(NapiStatus::InvalidArg)
        );
    }

    #[test]
    fn test_property_names_follow_filter() {
        let env = ReferenceEnv::new();
        let object = script(&env, "var o = { a: 1, b: 2 }; Object.defineProperty(o, 'hidden', { value: 3 }); o")
            .expect("object");
        let names = env
            .get_all_property_names(
                object,
                KeyCollectionMode::IncludePrototypes,
                KeyFilter::ENUMERABLE | KeyFilter::SKIP_SYMBOLS,
                KeyConversion::NumbersToStrings,
            )
            .expect("names");
        assert_eq!(env.get_array_length(names), Ok(2));
        let first = env.get_element(names, 0).expect("first");
        assert_eq!(env.get_value_string_utf8(first).as_deref(), Ok("a"));
    }
}
