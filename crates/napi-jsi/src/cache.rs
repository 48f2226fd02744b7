//! Property names and values resolved once per runtime.

use std::rc::{Rc, Weak};

use napi_env::{NapiRef, NapiResult, NapiStatus, NapiValue, NodeApi};
use once_cell::unsync::OnceCell;
use tracing::warn;

/// A strong engine reference released on drop.
pub(crate) struct NapiRefHolder {
    env: Weak<dyn NodeApi>,
    reference: NapiRef,
}

impl NapiRefHolder {
    pub(crate) fn new(env: &Rc<dyn NodeApi>, reference: NapiRef) -> Self {
        Self {
            env: Rc::downgrade(env),
            reference,
        }
    }

    /// Take a strong reference to `value`.
    pub(crate) fn from_value(env: &Rc<dyn NodeApi>, value: NapiValue) -> NapiResult<Self> {
        Ok(Self::new(env, env.create_reference(value)?))
    }

    pub(crate) fn reference(&self) -> NapiRef {
        self.reference
    }

    /// Handle in the current scope.
    pub(crate) fn value(&self, env: &dyn NodeApi) -> NapiResult<NapiValue> {
        env.get_reference_value(self.reference)?
            .ok_or(NapiStatus::GenericFailure)
    }
}

impl Drop for NapiRefHolder {
    fn drop(&mut self) {
        if let Some(env) = self.env.upgrade() {
            if let Err(status) = env.reference_unref(self.reference) {
                warn!(status = status.code(), "failed to release cached reference");
            }
        }
    }
}

/// Interned property names and the two marker symbols.
pub(crate) struct PropertyIds {
    pub(crate) error: NapiRefHolder,
    pub(crate) proxy: NapiRefHolder,
    pub(crate) symbol: NapiRefHolder,
    pub(crate) configurable: NapiRefHolder,
    pub(crate) enumerable: NapiRefHolder,
    pub(crate) get: NapiRefHolder,
    pub(crate) get_own_property_descriptor: NapiRefHolder,
    pub(crate) host_function_symbol: NapiRefHolder,
    pub(crate) host_object_symbol: NapiRefHolder,
    pub(crate) length: NapiRefHolder,
    pub(crate) message: NapiRefHolder,
    pub(crate) own_keys: NapiRefHolder,
    pub(crate) prototype: NapiRefHolder,
    pub(crate) set: NapiRefHolder,
    pub(crate) to_string: NapiRefHolder,
    pub(crate) value: NapiRefHolder,
    pub(crate) writable: NapiRefHolder,
}

impl PropertyIds {
    pub(crate) fn new(env: &Rc<dyn NodeApi>) -> NapiResult<Self> {
        let name = |text: &str| -> NapiResult<NapiRefHolder> {
            Ok(NapiRefHolder::new(env, env.get_unique_string_utf8_ref(text.as_bytes())?))
        };
        let symbol = |description: &str| -> NapiResult<NapiRefHolder> {
            let description = env.create_string_utf8(description.as_bytes())?;
            NapiRefHolder::from_value(env, env.create_symbol(Some(description))?)
        };
        Ok(Self {
            error: name("Error")?,
            proxy: name("Proxy")?,
            symbol: name("Symbol")?,
            configurable: name("configurable")?,
            enumerable: name("enumerable")?,
            get: name("get")?,
            get_own_property_descriptor: name("getOwnPropertyDescriptor")?,
            host_function_symbol: symbol("hostFunctionSymbol")?,
            host_object_symbol: symbol("hostObjectSymbol")?,
            length: name("length")?,
            message: name("message")?,
            own_keys: name("ownKeys")?,
            prototype: name("prototype")?,
            set: name("set")?,
            to_string: name("toString")?,
            value: name("value")?,
            writable: name("writable")?,
        })
    }
}

/// Well-known values. The last three are built on first use.
pub(crate) struct CachedValues {
    pub(crate) undefined: NapiRefHolder,
    pub(crate) null: NapiRefHolder,
    pub(crate) true_value: NapiRefHolder,
    pub(crate) false_value: NapiRefHolder,
    pub(crate) global: NapiRefHolder,
    pub(crate) error: NapiRefHolder,
    pub(crate) proxy_constructor: OnceCell<NapiRefHolder>,
    pub(crate) host_object_proxy_handler: OnceCell<NapiRefHolder>,
    pub(crate) symbol_to_string: OnceCell<NapiRefHolder>,
}

impl CachedValues {
    pub(crate) fn new(env: &Rc<dyn NodeApi>, ids: &PropertyIds) -> NapiResult<Self> {
        let global = env.get_global()?;
        let error = env.get_property(global, ids.error.value(env.as_ref())?)?;
        Ok(Self {
            undefined: NapiRefHolder::from_value(env, env.get_undefined()?)?,
            null: NapiRefHolder::from_value(env, env.get_null()?)?,
            true_value: NapiRefHolder::from_value(env, env.get_boolean(true)?)?,
            false_value: NapiRefHolder::from_value(env, env.get_boolean(false)?)?,
            global: NapiRefHolder::from_value(env, global)?,
            error: NapiRefHolder::from_value(env, error)?,
            proxy_constructor: OnceCell::new(),
            host_object_proxy_handler: OnceCell::new(),
            symbol_to_string: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use napi_env::{NapiValueType, ReferenceEnv};

    fn reference_env() -> (Rc<ReferenceEnv>, Rc<dyn NodeApi>) {
        let env = Rc::new(ReferenceEnv::new());
        let api: Rc<dyn NodeApi> = env.clone();
        (env, api)
    }

    #[test]
    fn test_cached_values_resolve() {
        let (_env, api) = reference_env();
        let scope = api.open_env_scope().unwrap();
        let ids = PropertyIds::new(&api).unwrap();
        let values = CachedValues::new(&api, &ids).unwrap();

        let error = values.error.value(api.as_ref()).unwrap();
        assert_eq!(api.type_of(error).unwrap(), NapiValueType::Function);
        let marker = ids.host_object_symbol.value(api.as_ref()).unwrap();
        assert_eq!(api.type_of(marker).unwrap(), NapiValueType::Symbol);
        let truth = values.true_value.value(api.as_ref()).unwrap();
        assert!(api.get_value_bool(truth).unwrap());
        assert!(values.proxy_constructor.get().is_none());
        api.close_env_scope(scope).unwrap();
    }

    #[test]
    fn test_holders_release_references() {
        let (env, api) = reference_env();
        let before = env.live_references();
        let scope = api.open_env_scope().unwrap();
        let ids = PropertyIds::new(&api).unwrap();
        let values = CachedValues::new(&api, &ids).unwrap();
        api.close_env_scope(scope).unwrap();
        assert!(env.live_references() > before);

        drop(values);
        drop(ids);
        assert_eq!(env.live_references(), before);
    }

    #[test]
    fn test_names_are_interned() {
        let (_env, api) = reference_env();
        let ids = PropertyIds::new(&api).unwrap();
        let again = api.get_unique_string_utf8_ref(b"length").unwrap();
        assert_eq!(again, ids.length.reference());
        api.reference_unref(again).unwrap();
    }
}
