//! Host objects and host functions.
//!
//! A host object is exposed as `new Proxy(target, handler)`: the target holds
//! an external with the [`HostObject`] under the host-object marker symbol,
//! and one handler shared by all host objects routes the `get`, `set`,
//! `ownKeys` and `getOwnPropertyDescriptor` traps back to it.
//!
//! A host function is a native function whose callback data is a
//! [`HostFunctionWrapper`]. The same wrapper is also stored as an external
//! under the host-function marker symbol so it can be recovered from the
//! function object.

use std::any::Any;
use std::rc::{Rc, Weak};

use jsi_core::{HostFunction, HostObject, JsiError, JsiResult};
use napi_env::{
    NapiCallbackInfo, NapiPropertyDescriptor, NapiValue, NapiValueType, NodeApi, PropertyAttributes,
};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::args::{JsiValueViewArgs, prop_name_view};
use crate::cache::{NapiRefHolder, PropertyIds};
use crate::error::{fatal, run_in_method_context};
use crate::pointer::{NapiHandle, handle_of};
use crate::runtime::{NapiJsiRuntime, RuntimeInner};

/// External payload of a host object proxy target.
pub(crate) struct HostObjectHolder(Rc<dyn HostObject>);

impl HostObjectHolder {
    pub(crate) fn new(host: Rc<dyn HostObject>) -> Self {
        Self(host)
    }

    pub(crate) fn host(&self) -> Rc<dyn HostObject> {
        self.0.clone()
    }
}

pub(crate) struct HostFunctionWrapper {
    runtime: Weak<RuntimeInner>,
    func: HostFunction,
}

impl HostFunctionWrapper {
    pub(crate) fn new(runtime: Weak<RuntimeInner>, func: HostFunction) -> Self {
        Self { runtime, func }
    }

    pub(crate) fn host_function(&self) -> HostFunction {
        self.func.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProxyTrap {
    Get,
    Set,
    OwnKeys,
    GetOwnPropertyDescriptor,
}

impl ProxyTrap {
    const ALL: [Self; 4] = [
        Self::Get,
        Self::Set,
        Self::OwnKeys,
        Self::GetOwnPropertyDescriptor,
    ];

    fn arity(self) -> usize {
        match self {
            Self::Get => 3,
            Self::Set => 4,
            Self::OwnKeys => 1,
            Self::GetOwnPropertyDescriptor => 2,
        }
    }

    fn name(self, ids: &PropertyIds) -> &NapiRefHolder {
        match self {
            Self::Get => &ids.get,
            Self::Set => &ids.set,
            Self::OwnKeys => &ids.own_keys,
            Self::GetOwnPropertyDescriptor => &ids.get_own_property_descriptor,
        }
    }
}

struct ProxyTrapData {
    runtime: Weak<RuntimeInner>,
    trap: ProxyTrap,
}

fn upgrade(runtime: &Weak<RuntimeInner>) -> NapiJsiRuntime {
    match runtime.upgrade() {
        Some(inner) => NapiJsiRuntime::from_inner(inner),
        None => fatal("The runtime was dropped while the engine still calls into it"),
    }
}

/// Entry point of every host function.
pub(crate) fn host_function_callback(
    _env: &dyn NodeApi,
    info: &NapiCallbackInfo,
) -> Option<NapiValue> {
    let Some(wrapper) = info
        .data()
        .and_then(|data| data.downcast_ref::<HostFunctionWrapper>())
    else {
        fatal("Cannot find the host function");
    };
    let runtime = upgrade(&wrapper.runtime);

    runtime.handle_callback_exceptions(|| {
        let this = runtime.value_view(info.this())?;
        let args = JsiValueViewArgs::new(&runtime, info.args())?;
        let result = run_in_method_context(
            || "HostFunction".to_string(),
            || (wrapper.func)(&runtime, &this, args.as_slice()),
        )?;
        runtime.value_to_napi(&result)
    })
}

fn proxy_trap_callback(_env: &dyn NodeApi, info: &NapiCallbackInfo) -> Option<NapiValue> {
    let Some(data) = info
        .data()
        .and_then(|data| data.downcast_ref::<ProxyTrapData>())
    else {
        fatal("Cannot find the proxy trap");
    };
    let runtime = upgrade(&data.runtime);
    let arity = data.trap.arity();
    if info.argc() != arity {
        fatal(&format!("proxy trap requires {arity} arguments."));
    }

    let args = info.args();
    runtime.handle_callback_exceptions(|| match data.trap {
        ProxyTrap::Get => runtime.host_object_get_trap(args[0], args[1]),
        ProxyTrap::Set => runtime.host_object_set_trap(args[0], args[1], args[2]),
        ProxyTrap::OwnKeys => runtime.host_object_own_keys_trap(args[0]),
        ProxyTrap::GetOwnPropertyDescriptor => {
            runtime.host_object_get_own_property_descriptor_trap(args[0], args[1])
        }
    })
}

impl NapiJsiRuntime {
    /// The handler shared by every host object proxy, built on first use.
    pub(crate) fn host_object_proxy_handler(&self) -> JsiResult<NapiValue> {
        let holder = self
            .inner()
            .value
            .host_object_proxy_handler
            .get_or_try_init(|| {
                trace!("creating host object proxy handler");
                let env = self.api();
                let handler = self.check(env.create_object())?;
                for trap in ProxyTrap::ALL {
                    let name = self.resolve(trap.name(&self.inner().property_id))?;
                    let data: Rc<dyn Any> = Rc::new(ProxyTrapData {
                        runtime: self.downgrade(),
                        trap,
                    });
                    let arity = u32::try_from(trap.arity())
                        .map_err(|_| JsiError::native("Proxy trap arity is out of range"))?;
                    let function =
                        self.create_external_function(name, arity, proxy_trap_callback, data)?;
                    self.check(env.set_property(handler, name, function))?;
                }
                self.check(NapiRefHolder::from_value(self.env(), handler))
            })?;
        self.resolve(holder)
    }

    fn is_symbol(&self, value: NapiValue) -> JsiResult<bool> {
        Ok(self.check(self.api().type_of(value))? == NapiValueType::Symbol)
    }

    /// Text of a property name for error messages.
    fn prop_name_text(&self, name: NapiValue) -> String {
        let text = match self.is_symbol(name) {
            Ok(true) => self.symbol_text(name).ok(),
            _ => self.api().get_value_string_utf8(name).ok(),
        };
        text.unwrap_or_default()
    }

    fn host_object_get_trap(&self, target: NapiValue, name: NapiValue) -> JsiResult<NapiValue> {
        if self.is_symbol(name)? {
            let marker = self.resolve(&self.inner().property_id.host_object_symbol)?;
            if self.check(self.api().strict_equals(name, marker))? {
                return self.check(self.api().get_property(target, marker));
            }
        }
        let host = self.host_object_of(target)?;
        let name_view = prop_name_view(name);
        let result = run_in_method_context(
            || format!("HostObject::get(propName:{})", self.prop_name_text(name)),
            || host.get(self, &name_view),
        )?;
        self.value_to_napi(&result)
    }

    fn host_object_set_trap(
        &self,
        target: NapiValue,
        name: NapiValue,
        value: NapiValue,
    ) -> JsiResult<NapiValue> {
        let host = self.host_object_of(target)?;
        let name_view = prop_name_view(name);
        let value_view = self.value_view(value)?;
        run_in_method_context(
            || format!("HostObject::set(propName:{})", self.prop_name_text(name)),
            || host.set(self, &name_view, &value_view),
        )?;
        self.resolve(&self.inner().value.undefined)
    }

    fn host_object_own_keys_trap(&self, target: NapiValue) -> JsiResult<NapiValue> {
        let env = self.api();
        let host = self.host_object_of(target)?;
        let keys = run_in_method_context(
            || "HostObject::getPropertyNames".to_string(),
            || host.get_property_names(self),
        )?;

        // Identical names share one interned reference; the first occurrence
        // keeps its position. Symbols are their own identity.
        let mut seen = FxHashSet::default();
        let mut unique = Vec::with_capacity(keys.len());
        let mut interned = Vec::new();
        for key in &keys {
            let reference = match handle_of(key.pointer())? {
                NapiHandle::Ref(reference) => reference,
                NapiHandle::Value(value) => {
                    let reference = if self.is_symbol(value)? {
                        self.check(env.create_reference(value))?
                    } else {
                        self.check(env.get_unique_string_ref(value))?
                    };
                    let holder = NapiRefHolder::new(self.env(), reference);
                    let reference = holder.reference();
                    interned.push(holder);
                    reference
                }
            };
            if seen.insert(reference) {
                unique.push(reference);
            }
        }

        let array = self.check(env.create_array_with_length(unique.len()))?;
        for (index, reference) in unique.into_iter().enumerate() {
            let Some(key) = self.check(env.get_reference_value(reference))? else {
                continue;
            };
            self.check(env.set_element(array, Self::index(index)?, key))?;
        }
        Ok(array)
    }

    fn host_object_get_own_property_descriptor_trap(
        &self,
        target: NapiValue,
        name: NapiValue,
    ) -> JsiResult<NapiValue> {
        let host = self.host_object_of(target)?;
        let name_view = prop_name_view(name);
        run_in_method_context(
            || {
                format!(
                    "HostObject::getOwnPropertyDescriptor(propName:{})",
                    self.prop_name_text(name)
                )
            },
            || {
                let env = self.api();
                let ids = &self.inner().property_id;
                let value = self.value_to_napi(&host.get(self, &name_view)?)?;
                let yes = self.resolve(&self.inner().value.true_value)?;
                let property = |name: &NapiRefHolder, value: NapiValue| -> JsiResult<_> {
                    Ok(NapiPropertyDescriptor {
                        name: self.resolve(name)?,
                        value,
                        attributes: PropertyAttributes::ALL,
                    })
                };
                let properties = [
                    property(&ids.value, value)?,
                    property(&ids.writable, yes)?,
                    property(&ids.enumerable, yes)?,
                    property(&ids.configurable, yes)?,
                ];
                let descriptor = self.check(env.create_object())?;
                self.check(env.define_properties(descriptor, &properties))?;
                Ok(descriptor)
            },
        )
    }
}

