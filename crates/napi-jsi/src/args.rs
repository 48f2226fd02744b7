//! Frame-local argument marshalling.
//!
//! Up to [`MAX_STACK_ARG_COUNT`] arguments are kept inline; longer lists
//! spill to the heap.

use jsi_core::{JsiResult, PropNameId, Value};
use napi_env::NapiValue;
use smallvec::SmallVec;

use crate::pointer::view;
use crate::runtime::NapiJsiRuntime;

pub(crate) const MAX_STACK_ARG_COUNT: usize = 8;

/// Engine handles passed to `call_function` and `new_instance`.
pub(crate) type NapiValueArgs = SmallVec<[NapiValue; MAX_STACK_ARG_COUNT]>;

/// Views over the arguments of a native callback.
pub(crate) struct JsiValueViewArgs {
    values: SmallVec<[Value; MAX_STACK_ARG_COUNT]>,
}

impl JsiValueViewArgs {
    pub(crate) fn new(rt: &NapiJsiRuntime, args: &[NapiValue]) -> JsiResult<Self> {
        let values = args
            .iter()
            .map(|&arg| rt.value_view(arg))
            .collect::<JsiResult<_>>()?;
        Ok(Self { values })
    }

    pub(crate) fn as_slice(&self) -> &[Value] {
        &self.values
    }

    #[cfg(test)]
    fn spilled(&self) -> bool {
        self.values.spilled()
    }
}

/// Property name view over a callback argument.
pub(crate) fn prop_name_view(name: NapiValue) -> PropNameId {
    PropNameId::from_pointer(view(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use napi_env::{NodeApi, ReferenceEnv};

    use crate::runtime::EnvScope;

    #[test]
    fn test_inline_up_to_threshold() {
        let env = Rc::new(ReferenceEnv::new());
        let rt = NapiJsiRuntime::new(env.clone()).unwrap();
        let _scope = EnvScope::open(&*env);

        let handles: Vec<NapiValue> = (0..MAX_STACK_ARG_COUNT)
            .map(|n| env.create_double(n as f64).unwrap())
            .collect();
        let args = JsiValueViewArgs::new(&rt, &handles).unwrap();
        assert!(!args.spilled());
        assert_eq!(args.as_slice().len(), MAX_STACK_ARG_COUNT);
        assert_eq!(args.as_slice()[3].as_number(), Some(3.0));

        let more: Vec<NapiValue> = (0..MAX_STACK_ARG_COUNT + 1)
            .map(|_| env.get_null().unwrap())
            .collect();
        let args = JsiValueViewArgs::new(&rt, &more).unwrap();
        assert!(args.spilled());
        assert!(args.as_slice().iter().all(Value::is_null));
    }

    #[test]
    fn test_outgoing_args_keep_order() {
        let env = Rc::new(ReferenceEnv::new());
        let rt = NapiJsiRuntime::new(env.clone()).unwrap();
        let _scope = EnvScope::open(&*env);

        let values = [Value::from(1), Value::Null, Value::from(true)];
        let handles = rt.napi_value_args(&values).unwrap();
        assert!(!handles.spilled());
        assert_eq!(env.get_value_double(handles[0]).unwrap(), 1.0);
        assert!(env.get_value_bool(handles[2]).unwrap());
    }
}
