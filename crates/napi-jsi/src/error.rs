//! Translation between engine status codes, script exceptions and host
//! errors.
//!
//! Three tiers: a script exception becomes [`JsiError::Js`], any other
//! failing status becomes [`JsiError::Native`], and a broken adapter
//! invariant ends the process through [`fatal`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use jsi_core::{JsError, JsiError, JsiResult};
use napi_env::{NapiResult, NapiStatus, NapiValue, NapiValueType};
use tracing::{error, warn};

use crate::runtime::NapiJsiRuntime;

const STACK_OVERFLOW_MESSAGE: &str = "Out of stack space";
const NORMALIZED_STACK_OVERFLOW_MESSAGE: &str = "RangeError : Maximum call stack size exceeded";

/// Abort on a violated adapter invariant.
pub(crate) fn fatal(message: &str) -> ! {
    error!(message, "fatal NodeApi JSI runtime error");
    std::process::abort()
}

/// Native error for a status that carries no script exception.
pub(crate) fn status_error(status: NapiStatus) -> JsiError {
    JsiError::native(format!(
        "A call to NodeApi returned error code 0x{:x}.",
        status.code()
    ))
}

/// Prefix native errors with the host method that raised them.
///
/// Script errors pass through untouched.
pub(crate) fn run_in_method_context<T>(
    method: impl FnOnce() -> String,
    f: impl FnOnce() -> JsiResult<T>,
) -> JsiResult<T> {
    f().map_err(|err| match err {
        JsiError::Js(_) => err,
        JsiError::Native(message) => {
            JsiError::Native(format!("Exception in {}: {message}", method()))
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unexpected error".to_string()
    }
}

impl NapiJsiRuntime {
    pub(crate) fn check<T>(&self, result: NapiResult<T>) -> JsiResult<T> {
        result.map_err(|status| self.throw_js_exception(status))
    }

    /// Convert a failing status, consuming the pending engine exception.
    pub(crate) fn throw_js_exception(&self, status: NapiStatus) -> JsiError {
        let env = self.api();
        let js_error = match env.get_and_clear_last_exception() {
            Ok(value) => value,
            Err(status) => fatal(&format!("Cannot read the pending exception: {status}")),
        };

        let pending = &self.inner().pending_js_error;
        if !pending.get() && (status == NapiStatus::PendingException || self.is_error(js_error)) {
            let previous = pending.replace(true);
            let _restore = scopeguard::guard(previous, |previous| pending.set(previous));
            self.rewrite_error_message(js_error);
            return match self.to_jsi_value(js_error) {
                Ok(value) => JsError::from_value(self, value).into(),
                Err(err) => err,
            };
        }
        status_error(status)
    }

    fn is_error(&self, value: NapiValue) -> bool {
        let env = self.api();
        self.inner()
            .value
            .error
            .value(env)
            .and_then(|ctor| env.instance_of(value, ctor))
            .unwrap_or(false)
    }

    /// Replace the engine's stack overflow message.
    ///
    /// Must not fail: a throwing `message` getter is cleared and ignored.
    fn rewrite_error_message(&self, js_error: NapiValue) {
        if !self.inner().config.normalize_stack_overflow {
            return;
        }
        let env = self.api();
        let Ok(key) = self.inner().property_id.message.value(env) else {
            return;
        };
        let message = match env.get_property(js_error, key) {
            Ok(message) => message,
            Err(_) => {
                let _ = env.get_and_clear_last_exception();
                return;
            }
        };
        if env.type_of(message) != Ok(NapiValueType::String) {
            return;
        }
        if !matches!(env.get_value_string_utf8(message).as_deref(), Ok(STACK_OVERFLOW_MESSAGE)) {
            return;
        }
        let rewritten = env
            .create_string_utf8(NORMALIZED_STACK_OVERFLOW_MESSAGE.as_bytes())
            .and_then(|text| env.set_property(js_error, key, text));
        if rewritten.is_err() {
            let _ = env.get_and_clear_last_exception();
        }
    }

    /// Run a native callback body, turning every failure into a pending
    /// engine exception. `None` returns `undefined` to the script.
    pub(crate) fn handle_callback_exceptions(
        &self,
        f: impl FnOnce() -> JsiResult<NapiValue>,
    ) -> Option<NapiValue> {
        let message = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(JsiError::Js(err))) => match self.value_to_napi(err.value()) {
                Ok(value) => match self.api().throw(value) {
                    Ok(()) => return None,
                    Err(_) => err.message().to_string(),
                },
                Err(convert) => convert.to_string(),
            },
            Ok(Err(JsiError::Native(message))) => {
                warn!(%message, "native exception at callback boundary");
                message
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "panic at callback boundary");
                message
            }
        };
        if let Err(status) = self.api().throw_error(Some("Unknown"), &message) {
            warn!(status = status.code(), "failed to raise callback error");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = status_error(NapiStatus::ObjectExpected);
        assert_eq!(err.message(), "A call to NodeApi returned error code 0x2.");
        let err = status_error(NapiStatus::ArraybufferExpected);
        assert_eq!(err.message(), "A call to NodeApi returned error code 0x13.");
    }

    #[test]
    fn test_method_context_prefixes_native_errors() {
        let err = run_in_method_context(
            || "HostObject::get(propName:x)".to_string(),
            || -> JsiResult<()> { Err(JsiError::native("boom")) },
        )
        .unwrap_err();
        assert_eq!(err.message(), "Exception in HostObject::get(propName:x): boom");
    }

    #[test]
    fn test_method_context_passes_values_through() {
        let value = run_in_method_context(|| unreachable!(), || Ok(5)).unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "Unexpected error");
    }
}
