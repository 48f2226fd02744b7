//! Error types shared by every runtime implementation.

use thiserror::Error;

use crate::runtime::Runtime;
use crate::value::Value;

/// Errors produced by [`Runtime`] operations.
#[derive(Debug, Error)]
pub enum JsiError {
    /// A script threw; carries the thrown value.
    #[error(transparent)]
    Js(#[from] JsError),

    /// An engine primitive failed for a reason not attributable to script
    /// code (bad argument, environment in an unexpected state, ...).
    #[error("{0}")]
    Native(String),
}

impl JsiError {
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }

    /// Check if this is a script exception.
    pub fn is_js(&self) -> bool {
        matches!(self, Self::Js(_))
    }

    pub fn as_js(&self) -> Option<&JsError> {
        match self {
            Self::Js(err) => Some(err),
            Self::Native(_) => None,
        }
    }

    /// Message without the stack.
    pub fn message(&self) -> &str {
        match self {
            Self::Js(err) => err.message(),
            Self::Native(message) => message,
        }
    }
}

/// Result type for runtime operations
pub type JsiResult<T> = Result<T, JsiError>;

/// A script-level exception.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct JsError {
    value: Value,
    message: String,
    stack: String,
}

impl JsError {
    /// Build an `Error` object with the given message and wrap it.
    pub fn new(rt: &dyn Runtime, message: &str) -> JsiResult<Self> {
        let ctor = rt.global()?.get_property_as_function(rt, "Error")?;
        let text = Value::String(crate::JsiString::create_from_utf8(rt, message)?);
        let value = ctor.call_as_constructor(rt, &[text])?;
        Ok(Self {
            value,
            message: message.to_string(),
            stack: String::new(),
        })
    }

    /// Wrap a thrown value, reading `message` and `stack` best-effort.
    pub fn from_value(rt: &dyn Runtime, value: Value) -> Self {
        let message = read_message(rt, &value)
            .unwrap_or_else(|err| format!("[Exception while creating message string: {err}]"));
        let stack = read_stack(rt, &value).unwrap_or_default();
        Self {
            value,
            message,
            stack,
        }
    }

    pub fn with_parts(value: Value, message: String, stack: String) -> Self {
        Self {
            value,
            message,
            stack,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }
}

fn read_message(rt: &dyn Runtime, value: &Value) -> JsiResult<String> {
    match value {
        Value::String(text) => text.utf8(rt),
        Value::Object(obj) => match obj.get_property(rt, "message")? {
            Value::String(text) => text.utf8(rt),
            _ => value.to_js_string(rt)?.utf8(rt),
        },
        _ => value.to_js_string(rt)?.utf8(rt),
    }
}

fn read_stack(rt: &dyn Runtime, value: &Value) -> JsiResult<String> {
    if let Value::Object(obj) = value {
        if let Value::String(stack) = obj.get_property(rt, "stack")? {
            return stack.utf8(rt);
        }
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_message() {
        let err = JsiError::native("A call to NodeApi returned error code 0x9.");
        assert!(!err.is_js());
        assert!(err.as_js().is_none());
        assert_eq!(err.message(), "A call to NodeApi returned error code 0x9.");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn test_js_error_parts() {
        let err: JsiError =
            JsError::with_parts(Value::Number(1.0), "boom".into(), "at a.js".into()).into();
        assert!(err.is_js());
        let js = err.as_js().unwrap();
        assert_eq!(js.message(), "boom");
        assert_eq!(js.stack(), "at a.js");
        assert_eq!(js.value().as_number(), Some(1.0));
        assert_eq!(err.to_string(), "boom");
    }
}
