//! The tagged value union.

use crate::error::{JsError, JsiResult};
use crate::object::{Array, Function, Object};
use crate::runtime::Runtime;
use crate::string::{JsiString, Symbol};

/// Any JavaScript value.
///
/// Primitives are stored inline; strings, symbols and objects carry a
/// pointer value. Values are not `Clone`: use [`Value::copy`] to obtain an
/// independent owning copy through the runtime.
#[derive(Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Symbol(Symbol),
    String(JsiString),
    Object(Object),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsiString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<JsiString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Like [`Value::into_object`] but raises a script error on mismatch.
    pub fn into_object_or_throw(self, rt: &dyn Runtime) -> JsiResult<Object> {
        match self {
            Value::Object(o) => Ok(o),
            other => {
                let message = format!("Value is {}, expected an Object", other.kind_name());
                Err(JsError::new(rt, &message)?.into())
            }
        }
    }

    /// Human-readable kind used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::Symbol(_) => "a symbol",
            Value::String(_) => "a string",
            Value::Object(_) => "an object",
        }
    }

    /// Independent copy; pointer kinds get their own owning reference.
    pub fn copy(&self, rt: &dyn Runtime) -> JsiResult<Value> {
        Ok(match self {
            Value::Undefined => Value::Undefined,
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Number(n) => Value::Number(*n),
            Value::Symbol(s) => Value::Symbol(s.copy(rt)?),
            Value::String(s) => Value::String(s.copy(rt)?),
            Value::Object(o) => Value::Object(o.copy(rt)?),
        })
    }

    /// `===` semantics.
    pub fn strict_equals(rt: &dyn Runtime, a: &Value, b: &Value) -> JsiResult<bool> {
        Ok(match (a, b) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Symbol(x), Value::Symbol(y)) => rt.strict_equals_symbol(x, y)?,
            (Value::String(x), Value::String(y)) => rt.strict_equals_string(x, y)?,
            (Value::Object(x), Value::Object(y)) => rt.strict_equals_object(x, y)?,
            _ => false,
        })
    }

    /// Convert with the global `String` function.
    pub fn to_js_string(&self, rt: &dyn Runtime) -> JsiResult<JsiString> {
        let to_string = rt.global()?.get_property_as_function(rt, "String")?;
        let arg = self.copy(rt)?;
        match to_string.call(rt, &[arg])? {
            Value::String(s) => Ok(s),
            other => {
                let message = format!("String() returned {}", other.kind_name());
                Err(crate::JsiError::native(message))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<JsiString> for Value {
    fn from(s: JsiString) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Object(f.into_object())
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Object(a.into_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_accessors() {
        assert!(Value::default().is_undefined());
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(3).as_number(), Some(3.0));
        assert_eq!(Value::from(2.5).as_number(), Some(2.5));
        assert!(Value::Null.as_number().is_none());
        assert!(Value::Null.as_object().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Undefined.kind_name(), "undefined");
        assert_eq!(Value::Null.kind_name(), "null");
        assert_eq!(Value::from(1).kind_name(), "a number");
    }
}
