//! Objects and their specialised views.

use std::ops::Deref;
use std::rc::Rc;

use crate::error::{JsError, JsiResult};
use crate::pointer::PointerValue;
use crate::runtime::{ArrayBufferStorage, HostFunction, HostObject, Runtime};
use crate::string::{JsiString, PropNameId};
use crate::value::Value;

/// A JavaScript object.
#[derive(Debug)]
pub struct Object {
    ptr: PointerValue,
}

impl Object {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self { ptr }
    }

    pub fn pointer(&self) -> &PointerValue {
        &self.ptr
    }

    /// Create an empty object.
    pub fn new(rt: &dyn Runtime) -> JsiResult<Self> {
        rt.create_object()
    }

    /// Expose `host` to scripts.
    pub fn create_from_host_object(rt: &dyn Runtime, host: Rc<dyn HostObject>) -> JsiResult<Self> {
        rt.create_object_with_host_object(host)
    }

    pub fn copy(&self, rt: &dyn Runtime) -> JsiResult<Self> {
        Ok(Self::from_pointer(rt.clone_object(&self.ptr)?))
    }

    pub fn strict_equals(rt: &dyn Runtime, a: &Self, b: &Self) -> JsiResult<bool> {
        rt.strict_equals_object(a, b)
    }

    pub fn instance_of(&self, rt: &dyn Runtime, ctor: &Function) -> JsiResult<bool> {
        rt.instance_of(self, ctor)
    }

    pub fn get_property(&self, rt: &dyn Runtime, name: &str) -> JsiResult<Value> {
        rt.get_property(self, &PropNameId::for_utf8(rt, name)?)
    }

    pub fn get_property_with_id(&self, rt: &dyn Runtime, name: &PropNameId) -> JsiResult<Value> {
        rt.get_property(self, name)
    }

    pub fn get_property_with_string(&self, rt: &dyn Runtime, name: &JsiString) -> JsiResult<Value> {
        rt.get_property_with_string(self, name)
    }

    pub fn has_property(&self, rt: &dyn Runtime, name: &str) -> JsiResult<bool> {
        rt.has_property(self, &PropNameId::for_utf8(rt, name)?)
    }

    pub fn has_property_with_id(&self, rt: &dyn Runtime, name: &PropNameId) -> JsiResult<bool> {
        rt.has_property(self, name)
    }

    pub fn has_property_with_string(&self, rt: &dyn Runtime, name: &JsiString) -> JsiResult<bool> {
        rt.has_property_with_string(self, name)
    }

    pub fn set_property(&self, rt: &dyn Runtime, name: &str, value: &Value) -> JsiResult<()> {
        rt.set_property_value(self, &PropNameId::for_utf8(rt, name)?, value)
    }

    pub fn set_property_with_id(
        &self,
        rt: &dyn Runtime,
        name: &PropNameId,
        value: &Value,
    ) -> JsiResult<()> {
        rt.set_property_value(self, name, value)
    }

    pub fn set_property_with_string(
        &self,
        rt: &dyn Runtime,
        name: &JsiString,
        value: &Value,
    ) -> JsiResult<()> {
        rt.set_property_value_with_string(self, name, value)
    }

    /// Read a property that must hold an object.
    pub fn get_property_as_object(&self, rt: &dyn Runtime, name: &str) -> JsiResult<Object> {
        match self.get_property(rt, name)? {
            Value::Object(obj) => Ok(obj),
            other => {
                let message = format!(
                    "getPropertyAsObject: property '{name}' is {}, expected an Object",
                    other.kind_name()
                );
                Err(JsError::new(rt, &message)?.into())
            }
        }
    }

    /// Read a property that must hold a function.
    pub fn get_property_as_function(&self, rt: &dyn Runtime, name: &str) -> JsiResult<Function> {
        let obj = self.get_property_as_object(rt, name)?;
        if !obj.is_function(rt)? {
            let message =
                format!("getPropertyAsFunction: property '{name}' is an Object, expected a Function");
            return Err(JsError::new(rt, &message)?.into());
        }
        Ok(Function::from_object(obj))
    }

    pub fn is_array(&self, rt: &dyn Runtime) -> JsiResult<bool> {
        rt.is_array(self)
    }

    pub fn is_array_buffer(&self, rt: &dyn Runtime) -> JsiResult<bool> {
        rt.is_array_buffer(self)
    }

    pub fn is_function(&self, rt: &dyn Runtime) -> JsiResult<bool> {
        rt.is_function(self)
    }

    pub fn is_host_object(&self, rt: &dyn Runtime) -> JsiResult<bool> {
        rt.is_host_object(self)
    }

    pub fn get_host_object(&self, rt: &dyn Runtime) -> JsiResult<Rc<dyn HostObject>> {
        rt.get_host_object(self)
    }

    pub fn get_property_names(&self, rt: &dyn Runtime) -> JsiResult<Array> {
        rt.get_property_names(self)
    }

    pub fn as_array(self, rt: &dyn Runtime) -> JsiResult<Array> {
        if !self.is_array(rt)? {
            return Err(JsError::new(rt, "Object is not an array")?.into());
        }
        Ok(Array(self))
    }

    pub fn as_array_buffer(self, rt: &dyn Runtime) -> JsiResult<ArrayBuffer> {
        if !self.is_array_buffer(rt)? {
            return Err(JsError::new(rt, "Object is not an ArrayBuffer")?.into());
        }
        Ok(ArrayBuffer(self))
    }

    pub fn as_function(self, rt: &dyn Runtime) -> JsiResult<Function> {
        if !self.is_function(rt)? {
            return Err(JsError::new(rt, "Object is not a function")?.into());
        }
        Ok(Function(self))
    }
}

/// A callable object.
#[derive(Debug)]
pub struct Function(Object);

impl Function {
    /// Wrap an object the caller knows to be callable.
    pub fn from_object(obj: Object) -> Self {
        Self(obj)
    }

    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self(Object::from_pointer(ptr))
    }

    pub fn into_object(self) -> Object {
        self.0
    }

    pub fn create_from_host_function(
        rt: &dyn Runtime,
        name: &PropNameId,
        param_count: u32,
        func: HostFunction,
    ) -> JsiResult<Self> {
        rt.create_function_from_host_function(name, param_count, func)
    }

    /// Call with `this` bound to `undefined`.
    pub fn call(&self, rt: &dyn Runtime, args: &[Value]) -> JsiResult<Value> {
        rt.call(self, &Value::Undefined, args)
    }

    pub fn call_with_this(&self, rt: &dyn Runtime, this: &Object, args: &[Value]) -> JsiResult<Value> {
        let this = Value::Object(this.copy(rt)?);
        rt.call(self, &this, args)
    }

    pub fn call_as_constructor(&self, rt: &dyn Runtime, args: &[Value]) -> JsiResult<Value> {
        rt.call_as_constructor(self, args)
    }

    pub fn is_host_function(&self, rt: &dyn Runtime) -> JsiResult<bool> {
        rt.is_host_function(self)
    }

    pub fn get_host_function(&self, rt: &dyn Runtime) -> JsiResult<HostFunction> {
        rt.get_host_function(self)
    }
}

impl Deref for Function {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

/// An array object.
#[derive(Debug)]
pub struct Array(Object);

impl Array {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self(Object::from_pointer(ptr))
    }

    pub fn into_object(self) -> Object {
        self.0
    }

    pub fn new(rt: &dyn Runtime, length: usize) -> JsiResult<Self> {
        rt.create_array(length)
    }

    /// Build an array holding copies of `values`.
    pub fn from_values(rt: &dyn Runtime, values: &[Value]) -> JsiResult<Self> {
        let array = rt.create_array(values.len())?;
        for (index, value) in values.iter().enumerate() {
            array.set_value_at_index(rt, index, value)?;
        }
        Ok(array)
    }

    pub fn size(&self, rt: &dyn Runtime) -> JsiResult<usize> {
        rt.array_size(self)
    }

    pub fn get_value_at_index(&self, rt: &dyn Runtime, index: usize) -> JsiResult<Value> {
        rt.get_value_at_index(self, index)
    }

    pub fn set_value_at_index(&self, rt: &dyn Runtime, index: usize, value: &Value) -> JsiResult<()> {
        rt.set_value_at_index(self, index, value)
    }
}

impl Deref for Array {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

/// An `ArrayBuffer` object.
#[derive(Debug)]
pub struct ArrayBuffer(Object);

impl ArrayBuffer {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self(Object::from_pointer(ptr))
    }

    pub fn into_object(self) -> Object {
        self.0
    }

    pub fn size(&self, rt: &dyn Runtime) -> JsiResult<usize> {
        rt.array_buffer_size(self)
    }

    pub fn data(&self, rt: &dyn Runtime) -> JsiResult<ArrayBufferStorage> {
        rt.array_buffer_data(self)
    }
}

impl Deref for ArrayBuffer {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

/// A reference that does not keep its object alive.
#[derive(Debug)]
pub struct WeakObject {
    ptr: PointerValue,
}

impl WeakObject {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self { ptr }
    }

    pub fn pointer(&self) -> &PointerValue {
        &self.ptr
    }

    pub fn new(rt: &dyn Runtime, obj: &Object) -> JsiResult<Self> {
        rt.create_weak_object(obj)
    }

    /// The object if it is still alive, `undefined` otherwise.
    pub fn lock(&self, rt: &dyn Runtime) -> JsiResult<Value> {
        rt.lock_weak_object(self)
    }
}
