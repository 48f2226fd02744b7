//! Abstract operations shared by the evaluator, the builtins and the
//! Node-API surface: conversions, proxy-aware property access and calls.

use std::any::Any;
use std::rc::Rc;

use smallvec::SmallVec;

use super::heap::{FunctionKind, HeapObject, ObjectKind, Property};
use super::realm::{ErrorKind, symbol_description};
use super::value::{ObjectId, PropKey, Val, number_to_string, string_to_number};
use super::{JsResult, ReferenceEnv, Thrown};
use crate::api::{NapiCallback, NapiCallbackInfo};
use crate::status::{NapiValueType, PropertyAttributes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Default,
    Number,
    String,
}

impl ReferenceEnv {
    // Errors.

    /// A fresh error object of `kind` with a `stack` naming the running script.
    pub(crate) fn make_error(&self, kind: ErrorKind, message: Option<&str>) -> Val {
        let proto = self.realm().error_proto(kind);
        let id = self.alloc(HeapObject::new(Some(proto), ObjectKind::Error));
        let header = match message {
            Some(message) if !message.is_empty() => format!("{}: {message}", kind.name()),
            _ => kind.name().to_string(),
        };
        let location = self.current_source_url();
        let stack = format!(
            "{header}\n    at {}",
            location.as_deref().unwrap_or("<native>")
        );
        self.with_object_mut(id, |obj| {
            if let Some(message) = message {
                obj.props
                    .insert(PropKey::str("message"), Property::hidden(Val::str(message)));
            }
            obj.props
                .insert(PropKey::str("stack"), Property::hidden(Val::str(&stack)));
        });
        Val::Object(id)
    }

    pub(crate) fn throw_kind(&self, kind: ErrorKind, message: &str) -> Thrown {
        Thrown(self.make_error(kind, Some(message)))
    }

    pub(crate) fn type_error(&self, message: &str) -> Thrown {
        self.throw_kind(ErrorKind::TypeError, message)
    }

    pub(crate) fn range_error(&self, message: &str) -> Thrown {
        self.throw_kind(ErrorKind::RangeError, message)
    }

    pub(crate) fn expect_object(&self, value: &Val, what: &str) -> JsResult<ObjectId> {
        match value {
            Val::Object(id) => Ok(*id),
            other => Err(self.type_error(&format!(
                "{what} called on non-object {}",
                self.describe(other)
            ))),
        }
    }

    /// Short rendering of a value for error messages; never runs script.
    pub(crate) fn describe(&self, value: &Val) -> String {
        match value {
            Val::Str(s) => format!("\"{s}\""),
            Val::Symbol(symbol) => symbol_description(symbol),
            Val::Object(id) => {
                if self.is_callable(value) {
                    "function".to_string()
                } else if self.with_object(*id, |obj| matches!(obj.kind, ObjectKind::Array(_))) {
                    "[object Array]".to_string()
                } else {
                    "[object Object]".to_string()
                }
            }
            other => format!("{other:?}"),
        }
    }

    // Conversions.

    pub(crate) fn value_type(&self, value: &Val) -> NapiValueType {
        match value {
            Val::Undefined => NapiValueType::Undefined,
            Val::Null => NapiValueType::Null,
            Val::Bool(_) => NapiValueType::Boolean,
            Val::Number(_) => NapiValueType::Number,
            Val::Str(_) => NapiValueType::String,
            Val::Symbol(_) => NapiValueType::Symbol,
            Val::Object(id) => {
                if self.is_callable(value) {
                    NapiValueType::Function
                } else if self.with_object(*id, |obj| matches!(obj.kind, ObjectKind::External(_))) {
                    NapiValueType::External
                } else {
                    NapiValueType::Object
                }
            }
        }
    }

    /// The `typeof` operator.
    pub(crate) fn type_of_name(&self, value: &Val) -> &'static str {
        match self.value_type(value) {
            NapiValueType::Undefined => "undefined",
            NapiValueType::Boolean => "boolean",
            NapiValueType::Number => "number",
            NapiValueType::String => "string",
            NapiValueType::Symbol => "symbol",
            NapiValueType::Function => "function",
            NapiValueType::Bigint => "bigint",
            NapiValueType::Null | NapiValueType::Object | NapiValueType::External => "object",
        }
    }

    pub(crate) fn is_callable(&self, value: &Val) -> bool {
        let mut current = match value {
            Val::Object(id) => *id,
            _ => return false,
        };
        loop {
            let next = self.with_object(current, |obj| match &obj.kind {
                ObjectKind::Function(_) => Err(true),
                ObjectKind::Proxy { target, .. } => Ok(*target),
                _ => Err(false),
            });
            match next {
                Ok(target) => current = target,
                Err(callable) => return callable,
            }
        }
    }

    pub(crate) fn is_array_value(&self, value: &Val) -> bool {
        let mut current = match value {
            Val::Object(id) => *id,
            _ => return false,
        };
        loop {
            let next = self.with_object(current, |obj| match &obj.kind {
                ObjectKind::Array(_) => Err(true),
                ObjectKind::Proxy { target, .. } => Ok(*target),
                _ => Err(false),
            });
            match next {
                Ok(target) => current = target,
                Err(is_array) => return is_array,
            }
        }
    }

    pub(crate) fn to_primitive(&self, value: &Val, hint: Hint) -> JsResult<Val> {
        if !matches!(value, Val::Object(_)) {
            return Ok(value.clone());
        }
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Number | Hint::Default => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get(value, &PropKey::str(name))?;
            if self.is_callable(&method) {
                let result = self.call(&method, value.clone(), &[])?;
                if !matches!(result, Val::Object(_)) {
                    return Ok(result);
                }
            }
        }
        Err(self.type_error("Cannot convert object to primitive value"))
    }

    pub(crate) fn to_string(&self, value: &Val) -> JsResult<Rc<str>> {
        Ok(match value {
            Val::Undefined => Rc::from("undefined"),
            Val::Null => Rc::from("null"),
            Val::Bool(b) => Rc::from(if *b { "true" } else { "false" }),
            Val::Number(n) => Rc::from(number_to_string(*n)),
            Val::Str(s) => s.clone(),
            Val::Symbol(_) => {
                return Err(self.type_error("Cannot convert a Symbol value to a string"));
            }
            Val::Object(_) => {
                let primitive = self.to_primitive(value, Hint::String)?;
                return self.to_string(&primitive);
            }
        })
    }

    pub(crate) fn to_number(&self, value: &Val) -> JsResult<f64> {
        Ok(match value {
            Val::Undefined => f64::NAN,
            Val::Null => 0.0,
            Val::Bool(b) => f64::from(u8::from(*b)),
            Val::Number(n) => *n,
            Val::Str(s) => string_to_number(s),
            Val::Symbol(_) => {
                return Err(self.type_error("Cannot convert a Symbol value to a number"));
            }
            Val::Object(_) => {
                let primitive = self.to_primitive(value, Hint::Number)?;
                return self.to_number(&primitive);
            }
        })
    }

    pub(crate) fn to_property_key(&self, value: &Val) -> JsResult<PropKey> {
        match value {
            Val::Symbol(symbol) => Ok(PropKey::Symbol(symbol.clone())),
            Val::Str(s) => Ok(PropKey::Str(s.clone())),
            other => {
                let primitive = self.to_primitive(other, Hint::String)?;
                if let Val::Symbol(symbol) = primitive {
                    return Ok(PropKey::Symbol(symbol));
                }
                Ok(PropKey::Str(self.to_string(&primitive)?))
            }
        }
    }

    /// `==`
    pub(crate) fn loose_equals(&self, a: &Val, b: &Val) -> JsResult<bool> {
        Ok(match (a, b) {
            (Val::Undefined | Val::Null, Val::Undefined | Val::Null) => true,
            (Val::Undefined | Val::Null, _) | (_, Val::Undefined | Val::Null) => false,
            (Val::Number(_), Val::Str(_)) | (Val::Str(_), Val::Number(_)) => {
                self.to_number(a)? == self.to_number(b)?
            }
            (Val::Bool(_), _) => {
                let a = Val::Number(self.to_number(a)?);
                return self.loose_equals(&a, b);
            }
            (_, Val::Bool(_)) => {
                let b = Val::Number(self.to_number(b)?);
                return self.loose_equals(a, &b);
            }
            (Val::Object(_), Val::Object(_)) => a.strict_equals(b),
            (Val::Object(_), _) => {
                let a = self.to_primitive(a, Hint::Default)?;
                return self.loose_equals(&a, b);
            }
            (_, Val::Object(_)) => {
                let b = self.to_primitive(b, Hint::Default)?;
                return self.loose_equals(a, &b);
            }
            _ => a.strict_equals(b),
        })
    }

    // Property access.

    pub(crate) fn get_prototype(&self, id: ObjectId) -> Option<ObjectId> {
        let (proto, target) = self.with_object(id, |obj| match &obj.kind {
            ObjectKind::Proxy { target, .. } => (None, Some(*target)),
            _ => (obj.proto, None),
        });
        match target {
            Some(target) => self.get_prototype(target),
            None => proto,
        }
    }

    fn proxy_parts(&self, id: ObjectId) -> Option<(ObjectId, ObjectId)> {
        self.with_object(id, |obj| match &obj.kind {
            ObjectKind::Proxy { target, handler } => Some((*target, *handler)),
            _ => None,
        })
    }

    /// Trap function of `handler`, or `None` to fall through to the target.
    fn proxy_trap(&self, handler: ObjectId, name: &str) -> JsResult<Option<Val>> {
        let trap = self.get_from(handler, &PropKey::str(name), &Val::Object(handler))?;
        if trap.is_nullish() {
            return Ok(None);
        }
        if !self.is_callable(&trap) {
            return Err(self.type_error(&format!("proxy trap '{name}' is not a function")));
        }
        Ok(Some(trap))
    }

    /// Own property without running proxy traps or accessors.
    fn own_property_raw(&self, id: ObjectId, key: &PropKey) -> Option<Property> {
        self.with_object(id, |obj| {
            match &obj.kind {
                ObjectKind::Array(elements) => {
                    if let Some(index) = key.array_index() {
                        return elements.get(index as usize).cloned().map(Property::data);
                    }
                    if key.as_str() == Some("length") {
                        return Some(Property {
                            value: Val::Number(elements.len() as f64),
                            attributes: PropertyAttributes::WRITABLE,
                        });
                    }
                }
                ObjectKind::ArrayBuffer(store) if key.as_str() == Some("byteLength") => {
                    return Some(Property {
                        value: Val::Number(store.borrow().len() as f64),
                        attributes: PropertyAttributes::CONFIGURABLE,
                    });
                }
                _ => {}
            }
            obj.props.get(key).cloned()
        })
    }

    pub(crate) fn get_own_property(
        &self,
        id: ObjectId,
        key: &PropKey,
    ) -> JsResult<Option<Property>> {
        let Some((target, handler)) = self.proxy_parts(id) else {
            return Ok(self.own_property_raw(id, key));
        };
        let Some(trap) = self.proxy_trap(handler, "getOwnPropertyDescriptor")? else {
            return self.get_own_property(target, key);
        };
        let descriptor = self.call(
            &trap,
            Val::Object(handler),
            &[Val::Object(target), key.to_val()],
        )?;
        if descriptor.is_nullish() {
            return Ok(None);
        }
        let mut attributes = PropertyAttributes::DEFAULT;
        for (name, flag) in [
            ("writable", PropertyAttributes::WRITABLE),
            ("enumerable", PropertyAttributes::ENUMERABLE),
            ("configurable", PropertyAttributes::CONFIGURABLE),
        ] {
            if self.get(&descriptor, &PropKey::str(name))?.to_boolean() {
                attributes = attributes | flag;
            }
        }
        let value = self.get(&descriptor, &PropKey::str("value"))?;
        Ok(Some(Property { value, attributes }))
    }

    /// `[[Get]]` on any value; primitives read through their prototype.
    pub(crate) fn get(&self, value: &Val, key: &PropKey) -> JsResult<Val> {
        let realm = self.realm();
        let holder = match value {
            Val::Object(id) => *id,
            Val::Undefined | Val::Null => {
                return Err(self.type_error(&format!(
                    "Cannot read properties of {value:?} (reading '{}')",
                    self.key_text(key)
                )));
            }
            Val::Str(s) => {
                if key.as_str() == Some("length") {
                    return Ok(Val::Number(s.encode_utf16().count() as f64));
                }
                if let Some(index) = key.array_index() {
                    return Ok(s
                        .chars()
                        .nth(index as usize)
                        .map_or(Val::Undefined, |c| Val::str(c.encode_utf8(&mut [0; 4]))));
                }
                realm.object_proto
            }
            Val::Symbol(_) => realm.symbol_proto,
            Val::Bool(_) | Val::Number(_) => realm.object_proto,
        };
        self.get_from(holder, key, value)
    }

    pub(crate) fn get_from(&self, id: ObjectId, key: &PropKey, receiver: &Val) -> JsResult<Val> {
        let mut current = Some(id);
        while let Some(id) = current {
            if let Some((target, handler)) = self.proxy_parts(id) {
                return match self.proxy_trap(handler, "get")? {
                    Some(trap) => self.call(
                        &trap,
                        Val::Object(handler),
                        &[Val::Object(target), key.to_val(), receiver.clone()],
                    ),
                    None => self.get_from(target, key, receiver),
                };
            }
            if let Some(property) = self.own_property_raw(id, key) {
                return Ok(property.value);
            }
            current = self.with_object(id, |obj| obj.proto);
        }
        Ok(Val::Undefined)
    }

    /// `[[Set]]` on an object. Writes to non-writable properties are ignored.
    pub(crate) fn set_on(&self, id: ObjectId, key: PropKey, value: Val, receiver: &Val) -> JsResult<()> {
        if let Some((target, handler)) = self.proxy_parts(id) {
            return match self.proxy_trap(handler, "set")? {
                Some(trap) => self
                    .call(
                        &trap,
                        Val::Object(handler),
                        &[Val::Object(target), key.to_val(), value, receiver.clone()],
                    )
                    .map(drop),
                None => self.set_on(target, key, value, receiver),
            };
        }
        if self.set_array_slot(id, &key, &value)? {
            return Ok(());
        }
        self.with_object_mut(id, |obj| match obj.props.get_mut(&key) {
            Some(property) => {
                if property.attributes.writable() {
                    property.value = value;
                }
            }
            None => {
                obj.props.insert(key, Property::data(value));
            }
        });
        Ok(())
    }

    /// Element and `length` writes on arrays. `Ok(false)` when not applicable.
    fn set_array_slot(&self, id: ObjectId, key: &PropKey, value: &Val) -> JsResult<bool> {
        let index = key.array_index();
        let is_length = key.as_str() == Some("length");
        if index.is_none() && !is_length {
            return Ok(false);
        }
        let is_array = self.with_object(id, |obj| matches!(obj.kind, ObjectKind::Array(_)));
        if !is_array {
            return Ok(false);
        }
        let new_length = if is_length {
            let length = self.to_number(value)?;
            if length.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&length) {
                return Err(self.range_error("Invalid array length"));
            }
            Some(length as usize)
        } else {
            None
        };
        self.with_object_mut(id, |obj| {
            if let ObjectKind::Array(elements) = &mut obj.kind {
                match (index, new_length) {
                    (Some(index), _) => {
                        let index = index as usize;
                        if index >= elements.len() {
                            elements.resize(index + 1, Val::Undefined);
                        }
                        elements[index] = value.clone();
                    }
                    (None, Some(length)) => elements.resize(length, Val::Undefined),
                    (None, None) => {}
                }
            }
        });
        Ok(true)
    }

    pub(crate) fn define_own_property(&self, id: ObjectId, key: PropKey, property: Property) {
        if let Some((target, _)) = self.proxy_parts(id) {
            return self.define_own_property(target, key, property);
        }
        let stored_in_array = self.with_object_mut(id, |obj| {
            if let (ObjectKind::Array(elements), Some(index)) = (&mut obj.kind, key.array_index()) {
                let index = index as usize;
                if index >= elements.len() {
                    elements.resize(index + 1, Val::Undefined);
                }
                elements[index] = property.value.clone();
                return true;
            }
            false
        });
        if !stored_in_array {
            self.with_object_mut(id, |obj| {
                obj.props.insert(key, property);
            });
        }
    }

    pub(crate) fn has(&self, id: ObjectId, key: &PropKey) -> JsResult<bool> {
        let mut current = Some(id);
        while let Some(id) = current {
            if let Some((target, handler)) = self.proxy_parts(id) {
                return match self.proxy_trap(handler, "has")? {
                    Some(trap) => Ok(self
                        .call(&trap, Val::Object(handler), &[Val::Object(target), key.to_val()])?
                        .to_boolean()),
                    None => self.has(target, key),
                };
            }
            if self.own_property_raw(id, key).is_some() {
                return Ok(true);
            }
            current = self.with_object(id, |obj| obj.proto);
        }
        Ok(false)
    }

    /// Own keys in property order: array indices first, then insertion order.
    pub(crate) fn own_keys(&self, id: ObjectId) -> JsResult<Vec<PropKey>> {
        if let Some((target, handler)) = self.proxy_parts(id) {
            let Some(trap) = self.proxy_trap(handler, "ownKeys")? else {
                return self.own_keys(target);
            };
            let list = self.call(&trap, Val::Object(handler), &[Val::Object(target)])?;
            let elements = self.array_elements(&list).ok_or_else(|| {
                self.type_error("CreateListFromArrayLike called on non-object")
            })?;
            return elements
                .iter()
                .map(|element| match element {
                    Val::Str(s) => Ok(PropKey::Str(s.clone())),
                    Val::Symbol(symbol) => Ok(PropKey::Symbol(symbol.clone())),
                    other => Err(self.type_error(&format!(
                        "{} is not a valid property name",
                        self.describe(other)
                    ))),
                })
                .collect();
        }
        Ok(self.with_object(id, |obj| {
            let mut keys = Vec::with_capacity(obj.props.len());
            if let ObjectKind::Array(elements) = &obj.kind {
                keys.extend((0..elements.len()).map(|index| PropKey::str(&index.to_string())));
            }
            keys.extend(obj.props.keys().cloned());
            keys
        }))
    }

    pub(crate) fn array_elements(&self, value: &Val) -> Option<Vec<Val>> {
        let id = value.as_object()?;
        self.with_object(id, |obj| match &obj.kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        })
    }

    fn key_text(&self, key: &PropKey) -> String {
        match key {
            PropKey::Str(s) => s.to_string(),
            PropKey::Symbol(symbol) => symbol_description(symbol),
        }
    }

    pub(crate) fn value_instance_of(&self, value: &Val, constructor: &Val) -> JsResult<bool> {
        if !self.is_callable(constructor) {
            return Err(self.type_error("Right-hand side of 'instanceof' is not callable"));
        }
        let Val::Object(id) = value else {
            return Ok(false);
        };
        let prototype = self.get(constructor, &PropKey::str("prototype"))?;
        let Val::Object(prototype) = prototype else {
            return Err(self.type_error(
                "Function has non-object prototype in instanceof check",
            ));
        };
        let mut current = self.get_prototype(*id);
        while let Some(proto) = current {
            if proto == prototype {
                return Ok(true);
            }
            current = self.get_prototype(proto);
        }
        Ok(false)
    }

    // Allocation.

    pub(crate) fn new_object(&self) -> ObjectId {
        let proto = self.realm().object_proto;
        self.alloc(HeapObject::new(Some(proto), ObjectKind::Ordinary))
    }

    pub(crate) fn create_array(&self, elements: Vec<Val>) -> Val {
        let proto = self.realm().array_proto;
        Val::Object(self.alloc(HeapObject::new(Some(proto), ObjectKind::Array(elements))))
    }

    pub(crate) fn new_external(&self, data: Rc<dyn Any>) -> Val {
        Val::Object(self.alloc(HeapObject::new(None, ObjectKind::External(data))))
    }

    /// Function object with `name`, `length` and a fresh `prototype`.
    pub(crate) fn create_function_object(&self, kind: FunctionKind, name: &str, length: usize) -> Val {
        let realm = self.realm();
        let function = self.alloc(HeapObject::new(
            Some(realm.function_proto),
            ObjectKind::Function(kind),
        ));
        let prototype = self.alloc(HeapObject::new(Some(realm.object_proto), ObjectKind::Ordinary));
        self.with_object_mut(prototype, |obj| {
            obj.props
                .insert(PropKey::str("constructor"), Property::hidden(Val::Object(function)));
        });
        self.with_object_mut(function, |obj| {
            let fixed = PropertyAttributes::CONFIGURABLE;
            obj.props.insert(
                PropKey::str("name"),
                Property { value: Val::str(name), attributes: fixed },
            );
            obj.props.insert(
                PropKey::str("length"),
                Property { value: Val::Number(length as f64), attributes: fixed },
            );
            obj.props.insert(
                PropKey::str("prototype"),
                Property { value: Val::Object(prototype), attributes: PropertyAttributes::WRITABLE },
            );
        });
        Val::Object(function)
    }

    // Calls.

    pub(crate) fn call(&self, func: &Val, this: Val, args: &[Val]) -> JsResult<Val> {
        self.invoke(func, this, args, None)
    }

    pub(crate) fn construct(&self, func: &Val, args: &[Val]) -> JsResult<Val> {
        if !self.is_callable(func) {
            return Err(self.type_error(&format!("{} is not a constructor", self.describe(func))));
        }
        let kind = self.function_kind(func);
        if let Some(FunctionKind::Builtin(_)) = kind {
            return self.invoke(func, Val::Undefined, args, Some(func));
        }
        let prototype = match self.get(func, &PropKey::str("prototype"))? {
            Val::Object(proto) => proto,
            _ => self.realm().object_proto,
        };
        let this = Val::Object(self.alloc(HeapObject::new(Some(prototype), ObjectKind::Ordinary)));
        let result = self.invoke(func, this.clone(), args, Some(func))?;
        Ok(match result {
            Val::Object(_) => result,
            _ => this,
        })
    }

    /// Function kind of a callable, looking through proxies.
    fn function_kind(&self, func: &Val) -> Option<FunctionKind> {
        let mut id = func.as_object()?;
        loop {
            let step = self.with_object(id, |obj| match &obj.kind {
                ObjectKind::Function(kind) => Err(Some(kind.clone())),
                ObjectKind::Proxy { target, .. } => Ok(*target),
                _ => Err(None),
            });
            match step {
                Ok(target) => id = target,
                Err(kind) => return kind,
            }
        }
    }

    fn invoke(&self, func: &Val, this: Val, args: &[Val], new_target: Option<&Val>) -> JsResult<Val> {
        let Some(kind) = self.function_kind(func) else {
            return Err(self.type_error(&format!("{} is not a function", self.describe(func))));
        };
        {
            let mut state = self.state.borrow_mut();
            if state.call_depth >= self.config.max_call_depth {
                drop(state);
                return Err(self.throw_kind(ErrorKind::Error, "Out of stack space"));
            }
            state.call_depth += 1;
        }
        let result = match kind {
            FunctionKind::Native { callback, data } => {
                self.invoke_native(callback, data, this, args, new_target)
            }
            FunctionKind::Builtin(builtin) => self.call_builtin(builtin, this, args, new_target),
            FunctionKind::Script { def, env } => self.call_script(&def, env, this, args),
        };
        self.state.borrow_mut().call_depth -= 1;
        result
    }

    /// Run a native callback inside its own handle scope. An exception left
    /// pending by the callback becomes the thrown value.
    fn invoke_native(
        &self,
        callback: NapiCallback,
        data: Option<Rc<dyn Any>>,
        this: Val,
        args: &[Val],
        new_target: Option<&Val>,
    ) -> JsResult<Val> {
        let (mark, depth) = {
            let mut state = self.state.borrow_mut();
            let mark = state.handles.len();
            let depth = state.handle_scopes.len();
            state.handle_scopes.push(mark);
            (mark, depth)
        };
        let this = self.push_handle(this);
        let args: SmallVec<[_; 8]> = args.iter().cloned().map(|arg| self.push_handle(arg)).collect();
        let new_target = new_target.cloned().map(|target| self.push_handle(target));
        let info = NapiCallbackInfo::new(this, args, new_target, data);

        let returned = callback(self, &info);

        let mut state = self.state.borrow_mut();
        let result = returned
            .and_then(|handle| state.handles.get(handle.raw() as usize).cloned())
            .unwrap_or(Val::Undefined);
        // Scopes the callback left open are closed with it.
        state.handle_scopes.truncate(depth);
        state.handles.truncate(mark);
        match state.pending_exception.take() {
            Some(exception) => Err(Thrown(exception)),
            None => Ok(result),
        }
    }
}
