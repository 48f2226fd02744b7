//! Global object and builtin library.

use std::cell::RefCell;
use std::rc::Rc;

use super::heap::{FunctionKind, Heap, HeapObject, ObjectKind, Property};
use super::value::{ObjectId, PropKey, SymbolData, Val};
use super::{JsResult, ReferenceEnv};
use crate::status::PropertyAttributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
}

impl ErrorKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }

    const ALL: [ErrorKind; 5] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Object,
    ObjectKeys,
    ObjectDefineProperty,
    ObjectGetPrototypeOf,
    ObjectProtoToString,
    ObjectProtoHasOwnProperty,
    Function,
    FunctionProtoToString,
    FunctionProtoCall,
    Array,
    ArrayIsArray,
    ArrayProtoPush,
    ArrayProtoJoin,
    ArrayBuffer,
    Error(ErrorKind),
    ErrorProtoToString,
    Proxy,
    Symbol,
    SymbolProtoToString,
    String,
    Number,
    Eval,
}

impl Builtin {
    fn is_constructor(self) -> bool {
        matches!(
            self,
            Builtin::Object
                | Builtin::Array
                | Builtin::ArrayBuffer
                | Builtin::Error(_)
                | Builtin::Proxy
                | Builtin::String
                | Builtin::Number
        )
    }
}

/// Well-known objects of the one realm an environment has.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Realm {
    pub(crate) global: ObjectId,
    pub(crate) object_proto: ObjectId,
    pub(crate) function_proto: ObjectId,
    pub(crate) array_proto: ObjectId,
    pub(crate) array_buffer_proto: ObjectId,
    pub(crate) symbol_proto: ObjectId,
    error_protos: [ObjectId; 5],
}

impl Realm {
    pub(crate) fn new(heap: &mut Heap) -> Self {
        let object_proto = heap.alloc(HeapObject::new(None, ObjectKind::Ordinary));
        let function_proto = heap.alloc(HeapObject::new(
            Some(object_proto),
            ObjectKind::Function(FunctionKind::Builtin(Builtin::Function)),
        ));
        let global = heap.alloc(HeapObject::new(Some(object_proto), ObjectKind::Ordinary));
        let mut builder = RealmBuilder {
            heap,
            function_proto,
            global,
        };

        let object_ctor = builder.constructor(Builtin::Object, "Object", 1, object_proto);
        builder.method(object_ctor, Builtin::ObjectKeys, "keys", 1);
        builder.method(object_ctor, Builtin::ObjectDefineProperty, "defineProperty", 3);
        builder.method(object_ctor, Builtin::ObjectGetPrototypeOf, "getPrototypeOf", 1);
        builder.method(object_proto, Builtin::ObjectProtoToString, "toString", 0);
        builder.method(object_proto, Builtin::ObjectProtoHasOwnProperty, "hasOwnProperty", 1);

        builder.constructor(Builtin::Function, "Function", 1, function_proto);
        builder.method(function_proto, Builtin::FunctionProtoToString, "toString", 0);
        builder.method(function_proto, Builtin::FunctionProtoCall, "call", 1);

        let array_proto = builder.object(object_proto);
        let array_ctor = builder.constructor(Builtin::Array, "Array", 1, array_proto);
        builder.method(array_ctor, Builtin::ArrayIsArray, "isArray", 1);
        builder.method(array_proto, Builtin::ArrayProtoPush, "push", 1);
        builder.method(array_proto, Builtin::ArrayProtoJoin, "join", 1);
        builder.method(array_proto, Builtin::ArrayProtoJoin, "toString", 0);

        let array_buffer_proto = builder.object(object_proto);
        builder.constructor(Builtin::ArrayBuffer, "ArrayBuffer", 1, array_buffer_proto);

        let error_proto = builder.object(object_proto);
        let mut error_protos = [error_proto; 5];
        for (slot, kind) in error_protos.iter_mut().zip(ErrorKind::ALL) {
            let proto = if kind == ErrorKind::Error {
                error_proto
            } else {
                builder.object(error_proto)
            };
            builder.constructor(Builtin::Error(kind), kind.name(), 1, proto);
            builder.value(proto, "name", Val::str(kind.name()));
            builder.value(proto, "message", Val::str(""));
            *slot = proto;
        }
        builder.method(error_proto, Builtin::ErrorProtoToString, "toString", 0);

        builder.global_function(Builtin::Proxy, "Proxy", 2);

        let symbol_proto = builder.object(object_proto);
        builder.constructor(Builtin::Symbol, "Symbol", 0, symbol_proto);
        builder.method(symbol_proto, Builtin::SymbolProtoToString, "toString", 0);

        builder.global_function(Builtin::String, "String", 1);
        builder.global_function(Builtin::Number, "Number", 1);
        builder.global_function(Builtin::Eval, "eval", 1);

        let fixed = PropertyAttributes::DEFAULT;
        builder.define(global, "globalThis", Val::Object(global), PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE);
        builder.define(global, "undefined", Val::Undefined, fixed);
        builder.define(global, "NaN", Val::Number(f64::NAN), fixed);
        builder.define(global, "Infinity", Val::Number(f64::INFINITY), fixed);

        Self {
            global,
            object_proto,
            function_proto,
            array_proto,
            array_buffer_proto,
            symbol_proto,
            error_protos,
        }
    }

    pub(crate) fn error_proto(&self, kind: ErrorKind) -> ObjectId {
        match kind {
            ErrorKind::Error => self.error_protos[0],
            ErrorKind::TypeError => self.error_protos[1],
            ErrorKind::RangeError => self.error_protos[2],
            ErrorKind::ReferenceError => self.error_protos[3],
            ErrorKind::SyntaxError => self.error_protos[4],
        }
    }

    pub(crate) fn roots(&self) -> Vec<ObjectId> {
        let mut roots = vec![
            self.global,
            self.object_proto,
            self.function_proto,
            self.array_proto,
            self.array_buffer_proto,
            self.symbol_proto,
        ];
        roots.extend(self.error_protos);
        roots
    }
}

struct RealmBuilder<'a> {
    heap: &'a mut Heap,
    function_proto: ObjectId,
    global: ObjectId,
}

impl RealmBuilder<'_> {
    fn object(&mut self, proto: ObjectId) -> ObjectId {
        self.heap
            .alloc(HeapObject::new(Some(proto), ObjectKind::Ordinary))
    }

    fn define(
        &mut self,
        target: ObjectId,
        name: &str,
        value: Val,
        attributes: PropertyAttributes,
    ) {
        self.heap[target]
            .props
            .insert(PropKey::str(name), Property { value, attributes });
    }

    fn value(&mut self, target: ObjectId, name: &str, value: Val) {
        self.define(target, name, value, PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE);
    }

    fn function(&mut self, builtin: Builtin, name: &str, length: usize) -> ObjectId {
        let id = self.heap.alloc(HeapObject::new(
            Some(self.function_proto),
            ObjectKind::Function(FunctionKind::Builtin(builtin)),
        ));
        self.define(id, "name", Val::str(name), PropertyAttributes::CONFIGURABLE);
        self.define(id, "length", Val::Number(length as f64), PropertyAttributes::CONFIGURABLE);
        id
    }

    fn method(&mut self, target: ObjectId, builtin: Builtin, name: &str, length: usize) {
        let id = self.function(builtin, name, length);
        self.value(target, name, Val::Object(id));
    }

    fn global_function(&mut self, builtin: Builtin, name: &str, length: usize) -> ObjectId {
        let id = self.function(builtin, name, length);
        let global = self.global;
        self.value(global, name, Val::Object(id));
        id
    }

    fn constructor(
        &mut self,
        builtin: Builtin,
        name: &str,
        length: usize,
        proto: ObjectId,
    ) -> ObjectId {
        let id = self.global_function(builtin, name, length);
        self.define(id, "prototype", Val::Object(proto), PropertyAttributes::DEFAULT);
        self.value(proto, "constructor", Val::Object(id));
        id
    }
}

fn arg(args: &[Val], index: usize) -> Val {
    args.get(index).cloned().unwrap_or(Val::Undefined)
}

impl ReferenceEnv {
    pub(crate) fn call_builtin(
        &self,
        builtin: Builtin,
        this: Val,
        args: &[Val],
        new_target: Option<&Val>,
    ) -> JsResult<Val> {
        if new_target.is_some() && !builtin.is_constructor() {
            return Err(self.type_error("is not a constructor"));
        }
        let realm = self.realm();
        match builtin {
            Builtin::Object => match arg(args, 0) {
                Val::Object(id) => Ok(Val::Object(id)),
                _ => Ok(Val::Object(self.new_object())),
            },
            Builtin::ObjectKeys => {
                let id = self.expect_object(&arg(args, 0), "Object.keys")?;
                let mut keys = Vec::new();
                for key in self.own_keys(id)? {
                    if key.as_str().is_none() {
                        continue;
                    }
                    if let Some(prop) = self.get_own_property(id, &key)? {
                        if prop.attributes.enumerable() {
                            keys.push(key.to_val());
                        }
                    }
                }
                Ok(self.create_array(keys))
            }
            Builtin::ObjectDefineProperty => {
                let target = arg(args, 0);
                let id = self.expect_object(&target, "Object.defineProperty")?;
                let key = self.to_property_key(&arg(args, 1))?;
                let descriptor = arg(args, 2);
                let desc = self.expect_object(&descriptor, "Property description")?;
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
                let value = self.get_from(desc, &PropKey::str("value"), &descriptor)?;
                self.define_own_property(id, key, Property { value, attributes });
                Ok(target)
            }
            Builtin::ObjectGetPrototypeOf => {
                let id = self.expect_object(&arg(args, 0), "Object.getPrototypeOf")?;
                Ok(self.get_prototype(id).map_or(Val::Null, Val::Object))
            }
            Builtin::ObjectProtoToString => {
                let tag = match &this {
                    Val::Undefined => "Undefined",
                    Val::Null => "Null",
                    Val::Object(id) => self.with_object(*id, |obj| match obj.kind {
                        ObjectKind::Array(_) => "Array",
                        ObjectKind::Function(_) => "Function",
                        ObjectKind::Error => "Error",
                        _ => "Object",
                    }),
                    _ => "Object",
                };
                Ok(Val::str(&format!("[object {tag}]")))
            }
            Builtin::ObjectProtoHasOwnProperty => {
                let id = self.expect_object(&this, "hasOwnProperty")?;
                let key = self.to_property_key(&arg(args, 0))?;
                Ok(Val::Bool(self.get_own_property(id, &key)?.is_some()))
            }
            Builtin::Function => Err(self.type_error("Function constructor is not supported")),
            Builtin::FunctionProtoToString => {
                let name = match &this {
                    Val::Object(_) => self.get(&this, &PropKey::str("name"))?,
                    _ => Val::str(""),
                };
                let name = self.to_string(&name)?;
                Ok(Val::str(&format!("function {name}() {{ [native code] }}")))
            }
            Builtin::FunctionProtoCall => {
                let rest = args.get(1..).unwrap_or(&[]);
                self.call(&this, arg(args, 0), rest)
            }
            Builtin::Array => {
                if let [Val::Number(length)] = args {
                    if length.fract() != 0.0 || *length < 0.0 || *length > f64::from(u32::MAX) {
                        return Err(self.range_error("Invalid array length"));
                    }
                    return Ok(self.create_array(vec![Val::Undefined; *length as usize]));
                }
                Ok(self.create_array(args.to_vec()))
            }
            Builtin::ArrayIsArray => Ok(Val::Bool(self.is_array_value(&arg(args, 0)))),
            Builtin::ArrayProtoPush => {
                let id = self.expect_object(&this, "Array.prototype.push")?;
                let length = self.with_object_mut(id, |obj| match &mut obj.kind {
                    ObjectKind::Array(elements) => {
                        elements.extend(args.iter().cloned());
                        Some(elements.len())
                    }
                    _ => None,
                });
                match length {
                    Some(length) => Ok(Val::Number(length as f64)),
                    None => Err(self.type_error("Array.prototype.push called on non-array")),
                }
            }
            Builtin::ArrayProtoJoin => {
                let separator = match arg(args, 0) {
                    Val::Undefined => Rc::from(","),
                    other => self.to_string(&other)?,
                };
                let id = self.expect_object(&this, "Array.prototype.join")?;
                let elements = self.with_object(id, |obj| match &obj.kind {
                    ObjectKind::Array(elements) => elements.clone(),
                    _ => Vec::new(),
                });
                let mut parts = Vec::with_capacity(elements.len());
                for element in &elements {
                    parts.push(match element {
                        Val::Undefined | Val::Null => String::new(),
                        other => self.to_string(other)?.to_string(),
                    });
                }
                Ok(Val::str(&parts.join(&separator)))
            }
            Builtin::ArrayBuffer => {
                if new_target.is_none() {
                    return Err(self.type_error("Constructor ArrayBuffer requires 'new'"));
                }
                let length = self.to_number(&arg(args, 0))?;
                if length.is_nan() || length < 0.0 || length.fract() != 0.0 {
                    return Err(self.range_error("Invalid array buffer length"));
                }
                let store = Rc::new(RefCell::new(vec![0u8; length as usize]));
                Ok(Val::Object(self.alloc(HeapObject::new(
                    Some(realm.array_buffer_proto),
                    ObjectKind::ArrayBuffer(store),
                ))))
            }
            Builtin::Error(kind) => {
                let message = match arg(args, 0) {
                    Val::Undefined => None,
                    other => Some(self.to_string(&other)?),
                };
                Ok(self.make_error(kind, message.as_deref()))
            }
            Builtin::ErrorProtoToString => {
                let name = match self.get(&this, &PropKey::str("name"))? {
                    Val::Undefined => Rc::from("Error"),
                    other => self.to_string(&other)?,
                };
                let message = match self.get(&this, &PropKey::str("message"))? {
                    Val::Undefined => Rc::from(""),
                    other => self.to_string(&other)?,
                };
                Ok(match (name.is_empty(), message.is_empty()) {
                    (_, true) => Val::Str(name),
                    (true, false) => Val::Str(message),
                    (false, false) => Val::str(&format!("{name}: {message}")),
                })
            }
            Builtin::Proxy => {
                if new_target.is_none() {
                    return Err(self.type_error("Constructor Proxy requires 'new'"));
                }
                let (Val::Object(target), Val::Object(handler)) = (arg(args, 0), arg(args, 1)) else {
                    return Err(
                        self.type_error("Cannot create proxy with a non-object as target or handler")
                    );
                };
                Ok(Val::Object(self.alloc(HeapObject::new(
                    None,
                    ObjectKind::Proxy { target, handler },
                ))))
            }
            Builtin::Symbol => {
                let description = match arg(args, 0) {
                    Val::Undefined => None,
                    other => Some(self.to_string(&other)?),
                };
                Ok(Val::Symbol(Rc::new(SymbolData { description })))
            }
            Builtin::SymbolProtoToString => match &this {
                Val::Symbol(symbol) => Ok(Val::str(&symbol_description(symbol))),
                _ => Err(self.type_error("Symbol.prototype.toString requires that 'this' be a Symbol")),
            },
            Builtin::String => match arg(args, 0) {
                Val::Symbol(symbol) if new_target.is_none() => Ok(Val::str(&symbol_description(&symbol))),
                Val::Undefined if args.is_empty() => Ok(Val::str("")),
                other => Ok(Val::Str(self.to_string(&other)?)),
            },
            Builtin::Number => match args.first() {
                None => Ok(Val::Number(0.0)),
                Some(value) => Ok(Val::Number(self.to_number(value)?)),
            },
            Builtin::Eval => match arg(args, 0) {
                Val::Str(source) => {
                    let program = self.compile(&source)?;
                    self.run_program(&program, "eval")
                }
                other => Ok(other),
            },
        }
    }
}

/// `Symbol(description)` text.
pub(crate) fn symbol_description(symbol: &SymbolData) -> String {
    format!("Symbol({})", symbol.description.as_deref().unwrap_or(""))
}
