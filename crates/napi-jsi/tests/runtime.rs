//! Value marshalling, lifetimes and script execution through the adapter.

use std::rc::Rc;

use jsi_core::{
    Array, JsiString, Object, PropNameId, Runtime, RuntimeExt, Scope, StringBuffer, Value,
    WeakObject,
};
use napi_env::ReferenceEnv;
use napi_jsi::NapiJsiRuntime;

fn runtime() -> (Rc<ReferenceEnv>, NapiJsiRuntime) {
    let env = Rc::new(ReferenceEnv::new());
    let rt = NapiJsiRuntime::new(env.clone()).expect("runtime");
    (env, rt)
}

fn eval(rt: &NapiJsiRuntime, source: &str) -> Value {
    rt.evaluate_script(source, "test.js").expect(source)
}

#[test]
fn test_evaluate_sum() {
    let (_env, rt) = runtime();
    let value = eval(&rt, "1+2");
    assert!(value.is_number());
    assert_eq!(value.as_number(), Some(3.0));
}

#[test]
fn test_value_round_trip() {
    let (_env, rt) = runtime();
    let holder = Object::new(&rt).unwrap();
    let values = [
        Value::Undefined,
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Number(-0.5),
        Value::String(JsiString::create_from_utf8(&rt, "text").unwrap()),
        eval(&rt, "Symbol('marker')"),
        Value::Object(Object::new(&rt).unwrap()),
        eval(&rt, "(function () {})"),
    ];
    for value in &values {
        holder.set_property(&rt, "slot", value).unwrap();
        let back = holder.get_property(&rt, "slot").unwrap();
        assert_eq!(back.kind_name(), value.kind_name());
        assert!(Value::strict_equals(&rt, value, &back).unwrap(), "{}", value.kind_name());
    }
}

#[test]
fn test_clone_survives_original() {
    let (env, rt) = runtime();
    let baseline = env.live_references();

    let text = JsiString::create_from_utf8(&rt, "kept").unwrap();
    let copy = text.copy(&rt).unwrap();
    drop(text);

    let obj = Object::new(&rt).unwrap();
    obj.set_property(&rt, "n", &Value::from(7)).unwrap();
    let obj_copy = obj.copy(&rt).unwrap();
    drop(obj);

    env.collect_garbage().expect("idle environment");
    assert_eq!(copy.utf8(&rt).unwrap(), "kept");
    assert_eq!(obj_copy.get_property(&rt, "n").unwrap().as_number(), Some(7.0));

    drop(copy);
    drop(obj_copy);
    assert_eq!(env.live_references(), baseline);
}

#[test]
fn test_copy_of_owning_value_shares_identity() {
    let (_env, rt) = runtime();
    let obj = Object::new(&rt).unwrap();
    let copy = obj.copy(&rt).unwrap();
    assert!(Object::strict_equals(&rt, &obj, &copy).unwrap());
    let other = Object::new(&rt).unwrap();
    assert!(!Object::strict_equals(&rt, &obj, &other).unwrap());
}

#[test]
fn test_pop_scope_releases_handles() {
    let (env, rt) = runtime();
    assert_eq!(env.open_handle_count(), 0);

    let state = rt.push_scope().unwrap();
    for n in 0..16 {
        let text = format!("value {n}");
        let _ = rt.create_string_from_utf8(text.as_bytes()).unwrap();
        let _ = eval(&rt, "({})");
    }
    assert!(env.open_handle_count() >= 16);
    rt.pop_scope(state).unwrap();
    assert_eq!(env.open_handle_count(), 0);
}

#[test]
fn test_nested_scopes_unwind_in_order() {
    let (env, rt) = runtime();
    let outer = Scope::new(&rt).unwrap();
    let _ = eval(&rt, "'outer'");
    let after_outer = env.open_handle_count();
    {
        let _inner = Scope::new(&rt).unwrap();
        let _ = eval(&rt, "'inner'");
        assert!(env.open_handle_count() > after_outer);
    }
    assert_eq!(env.open_handle_count(), after_outer);
    outer.close().unwrap();
    assert_eq!(env.open_handle_count(), 0);
}

#[test]
fn test_safe_integer_boundary() {
    let (_env, rt) = runtime();
    let max = 9_007_199_254_740_991.0;
    assert_eq!(eval(&rt, "9007199254740991").as_number(), Some(max));
    assert_eq!(eval(&rt, "-9007199254740991").as_number(), Some(-max));

    let obj = Object::new(&rt).unwrap();
    obj.set_property(&rt, "max", &Value::from(max)).unwrap();
    obj.set_property(&rt, "min", &Value::from(-max)).unwrap();
    assert_eq!(obj.get_property(&rt, "max").unwrap().as_number(), Some(max));
    assert_eq!(obj.get_property(&rt, "min").unwrap().as_number(), Some(-max));
}

#[test]
fn test_prepared_script_matches_direct_evaluation() {
    let (_env, rt) = runtime();
    let source = "var base = 6; function times(n) { return base * n; } times(7)";
    let direct = rt
        .evaluate_javascript(Rc::new(StringBuffer::new(source)), "a.js")
        .unwrap();

    let prepared = rt
        .prepare_javascript(Rc::new(StringBuffer::new(source)), "a.js".to_string())
        .unwrap();
    let first = rt.evaluate_prepared_javascript(&prepared).unwrap();
    let second = rt.evaluate_prepared_javascript(&prepared).unwrap();

    assert_eq!(direct.as_number(), Some(42.0));
    assert!(Value::strict_equals(&rt, &direct, &first).unwrap());
    assert!(Value::strict_equals(&rt, &direct, &second).unwrap());
}

#[test]
fn test_prepare_reports_syntax_errors() {
    let (_env, rt) = runtime();
    let err = rt
        .prepare_javascript(Rc::new(StringBuffer::new("var = ;")), "bad.js".to_string())
        .err()
        .unwrap();
    assert!(err.is_js());
}

#[test]
fn test_weak_object_lock() {
    let (env, rt) = runtime();
    let obj = Object::new(&rt).unwrap();
    let weak = WeakObject::new(&rt, &obj).unwrap();

    let locked = weak.lock(&rt).unwrap();
    assert!(Object::strict_equals(&rt, locked.as_object().unwrap(), &obj).unwrap());
    drop(locked);

    drop(obj);
    env.collect_garbage().expect("idle environment");
    assert!(weak.lock(&rt).unwrap().is_undefined());
}

#[test]
fn test_weak_object_kept_alive_by_strong_value() {
    let (env, rt) = runtime();
    let obj = Object::new(&rt).unwrap();
    let weak = WeakObject::new(&rt, &obj).unwrap();
    env.collect_garbage().expect("idle environment");
    assert!(weak.lock(&rt).unwrap().is_object());
}

#[test]
fn test_runtime_identity() {
    let (_env, rt) = runtime();
    assert_eq!(rt.description(), "NapiJsiRuntime");
    assert!(!rt.is_inspectable());
    assert!(rt.drain_microtasks(-1).unwrap());

    let global = rt.global().unwrap();
    let again = rt.global().unwrap();
    assert!(Object::strict_equals(&rt, &global, &again).unwrap());
    assert!(global.get_property_as_function(&rt, "Object").is_ok());
}

#[test]
fn test_prop_name_ids() {
    let (env, rt) = runtime();
    let a = PropNameId::for_utf8(&rt, "name").unwrap();
    let references = env.live_references();
    let b = PropNameId::for_ascii(&rt, "name").unwrap();
    // Equal names share one interned reference.
    assert_eq!(env.live_references(), references);
    assert!(PropNameId::compare(&rt, &a, &b).unwrap());

    let text = JsiString::create_from_utf8(&rt, "name").unwrap();
    let c = PropNameId::for_string(&rt, &text).unwrap();
    assert!(PropNameId::compare(&rt, &a, &c).unwrap());
    assert_eq!(c.copy(&rt).unwrap().utf8(&rt).unwrap(), "name");

    let other = PropNameId::for_utf8(&rt, "other").unwrap();
    assert!(!PropNameId::compare(&rt, &a, &other).unwrap());
}

#[test]
fn test_strings() {
    let (_env, rt) = runtime();
    let utf8 = JsiString::create_from_utf8(&rt, "héllo ✓").unwrap();
    assert_eq!(utf8.utf8(&rt).unwrap(), "héllo ✓");

    let ascii = JsiString::create_from_ascii(&rt, "plain").unwrap();
    assert_eq!(ascii.utf8(&rt).unwrap(), "plain");

    let same = JsiString::create_from_utf8(&rt, "plain").unwrap();
    assert!(JsiString::strict_equals(&rt, &ascii, &same).unwrap());
    assert!(!JsiString::strict_equals(&rt, &ascii, &utf8).unwrap());
}

#[test]
fn test_symbols() {
    let (_env, rt) = runtime();
    let value = eval(&rt, "var tag = Symbol('tag'); tag");
    let symbol = value.as_symbol().unwrap();
    assert_eq!(symbol.to_string(&rt).unwrap(), "Symbol(tag)");

    let same = eval(&rt, "tag");
    assert!(jsi_core::Symbol::strict_equals(&rt, symbol, same.as_symbol().unwrap()).unwrap());
    let other = eval(&rt, "Symbol('tag')");
    assert!(!jsi_core::Symbol::strict_equals(&rt, symbol, other.as_symbol().unwrap()).unwrap());
}

#[test]
fn test_object_properties() {
    let (_env, rt) = runtime();
    let obj = Object::new(&rt).unwrap();
    assert!(!obj.has_property(&rt, "a").unwrap());
    obj.set_property(&rt, "a", &Value::from(1)).unwrap();
    assert!(obj.has_property(&rt, "a").unwrap());

    let key = JsiString::create_from_utf8(&rt, "b").unwrap();
    obj.set_property_with_string(&rt, &key, &Value::from(2)).unwrap();
    assert!(obj.has_property_with_string(&rt, &key).unwrap());
    assert_eq!(obj.get_property_with_string(&rt, &key).unwrap().as_number(), Some(2.0));
    assert!(obj.get_property(&rt, "missing").unwrap().is_undefined());
    assert!(!obj.is_function(&rt).unwrap());
    assert!(!obj.is_array(&rt).unwrap());
}

#[test]
fn test_property_names_include_inherited() {
    let (_env, rt) = runtime();
    let obj = eval(
        &rt,
        "function P() { this.own = 1; } P.prototype.inherited = 2; new P()",
    )
    .into_object()
    .unwrap();
    let names = obj.get_property_names(&rt).unwrap();
    let mut collected = Vec::new();
    for index in 0..names.size(&rt).unwrap() {
        let name = names.get_value_at_index(&rt, index).unwrap();
        collected.push(name.as_string().unwrap().utf8(&rt).unwrap());
    }
    assert_eq!(collected, ["own", "inherited"]);
}

#[test]
fn test_arrays() {
    let (_env, rt) = runtime();
    let array = Array::new(&rt, 3).unwrap();
    assert_eq!(array.size(&rt).unwrap(), 3);
    array.set_value_at_index(&rt, 1, &Value::from(5)).unwrap();
    assert!(array.get_value_at_index(&rt, 0).unwrap().is_undefined());
    assert_eq!(array.get_value_at_index(&rt, 1).unwrap().as_number(), Some(5.0));
    assert!(array.is_array(&rt).unwrap());

    let from_script = eval(&rt, "[1, 'two', [3]]").into_object().unwrap();
    let from_script = from_script.as_array(&rt).unwrap();
    assert_eq!(from_script.size(&rt).unwrap(), 3);
    let nested = from_script.get_value_at_index(&rt, 2).unwrap();
    assert!(nested.as_object().unwrap().is_array(&rt).unwrap());
}

#[test]
fn test_array_buffers() {
    let (_env, rt) = runtime();
    let buffer = eval(&rt, "var buffer = new ArrayBuffer(8); buffer")
        .into_object()
        .unwrap()
        .as_array_buffer(&rt)
        .unwrap();
    assert_eq!(buffer.size(&rt).unwrap(), 8);

    let data = buffer.data(&rt).unwrap();
    data.borrow_mut()[0] = 0xAB;
    let again = buffer.data(&rt).unwrap();
    assert_eq!(again.borrow()[0], 0xAB);

    let plain = Object::new(&rt).unwrap();
    assert!(!plain.is_array_buffer(&rt).unwrap());
    assert!(plain.as_array_buffer(&rt).is_err());
}

#[test]
fn test_calls_and_constructors() {
    let (_env, rt) = runtime();
    let add = eval(&rt, "(function (a, b) { return a + b; })")
        .into_object()
        .unwrap()
        .as_function(&rt)
        .unwrap();
    let sum = add.call(&rt, &[Value::from(1), Value::from(2)]).unwrap();
    assert_eq!(sum.as_number(), Some(3.0));

    let sum_ten = eval(
        &rt,
        "(function (a, b, c, d, e, f, g, h, i, j) { return a + b + c + d + e + f + g + h + i + j; })",
    )
    .into_object()
    .unwrap()
    .as_function(&rt)
    .unwrap();
    let args: Vec<Value> = (1..=10).map(Value::from).collect();
    assert_eq!(sum_ten.call(&rt, &args).unwrap().as_number(), Some(55.0));

    let this_reader = eval(&rt, "(function () { return this.tag; })")
        .into_object()
        .unwrap()
        .as_function(&rt)
        .unwrap();
    let receiver = Object::new(&rt).unwrap();
    receiver.set_property(&rt, "tag", &Value::from(9)).unwrap();
    let tag = this_reader.call_with_this(&rt, &receiver, &[]).unwrap();
    assert_eq!(tag.as_number(), Some(9.0));

    let point = eval(&rt, "function Point(x) { this.x = x; } Point")
        .into_object()
        .unwrap()
        .as_function(&rt)
        .unwrap();
    let instance = point
        .call_as_constructor(&rt, &[Value::from(4)])
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(instance.get_property(&rt, "x").unwrap().as_number(), Some(4.0));
    assert!(instance.instance_of(&rt, &point).unwrap());
    assert!(!Object::new(&rt).unwrap().instance_of(&rt, &point).unwrap());
}
