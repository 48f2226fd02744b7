//! Script exceptions, engine status failures and stack overflow reporting.

use std::rc::Rc;

use jsi_core::{Array, JsError, JsiError, Object, Runtime, RuntimeExt, Value};
use napi_env::{EnvConfig, ReferenceEnv};
use napi_jsi::{NapiJsiRuntime, RuntimeConfig};

fn runtime_with(config: RuntimeConfig) -> NapiJsiRuntime {
    // A shallow call limit keeps the overflow tests fast.
    let env = Rc::new(ReferenceEnv::with_config(EnvConfig::new().max_call_depth(24)));
    NapiJsiRuntime::with_config(env, config).expect("runtime")
}

fn runtime() -> NapiJsiRuntime {
    runtime_with(RuntimeConfig::default())
}

fn js_error(result: Result<Value, JsiError>) -> JsError {
    match result {
        Ok(value) => panic!("expected a script error, got {}", value.kind_name()),
        Err(JsiError::Js(err)) => err,
        Err(JsiError::Native(message)) => panic!("expected a script error, got native {message}"),
    }
}

#[test]
fn test_thrown_error_object() {
    let rt = runtime();
    let err = js_error(rt.evaluate_script("throw new TypeError('bad input')", "t.js"));
    assert_eq!(err.message(), "bad input");

    let value = err.value().as_object().unwrap();
    let type_error = rt
        .global()
        .unwrap()
        .get_property_as_function(&rt, "TypeError")
        .unwrap();
    assert!(value.instance_of(&rt, &type_error).unwrap());
}

#[test]
fn test_thrown_primitive() {
    let rt = runtime();
    let err = js_error(rt.evaluate_script("throw 42", "t.js"));
    assert_eq!(err.value().as_number(), Some(42.0));
    assert_eq!(err.message(), "42");

    let err = js_error(rt.evaluate_script("throw 'plain text'", "t.js"));
    assert_eq!(err.message(), "plain text");
}

#[test]
fn test_thrown_object_without_message() {
    let rt = runtime();
    let err = js_error(rt.evaluate_script("throw { code: 1 }", "t.js"));
    assert_eq!(err.message(), "[object Object]");
}

#[test]
fn test_syntax_error() {
    let rt = runtime();
    let err = js_error(rt.evaluate_script("var = 1", "t.js"));
    let syntax_error = rt
        .global()
        .unwrap()
        .get_property_as_function(&rt, "SyntaxError")
        .unwrap();
    let value = err.value().as_object().unwrap();
    assert!(value.instance_of(&rt, &syntax_error).unwrap());
}

#[test]
fn test_runtime_usable_after_error() {
    let rt = runtime();
    let thrower = rt
        .evaluate_script("(function () { throw new Error('once'); })", "t.js")
        .unwrap()
        .into_object()
        .unwrap()
        .as_function(&rt)
        .unwrap();
    for _ in 0..3 {
        let err = thrower.call(&rt, &[]).unwrap_err();
        assert_eq!(err.message(), "once");
    }
    let value = rt.evaluate_script("2 * 21", "t.js").unwrap();
    assert_eq!(value.as_number(), Some(42.0));
}

#[test]
fn test_error_caught_by_script_stays_in_script() {
    let rt = runtime();
    let value = rt
        .evaluate_script(
            "var seen; try { null.x; } catch (e) { seen = e instanceof TypeError; } seen",
            "t.js",
        )
        .unwrap();
    assert_eq!(value.as_bool(), Some(true));
}

#[test]
fn test_stack_overflow_is_normalized() {
    let rt = runtime();
    let err = js_error(rt.evaluate_script("function f() { return f(); } f()", "t.js"));
    assert_eq!(err.message(), "RangeError : Maximum call stack size exceeded");

    let message = err
        .value()
        .as_object()
        .unwrap()
        .get_property(&rt, "message")
        .unwrap();
    assert_eq!(
        message.as_string().unwrap().utf8(&rt).unwrap(),
        "RangeError : Maximum call stack size exceeded"
    );
}

#[test]
fn test_stack_overflow_message_kept_when_disabled() {
    let rt = runtime_with(RuntimeConfig::new().normalize_stack_overflow(false));
    let err = js_error(rt.evaluate_script("function f() { return f(); } f()", "t.js"));
    assert_eq!(err.message(), "Out of stack space");
}

#[test]
fn test_other_messages_are_not_rewritten() {
    let rt = runtime();
    let err = js_error(rt.evaluate_script("throw new RangeError('Out of range')", "t.js"));
    assert_eq!(err.message(), "Out of range");
}

#[test]
fn test_status_failure_is_native() {
    let rt = runtime();
    let obj = Object::new(&rt).unwrap();
    let not_an_array = Array::from_pointer(rt.clone_object(obj.pointer()).unwrap());
    let err = rt.array_size(&not_an_array).unwrap_err();
    assert!(!err.is_js());
    assert_eq!(err.message(), "A call to NodeApi returned error code 0x8.");
}

#[test]
fn test_calling_a_non_function_is_native() {
    let rt = runtime();
    let obj = Object::new(&rt).unwrap();
    let not_a_function = jsi_core::Function::from_pointer(rt.clone_object(obj.pointer()).unwrap());
    let err = not_a_function.call(&rt, &[]).unwrap_err();
    assert_eq!(err.message(), "A call to NodeApi returned error code 0x5.");
}

#[test]
fn test_js_error_new_builds_error() {
    let rt = runtime();
    let err = JsError::new(&rt, "made by host").unwrap();
    assert_eq!(err.message(), "made by host");
    let message = err
        .value()
        .as_object()
        .unwrap()
        .get_property(&rt, "message")
        .unwrap();
    assert_eq!(message.as_string().unwrap().utf8(&rt).unwrap(), "made by host");
}

#[test]
fn test_unreadable_message_is_still_a_script_error() {
    let rt = runtime();
    let source = "throw new Proxy({}, { get: function () { throw new Error('inner'); } })";
    let result = rt.evaluate_script(source, "t.js");
    let Err(JsiError::Js(err)) = result else {
        panic!("expected a script error");
    };
    assert!(
        err.message().starts_with("[Exception while creating message string:"),
        "{}",
        err.message()
    );
    assert!(err.value().is_object());

    // Nothing is left pending in the engine.
    let value = rt.evaluate_script("1+1", "t.js").unwrap();
    assert_eq!(value.as_number(), Some(2.0));
}
