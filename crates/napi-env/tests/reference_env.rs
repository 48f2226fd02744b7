//! Reference engine tests through the public Node-API surface.

use std::any::Any;
use std::rc::Rc;

use napi_env::{
    EnvConfig, KeyCollectionMode, KeyConversion, KeyFilter, NapiCallbackInfo, NapiPropertyDescriptor,
    NapiStatus, NapiValue, NapiValueType, NodeApi, PropertyAttributes, ReferenceEnv,
};

fn eval(env: &ReferenceEnv, source: &str) -> Result<NapiValue, NapiStatus> {
    let source = env.create_string_utf8(source.as_bytes())?;
    env.run_script(source, "test.js")
}

fn string_of(env: &ReferenceEnv, value: NapiValue) -> String {
    env.get_value_string_utf8(value).expect("string value")
}

fn pending_message(env: &ReferenceEnv) -> String {
    let exception = env.get_and_clear_last_exception().expect("exception");
    let key = env.create_string_utf8(b"message").expect("key");
    let message = env.get_property(exception, key).expect("message");
    string_of(env, message)
}

#[test]
fn test_value_types() {
    let env = ReferenceEnv::new();
    let cases = [
        ("undefined", NapiValueType::Undefined),
        ("null", NapiValueType::Null),
        ("true", NapiValueType::Boolean),
        ("1.5", NapiValueType::Number),
        ("'text'", NapiValueType::String),
        ("Symbol('s')", NapiValueType::Symbol),
        ("({})", NapiValueType::Object),
        ("(function () {})", NapiValueType::Function),
    ];
    for (source, expected) in cases {
        let value = eval(&env, source).expect(source);
        assert_eq!(env.type_of(value), Ok(expected), "{source}");
    }
}

#[test]
fn test_external_finalizer_runs_on_collection() {
    let env = ReferenceEnv::new();
    let data: Rc<dyn Any> = Rc::new(String::from("payload"));
    let scope = env.open_env_scope().expect("scope");
    let external = env.create_external(data.clone()).expect("external");
    assert_eq!(env.type_of(external), Ok(NapiValueType::External));
    let back = env.get_value_external(external).expect("data");
    assert_eq!(back.downcast_ref::<String>().map(String::as_str), Some("payload"));
    drop(back);
    env.close_env_scope(scope).expect("close");

    assert_eq!(Rc::strong_count(&data), 2);
    env.collect_garbage().expect("idle");
    assert_eq!(Rc::strong_count(&data), 1);
}

#[test]
fn test_no_collection_inside_env_scope() {
    let env = ReferenceEnv::new();
    let scope = env.open_env_scope().expect("scope");
    assert!(env.collect_garbage().is_none());
    env.close_env_scope(scope).expect("close");
    assert!(env.collect_garbage().is_some());
}

#[test]
fn test_call_depth_limit() {
    let env = ReferenceEnv::with_config(EnvConfig::new().max_call_depth(10));
    assert_eq!(
        eval(&env, "function down(n) { return n === 0 ? 0 : down(n - 1); } down(20)"),
        Err(NapiStatus::PendingException)
    );
    assert_eq!(pending_message(&env), "Out of stack space");
    let value = eval(&env, "down(5)").expect("within the limit");
    assert_eq!(env.get_value_double(value), Ok(0.0));
}

#[test]
fn test_proxy_traps_from_script() {
    let env = ReferenceEnv::new();
    let source = "
        var log = [];
        var handler = {
            get: function (t, k) { return 'got ' + k; },
            set: function (t, k, v) { log.push(k + '=' + v); return true; },
            has: function (t, k) { return k === 'present'; },
            ownKeys: function (t) { return ['a', 'b']; },
            getOwnPropertyDescriptor: function (t, k) {
                return { value: 1, writable: true, enumerable: true, configurable: true };
            }
        };
        var p = new Proxy({}, handler);
        p.x = 5;
        [p.y, 'present' in p, 'absent' in p, Object.keys(p).join(','), log.join(';')].join('|')
    ";
    let value = eval(&env, source).expect("runs");
    assert_eq!(string_of(&env, value), "got y|true|false|a,b|x=5");
}

#[test]
fn test_define_properties_and_key_filters() {
    let env = ReferenceEnv::new();
    let object = env.create_object().expect("object");
    let visible = env.create_string_utf8(b"visible").expect("name");
    let hidden = env.create_string_utf8(b"hidden").expect("name");
    let value = env.create_double(1.0).expect("value");
    env.define_properties(
        object,
        &[
            NapiPropertyDescriptor {
                name: visible,
                value,
                attributes: PropertyAttributes::ALL,
            },
            NapiPropertyDescriptor {
                name: hidden,
                value,
                attributes: PropertyAttributes::WRITABLE,
            },
        ],
    )
    .expect("define");

    let all = env
        .get_all_property_names(
            object,
            KeyCollectionMode::OwnOnly,
            KeyFilter::ALL_PROPERTIES,
            KeyConversion::NumbersToStrings,
        )
        .expect("names");
    assert_eq!(env.get_array_length(all), Ok(2));
    let enumerable = env
        .get_all_property_names(
            object,
            KeyCollectionMode::OwnOnly,
            KeyFilter::ENUMERABLE,
            KeyConversion::NumbersToStrings,
        )
        .expect("names");
    assert_eq!(env.get_array_length(enumerable), Ok(1));
}

#[test]
fn test_native_constructor_receives_new_target() {
    fn make(env: &dyn NodeApi, info: &NapiCallbackInfo) -> Option<NapiValue> {
        let flag = env.get_boolean(info.new_target().is_some()).ok()?;
        let key = env.create_string_utf8(b"constructed").ok()?;
        env.set_property(info.this(), key, flag).ok()?;
        None
    }
    let env = ReferenceEnv::new();
    let ctor = env.create_function("Thing", make, None).expect("function");
    let instance = env.new_instance(ctor, &[]).expect("construct");
    assert_eq!(env.instance_of(instance, ctor), Ok(true));
    let key = env.create_string_utf8(b"constructed").expect("key");
    let flag = env.get_property(instance, key).expect("flag");
    assert_eq!(env.get_value_bool(flag), Ok(true));
}

#[test]
fn test_array_buffer_shares_backing_store() {
    let env = ReferenceEnv::new();
    let buffer = eval(&env, "new ArrayBuffer(8)").expect("buffer");
    assert_eq!(env.is_arraybuffer(buffer), Ok(true));
    let (store, length) = env.get_arraybuffer_info(buffer).expect("info");
    assert_eq!(length, 8);
    store.borrow_mut()[0] = 7;
    let (again, _) = env.get_arraybuffer_info(buffer).expect("info");
    assert_eq!(again.borrow()[0], 7);
    let key = env.create_string_utf8(b"byteLength").expect("key");
    let size = env.get_property(buffer, key).expect("byteLength");
    assert_eq!(env.get_value_double(size), Ok(8.0));
}

#[test]
fn test_type_mismatch_statuses() {
    let env = ReferenceEnv::new();
    let number = env.create_double(1.0).expect("number");
    assert_eq!(env.get_value_bool(number), Err(NapiStatus::BooleanExpected));
    assert_eq!(env.get_value_string_utf8(number), Err(NapiStatus::StringExpected));
    assert_eq!(env.get_array_length(number), Err(NapiStatus::ArrayExpected));
    let undefined = env.get_undefined().expect("undefined");
    assert_eq!(
        env.call_function(undefined, number, &[]),
        Err(NapiStatus::FunctionExpected)
    );
    assert_eq!(
        env.get_value_double(NapiValue::from_raw(9_999)),
        Err(NapiStatus::InvalidArg)
    );
}
