//! Argument marshalling benchmarks
//!
//! Calls through host functions with argument counts on both sides of the
//! inline argument buffer.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::rc::Rc;

use jsi_core::{Function, JsiResult, PropNameId, Runtime, RuntimeExt, Value};
use napi_env::ReferenceEnv;
use napi_jsi::NapiJsiRuntime;

fn count_args(_rt: &dyn Runtime, _this: &Value, args: &[Value]) -> JsiResult<Value> {
    Ok(Value::from(args.len() as f64))
}

fn setup() -> (NapiJsiRuntime, Function) {
    let rt = NapiJsiRuntime::new(Rc::new(ReferenceEnv::new())).unwrap();
    let name = PropNameId::for_ascii(&rt, "count").unwrap();
    let count = Function::create_from_host_function(&rt, &name, 0, Rc::new(count_args)).unwrap();
    (rt, count)
}

/// Host to host: values go out as engine handles and come back as views.
fn bench_host_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_function_call");
    for arg_count in [4usize, 16] {
        let (rt, count) = setup();
        let args: Vec<Value> = (0..arg_count as i32).map(Value::from).collect();
        group.bench_with_input(BenchmarkId::from_parameter(arg_count), &args, |b, args| {
            b.iter(|| count.call(&rt, black_box(args)).unwrap());
        });
    }
    group.finish();
}

/// Script to host: only the view side is exercised.
fn bench_script_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("script_to_host_call");
    for (arg_count, source) in [
        (4, "count(1, 2, 3, 4)"),
        (
            16,
            "count(1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16)",
        ),
    ] {
        let (rt, count) = setup();
        rt.global()
            .unwrap()
            .set_property(&rt, "count", &Value::from(count))
            .unwrap();
        let prepared = rt
            .prepare_javascript(Rc::new(jsi_core::StringBuffer::new(source)), "bench.js".into())
            .unwrap();
        group.bench_function(BenchmarkId::from_parameter(arg_count), |b| {
            b.iter(|| rt.evaluate_prepared_javascript(black_box(&prepared)).unwrap());
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let (rt, _) = setup();
    c.bench_function("evaluate_sum", |b| {
        b.iter(|| rt.evaluate_script(black_box("1 + 2"), "bench.js").unwrap());
    });
}

criterion_group!(benches, bench_host_call, bench_script_call, bench_evaluate);
criterion_main!(benches);
