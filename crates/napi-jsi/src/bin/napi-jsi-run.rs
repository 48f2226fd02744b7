//! Evaluate a script against the reference engine through the JSI adapter.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use jsi_core::{JsiError, Runtime, StringBuffer, Value};
use napi_env::{EnvConfig, ReferenceEnv};
use napi_jsi::{NapiJsiRuntime, RuntimeConfig};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(
    name = "napi-jsi-run",
    version,
    about = "Run a script through the NodeApi JSI runtime"
)]
struct Cli {
    /// Script to evaluate
    file: PathBuf,

    /// Serialize the script first and run the serialized form
    #[arg(long)]
    prepare: bool,

    /// Runtime config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nested calls allowed before the engine reports a stack overflow
    #[arg(long, value_name = "DEPTH")]
    max_call_depth: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .init();

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RuntimeConfig::from_json(&json)
                .with_context(|| format!("invalid runtime config {}", path.display()))?
        }
        None => RuntimeConfig::default(),
    };

    let mut env_config = EnvConfig::default();
    if let Some(depth) = cli.max_call_depth {
        env_config = env_config.max_call_depth(depth);
    }

    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let source_url = cli.file.display().to_string();

    let env = Rc::new(ReferenceEnv::with_config(env_config));
    let rt = NapiJsiRuntime::with_config(env, config).map_err(report)?;
    let buffer = Rc::new(StringBuffer::new(source));

    let value = if cli.prepare {
        let prepared = rt.prepare_javascript(buffer, source_url).map_err(report)?;
        rt.evaluate_prepared_javascript(&prepared).map_err(report)?
    } else {
        rt.evaluate_javascript(buffer, &source_url).map_err(report)?
    };

    println!("{}", display(&rt, &value).map_err(report)?);
    Ok(())
}

fn display(rt: &dyn Runtime, value: &Value) -> Result<String, JsiError> {
    match value {
        Value::String(text) => Ok(format!("{:?}", text.utf8(rt)?)),
        Value::Symbol(symbol) => symbol.to_string(rt),
        _ => value.to_js_string(rt)?.utf8(rt),
    }
}

/// Runtime errors hold engine values and cannot cross into `anyhow`.
fn report(err: JsiError) -> anyhow::Error {
    match err.as_js() {
        Some(js) if !js.stack().is_empty() => anyhow!("Uncaught {}", js.stack()),
        Some(js) => anyhow!("Uncaught {}", js.message()),
        None => anyhow!("{err}"),
    }
}
