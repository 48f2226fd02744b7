//! JSI runtime adapter over Node-API.
//!
//! [`NapiJsiRuntime`] implements [`jsi_core::Runtime`] on top of any
//! [`napi_env::NodeApi`] environment. Host code exchanges [`jsi_core::Value`]s
//! with the engine and never sees an engine handle.
//!
//! ```
//! use std::rc::Rc;
//!
//! use jsi_core::RuntimeExt;
//! use napi_env::ReferenceEnv;
//! use napi_jsi::NapiJsiRuntime;
//!
//! let rt = NapiJsiRuntime::new(Rc::new(ReferenceEnv::new())).unwrap();
//! let value = rt.evaluate_script("1 + 2", "sum.js").unwrap();
//! assert_eq!(value.as_number(), Some(3.0));
//! ```
//!
//! # Host objects and functions
//!
//! Host objects are exposed to scripts as proxies whose traps call back into
//! the [`jsi_core::HostObject`]. Errors and panics raised by host code are
//! turned into script exceptions at the callback boundary and never unwind
//! into the engine.
//!
//! # Thread safety
//!
//! A runtime is bound to the thread owning its environment:
//!
//! ```compile_fail
//! fn assert_send<T: Send>() {}
//! assert_send::<napi_jsi::NapiJsiRuntime>();
//! ```

mod args;
mod cache;
mod config;
mod error;
mod host;
mod pointer;
mod runtime;
mod script;

pub use config::RuntimeConfig;
pub use runtime::NapiJsiRuntime;
pub use script::{NapiPreparedJavaScript, VectorBuffer};
