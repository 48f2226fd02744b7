//! Engine-neutral JavaScript interface.
//!
//! This crate defines the values and the [`Runtime`] contract shared by
//! every engine adapter. Host code only ever sees [`Value`], [`Object`],
//! [`JsiString`] and friends; engine handles stay behind the runtime.
//!
//! # Lifetimes
//!
//! Strings, symbols, objects and property names carry a [`PointerValue`].
//! A pointer value is either a *view* of a handle owned by the current
//! native frame (arguments passed to a host function, for example) or an
//! *owning* engine reference released when the value drops. Host code
//! receives views only by reference, so they cannot escape the call.
//! [`Value::copy`] always produces an owning value.
//!
//! # Thread Safety
//!
//! Runtimes and values are `!Send` and `!Sync`: an engine environment is
//! bound to the thread that created it.
//!
//! ```compile_fail
//! use jsi_core::Value;
//!
//! fn assert_send<T: Send>(_: T) {}
//! assert_send(Value::Undefined);
//! ```
//!
//! ```compile_fail
//! use jsi_core::Object;
//!
//! fn assert_sync<T: Sync>() {}
//! assert_sync::<Object>();
//! ```

mod error;
mod object;
mod pointer;
mod runtime;
mod string;
mod value;

pub use error::{JsError, JsiError, JsiResult};
pub use object::{Array, ArrayBuffer, Function, Object, WeakObject};
pub use pointer::{OwnedPointer, PointerRef, PointerValue, RawHandle};
pub use runtime::{
    ArrayBufferStorage, Buffer, HostFunction, HostObject, PreparedJavaScript, Runtime, RuntimeExt,
    Scope, ScopeState, StringBuffer,
};
pub use string::{JsiString, PropNameId, Symbol};
pub use value::Value;
