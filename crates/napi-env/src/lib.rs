//! Node-API environment contract.
//!
//! [`NodeApi`] is the engine-facing side of the JSI adapter: a table of
//! `napi_*` primitives over opaque handles. [`ReferenceEnv`] implements it
//! with a small in-process engine so the adapter can run without a
//! production JavaScript engine.
//!
//! # Handles and references
//!
//! A [`NapiValue`] is valid until the handle scope it was created in is
//! closed. Values that must outlive a scope are held through a [`NapiRef`],
//! which is reference counted and deleted when its count drops to zero.
//!
//! # Thread safety
//!
//! Environments are single threaded. `ReferenceEnv` is `!Send`:
//!
//! ```compile_fail
//! fn assert_send<T: Send>() {}
//! assert_send::<napi_env::ReferenceEnv>();
//! ```

mod api;
mod reference;
mod status;

pub use api::{
    BackingStore, NapiCallback, NapiCallbackInfo, NapiEnvScope, NapiHandleScope,
    NapiPropertyDescriptor, NapiRef, NapiValue, NodeApi,
};
pub use reference::{CodecError, EnvConfig, GcStats, ReferenceEnv};
pub use status::{
    KeyCollectionMode, KeyConversion, KeyFilter, NapiResult, NapiStatus, NapiValueType,
    PropertyAttributes,
};
