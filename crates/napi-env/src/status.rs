//! Status codes and enumerations of the Node-API surface.

use std::ops::BitOr;

use thiserror::Error;

/// `napi_status` codes. Every primitive reports failure with one of these.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NapiStatus {
    #[error("napi_ok")]
    Ok = 0,
    #[error("napi_invalid_arg")]
    InvalidArg = 1,
    #[error("napi_object_expected")]
    ObjectExpected = 2,
    #[error("napi_string_expected")]
    StringExpected = 3,
    #[error("napi_name_expected")]
    NameExpected = 4,
    #[error("napi_function_expected")]
    FunctionExpected = 5,
    #[error("napi_number_expected")]
    NumberExpected = 6,
    #[error("napi_boolean_expected")]
    BooleanExpected = 7,
    #[error("napi_array_expected")]
    ArrayExpected = 8,
    #[error("napi_generic_failure")]
    GenericFailure = 9,
    #[error("napi_pending_exception")]
    PendingException = 10,
    #[error("napi_cancelled")]
    Cancelled = 11,
    #[error("napi_escape_called_twice")]
    EscapeCalledTwice = 12,
    #[error("napi_handle_scope_mismatch")]
    HandleScopeMismatch = 13,
    #[error("napi_callback_scope_mismatch")]
    CallbackScopeMismatch = 14,
    #[error("napi_queue_full")]
    QueueFull = 15,
    #[error("napi_closing")]
    Closing = 16,
    #[error("napi_bigint_expected")]
    BigintExpected = 17,
    #[error("napi_date_expected")]
    DateExpected = 18,
    #[error("napi_arraybuffer_expected")]
    ArraybufferExpected = 19,
    #[error("napi_detachable_arraybuffer_expected")]
    DetachableArraybufferExpected = 20,
    #[error("napi_would_deadlock")]
    WouldDeadlock = 21,
}

impl NapiStatus {
    /// Numeric `napi_status` value.
    pub fn code(self) -> i32 {
        self as i32
    }
}

pub type NapiResult<T> = Result<T, NapiStatus>;

/// Result of `napi_typeof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NapiValueType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Symbol,
    Object,
    Function,
    External,
    Bigint,
}

/// Whether key collection walks the prototype chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCollectionMode {
    IncludePrototypes,
    OwnOnly,
}

/// How index-like keys are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyConversion {
    KeepNumbers,
    NumbersToStrings,
}

/// `napi_key_filter` bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyFilter(u32);

impl KeyFilter {
    pub const ALL_PROPERTIES: Self = Self(0);
    pub const WRITABLE: Self = Self(1);
    pub const ENUMERABLE: Self = Self(1 << 1);
    pub const CONFIGURABLE: Self = Self(1 << 2);
    pub const SKIP_STRINGS: Self = Self(1 << 3);
    pub const SKIP_SYMBOLS: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for KeyFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// `napi_property_attributes` bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyAttributes(u32);

impl PropertyAttributes {
    pub const DEFAULT: Self = Self(0);
    pub const WRITABLE: Self = Self(1);
    pub const ENUMERABLE: Self = Self(1 << 1);
    pub const CONFIGURABLE: Self = Self(1 << 2);
    /// Writable, enumerable and configurable: what plain assignment creates.
    pub const ALL: Self = Self(1 | (1 << 1) | (1 << 2));

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    pub fn enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    pub fn configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }
}

impl BitOr for PropertyAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_node_api() {
        assert_eq!(NapiStatus::Ok.code(), 0);
        assert_eq!(NapiStatus::GenericFailure.code(), 9);
        assert_eq!(NapiStatus::PendingException.code(), 10);
        assert_eq!(NapiStatus::WouldDeadlock.code(), 21);
        assert_eq!(NapiStatus::ObjectExpected.to_string(), "napi_object_expected");
    }

    #[test]
    fn test_filters_combine() {
        let filter = KeyFilter::ENUMERABLE | KeyFilter::SKIP_SYMBOLS;
        assert!(filter.contains(KeyFilter::ENUMERABLE));
        assert!(filter.contains(KeyFilter::SKIP_SYMBOLS));
        assert!(!filter.contains(KeyFilter::SKIP_STRINGS));

        let attrs = PropertyAttributes::CONFIGURABLE;
        assert!(attrs.configurable());
        assert!(!attrs.writable());
        assert!(PropertyAttributes::ALL.enumerable());
    }
}
