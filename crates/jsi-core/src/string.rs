//! Strings, symbols and property names.

use crate::error::JsiResult;
use crate::pointer::PointerValue;
use crate::runtime::Runtime;

/// A JavaScript string.
#[derive(Debug)]
pub struct JsiString {
    ptr: PointerValue,
}

impl JsiString {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self { ptr }
    }

    pub fn pointer(&self) -> &PointerValue {
        &self.ptr
    }

    /// Create a string from ASCII text.
    pub fn create_from_ascii(rt: &dyn Runtime, ascii: &str) -> JsiResult<Self> {
        rt.create_string_from_ascii(ascii.as_bytes())
    }

    pub fn create_from_utf8(rt: &dyn Runtime, utf8: &str) -> JsiResult<Self> {
        rt.create_string_from_utf8(utf8.as_bytes())
    }

    pub fn utf8(&self, rt: &dyn Runtime) -> JsiResult<String> {
        rt.string_to_utf8(self)
    }

    /// Independent owning copy.
    pub fn copy(&self, rt: &dyn Runtime) -> JsiResult<Self> {
        Ok(Self::from_pointer(rt.clone_string(&self.ptr)?))
    }

    pub fn strict_equals(rt: &dyn Runtime, a: &Self, b: &Self) -> JsiResult<bool> {
        rt.strict_equals_string(a, b)
    }
}

/// A JavaScript symbol.
#[derive(Debug)]
pub struct Symbol {
    ptr: PointerValue,
}

impl Symbol {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self { ptr }
    }

    pub fn pointer(&self) -> &PointerValue {
        &self.ptr
    }

    /// `Symbol.prototype.toString` applied to this symbol.
    pub fn to_string(&self, rt: &dyn Runtime) -> JsiResult<String> {
        rt.symbol_to_string(self)
    }

    pub fn copy(&self, rt: &dyn Runtime) -> JsiResult<Self> {
        Ok(Self::from_pointer(rt.clone_symbol(&self.ptr)?))
    }

    pub fn strict_equals(rt: &dyn Runtime, a: &Self, b: &Self) -> JsiResult<bool> {
        rt.strict_equals_symbol(a, b)
    }
}

/// A property key: a string or a symbol.
///
/// Names created from equal text compare equal with [`PropNameId::compare`].
/// Symbol names compare equal only to the same symbol.
#[derive(Debug)]
pub struct PropNameId {
    ptr: PointerValue,
}

impl PropNameId {
    pub fn from_pointer(ptr: PointerValue) -> Self {
        Self { ptr }
    }

    pub fn pointer(&self) -> &PointerValue {
        &self.ptr
    }

    pub fn for_ascii(rt: &dyn Runtime, ascii: &str) -> JsiResult<Self> {
        rt.create_prop_name_id_from_ascii(ascii.as_bytes())
    }

    pub fn for_utf8(rt: &dyn Runtime, utf8: &str) -> JsiResult<Self> {
        rt.create_prop_name_id_from_utf8(utf8.as_bytes())
    }

    pub fn for_string(rt: &dyn Runtime, text: &JsiString) -> JsiResult<Self> {
        rt.create_prop_name_id_from_string(text)
    }

    pub fn for_symbol(rt: &dyn Runtime, symbol: &Symbol) -> JsiResult<Self> {
        rt.create_prop_name_id_from_symbol(symbol)
    }

    pub fn utf8(&self, rt: &dyn Runtime) -> JsiResult<String> {
        rt.prop_name_id_to_utf8(self)
    }

    pub fn compare(rt: &dyn Runtime, a: &Self, b: &Self) -> JsiResult<bool> {
        rt.compare_prop_name_ids(a, b)
    }

    pub fn copy(&self, rt: &dyn Runtime) -> JsiResult<Self> {
        Ok(Self::from_pointer(rt.clone_prop_name_id(&self.ptr)?))
    }

    /// Build names from a list of ASCII strings.
    pub fn names(rt: &dyn Runtime, names: &[&str]) -> JsiResult<Vec<Self>> {
        names.iter().map(|name| Self::for_ascii(rt, name)).collect()
    }
}
