//! Engine-internal value representation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Index of a heap slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ObjectId(pub(crate) u32);

/// Symbol identity is the allocation.
#[derive(Debug)]
pub(crate) struct SymbolData {
    pub(crate) description: Option<Rc<str>>,
}

#[derive(Clone)]
pub(crate) enum Val {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Symbol(Rc<SymbolData>),
    Object(ObjectId),
}

impl Val {
    pub(crate) fn str(text: &str) -> Self {
        Val::Str(Rc::from(text))
    }

    pub(crate) fn as_object(&self) -> Option<ObjectId> {
        match self {
            Val::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn is_nullish(&self) -> bool {
        matches!(self, Val::Undefined | Val::Null)
    }

    /// `===`
    pub(crate) fn strict_equals(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::Undefined, Val::Undefined) | (Val::Null, Val::Null) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Number(a), Val::Number(b)) => a == b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::Symbol(a), Val::Symbol(b)) => Rc::ptr_eq(a, b),
            (Val::Object(a), Val::Object(b)) => a == b,
            _ => false,
        }
    }

    /// Truthiness.
    pub(crate) fn to_boolean(&self) -> bool {
        match self {
            Val::Undefined | Val::Null => false,
            Val::Bool(b) => *b,
            Val::Number(n) => *n != 0.0 && !n.is_nan(),
            Val::Str(s) => !s.is_empty(),
            Val::Symbol(_) | Val::Object(_) => true,
        }
    }
}

impl fmt::Debug for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Undefined => f.write_str("undefined"),
            Val::Null => f.write_str("null"),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Number(n) => f.write_str(&number_to_string(*n)),
            Val::Str(s) => write!(f, "{s:?}"),
            Val::Symbol(sym) => write!(f, "Symbol({})", sym.description.as_deref().unwrap_or("")),
            Val::Object(id) => write!(f, "#{}", id.0),
        }
    }
}

/// Property key: strings compare by content, symbols by identity.
#[derive(Clone)]
pub(crate) enum PropKey {
    Str(Rc<str>),
    Symbol(Rc<SymbolData>),
}

impl PropKey {
    pub(crate) fn str(text: &str) -> Self {
        PropKey::Str(Rc::from(text))
    }

    pub(crate) fn to_val(&self) -> Val {
        match self {
            PropKey::Str(s) => Val::Str(s.clone()),
            PropKey::Symbol(sym) => Val::Symbol(sym.clone()),
        }
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            PropKey::Str(s) => Some(s),
            PropKey::Symbol(_) => None,
        }
    }

    pub(crate) fn array_index(&self) -> Option<u32> {
        self.as_str().and_then(array_index)
    }
}

impl PartialEq for PropKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropKey::Str(a), PropKey::Str(b)) => a == b,
            (PropKey::Symbol(a), PropKey::Symbol(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for PropKey {}

impl Hash for PropKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            PropKey::Str(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            PropKey::Symbol(sym) => {
                1u8.hash(state);
                std::ptr::hash(Rc::as_ptr(sym), state);
            }
        }
    }
}

impl fmt::Debug for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_val(), f)
    }
}

/// Canonical array index (`"0"`, `"17"`, not `"017"`).
pub(crate) fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || key.len() > 10 || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u64>()
        .ok()
        .filter(|&n| n < u64::from(u32::MAX))
        .map(|n| n as u32)
}

/// `Number::toString` for the common cases.
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        if n.abs() <= 9_007_199_254_740_991.0 {
            return format!("{}", n as i64);
        }
        return format!("{n:.0}");
    }
    format!("{n}")
}

/// `ToNumber` for strings.
pub(crate) fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(9_007_199_254_740_991.0), "9007199254740991");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
    }

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("042"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("4294967295"), None);
    }

    #[test]
    fn test_symbol_keys_compare_by_identity() {
        let a = Rc::new(SymbolData { description: None });
        let b = Rc::new(SymbolData { description: None });
        assert!(PropKey::Symbol(a.clone()) == PropKey::Symbol(a));
        assert!(PropKey::Symbol(b.clone()) != PropKey::Symbol(Rc::new(SymbolData { description: None })));
        assert!(PropKey::str("x") == PropKey::str("x"));
    }
}
