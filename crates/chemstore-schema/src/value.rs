//! Specifier values.
//!
//! A specifier is an ordered, fixed-length list of [`SpecValue`]s. The engine
//! only cares about how many values there are and which [`ValueKind`] each one
//! has; the meaning of a value belongs to the schema that encodes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered tuple of values identifying one node within a schema.
pub type Specifier = Vec<SpecValue>;

/// The kind of a single specifier value, as declared in a schema signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Str,
    Int,
    Bool,
    StrList,
    IntList,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::StrList => "[str]",
            ValueKind::IntList => "[int]",
        };
        f.write_str(name)
    }
}

/// One value of a specifier.
///
/// Serialized untagged so specifier files stay readable:
/// `"InChI=1S/CH4/h1H4"`, `1`, `true`, `["D5", "D8"]`, `[0, 3]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Bool(bool),
    Int(i64),
    Str(String),
    IntList(Vec<i64>),
    StrList(Vec<String>),
}

impl SpecValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SpecValue::Str(_) => ValueKind::Str,
            SpecValue::Int(_) => ValueKind::Int,
            SpecValue::Bool(_) => ValueKind::Bool,
            SpecValue::StrList(_) => ValueKind::StrList,
            SpecValue::IntList(_) => ValueKind::IntList,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpecValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SpecValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SpecValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            SpecValue::StrList(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            SpecValue::IntList(items) => Some(items),
            _ => None,
        }
    }

    /// Reinterpret a decoded value as `kind`.
    ///
    /// An empty JSON list decodes as `IntList`; this lets it stand in for an
    /// empty `StrList` too. Every other kind mismatch yields `None`.
    pub fn conform(self, kind: ValueKind) -> Option<SpecValue> {
        match (self, kind) {
            (v, k) if v.kind() == k => Some(v),
            (SpecValue::IntList(items), ValueKind::StrList) if items.is_empty() => {
                Some(SpecValue::StrList(Vec::new()))
            }
            (SpecValue::StrList(items), ValueKind::IntList) if items.is_empty() => {
                Some(SpecValue::IntList(Vec::new()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Str(s) => f.write_str(s),
            SpecValue::Int(i) => write!(f, "{i}"),
            SpecValue::Bool(b) => write!(f, "{b}"),
            SpecValue::StrList(items) => write!(f, "[{}]", items.join(", ")),
            SpecValue::IntList(items) => {
                let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

impl From<&str> for SpecValue {
    fn from(value: &str) -> Self {
        SpecValue::Str(value.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(value: String) -> Self {
        SpecValue::Str(value)
    }
}

impl From<i64> for SpecValue {
    fn from(value: i64) -> Self {
        SpecValue::Int(value)
    }
}

impl From<i32> for SpecValue {
    fn from(value: i32) -> Self {
        SpecValue::Int(i64::from(value))
    }
}

impl From<u32> for SpecValue {
    fn from(value: u32) -> Self {
        SpecValue::Int(i64::from(value))
    }
}

impl From<bool> for SpecValue {
    fn from(value: bool) -> Self {
        SpecValue::Bool(value)
    }
}

impl From<Vec<String>> for SpecValue {
    fn from(value: Vec<String>) -> Self {
        SpecValue::StrList(value)
    }
}

impl From<Vec<&str>> for SpecValue {
    fn from(value: Vec<&str>) -> Self {
        SpecValue::StrList(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for SpecValue {
    fn from(value: Vec<i64>) -> Self {
        SpecValue::IntList(value)
    }
}

/// Build a [`Specifier`] from a list of values convertible into [`SpecValue`].
///
/// ```
/// use chemstore_schema::{spec, SpecValue};
///
/// let s = spec!["InChI=1S/CH4/h1H4", 1];
/// assert_eq!(s, vec![SpecValue::Str("InChI=1S/CH4/h1H4".into()), SpecValue::Int(1)]);
/// ```
#[macro_export]
macro_rules! spec {
    () => {
        $crate::Specifier::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::SpecValue::from($value)),+]
    };
}
