//! Host-side values read from and written to ctype objects.

use std::fmt;

use cmem_core::Num;
use indexmap::IndexMap;

/// A value moved between the host and a ctype object.
///
/// Integers (including pointer addresses) read back as [`Value::Int`],
/// `Float` reads back as [`Value::Float`], character types as
/// [`Value::Char`]. Arrays read back as [`Value::Array`] and structs as an
/// ordered [`Value::Struct`] map in field declaration order.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Integer or address.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Single character.
    Char(char),
    /// String. Character types take its first code unit, character arrays
    /// take one character per element.
    Text(String),
    /// Sequence, one entry per array element.
    Array(Vec<Value>),
    /// Field name to field value.
    Struct(IndexMap<String, Value>),
}

impl Value {
    /// Numeric content of an `Int` or `Float`.
    pub fn as_num(&self) -> Option<Num> {
        match self {
            Self::Int(i) => Some(Num::Int(*i)),
            Self::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    /// Integer content, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Text(_) => "string",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }

    /// Build a struct value from `(name, value)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Field `name` of a struct value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Char(c) => write!(f, "{c:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<Num> for Value {
    fn from(n: Num) -> Self {
        match n {
            Num::Int(i) => Self::Int(i),
            Num::Float(f) => Self::Float(f),
        }
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

int_value!(u8, u16, u32, i8, i16, i32, i64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
