//! Bind values.
//!
//! A [`BindValue`] is the scalar carried by a named bind parameter and by the
//! columns of a probe row.

use serde::{Deserialize, Serialize};

/// A scalar value bound to a named SQL parameter.
///
/// Serializes to the plain JSON scalar it holds, so parameter maps can be
/// read from configuration or request bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value, including character LOB content.
    Text(String),
    /// Binary value, including binary LOB content.
    Blob(Vec<u8>),
}

impl BindValue {
    /// Returns the integer, if this is an integer value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the storage class name used in log output.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

/// Trait for types that can be bound as a named parameter.
pub trait ToBindValue {
    /// Converts the value to a [`BindValue`].
    fn to_bind_value(self) -> BindValue;
}

impl ToBindValue for BindValue {
    fn to_bind_value(self) -> BindValue {
        self
    }
}

impl ToBindValue for bool {
    fn to_bind_value(self) -> BindValue {
        BindValue::Bool(self)
    }
}

macro_rules! int_to_bind_value {
    ($($ty:ty),*) => {
        $(
            impl ToBindValue for $ty {
                fn to_bind_value(self) -> BindValue {
                    BindValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_bind_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToBindValue for f32 {
    fn to_bind_value(self) -> BindValue {
        BindValue::Float(f64::from(self))
    }
}

impl ToBindValue for f64 {
    fn to_bind_value(self) -> BindValue {
        BindValue::Float(self)
    }
}

impl ToBindValue for String {
    fn to_bind_value(self) -> BindValue {
        BindValue::Text(self)
    }
}

impl ToBindValue for &str {
    fn to_bind_value(self) -> BindValue {
        BindValue::Text(self.to_owned())
    }
}

impl ToBindValue for Vec<u8> {
    fn to_bind_value(self) -> BindValue {
        BindValue::Blob(self)
    }
}

impl ToBindValue for &[u8] {
    fn to_bind_value(self) -> BindValue {
        BindValue::Blob(self.to_vec())
    }
}

impl<T: ToBindValue> ToBindValue for Option<T> {
    fn to_bind_value(self) -> BindValue {
        self.map_or(BindValue::Null, ToBindValue::to_bind_value)
    }
}

macro_rules! from_bind_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for BindValue {
                fn from(value: $ty) -> Self {
                    value.to_bind_value()
                }
            }
        )*
    };
}

from_bind_value!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, Vec<u8>);
