//! Typed intermediate values and their conversion into struct fields.
//!
//! Every source produces a [`Value`] through the coercion layer; the derive
//! macro's generated `assign` implementations then turn that [`Value`] into
//! the concrete field type via [`FromValue`].

use std::time::Duration;

use thiserror::Error;

/// A coerced configuration value on its way into a struct field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer, widened to `i64`.
    Int(i64),
    /// Unsigned integer, widened to `u64`.
    Uint(u64),
    /// Floating-point number, widened to `f64`.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Span of time.
    Duration(Duration),
    /// Sequence of scalar values.
    Seq(Vec<Value>),
}

impl Value {
    /// Short kind name used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Uint(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Duration(_) => "duration",
            Self::Seq(_) => "sequence",
        }
    }
}

/// Failure to write a [`Value`] into a struct field.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssignError {
    /// No option is declared at the requested path.
    #[error("no option declared at '{path}'")]
    UnknownPath {
        /// Dotted path that failed to resolve.
        path: String,
    },

    /// The value's kind does not match the field's declared type.
    #[error("expected {expected}, got {found}")]
    Mismatch {
        /// Kind the field requires.
        expected: &'static str,
        /// Kind the value actually carried.
        found: &'static str,
    },

    /// The value does not fit the field's integer width.
    #[error("value {value} out of range for {target}")]
    OutOfRange {
        /// Offending value, rendered as text.
        value: String,
        /// Name of the target type.
        target: &'static str,
    },
}

impl AssignError {
    /// Build an [`AssignError::UnknownPath`] from raw path segments.
    #[must_use]
    pub fn unknown_path(path: &[&str]) -> Self {
        Self::UnknownPath {
            path: path.join("."),
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> AssignError {
    AssignError::Mismatch {
        expected,
        found: found.kind_name(),
    }
}

/// Conversion from a coerced [`Value`] into a concrete field type.
///
/// Implemented for every scalar type an option may declare, plus `Vec<T>` for
/// sequence options. Generated `assign` implementations call this; it is not
/// normally used directly.
pub trait FromValue: Sized {
    /// Convert `value`, failing on kind mismatches or range overflow.
    ///
    /// # Errors
    ///
    /// Returns an [`AssignError`] when the value's kind does not match `Self`
    /// or an integer does not fit.
    fn from_value(value: Value) -> Result<Self, AssignError>;
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Duration {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Duration(d) => Ok(d),
            other => Err(mismatch("duration", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        f64::from_value(value).map(|x| x as Self)
    }
}

macro_rules! int_from_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, AssignError> {
                let out_of_range = |v: &dyn std::fmt::Display| AssignError::OutOfRange {
                    value: v.to_string(),
                    target: stringify!($ty),
                };
                match value {
                    Value::Int(n) => <$ty>::try_from(n).map_err(|_| out_of_range(&n)),
                    Value::Uint(n) => <$ty>::try_from(n).map_err(|_| out_of_range(&n)),
                    other => Err(mismatch("integer", &other)),
                }
            }
        }
    )+};
}

int_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("sequence", &other)),
        }
    }
}
