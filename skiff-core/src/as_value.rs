use crate::{Error, Result, Value};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Entities use it in `get_value` / `set_value`, sessions use it to read scalars.
///
/// `try_from_value` accepts the canonical variant of the type and, for numbers, any other
/// numeric variant as long as the value fits (identity values come back as `DECIMAL` from
/// some databases and as `BIGINT` from others).
///
/// ```rust
/// use skiff_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// NULL variant for this type.
    fn as_empty_value() -> Value;
    /// Owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::Mapping(format!(
        "Cannot convert {:?} to {}",
        value,
        any::type_name::<T>()
    ))
}

/// Integral content of any numeric variant (decimals only when they have no fractional part).
fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Int8(Some(v)) => Some(*v as _),
        Value::Int16(Some(v)) => Some(*v as _),
        Value::Int32(Some(v)) => Some(*v as _),
        Value::Int64(Some(v)) => Some(*v as _),
        Value::UInt8(Some(v)) => Some(*v as _),
        Value::UInt16(Some(v)) => Some(*v as _),
        Value::UInt32(Some(v)) => Some(*v as _),
        Value::UInt64(Some(v)) => Some(*v as _),
        Value::Decimal(Some(v)) if v.fract().is_zero() => v.to_i128(),
        _ => None,
    }
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $destination(Some(v)) = value {
                    return Ok(v);
                }
                if let Some(v) = as_integer(&value) {
                    return <$source>::try_from(v).map_err(|_| {
                        Error::Mapping(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    });
                }
                match &value {
                    Value::Varchar(Some(v)) => v
                        .trim()
                        .parse::<$source>()
                        .map_err(|_| conversion_error::<Self>(&value)),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

/// Content of any numeric variant as `f64`.
fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(Some(v)) => Some(*v as _),
        Value::Float64(Some(v)) => Some(*v),
        Value::Decimal(Some(v)) => v.to_f64(),
        v => as_integer(v).map(|v| v as _),
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        as_float(&value).ok_or_else(|| conversion_error::<Self>(&value))
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float32(None)
    }
    fn as_value(self) -> Value {
        Value::Float32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Value::Float32(Some(v)) = value {
            return Ok(v);
        }
        let v = as_float(&value).ok_or_else(|| conversion_error::<Self>(&value))?;
        if v.is_finite() && v.abs() > f32::MAX as f64 {
            return Err(Error::Mapping(format!(
                "Value {} is out of range for {}",
                v,
                any::type_name::<Self>()
            )));
        }
        Ok(v as _)
    }
}

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            ref v => match as_integer(v) {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(conversion_error::<Self>(v)),
            },
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => v
                .trim()
                .parse()
                .map_err(|_| conversion_error::<Self>(&value)),
            ref v => as_integer(v)
                .and_then(Decimal::from_i128)
                .ok_or_else(|| conversion_error::<Self>(v)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => {
                Uuid::parse_str(v).map_err(|_| conversion_error::<Self>(&value))
            }
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).map_err(|_| conversion_error::<Self>(&value))
            }
            v => Err(conversion_error::<Self>(&v)),
        }
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $($pat_rest => $expr_rest,)*
                    v => Err(conversion_error::<Self>(&v)),
                }
            }
        }
    };
}

impl_as_value!(Date, Value::Date, Value::Timestamp(Some(v)) => Ok(v.date()));
impl_as_value!(Time, Value::Time, Value::Timestamp(Some(v)) => Ok(v.time()));
impl_as_value!(
    PrimitiveDateTime,
    Value::Timestamp,
    Value::TimestampWithTimezone(Some(v)) => {
        let v = v.to_utc();
        Ok(PrimitiveDateTime::new(v.date(), v.time()))
    },
);
impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_and_narrow() {
        assert_eq!(i64::try_from_value(Value::Int32(Some(7))).unwrap(), 7);
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert_eq!(i32::try_from_value(Value::Decimal(Some(Decimal::new(12, 0)))).unwrap(), 12);
        assert!(i8::try_from_value(Value::Int64(Some(300))).is_err());
        assert!(u32::try_from_value(Value::Int32(Some(-1))).is_err());
        assert!(i32::try_from_value(Value::Decimal(Some(Decimal::new(15, 1)))).is_err());
    }

    #[test]
    fn floats_narrow_within_range() {
        assert_eq!(f64::try_from_value(Value::Float32(Some(1.5))).unwrap(), 1.5);
        assert_eq!(f32::try_from_value(Value::Float64(Some(2.25))).unwrap(), 2.25);
        assert_eq!(f32::try_from_value(Value::Int32(Some(3))).unwrap(), 3.0);
        assert!(f32::try_from_value(Value::Float64(Some(1e300))).is_err());
        assert!(f32::try_from_value(Value::Float64(Some(f64::INFINITY))).unwrap().is_infinite());
        assert!(f64::try_from_value(Value::Varchar(Some("1.5".into()))).is_err());
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::try_from_value(Value::Varchar(Some("a".into()))).unwrap(),
            Some("a".to_string())
        );
        assert!(i32::try_from_value(Value::Int32(None)).is_err());
    }

    #[test]
    fn conversion_error_is_mapping_error() {
        let error = bool::try_from_value(Value::Varchar(Some("yes".into()))).unwrap_err();
        assert!(matches!(error, Error::Mapping(..)));
    }
}
