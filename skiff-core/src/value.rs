use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Database type of a parameter or column, modelled after the ADO `DbType` enumeration.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    AnsiString,
    Binary,
    Boolean,
    Byte,
    Date,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    #[default]
    Object,
    SByte,
    Single,
    String,
    Time,
    UInt16,
    UInt32,
    UInt64,
}

impl DbType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DbType::Byte
                | DbType::SByte
                | DbType::Int16
                | DbType::Int32
                | DbType::Int64
                | DbType::UInt16
                | DbType::UInt32
                | DbType::UInt64
        )
    }

    pub fn is_date_time(&self) -> bool {
        matches!(
            self,
            DbType::DateTime | DbType::DateTime2 | DbType::DateTimeOffset
        )
    }
}

/// Dynamically typed cell used for arguments, parameters and row values.
///
/// Every variant but `Null` carries an `Option`: `Int32(None)` is a NULL that still knows
/// its type, which is what providers need to bind a typed NULL parameter.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => self.is_null() && other.is_null(),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    /// Natural database type of this value.
    pub fn db_type(&self) -> DbType {
        match self {
            Value::Null => DbType::Object,
            Value::Boolean(..) => DbType::Boolean,
            Value::Int8(..) => DbType::SByte,
            Value::Int16(..) => DbType::Int16,
            Value::Int32(..) => DbType::Int32,
            Value::Int64(..) => DbType::Int64,
            Value::UInt8(..) => DbType::Byte,
            Value::UInt16(..) => DbType::UInt16,
            Value::UInt32(..) => DbType::UInt32,
            Value::UInt64(..) => DbType::UInt64,
            Value::Float32(..) => DbType::Single,
            Value::Float64(..) => DbType::Double,
            Value::Decimal(..) => DbType::Decimal,
            Value::Varchar(..) => DbType::String,
            Value::Blob(..) => DbType::Binary,
            Value::Date(..) => DbType::Date,
            Value::Time(..) => DbType::Time,
            Value::Timestamp(..) => DbType::DateTime,
            Value::TimestampWithTimezone(..) => DbType::DateTimeOffset,
            Value::Uuid(..) => DbType::Guid,
        }
    }

    /// Typed NULL matching `db_type`.
    pub fn null_of(db_type: DbType) -> Value {
        match db_type {
            DbType::AnsiString | DbType::String => Value::Varchar(None),
            DbType::Binary => Value::Blob(None),
            DbType::Boolean => Value::Boolean(None),
            DbType::Byte => Value::UInt8(None),
            DbType::SByte => Value::Int8(None),
            DbType::Date => Value::Date(None),
            DbType::DateTime | DbType::DateTime2 => Value::Timestamp(None),
            DbType::DateTimeOffset => Value::TimestampWithTimezone(None),
            DbType::Decimal => Value::Decimal(None),
            DbType::Double => Value::Float64(None),
            DbType::Single => Value::Float32(None),
            DbType::Guid => Value::Uuid(None),
            DbType::Int16 => Value::Int16(None),
            DbType::Int32 => Value::Int32(None),
            DbType::Int64 => Value::Int64(None),
            DbType::UInt16 => Value::UInt16(None),
            DbType::UInt32 => Value::UInt32(None),
            DbType::UInt64 => Value::UInt64(None),
            DbType::Time => Value::Time(None),
            DbType::Object => Value::Null,
        }
    }

    /// True for NULL and for the zero/empty value of the type, what an unset identifier looks like.
    pub fn is_default(&self) -> bool {
        match self {
            v if v.is_null() => true,
            Value::Boolean(Some(v)) => !v,
            Value::Int8(Some(v)) => *v == 0,
            Value::Int16(Some(v)) => *v == 0,
            Value::Int32(Some(v)) => *v == 0,
            Value::Int64(Some(v)) => *v == 0,
            Value::UInt8(Some(v)) => *v == 0,
            Value::UInt16(Some(v)) => *v == 0,
            Value::UInt32(Some(v)) => *v == 0,
            Value::UInt64(Some(v)) => *v == 0,
            Value::Float32(Some(v)) => *v == 0.0,
            Value::Float64(Some(v)) => *v == 0.0,
            Value::Decimal(Some(v)) => v.is_zero(),
            Value::Varchar(Some(v)) => v.is_empty(),
            Value::Blob(Some(v)) => v.is_empty(),
            Value::Uuid(Some(v)) => v.is_nil(),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! write_some {
            ($v:expr) => {
                match $v {
                    Some(v) => write!(f, "{}", v),
                    None => f.write_str("NULL"),
                }
            };
        }
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write_some!(v),
            Value::Int8(v) => write_some!(v),
            Value::Int16(v) => write_some!(v),
            Value::Int32(v) => write_some!(v),
            Value::Int64(v) => write_some!(v),
            Value::UInt8(v) => write_some!(v),
            Value::UInt16(v) => write_some!(v),
            Value::UInt32(v) => write_some!(v),
            Value::UInt64(v) => write_some!(v),
            Value::Float32(v) => write_some!(v),
            Value::Float64(v) => write_some!(v),
            Value::Decimal(v) => write_some!(v),
            Value::Varchar(Some(v)) => write!(f, "'{}'", v),
            Value::Varchar(None) => f.write_str("NULL"),
            Value::Blob(Some(v)) => write!(f, "<{} bytes>", v.len()),
            Value::Blob(None) => f.write_str("NULL"),
            Value::Date(v) => write_some!(v),
            Value::Time(v) => write_some!(v),
            Value::Timestamp(v) => write_some!(v),
            Value::TimestampWithTimezone(v) => write_some!(v),
            Value::Uuid(v) => write_some!(v),
        }
    }
}
