use crate::{DbType, Value, truncate_long};
use std::fmt::{self, Display};

/// Default command timeout in seconds.
pub const DEFAULT_TIMEOUT: u32 = 30;

/// A value bound to a statement placeholder together with its database type.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlArgument {
    value: Value,
    db_type: DbType,
}

impl SqlArgument {
    /// Argument typed after the value itself.
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let db_type = value.db_type();
        Self { value, db_type }
    }

    /// Argument with an explicit database type (for example `AnsiString` for a `String`).
    pub fn with_db_type(value: impl Into<Value>, db_type: DbType) -> Self {
        Self {
            value: value.into(),
            db_type,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// A parameterized statement: SQL text, ordered arguments and a timeout.
///
/// The placeholder count is validated when a driver builds the command, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    command_text: String,
    arguments: Vec<SqlArgument>,
    timeout: u32,
}

impl SqlQuery {
    pub fn new(command_text: impl Into<String>) -> Self {
        Self::with_arguments(command_text, Vec::new())
    }

    pub fn with_arguments(
        command_text: impl Into<String>,
        arguments: impl IntoIterator<Item = SqlArgument>,
    ) -> Self {
        Self {
            command_text: command_text.into(),
            arguments: arguments.into_iter().collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    pub fn arguments(&self) -> &[SqlArgument] {
        &self.arguments
    }

    pub fn timeout_seconds(&self) -> u32 {
        self.timeout
    }

    pub fn is_empty(&self) -> bool {
        self.command_text.trim().is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<SqlArgument>, u32) {
        (self.command_text, self.arguments, self.timeout)
    }
}

impl Default for SqlQuery {
    fn default() -> Self {
        SqlQuery::new(String::new())
    }
}

impl From<&str> for SqlQuery {
    fn from(value: &str) -> Self {
        SqlQuery::new(value)
    }
}

impl From<String> for SqlQuery {
    fn from(value: String) -> Self {
        SqlQuery::new(value)
    }
}

impl Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.command_text))?;
        if !self.arguments.is_empty() {
            f.write_str(" [")?;
            for (i, argument) in self.arguments.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", argument.value)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Build a [`SqlQuery`] from text and arguments.
///
/// ```rust
/// let query = skiff_core::sql_query!("SELECT * FROM Customers WHERE Id = @p0", 42);
/// assert_eq!(query.arguments().len(), 1);
/// ```
#[macro_export]
macro_rules! sql_query {
    ($text:expr $(,)?) => {
        $crate::SqlQuery::new($text)
    };
    ($text:expr, $($argument:expr),+ $(,)?) => {
        $crate::SqlQuery::with_arguments(
            $text,
            [$($crate::SqlArgument::new($argument)),+],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_take_the_value_type() {
        let query = sql_query!("SELECT * FROM T WHERE a = @p0 AND b = @p1", 1i64, "x");
        assert_eq!(query.arguments()[0].db_type(), DbType::Int64);
        assert_eq!(query.arguments()[1].db_type(), DbType::String);
        assert_eq!(query.timeout_seconds(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn display_lists_arguments() {
        let query = sql_query!("SELECT 1 WHERE a = @p0", 5i32).timeout(5);
        assert_eq!(query.to_string(), "SELECT 1 WHERE a = @p0 [5]");
        assert_eq!(query.timeout_seconds(), 5);
    }
}
