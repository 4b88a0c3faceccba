use crate::{
    ColumnInfo, DbType, EMPTY, Entity, Error, IdentifierStrategy, ObjectDelta, PagingOptions,
    Result, SqlArgument, SqlCharacters, SqlQuery, SqlString, TableInfo, Value, column_value,
    separated_by, truncate_long,
};
use time::OffsetDateTime;

/// Product specific SQL generation.
///
/// The default methods implement the generic dialect (row windowing for paging, no identity
/// retrieval), products override what differs. Every statement is written on a single line.
pub trait SqlDialect: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlDialect;

    /// Name used to select the dialect in the configuration.
    fn name(&self) -> &'static str;

    fn characters(&self) -> &'static SqlCharacters {
        &EMPTY
    }

    /// The identifier of an inserted row can be read with [`SqlDialect::build_select_inserted_id`].
    fn supports_select_inserted_identifier(&self) -> bool {
        false
    }

    fn write_identifier(&self, out: &mut String, name: &str) {
        self.characters().write_identifier(out, name);
    }

    fn write_table_name(&self, out: &mut String, table: &TableInfo) {
        if !table.schema().is_empty() {
            self.write_identifier(out, table.schema());
            out.push('.');
        }
        self.write_identifier(out, table.name());
    }

    /// Writes the next placeholder and records its argument.
    fn write_argument(
        &self,
        out: &mut String,
        arguments: &mut Vec<SqlArgument>,
        value: Value,
        db_type: DbType,
    ) {
        out.push_str(&self.characters().parameter_name(arguments.len()));
        arguments.push(SqlArgument::with_db_type(value, db_type));
    }

    /// Expression producing the next value of `sequence`, inlined in the insert.
    fn sequence_expression(&self, sequence: &str) -> Result<String> {
        Err(Error::Statement(format!(
            "The {} does not support sequences (requested {})",
            self.name(),
            sequence
        )))
    }

    /// Clause appended to an insert to return the generated identifier inline.
    fn write_returning(&self, _out: &mut String, _table: &TableInfo) {}

    fn build_insert(&self, table: &TableInfo, instance: &dyn Entity) -> Result<SqlQuery> {
        let mut out = String::with_capacity(128);
        let mut arguments = Vec::new();
        let columns = table
            .columns()
            .iter()
            .filter(|c| {
                if c.is_identifier {
                    matches!(
                        c.identifier_strategy,
                        IdentifierStrategy::Assigned | IdentifierStrategy::Sequence
                    )
                } else {
                    c.allow_insert
                }
            })
            .collect::<Vec<_>>();
        out.push_str("INSERT INTO ");
        self.write_table_name(&mut out, table);
        out.push_str(" (");
        separated_by(
            &mut out,
            columns.iter(),
            |out, c| self.write_identifier(out, c.name),
            ", ",
        );
        out.push_str(") VALUES (");
        let mut error = None;
        separated_by(
            &mut out,
            columns.iter(),
            |out, c| {
                if c.identifier_strategy == IdentifierStrategy::Sequence && c.is_identifier {
                    match self.sequence_expression(c.sequence_name.unwrap_or_default()) {
                        Ok(v) => out.push_str(&v),
                        Err(e) => error = Some(e),
                    }
                } else {
                    self.write_argument(out, &mut arguments, column_value(instance, c), c.db_type);
                }
            },
            ", ",
        );
        if let Some(error) = error {
            return Err(error);
        }
        out.push(')');
        if table.identifier_strategy().is_generated() {
            self.write_returning(&mut out, table);
        }
        Ok(SqlQuery::with_arguments(out, arguments))
    }

    /// Statement reading the identifier generated by the last insert, empty when unsupported.
    fn build_select_inserted_id(&self, _table: &TableInfo) -> SqlQuery {
        SqlQuery::default()
    }

    fn build_update(&self, table: &TableInfo, instance: &dyn Entity) -> Result<SqlQuery> {
        let mut out = String::with_capacity(128);
        let mut arguments = Vec::new();
        out.push_str("UPDATE ");
        self.write_table_name(&mut out, table);
        out.push_str(" SET ");
        let mut error = None;
        separated_by(
            &mut out,
            table.updatable_columns(),
            |out, c| {
                let mut value = column_value(instance, c);
                if c.is_version {
                    match next_version(c, &value) {
                        Ok(v) => value = v,
                        Err(e) => error = Some(e),
                    }
                }
                self.write_identifier(out, c.name);
                out.push_str(" = ");
                self.write_argument(out, &mut arguments, value, c.db_type);
            },
            ", ",
        );
        if let Some(error) = error {
            return Err(error);
        }
        if arguments.is_empty() {
            return Err(Error::Statement(format!(
                "The table {} has no updatable columns",
                table.name()
            )));
        }
        let identifier = table.identifier_column();
        let version = table
            .version_column()
            .map(|c| (c, column_value(instance, c)));
        self.write_key_filter(
            &mut out,
            &mut arguments,
            table,
            column_value(instance, identifier),
            version,
        );
        Ok(SqlQuery::with_arguments(out, arguments))
    }

    /// Update of the columns listed in `delta` only.
    fn build_update_delta(&self, delta: &ObjectDelta) -> Result<SqlQuery> {
        if delta.change_count() == 0 {
            return Err(Error::argument("delta", "The delta must contain at least one change"));
        }
        let table = delta.table();
        let mut out = String::with_capacity(128);
        let mut arguments = Vec::new();
        out.push_str("UPDATE ");
        self.write_table_name(&mut out, table);
        out.push_str(" SET ");
        for (i, (column, value)) in delta.changes().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let db_type = table
                .column(column)
                .map(|c| c.db_type)
                .unwrap_or_else(|| value.db_type());
            self.write_identifier(&mut out, column);
            out.push_str(" = ");
            self.write_argument(&mut out, &mut arguments, value.clone(), db_type);
        }
        self.write_key_filter(&mut out, &mut arguments, table, delta.identifier().clone(), None);
        Ok(SqlQuery::with_arguments(out, arguments))
    }

    fn build_delete(
        &self,
        table: &TableInfo,
        identifier: &Value,
        version: Option<&Value>,
    ) -> Result<SqlQuery> {
        let mut out = String::with_capacity(64);
        let mut arguments = Vec::new();
        out.push_str("DELETE FROM ");
        self.write_table_name(&mut out, table);
        let version = match version {
            Some(v) => Some((
                table.version_column().ok_or_else(|| {
                    Error::Statement(format!("The table {} has no version column", table.name()))
                })?,
                v.clone(),
            )),
            None => None,
        };
        self.write_key_filter(&mut out, &mut arguments, table, identifier.clone(), version);
        Ok(SqlQuery::with_arguments(out, arguments))
    }

    fn build_select(&self, table: &TableInfo, identifier: &Value) -> SqlQuery {
        let mut out = String::with_capacity(128);
        let mut arguments = Vec::new();
        out.push_str("SELECT ");
        separated_by(
            &mut out,
            table.columns(),
            |out, c| self.write_identifier(out, c.name),
            ", ",
        );
        out.push_str(" FROM ");
        self.write_table_name(&mut out, table);
        self.write_key_filter(&mut out, &mut arguments, table, identifier.clone(), None);
        SqlQuery::with_arguments(out, arguments)
    }

    /// ` WHERE {identifier} = @pN [AND {version} = @pN+1]`
    fn write_key_filter(
        &self,
        out: &mut String,
        arguments: &mut Vec<SqlArgument>,
        table: &TableInfo,
        identifier: Value,
        version: Option<(&ColumnInfo, Value)>,
    ) {
        let column = table.identifier_column();
        out.push_str(" WHERE ");
        self.write_identifier(out, column.name);
        out.push_str(" = ");
        self.write_argument(out, arguments, identifier, column.db_type);
        if let Some((column, value)) = version {
            out.push_str(" AND ");
            self.write_identifier(out, column.name);
            out.push_str(" = ");
            self.write_argument(out, arguments, value, column.db_type);
        }
    }

    /// Rewrite `query` to return only the page selected by `paging`.
    ///
    /// The arguments of `query` come first, the paging arguments are appended after them.
    fn page_query(&self, query: &SqlQuery, paging: PagingOptions) -> Result<SqlQuery> {
        paging.validate()?;
        let sql = SqlString::parse(query.command_text())?;
        let mut arguments = query.arguments().to_vec();
        let text = self.write_page_query(&sql, &mut arguments, paging);
        log::debug!(
            "Paged `{}` as `{}`",
            truncate_long!(query.command_text()),
            truncate_long!(text)
        );
        Ok(SqlQuery::with_arguments(text, arguments).timeout(query.timeout_seconds()))
    }

    /// Row windowing: the statement becomes a derived table numbered with `ROW_NUMBER()`.
    fn write_page_query(
        &self,
        sql: &SqlString,
        arguments: &mut Vec<SqlArgument>,
        paging: PagingOptions,
    ) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("SELECT ");
        out.push_str(&sql.unqualified_select());
        out.push_str(" FROM (SELECT ");
        out.push_str(&sql.select);
        out.push_str(", ROW_NUMBER() OVER(ORDER BY ");
        out.push_str(sql.order_by.as_deref().unwrap_or("(SELECT NULL)"));
        out.push_str(") AS RowNumber FROM ");
        out.push_str(&sql.from);
        sql.write_filter(&mut out);
        out.push_str(") AS ");
        out.push_str(sql.table_alias());
        out.push_str(" WHERE (RowNumber >= ");
        let start = paging.offset() + 1;
        let end = paging.offset() + paging.count();
        self.write_argument(&mut out, arguments, Value::Int64(Some(start as i64)), DbType::Int64);
        out.push_str(" AND RowNumber <= ");
        self.write_argument(&mut out, arguments, Value::Int64(Some(end as i64)), DbType::Int64);
        out.push(')');
        out
    }

    /// `SELECT COUNT(*) FROM ... [WHERE ...]`, the arguments are preserved.
    fn count_query(&self, query: &SqlQuery) -> Result<SqlQuery> {
        let sql = SqlString::parse(query.command_text())?;
        let mut out = String::with_capacity(64);
        out.push_str("SELECT COUNT(*) FROM ");
        out.push_str(&sql.from);
        if let Some(filter) = &sql.where_clause {
            out.push_str(" WHERE ");
            out.push_str(filter);
        }
        Ok(SqlQuery::with_arguments(out, query.arguments().to_vec())
            .timeout(query.timeout_seconds()))
    }
}

/// Value the version column takes after an update.
///
/// Integers are incremented keeping their type, date time columns take the current UTC time.
pub fn next_version(column: &ColumnInfo, current: &Value) -> Result<Value> {
    let overflow = || {
        Error::Statement(format!(
            "The version {} of column {} cannot be incremented",
            current, column.name
        ))
    };
    macro_rules! increment {
        ($variant:path, $v:expr) => {
            $v.unwrap_or_default()
                .checked_add(1)
                .map(|v| $variant(Some(v)))
                .ok_or_else(overflow)
        };
    }
    match current {
        Value::Int8(v) => increment!(Value::Int8, v),
        Value::Int16(v) => increment!(Value::Int16, v),
        Value::Int32(v) => increment!(Value::Int32, v),
        Value::Int64(v) => increment!(Value::Int64, v),
        Value::UInt8(v) => increment!(Value::UInt8, v),
        Value::UInt16(v) => increment!(Value::UInt16, v),
        Value::UInt32(v) => increment!(Value::UInt32, v),
        Value::UInt64(v) => increment!(Value::UInt64, v),
        Value::Timestamp(..) | Value::TimestampWithTimezone(..) | Value::Null
            if column.db_type.is_date_time() =>
        {
            let now = OffsetDateTime::now_utc();
            Ok(match column.db_type {
                DbType::DateTimeOffset => Value::TimestampWithTimezone(Some(now)),
                _ => Value::Timestamp(Some(time::PrimitiveDateTime::new(now.date(), now.time()))),
            })
        }
        Value::Null if column.db_type.is_integer() => {
            next_version(column, &Value::null_of(column.db_type))
        }
        _ => Err(Error::Statement(format!(
            "The version column {} has type {:?}, only integers and date times are supported",
            column.name,
            current.db_type()
        ))),
    }
}

/// The dialect used when the database product is unknown.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for GenericDialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "GenericDialect"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_query;

    #[test]
    fn integer_versions_keep_their_type() {
        let column = ColumnInfo::new("Version", DbType::Int16).version();
        assert_eq!(
            next_version(&column, &Value::Int16(Some(4))).unwrap(),
            Value::Int16(Some(5))
        );
        assert!(next_version(&column, &Value::Int16(Some(i16::MAX))).is_err());
        let column = ColumnInfo::new("Version", DbType::UInt64).version();
        assert_eq!(
            next_version(&column, &Value::UInt64(None)).unwrap(),
            Value::UInt64(Some(1))
        );
    }

    #[test]
    fn date_time_versions_become_now() {
        let column = ColumnInfo::new("Modified", DbType::DateTime).version();
        let before = OffsetDateTime::now_utc();
        let Value::Timestamp(Some(v)) = next_version(&column, &Value::Timestamp(None)).unwrap()
        else {
            panic!("Expected a timestamp");
        };
        assert!(v.assume_utc() >= before - time::Duration::seconds(1));
    }

    #[test]
    fn other_versions_are_rejected() {
        let column = ColumnInfo::new("Version", DbType::String).version();
        assert!(matches!(
            next_version(&column, &Value::Varchar(Some("a".into()))),
            Err(Error::Statement(..))
        ));
    }

    #[test]
    fn generic_paging_uses_row_number() {
        let query = sql_query!("SELECT * FROM Customers WHERE Status = ?", 1i32);
        let paged = GenericDialect
            .page_query(&query, PagingOptions::for_page(2, 10).unwrap())
            .unwrap();
        assert_eq!(
            paged.command_text(),
            "SELECT * FROM (SELECT *, ROW_NUMBER() OVER(ORDER BY (SELECT NULL)) AS RowNumber FROM Customers WHERE Status = ?) AS Customers WHERE (RowNumber >= ? AND RowNumber <= ?)"
        );
        assert_eq!(
            paged.arguments().iter().map(|a| a.value().clone()).collect::<Vec<_>>(),
            [Value::Int32(Some(1)), Value::Int64(Some(11)), Value::Int64(Some(20))]
        );
    }

    #[test]
    fn invalid_paging_is_an_argument_error() {
        let query = SqlQuery::new("SELECT * FROM Customers");
        for paging in [
            PagingOptions::None,
            PagingOptions::ForPage {
                page: 0,
                results_per_page: 10,
            },
            PagingOptions::ForPage {
                page: 1,
                results_per_page: 0,
            },
        ] {
            assert!(matches!(
                GenericDialect.page_query(&query, paging),
                Err(Error::Argument {
                    parameter: "paging",
                    ..
                })
            ));
        }
    }

    #[test]
    fn count_strips_order_by() {
        let query = sql_query!(
            "SELECT a,b FROM T WHERE id IN (SELECT x FROM U) AND c = ? ORDER BY a",
            3i32
        );
        let count = GenericDialect.count_query(&query).unwrap();
        assert_eq!(
            count.command_text(),
            "SELECT COUNT(*) FROM T WHERE id IN (SELECT x FROM U) AND c = ?"
        );
        assert_eq!(count.arguments(), query.arguments());
    }

    #[test]
    fn sequences_are_not_generic() {
        assert!(GenericDialect.sequence_expression("S").is_err());
        assert!(!GenericDialect.supports_select_inserted_identifier());
        let table = TableInfo::new(
            "",
            "T",
            vec![ColumnInfo::new("Id", DbType::Int32).identifier(IdentifierStrategy::Identity)],
        )
        .unwrap();
        assert!(GenericDialect.build_select_inserted_id(&table).is_empty());
    }
}
