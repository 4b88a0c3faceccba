use skiff_core::{
    DbType, IdentifierStrategy, PagingOptions, SqlArgument, SqlCharacters, SqlDialect, SqlQuery,
    SqlString, TableInfo, Value,
};

pub const MSSQL_CHARACTERS: SqlCharacters = SqlCharacters {
    left_delimiter: '[',
    right_delimiter: ']',
    sql_parameter: '@',
    supports_named_parameters: true,
    stored_procedure_invocation_command: "EXEC",
    statement_separator: ';',
};

pub const SQLSERVERCE_CHARACTERS: SqlCharacters = SqlCharacters {
    stored_procedure_invocation_command: "",
    ..MSSQL_CHARACTERS
};

/// `{statement} ORDER BY {order} OFFSET @skip ROWS FETCH NEXT @take ROWS ONLY`
fn write_offset_fetch(
    dialect: &dyn SqlDialect,
    sql: &SqlString,
    arguments: &mut Vec<SqlArgument>,
    paging: PagingOptions,
    default_order: &str,
) -> String {
    let mut out = sql.without_order_by();
    out.push_str(" ORDER BY ");
    out.push_str(sql.order_by.as_deref().unwrap_or(default_order));
    out.push_str(" OFFSET ");
    let skip = Value::Int64(Some(paging.offset() as i64));
    dialect.write_argument(&mut out, arguments, skip, DbType::Int64);
    out.push_str(" ROWS FETCH NEXT ");
    let take = Value::Int64(Some(paging.count() as i64));
    dialect.write_argument(&mut out, arguments, take, DbType::Int64);
    out.push_str(" ROWS ONLY");
    out
}

/// SQL Server 2005 and 2008: identity columns, paging by row number.
#[derive(Default, Debug, Clone, Copy)]
pub struct MsSql2005Dialect;

impl SqlDialect for MsSql2005Dialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "MsSql2005Dialect"
    }

    fn characters(&self) -> &'static SqlCharacters {
        &MSSQL_CHARACTERS
    }

    fn supports_select_inserted_identifier(&self) -> bool {
        true
    }

    fn build_select_inserted_id(&self, _table: &TableInfo) -> SqlQuery {
        SqlQuery::new("SELECT SCOPE_IDENTITY()")
    }
}

/// SQL Server 2012 and later: sequences and `OFFSET ... FETCH` paging.
#[derive(Default, Debug, Clone, Copy)]
pub struct MsSql2012Dialect;

impl SqlDialect for MsSql2012Dialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "MsSql2012Dialect"
    }

    fn characters(&self) -> &'static SqlCharacters {
        &MSSQL_CHARACTERS
    }

    fn supports_select_inserted_identifier(&self) -> bool {
        true
    }

    fn sequence_expression(&self, sequence: &str) -> skiff_core::Result<String> {
        Ok(format!("NEXT VALUE FOR {}", sequence))
    }

    fn build_select_inserted_id(&self, table: &TableInfo) -> SqlQuery {
        let column = table.identifier_column();
        match (column.identifier_strategy, column.sequence_name) {
            (IdentifierStrategy::Sequence, Some(sequence)) => SqlQuery::new(format!(
                "SELECT current_value FROM sys.sequences WHERE name = '{}'",
                sequence
            )),
            _ => SqlQuery::new("SELECT SCOPE_IDENTITY()"),
        }
    }

    fn write_page_query(
        &self,
        sql: &SqlString,
        arguments: &mut Vec<SqlArgument>,
        paging: PagingOptions,
    ) -> String {
        write_offset_fetch(self, sql, arguments, paging, "CURRENT_TIMESTAMP")
    }
}

/// SQL Server Compact Edition 4.0.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerCeDialect;

impl SqlDialect for SqlServerCeDialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "SqlServerCeDialect"
    }

    fn characters(&self) -> &'static SqlCharacters {
        &SQLSERVERCE_CHARACTERS
    }

    fn supports_select_inserted_identifier(&self) -> bool {
        true
    }

    fn build_select_inserted_id(&self, _table: &TableInfo) -> SqlQuery {
        SqlQuery::new("SELECT @@IDENTITY")
    }

    fn write_page_query(
        &self,
        sql: &SqlString,
        arguments: &mut Vec<SqlArgument>,
        paging: PagingOptions,
    ) -> String {
        write_offset_fetch(self, sql, arguments, paging, "GETDATE()")
    }
}
