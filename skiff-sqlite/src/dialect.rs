use skiff_core::{
    DbType, PagingOptions, SqlArgument, SqlCharacters, SqlDialect, SqlQuery, SqlString, TableInfo,
    Value,
};

pub const SQLITE_CHARACTERS: SqlCharacters = SqlCharacters {
    left_delimiter: '"',
    right_delimiter: '"',
    sql_parameter: '@',
    supports_named_parameters: true,
    stored_procedure_invocation_command: "",
    statement_separator: ';',
};

/// SQLite 3, the rowid of the last insert is the generated identifier.
#[derive(Default, Debug, Clone, Copy)]
pub struct SQLiteDialect;

impl SqlDialect for SQLiteDialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "SQLiteDialect"
    }

    fn characters(&self) -> &'static SqlCharacters {
        &SQLITE_CHARACTERS
    }

    fn supports_select_inserted_identifier(&self) -> bool {
        true
    }

    fn build_select_inserted_id(&self, _table: &TableInfo) -> SqlQuery {
        SqlQuery::new("SELECT last_insert_rowid()")
    }

    /// `LIMIT @skip,@take`
    fn write_page_query(
        &self,
        sql: &SqlString,
        arguments: &mut Vec<SqlArgument>,
        paging: PagingOptions,
    ) -> String {
        let mut out = sql.to_string();
        out.push_str(" LIMIT ");
        let skip = Value::Int64(Some(paging.offset() as i64));
        self.write_argument(&mut out, arguments, skip, DbType::Int64);
        out.push(',');
        let take = Value::Int64(Some(paging.count() as i64));
        self.write_argument(&mut out, arguments, take, DbType::Int64);
        out
    }
}
