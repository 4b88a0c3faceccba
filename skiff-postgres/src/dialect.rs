use skiff_core::{
    DbType, IdentifierStrategy, PagingOptions, Result, SqlArgument, SqlCharacters, SqlDialect,
    SqlQuery, SqlString, TableInfo, Value,
};

pub const POSTGRES_CHARACTERS: SqlCharacters = SqlCharacters {
    left_delimiter: '"',
    right_delimiter: '"',
    sql_parameter: ':',
    supports_named_parameters: true,
    stored_procedure_invocation_command: "SELECT",
    statement_separator: ';',
};

/// PostgreSql, functions are invoked with `SELECT`.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgreSqlDialect;

impl SqlDialect for PostgreSqlDialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "PostgreSqlDialect"
    }

    fn characters(&self) -> &'static SqlCharacters {
        &POSTGRES_CHARACTERS
    }

    fn supports_select_inserted_identifier(&self) -> bool {
        true
    }

    fn sequence_expression(&self, sequence: &str) -> Result<String> {
        Ok(format!("nextval('{}')", sequence))
    }

    fn build_select_inserted_id(&self, table: &TableInfo) -> SqlQuery {
        let column = table.identifier_column();
        match (column.identifier_strategy, column.sequence_name) {
            (IdentifierStrategy::Sequence, Some(sequence)) => {
                SqlQuery::new(format!("SELECT currval('{}')", sequence))
            }
            _ => SqlQuery::new("SELECT lastval()"),
        }
    }

    /// `LIMIT :take OFFSET :skip`
    fn write_page_query(
        &self,
        sql: &SqlString,
        arguments: &mut Vec<SqlArgument>,
        paging: PagingOptions,
    ) -> String {
        let mut out = sql.to_string();
        out.push_str(" LIMIT ");
        let take = Value::Int64(Some(paging.count() as i64));
        self.write_argument(&mut out, arguments, take, DbType::Int64);
        out.push_str(" OFFSET ");
        let skip = Value::Int64(Some(paging.offset() as i64));
        self.write_argument(&mut out, arguments, skip, DbType::Int64);
        out
    }
}
