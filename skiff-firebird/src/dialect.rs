use skiff_core::{
    DbType, PagingOptions, Result, SqlArgument, SqlCharacters, SqlDialect, SqlString, TableInfo,
    Value,
};

pub const FIREBIRD_CHARACTERS: SqlCharacters = SqlCharacters {
    left_delimiter: '"',
    right_delimiter: '"',
    sql_parameter: '@',
    supports_named_parameters: true,
    stored_procedure_invocation_command: "EXECUTE PROCEDURE",
    statement_separator: ';',
};

/// Firebird 2.5 and later.
///
/// Generated identifiers come back from the insert itself through `RETURNING`, sequences are
/// generators read with `GEN_ID`.
#[derive(Default, Debug, Clone, Copy)]
pub struct FirebirdDialect;

impl SqlDialect for FirebirdDialect {
    fn as_dyn(&self) -> &dyn SqlDialect {
        self
    }

    fn name(&self) -> &'static str {
        "FirebirdDialect"
    }

    fn characters(&self) -> &'static SqlCharacters {
        &FIREBIRD_CHARACTERS
    }

    fn sequence_expression(&self, sequence: &str) -> Result<String> {
        Ok(format!("GEN_ID({}, 1)", sequence))
    }

    fn write_returning(&self, out: &mut String, table: &TableInfo) {
        out.push_str(" RETURNING ");
        self.write_identifier(out, table.identifier_column().name);
    }

    /// `ROWS @start TO @end`, `start` is 1 based.
    fn write_page_query(
        &self,
        sql: &SqlString,
        arguments: &mut Vec<SqlArgument>,
        paging: PagingOptions,
    ) -> String {
        let mut out = sql.to_string();
        out.push_str(" ROWS ");
        let start = Value::Int64(Some(paging.offset() as i64 + 1));
        self.write_argument(&mut out, arguments, start, DbType::Int64);
        out.push_str(" TO ");
        let end = Value::Int64(Some((paging.offset() + paging.count()) as i64));
        self.write_argument(&mut out, arguments, end, DbType::Int64);
        out
    }
}
