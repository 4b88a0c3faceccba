use crate::{
    Command, CommandType, ConnectionScope, DbConnection, DbProviderFactory, Error, Parameter,
    ParameterDirection, Result, SqlCharacters, SqlDialect, SqlQuery, Value, truncate_long,
};
use std::sync::Arc;

/// Adapter between the statements a dialect produces and the connections of a provider.
///
/// Products implement the accessors, everything else has a default.
pub trait DbDriver: Send + Sync {
    fn as_dyn(&self) -> &dyn DbDriver;

    fn dialect(&self) -> &dyn SqlDialect;

    fn provider(&self) -> &Arc<dyn DbProviderFactory>;

    fn connection_string(&self) -> &str;

    fn characters(&self) -> &'static SqlCharacters {
        self.dialect().characters()
    }

    /// Several statements can be sent in a single command.
    fn supports_batched_queries(&self) -> bool {
        true
    }

    /// A new connection, not opened yet. The connection manager opens it following `scope`.
    fn get_connection(&self, scope: ConnectionScope) -> Result<Box<dyn DbConnection>> {
        log::debug!("Creating a {:?} connection", scope);
        self.provider()
            .create_connection(self.connection_string())
            .map_err(Error::execution)
    }

    /// Command for `query`, one input parameter per argument.
    ///
    /// Fails when the number of distinct placeholders differs from the number of arguments or
    /// when named placeholders skip a position.
    /// A call to a stored procedure becomes a stored procedure command named after it.
    fn build_command(&self, query: &SqlQuery) -> Result<Command> {
        let characters = self.characters();
        let text = query.command_text();
        if let Some(position) = characters.missing_placeholder(text) {
            return Err(Error::Statement(format!(
                "The statement skips the parameter {}: `{}`",
                characters.parameter_name(position),
                truncate_long!(text)
            )));
        }
        let placeholders = characters.count_placeholders(text);
        if placeholders != query.arguments().len() {
            return Err(Error::Statement(format!(
                "The statement has {} parameters but {} arguments were supplied: `{}`",
                placeholders,
                query.arguments().len(),
                truncate_long!(text)
            )));
        }
        let (text, command_type) = match characters.stored_procedure_name(text) {
            Some(name) => (name.to_string(), CommandType::StoredProcedure),
            None => (text.to_string(), CommandType::Text),
        };
        let parameters = query
            .arguments()
            .iter()
            .enumerate()
            .map(|(i, argument)| Parameter {
                name: characters.parameter_name(i),
                value: if argument.value().is_null() {
                    Value::Null
                } else {
                    argument.value().clone()
                },
                db_type: argument.db_type(),
                direction: ParameterDirection::Input,
            })
            .collect();
        Ok(Command {
            text,
            command_type,
            timeout: query.timeout_seconds(),
            parameters,
            transaction: None,
        })
    }

    /// Single statement running all of `queries` in order.
    ///
    /// Named placeholders of each statement are shifted by the number of arguments preceding
    /// it, the timeout is the longest one.
    fn combine(&self, queries: &[SqlQuery]) -> Result<SqlQuery> {
        if queries.is_empty() {
            return Err(Error::argument_null("queries"));
        }
        if queries.len() == 1 {
            return Ok(queries[0].clone());
        }
        let characters = self.characters();
        let mut text = String::with_capacity(
            queries
                .iter()
                .map(|q| q.command_text().len() + 3)
                .sum(),
        );
        let mut arguments = Vec::new();
        let mut timeout = 0;
        for query in queries {
            if !text.is_empty() {
                text.push(characters.statement_separator);
                text.push('\n');
            }
            let statement = query
                .command_text()
                .trim_end()
                .trim_end_matches(characters.statement_separator);
            text.push_str(&characters.renumber_placeholders(statement, arguments.len()));
            arguments.extend(query.arguments().iter().cloned());
            timeout = timeout.max(query.timeout_seconds());
        }
        Ok(SqlQuery::with_arguments(text, arguments).timeout(timeout))
    }

    fn combine_pair(&self, first: &SqlQuery, second: &SqlQuery) -> Result<SqlQuery> {
        self.combine(&[first.clone(), second.clone()])
    }
}

/// Driver for the generic dialect, no batching.
pub struct GenericDriver {
    dialect: crate::GenericDialect,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: String,
}

impl GenericDriver {
    pub fn new(provider: Arc<dyn DbProviderFactory>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect: crate::GenericDialect,
            provider,
            connection_string: connection_string.into(),
        }
    }
}

impl DbDriver for GenericDriver {
    fn as_dyn(&self) -> &dyn DbDriver {
        self
    }

    fn dialect(&self) -> &dyn SqlDialect {
        &self.dialect
    }

    fn provider(&self) -> &Arc<dyn DbProviderFactory> {
        &self.provider
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn supports_batched_queries(&self) -> bool {
        false
    }
}
