//! The seam between Skiff and the actual database client.
//!
//! A provider supplies connections that open, run commands and stream rows. Skiff never
//! talks to a wire protocol itself. Errors crossing this boundary are plain `anyhow::Error`,
//! the session wraps them into [`crate::Error::Execution`].
use crate::{DbType, Row, RowNames, Value};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Isolation level requested when a transaction begins.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    /// Whatever the provider uses by default.
    Unspecified,
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    #[default]
    Text,
    StoredProcedure,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

/// Identifies the transaction a command is enlisted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A bound parameter of a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    pub db_type: DbType,
    pub direction: ParameterDirection,
}

/// A statement ready to be sent to a provider.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub command_type: CommandType,
    /// Seconds.
    pub timeout: u32,
    pub parameters: Vec<Parameter>,
    pub transaction: Option<TransactionId>,
}

/// Creates provider connections from a connection string.
pub trait DbProviderFactory: Send + Sync {
    fn create_connection(&self, connection_string: &str) -> anyhow::Result<Box<dyn DbConnection>>;
}

/// A connection to a database, owned by one session.
#[async_trait]
pub trait DbConnection: Send {
    async fn open(&mut self) -> anyhow::Result<()>;

    async fn close(&mut self) -> anyhow::Result<()>;

    fn is_open(&self) -> bool;

    async fn begin_transaction(&mut self, isolation_level: IsolationLevel) -> anyhow::Result<()>;

    async fn commit(&mut self) -> anyhow::Result<()>;

    async fn rollback(&mut self) -> anyhow::Result<()>;

    /// Rows affected.
    async fn execute_non_query(&mut self, command: &Command) -> anyhow::Result<u64>;

    /// First column of the first row, NULL when there is none.
    async fn execute_scalar(&mut self, command: &Command) -> anyhow::Result<Value>;

    async fn execute_reader<'c>(
        &'c mut self,
        command: &Command,
    ) -> anyhow::Result<Box<dyn DataReader + 'c>>;
}

/// Forward only cursor over the result sets of a command.
#[async_trait]
pub trait DataReader: Send {
    /// Column names of the current result set.
    fn labels(&self) -> RowNames;

    /// Next row of the current result set, `None` when exhausted.
    async fn read(&mut self) -> anyhow::Result<Option<Row>>;

    /// Move to the next result set, false when there is none.
    async fn next_result(&mut self) -> anyhow::Result<bool>;
}
