use crate::{
    Command, DbConnection, DbDriver, Error, IsolationLevel, Result, ResultSet, SqlQuery,
    TransactionId, Value, truncate_long,
};

/// When the connection of a session is open.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionScope {
    /// Opened for each transaction (or each command outside of a transaction) and closed after.
    #[default]
    PerTransaction,
    /// Opened with the session and closed with it.
    PerSession,
}

/// Owns the connection of a session and at most one transaction on it.
///
/// Applies the open/close policy of the [`ConnectionScope`] and enlists commands in the
/// current transaction.
pub struct ConnectionManager {
    connection: Box<dyn DbConnection>,
    scope: ConnectionScope,
    transaction: Option<TransactionId>,
    pending_rollback: Option<TransactionId>,
    closed: bool,
}

impl ConnectionManager {
    /// Takes ownership of `connection`, opening it right away for [`ConnectionScope::PerSession`].
    pub async fn new(connection: Box<dyn DbConnection>, scope: ConnectionScope) -> Result<Self> {
        let mut result = Self {
            connection,
            scope,
            transaction: None,
            pending_rollback: None,
            closed: false,
        };
        if scope == ConnectionScope::PerSession {
            result.open().await?;
        }
        Ok(result)
    }

    pub fn scope(&self) -> ConnectionScope {
        self.scope
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Transaction currently active on the connection.
    pub fn current_transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    async fn open(&mut self) -> Result<()> {
        if !self.connection.is_open() {
            log::debug!("Opening the connection");
            self.connection.open().await.map_err(Error::execution)?;
        }
        Ok(())
    }

    async fn close_connection(&mut self) {
        if self.connection.is_open() {
            log::debug!("Closing the connection");
            if let Err(e) = self.connection.close().await {
                log::warn!("Error while closing the connection: {:#}", e);
            }
        }
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(Error::Disposed("connection"))
        } else {
            Ok(())
        }
    }

    /// Roll back a transaction whose guard was dropped without being disposed.
    async fn run_pending_rollback(&mut self) {
        let Some(id) = self.pending_rollback.take() else {
            return;
        };
        log::warn!("Rolling back transaction {:?} dropped while still active", id);
        if let Err(e) = self.connection.rollback().await {
            log::error!("Implicit rollback failed: {:#}", e);
        }
        self.complete(id).await;
    }

    /// Makes the connection ready for a command: pending rollbacks run, the connection opens.
    pub async fn prepare(&mut self) -> Result<()> {
        self.check_closed()?;
        self.run_pending_rollback().await;
        self.open().await
    }

    /// Command for `query` built by `driver`, enlisted in the current transaction unless it is
    /// waiting to be rolled back.
    pub fn create_command(&self, driver: &dyn DbDriver, query: &SqlQuery) -> Result<Command> {
        let mut command = driver.build_command(query)?;
        command.transaction = self
            .transaction
            .filter(|id| self.pending_rollback != Some(*id));
        log::debug!("{}", truncate_long!(command.text));
        Ok(command)
    }

    /// Applies the scope policy once a command is done.
    pub async fn release(&mut self) {
        if self.scope == ConnectionScope::PerTransaction && self.transaction.is_none() {
            self.close_connection().await;
        }
    }

    pub async fn execute_non_query(&mut self, command: &Command) -> Result<u64> {
        self.prepare().await?;
        self.connection
            .execute_non_query(command)
            .await
            .map_err(Error::execution)
    }

    pub async fn execute_scalar(&mut self, command: &Command) -> Result<Value> {
        self.prepare().await?;
        self.connection
            .execute_scalar(command)
            .await
            .map_err(Error::execution)
    }

    /// Every result set produced by `command`, read until the reader is exhausted.
    pub async fn execute_reader(&mut self, command: &Command) -> Result<Vec<ResultSet>> {
        self.prepare().await?;
        let mut reader = self
            .connection
            .execute_reader(command)
            .await
            .map_err(Error::execution)?;
        let mut result = Vec::new();
        loop {
            let mut set = ResultSet {
                labels: reader.labels(),
                rows: Vec::new(),
            };
            while let Some(row) = reader.read().await.map_err(Error::execution)? {
                set.rows.push(row);
            }
            result.push(set);
            if !reader.next_result().await.map_err(Error::execution)? {
                break;
            }
        }
        Ok(result)
    }

    /// Begin a transaction, opening the connection first when needed.
    pub async fn begin(&mut self, isolation_level: IsolationLevel) -> Result<TransactionId> {
        self.prepare().await?;
        if self.transaction.is_some() {
            return Err(Error::InvalidState(
                "A transaction is already active on this session".into(),
            ));
        }
        if let Err(e) = self.connection.begin_transaction(isolation_level).await {
            self.release().await;
            return Err(Error::execution(e));
        }
        let id = TransactionId::next();
        log::debug!("Began transaction {:?} ({:?})", id, isolation_level);
        self.transaction = Some(id);
        Ok(id)
    }

    pub async fn commit(&mut self, id: TransactionId) -> Result<()> {
        self.check_transaction(id)?;
        self.connection.commit().await.map_err(Error::execution)?;
        log::debug!("Committed transaction {:?}", id);
        self.complete(id).await;
        Ok(())
    }

    pub async fn rollback(&mut self, id: TransactionId) -> Result<()> {
        self.check_transaction(id)?;
        self.connection.rollback().await.map_err(Error::execution)?;
        log::debug!("Rolled back transaction {:?}", id);
        self.complete(id).await;
        Ok(())
    }

    fn check_transaction(&self, id: TransactionId) -> Result<()> {
        self.check_closed()?;
        if self.transaction != Some(id) {
            return Err(Error::InvalidState(format!(
                "The transaction {:?} is not the active one",
                id
            )));
        }
        Ok(())
    }

    /// The transaction ended, the session no longer has a current transaction.
    pub(crate) async fn complete(&mut self, id: TransactionId) {
        if self.transaction == Some(id) {
            self.transaction = None;
            self.release().await;
        }
    }

    /// Rollback at the next use of the connection, a transaction guard was dropped.
    pub(crate) fn defer_rollback(&mut self, id: TransactionId) {
        if self.transaction == Some(id) {
            self.pending_rollback = Some(id);
        }
    }

    /// Roll back whatever is still active and close the connection. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.run_pending_rollback().await;
        if let Some(id) = self.transaction {
            log::warn!("Rolling back transaction {:?} still active at close", id);
            if let Err(e) = self.connection.rollback().await {
                log::error!("Implicit rollback failed: {:#}", e);
            }
            self.transaction = None;
        }
        self.close_connection().await;
        self.closed = true;
    }
}
