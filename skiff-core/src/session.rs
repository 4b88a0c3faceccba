use crate::{
    AsValue, ConnectionManager, DEFAULT_TIMEOUT, DbDriver, Entity, Error, Include, IsolationLevel,
    Listener, ObjectDelta, PagedResult, PagingOptions, PendingInclude, Result, ResultSet,
    RowLabeled, SqlDialect, SqlQuery, Transaction, Value, build_dynamic, build_instance,
    cancellable, column_value,
};
use std::{
    mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;

/// A session that reads entities, projections and scalars.
///
/// Reads are queued as includes and run together: every read flushes all the pending ones,
/// in a single round trip when the driver supports batched queries.
pub struct ReadOnlySession {
    pub(crate) driver: Arc<dyn DbDriver>,
    pub(crate) connection: ConnectionManager,
    pub(crate) cancellation: CancellationToken,
    includes: Vec<PendingInclude>,
    isolation_level: IsolationLevel,
    command_timeout: Option<u32>,
    closed: bool,
}

impl ReadOnlySession {
    pub(crate) fn new(
        driver: Arc<dyn DbDriver>,
        connection: ConnectionManager,
        isolation_level: IsolationLevel,
        command_timeout: Option<u32>,
    ) -> Self {
        Self {
            driver,
            connection,
            cancellation: CancellationToken::new(),
            includes: Vec::new(),
            isolation_level,
            command_timeout,
            closed: false,
        }
    }

    pub fn driver(&self) -> &dyn DbDriver {
        self.driver.as_ref()
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.driver.dialect()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Operations fail with [`Error::Cancelled`] once `token` is cancelled.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Disposed("session"))
        } else {
            Ok(())
        }
    }

    /// Begin a transaction at the isolation level configured for the session.
    pub async fn begin_transaction(&mut self) -> Result<Transaction<'_, Self>> {
        let isolation_level = self.isolation_level;
        Transaction::begin(self, isolation_level).await
    }

    pub async fn begin_transaction_with(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> Result<Transaction<'_, Self>> {
        Transaction::begin(self, isolation_level).await
    }

    fn command_query(&self, query: SqlQuery) -> SqlQuery {
        match self.command_timeout {
            Some(timeout) if query.timeout_seconds() == DEFAULT_TIMEOUT => query.timeout(timeout),
            _ => query,
        }
    }

    pub(crate) async fn run_non_query(&mut self, query: SqlQuery) -> Result<u64> {
        self.check_open()?;
        let query = self.command_query(query);
        let command = self.connection.create_command(self.driver.as_ref(), &query)?;
        let result = cancellable!(&self.cancellation, self.connection.execute_non_query(&command));
        self.connection.release().await;
        result
    }

    pub(crate) async fn run_scalar(&mut self, query: SqlQuery) -> Result<Value> {
        self.check_open()?;
        let query = self.command_query(query);
        let command = self.connection.create_command(self.driver.as_ref(), &query)?;
        let result = cancellable!(&self.cancellation, self.connection.execute_scalar(&command));
        self.connection.release().await;
        result
    }

    async fn run_reader(&mut self, query: SqlQuery) -> Result<Vec<ResultSet>> {
        let query = self.command_query(query);
        let command = self.connection.create_command(self.driver.as_ref(), &query)?;
        cancellable!(&self.cancellation, self.connection.execute_reader(&command))
    }

    /// Insert statement followed by the retrieval of the generated identifier, if any.
    pub(crate) async fn run_insert(
        &mut self,
        table: &crate::TableInfo,
        query: SqlQuery,
    ) -> Result<Option<Value>> {
        if !table.identifier_strategy().is_generated() {
            self.run_non_query(query).await?;
            return Ok(None);
        }
        let dialect = self.driver.dialect();
        if !dialect.supports_select_inserted_identifier() {
            return self.run_scalar(query).await.map(Some);
        }
        let select_id = dialect.build_select_inserted_id(table);
        if self.driver.supports_batched_queries() {
            let combined = self.driver.combine_pair(&query, &select_id)?;
            self.run_scalar(combined).await.map(Some)
        } else {
            self.check_open()?;
            let insert = self.command_query(query);
            let insert = self.connection.create_command(self.driver.as_ref(), &insert)?;
            let select_id = self.command_query(select_id);
            let select_id = self.connection.create_command(self.driver.as_ref(), &select_id)?;
            let result = async {
                cancellable!(&self.cancellation, self.connection.execute_non_query(&insert))?;
                cancellable!(&self.cancellation, self.connection.execute_scalar(&select_id))
            }
            .await;
            self.connection.release().await;
            result.map(Some)
        }
    }

    fn queue(
        &mut self,
        query: SqlQuery,
        build: impl FnOnce(ResultSet) -> Result<()> + Send + 'static,
    ) {
        self.includes.push(PendingInclude {
            query,
            build: Box::new(build),
        });
    }

    /// Register a query returning many entities.
    pub fn include_many<T>(&mut self, query: SqlQuery) -> Result<Include<Vec<T>>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        self.check_open()?;
        let include = Include::new();
        let sink = include.sink();
        self.queue(query, move |set| {
            let table = T::table_info();
            let values = set
                .labeled()
                .map(|row| build_instance::<T>(table, &row))
                .collect::<Result<Vec<_>>>()?;
            let _ = sink.set(values);
            Ok(())
        });
        Ok(include)
    }

    /// Register the read of the entity identified by `identifier`.
    pub fn include_single<T>(&mut self, identifier: impl Into<Value>) -> Result<Include<Option<T>>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        self.check_open()?;
        let identifier = identifier.into();
        if identifier.is_null() {
            return Err(Error::argument_null("identifier"));
        }
        let query = self.dialect().build_select(T::table_info(), &identifier);
        self.include_single_query(query)
    }

    /// Register a query returning at most one entity.
    pub fn include_single_query<T>(&mut self, query: SqlQuery) -> Result<Include<Option<T>>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        self.check_open()?;
        let include = Include::new();
        let sink = include.sink();
        self.queue(query, move |set| {
            let value = match set.labeled().next() {
                Some(row) => Some(build_instance::<T>(T::table_info(), &row)?),
                None => None,
            };
            let _ = sink.set(value);
            Ok(())
        });
        Ok(include)
    }

    /// Register a query returning a single value, the first column of the first row.
    pub fn include_scalar<T>(&mut self, query: SqlQuery) -> Result<Include<T>>
    where
        T: AsValue + Send + Sync + 'static,
    {
        self.check_open()?;
        let include = Include::new();
        let sink = include.sink();
        self.queue(query, move |set| {
            let value = set
                .rows
                .into_iter()
                .next()
                .and_then(|row| row.into_vec().into_iter().next())
                .unwrap_or(Value::Null);
            let _ = sink.set(T::try_from_value(value)?);
            Ok(())
        });
        Ok(include)
    }

    /// Register a query whose rows are kept as name/value pairs.
    pub fn include_projection(&mut self, query: SqlQuery) -> Result<Include<Vec<RowLabeled>>> {
        self.check_open()?;
        let include = Include::new();
        let sink = include.sink();
        self.queue(query, move |set| {
            let labels = set.labels;
            let rows = set
                .rows
                .into_iter()
                .map(|row| build_dynamic(&labels, row))
                .collect();
            let _ = sink.set(rows);
            Ok(())
        });
        Ok(include)
    }

    /// Run every pending include.
    pub async fn execute_pending_queries(&mut self) -> Result<()> {
        self.check_open()?;
        let pending = mem::take(&mut self.includes);
        if pending.is_empty() {
            return Ok(());
        }
        let result = self.run_includes(pending).await;
        self.connection.release().await;
        result
    }

    async fn run_includes(&mut self, pending: Vec<PendingInclude>) -> Result<()> {
        if pending.len() > 1 && self.driver.supports_batched_queries() {
            let queries = pending.iter().map(|v| v.query.clone()).collect::<Vec<_>>();
            let combined = self.driver.combine(&queries)?;
            let mut sets = self.run_reader(combined).await?.into_iter();
            for include in pending {
                (include.build)(sets.next().unwrap_or_default())?;
            }
        } else {
            for include in pending {
                let set = self.run_reader(include.query).await?.into_iter().next();
                (include.build)(set.unwrap_or_default())?;
            }
        }
        Ok(())
    }

    async fn flush<T>(&mut self, include: Include<T>) -> Result<T> {
        self.execute_pending_queries().await?;
        include
            .take()
            .ok_or_else(|| Error::InvalidState("The query did not produce a result".into()))
    }

    /// The entity identified by `identifier`.
    pub async fn single<T>(&mut self, identifier: impl Into<Value>) -> Result<Option<T>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        let include = self.include_single(identifier)?;
        self.flush(include).await
    }

    /// The first entity returned by `query`.
    pub async fn single_query<T>(&mut self, query: SqlQuery) -> Result<Option<T>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        let include = self.include_single_query(query)?;
        self.flush(include).await
    }

    pub async fn fetch<T>(&mut self, query: SqlQuery) -> Result<Vec<T>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        let include = self.include_many(query)?;
        self.flush(include).await
    }

    /// Rows of `query` as name/value pairs.
    pub async fn projection(&mut self, query: SqlQuery) -> Result<Vec<RowLabeled>> {
        let include = self.include_projection(query)?;
        self.flush(include).await
    }

    /// One page of the results of `query` together with the total number of results.
    pub async fn paged<T>(
        &mut self,
        query: SqlQuery,
        paging: PagingOptions,
    ) -> Result<PagedResult<T>>
    where
        T: Entity + Default + Send + Sync + 'static,
    {
        self.check_open()?;
        paging.validate()?;
        let PagingOptions::ForPage {
            page,
            results_per_page,
        } = paging
        else {
            return Err(Error::argument(
                "paging",
                "Paged queries require a page, not PagingOptions::None",
            ));
        };
        let count = self.dialect().count_query(&query)?;
        let page_query = self.dialect().page_query(&query, paging)?;
        let total = self.include_scalar::<u64>(count)?;
        let results = self.include_many::<T>(page_query)?;
        self.execute_pending_queries().await?;
        Ok(PagedResult::new(
            page,
            results.take().unwrap_or_default(),
            results_per_page,
            total.take().unwrap_or_default(),
        ))
    }

    /// Roll back what is still active and close the connection. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        if !self.includes.is_empty() {
            log::warn!(
                "Closing a session with {} pending queries never executed",
                self.includes.len()
            );
            self.includes.clear();
        }
        self.connection.close().await;
        self.closed = true;
    }
}

impl AsMut<ReadOnlySession> for ReadOnlySession {
    fn as_mut(&mut self) -> &mut ReadOnlySession {
        self
    }
}

impl Drop for ReadOnlySession {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!("Session dropped without being closed");
        }
    }
}

/// A session that also inserts, updates and deletes.
///
/// Dereferences to [`ReadOnlySession`] for the reads.
pub struct Session {
    base: ReadOnlySession,
    listeners: Vec<Box<dyn Listener>>,
}

impl Session {
    pub(crate) fn new(base: ReadOnlySession, listeners: Vec<Box<dyn Listener>>) -> Self {
        Self { base, listeners }
    }

    pub fn listeners(&self) -> &[Box<dyn Listener>] {
        &self.listeners
    }

    pub async fn begin_transaction(&mut self) -> Result<Transaction<'_, Self>> {
        let isolation_level = self.base.isolation_level;
        Transaction::begin(self, isolation_level).await
    }

    pub async fn begin_transaction_with(
        &mut self,
        isolation_level: IsolationLevel,
    ) -> Result<Transaction<'_, Self>> {
        Transaction::begin(self, isolation_level).await
    }

    /// Insert `instance`, the generated identifier is assigned to it.
    pub async fn insert<T: Entity>(&mut self, instance: &mut T) -> Result<()> {
        self.base.check_open()?;
        let table = T::table_info();
        for listener in &self.listeners {
            listener.before_insert(table, instance)?;
        }
        let mut query = self.base.dialect().build_insert(table, instance)?;
        for listener in &self.listeners {
            listener.before_insert_query(table, instance, &mut query)?;
        }
        let identifier = self.base.run_insert(table, query).await?;
        if let Some(identifier) = identifier.as_ref().filter(|v| !v.is_null()) {
            instance.set_value(table.identifier_column().name, identifier.clone())?;
        }
        for listener in &self.listeners {
            listener.after_insert(table, instance, identifier.as_ref())?;
        }
        Ok(())
    }

    /// Update every updatable column of `instance`.
    ///
    /// With a version column a statement affecting no rows is a concurrency error: the row was
    /// deleted or its version changed, the two cases are not told apart.
    pub async fn update<T: Entity>(&mut self, instance: &mut T) -> Result<bool> {
        self.base.check_open()?;
        let table = T::table_info();
        for listener in &self.listeners {
            listener.before_update(table, instance)?;
        }
        let mut query = self.base.dialect().build_update(table, instance)?;
        for listener in &self.listeners {
            listener.before_update_query(table, instance, &mut query)?;
        }
        let new_version = table.version_column().and_then(|version| {
            table
                .updatable_columns()
                .position(|c| c.name == version.name)
                .and_then(|i| query.arguments().get(i))
                .map(|v| (version.name, v.value().clone()))
        });
        let rows_affected = self.base.run_non_query(query).await?;
        if rows_affected == 0 && new_version.is_some() {
            return Err(Error::Concurrency(format!(
                "The {} identified by {} was changed or deleted by someone else",
                table.name(),
                column_value(instance, table.identifier_column())
            )));
        }
        if let Some((column, version)) = new_version.filter(|_| rows_affected > 0) {
            instance.set_value(column, version)?;
        }
        for listener in &self.listeners {
            listener.after_update(table, instance, rows_affected)?;
        }
        Ok(rows_affected > 0)
    }

    /// Update only the columns listed in `delta`.
    pub async fn update_delta(&mut self, delta: &ObjectDelta) -> Result<bool> {
        self.base.check_open()?;
        if delta.change_count() == 0 {
            return Err(Error::argument(
                "delta",
                "The delta must contain at least one change",
            ));
        }
        if delta.identifier().is_null() {
            return Err(Error::argument_null("delta"));
        }
        let query = self.base.dialect().build_update_delta(delta)?;
        Ok(self.base.run_non_query(query).await? > 0)
    }

    /// Delete `instance`, guarded by its version when the table has a version column.
    pub async fn delete<T: Entity>(&mut self, instance: &T) -> Result<bool> {
        self.base.check_open()?;
        let table = T::table_info();
        for listener in &self.listeners {
            listener.before_delete(table, instance)?;
        }
        let identifier = column_value(instance, table.identifier_column());
        let version = table.version_column().map(|c| column_value(instance, c));
        let mut query = self
            .base
            .dialect()
            .build_delete(table, &identifier, version.as_ref())?;
        for listener in &self.listeners {
            listener.before_delete_query(table, instance, &mut query)?;
        }
        let rows_affected = self.base.run_non_query(query).await?;
        if rows_affected == 0 && version.is_some() {
            return Err(Error::Concurrency(format!(
                "The {} identified by {} was changed or deleted by someone else",
                table.name(),
                identifier
            )));
        }
        for listener in &self.listeners {
            listener.after_delete(table, instance, rows_affected)?;
        }
        Ok(rows_affected > 0)
    }

    /// Delete the row of `T` identified by `identifier`, without version check.
    pub async fn delete_by_id<T: Entity>(&mut self, identifier: impl Into<Value>) -> Result<bool> {
        self.base.check_open()?;
        let identifier = identifier.into();
        if identifier.is_null() {
            return Err(Error::argument_null("identifier"));
        }
        let query = self
            .base
            .dialect()
            .build_delete(T::table_info(), &identifier, None)?;
        Ok(self.base.run_non_query(query).await? > 0)
    }

    /// Delete the row of `T` identified by `identifier` if its version is still `version`.
    pub async fn delete_by_id_with_version<T: Entity>(
        &mut self,
        identifier: impl Into<Value>,
        version: impl Into<Value>,
    ) -> Result<bool> {
        self.base.check_open()?;
        let identifier = identifier.into();
        if identifier.is_null() {
            return Err(Error::argument_null("identifier"));
        }
        let version = version.into();
        if version.is_null() {
            return Err(Error::argument_null("version"));
        }
        let table = T::table_info();
        let query = self
            .base
            .dialect()
            .build_delete(table, &identifier, Some(&version))?;
        if self.base.run_non_query(query).await? == 0 {
            return Err(Error::Concurrency(format!(
                "The {} identified by {} with version {} was changed or deleted by someone else",
                table.name(),
                identifier,
                version
            )));
        }
        Ok(true)
    }

    /// Insert when the identifier is not set, update otherwise.
    ///
    /// Assigned identifiers are always set: the row is updated, and inserted when the update
    /// does not find it.
    pub async fn insert_or_update<T: Entity>(&mut self, instance: &mut T) -> Result<()> {
        self.base.check_open()?;
        let table = T::table_info();
        let identifier = column_value(instance, table.identifier_column());
        if table.identifier_strategy().is_generated() {
            if identifier.is_default() {
                self.insert(instance).await
            } else {
                self.update(instance).await.map(|_| ())
            }
        } else if self.update(instance).await? {
            Ok(())
        } else {
            self.insert(instance).await
        }
    }

    /// Run `query` and return the rows affected.
    pub async fn execute(&mut self, query: SqlQuery) -> Result<u64> {
        self.base.run_non_query(query).await
    }

    /// Run `query` and return the first column of the first row.
    pub async fn execute_scalar<T: AsValue>(&mut self, query: SqlQuery) -> Result<T> {
        let value = self.base.run_scalar(query).await?;
        T::try_from_value(value)
    }
}

impl Deref for Session {
    type Target = ReadOnlySession;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl AsMut<ReadOnlySession> for Session {
    fn as_mut(&mut self) -> &mut ReadOnlySession {
        &mut self.base
    }
}
