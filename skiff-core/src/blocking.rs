//! Blocking sessions.
//!
//! Each session owns a current thread runtime driving the async session on the caller's
//! thread. Do not use them from inside an async runtime.
use crate::{
    AsValue, ConnectionScope, Entity, Error, Include, IsolationLevel, ObjectDelta, PagedResult,
    PagingOptions, Result, RowLabeled, SessionFactory, SqlQuery, TransactionState, Value,
};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};
use tokio::runtime::{Builder, Runtime};

fn runtime() -> Result<Arc<Runtime>> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|e| Error::Configuration(format!("Cannot start the session runtime: {}", e)))
}

/// Read operations shared by the blocking sessions, `self.inner` dereferences to the async
/// read only session.
macro_rules! blocking_reads {
    () => {
        pub fn single<T>(&mut self, identifier: impl Into<Value>) -> Result<Option<T>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.runtime.block_on(self.inner.single(identifier))
        }

        pub fn single_query<T>(&mut self, query: SqlQuery) -> Result<Option<T>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.runtime.block_on(self.inner.single_query(query))
        }

        pub fn fetch<T>(&mut self, query: SqlQuery) -> Result<Vec<T>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.runtime.block_on(self.inner.fetch(query))
        }

        pub fn paged<T>(&mut self, query: SqlQuery, paging: PagingOptions) -> Result<PagedResult<T>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.runtime.block_on(self.inner.paged(query, paging))
        }

        pub fn projection(&mut self, query: SqlQuery) -> Result<Vec<RowLabeled>> {
            self.runtime.block_on(self.inner.projection(query))
        }

        pub fn include_many<T>(&mut self, query: SqlQuery) -> Result<Include<Vec<T>>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.inner.include_many(query)
        }

        pub fn include_single<T>(
            &mut self,
            identifier: impl Into<Value>,
        ) -> Result<Include<Option<T>>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.inner.include_single(identifier)
        }

        pub fn include_single_query<T>(&mut self, query: SqlQuery) -> Result<Include<Option<T>>>
        where
            T: Entity + Default + Send + Sync + 'static,
        {
            self.inner.include_single_query(query)
        }

        pub fn include_scalar<T>(&mut self, query: SqlQuery) -> Result<Include<T>>
        where
            T: AsValue + Send + Sync + 'static,
        {
            self.inner.include_scalar(query)
        }

        pub fn execute_pending_queries(&mut self) -> Result<()> {
            self.runtime.block_on(self.inner.execute_pending_queries())
        }

        pub fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }

        pub fn begin_transaction(&mut self) -> Result<Transaction<'_, Self>> {
            let isolation_level = self.inner.isolation_level();
            self.begin_transaction_with(isolation_level)
        }

        pub fn begin_transaction_with(
            &mut self,
            isolation_level: IsolationLevel,
        ) -> Result<Transaction<'_, Self>> {
            let runtime = self.runtime.clone();
            let inner = runtime.block_on(crate::Transaction::begin(self, isolation_level))?;
            Ok(Transaction { inner, runtime })
        }

        /// Idempotent, also performed on drop.
        pub fn close(&mut self) {
            self.runtime.block_on(self.inner.close())
        }
    };
}

/// Blocking version of [`crate::ReadOnlySession`].
pub struct ReadOnlySession {
    inner: crate::ReadOnlySession,
    runtime: Arc<Runtime>,
}

impl ReadOnlySession {
    blocking_reads!();

    pub fn inner(&self) -> &crate::ReadOnlySession {
        &self.inner
    }
}

impl AsMut<crate::ReadOnlySession> for ReadOnlySession {
    fn as_mut(&mut self) -> &mut crate::ReadOnlySession {
        &mut self.inner
    }
}

impl Drop for ReadOnlySession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Blocking version of [`crate::Session`].
pub struct Session {
    inner: crate::Session,
    runtime: Arc<Runtime>,
}

impl Session {
    blocking_reads!();

    pub fn inner(&self) -> &crate::Session {
        &self.inner
    }

    pub fn insert<T: Entity>(&mut self, instance: &mut T) -> Result<()> {
        self.runtime.block_on(self.inner.insert(instance))
    }

    pub fn update<T: Entity>(&mut self, instance: &mut T) -> Result<bool> {
        self.runtime.block_on(self.inner.update(instance))
    }

    pub fn update_delta(&mut self, delta: &ObjectDelta) -> Result<bool> {
        self.runtime.block_on(self.inner.update_delta(delta))
    }

    pub fn delete<T: Entity>(&mut self, instance: &T) -> Result<bool> {
        self.runtime.block_on(self.inner.delete(instance))
    }

    pub fn delete_by_id<T: Entity>(&mut self, identifier: impl Into<Value>) -> Result<bool> {
        self.runtime.block_on(self.inner.delete_by_id::<T>(identifier))
    }

    pub fn delete_by_id_with_version<T: Entity>(
        &mut self,
        identifier: impl Into<Value>,
        version: impl Into<Value>,
    ) -> Result<bool> {
        self.runtime
            .block_on(self.inner.delete_by_id_with_version::<T>(identifier, version))
    }

    pub fn insert_or_update<T: Entity>(&mut self, instance: &mut T) -> Result<()> {
        self.runtime.block_on(self.inner.insert_or_update(instance))
    }

    pub fn execute(&mut self, query: SqlQuery) -> Result<u64> {
        self.runtime.block_on(self.inner.execute(query))
    }

    pub fn execute_scalar<T: AsValue>(&mut self, query: SqlQuery) -> Result<T> {
        self.runtime.block_on(self.inner.execute_scalar(query))
    }
}

impl AsMut<crate::ReadOnlySession> for Session {
    fn as_mut(&mut self) -> &mut crate::ReadOnlySession {
        &mut self.inner
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Blocking version of [`crate::Transaction`], disposed when dropped.
pub struct Transaction<'s, S: AsMut<crate::ReadOnlySession>> {
    inner: crate::Transaction<'s, S>,
    runtime: Arc<Runtime>,
}

impl<S: AsMut<crate::ReadOnlySession>> Transaction<'_, S> {
    pub fn state(&self) -> TransactionState {
        self.inner.state()
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.commit())
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.rollback())
    }

    pub fn dispose(&mut self) {
        self.runtime.block_on(self.inner.dispose())
    }
}

impl<S: AsMut<crate::ReadOnlySession>> Deref for Transaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<S: AsMut<crate::ReadOnlySession>> DerefMut for Transaction<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<S: AsMut<crate::ReadOnlySession>> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl SessionFactory {
    pub fn open_blocking_read_only_session(&self) -> Result<ReadOnlySession> {
        self.open_blocking_read_only_session_with(self.configuration().scope)
    }

    pub fn open_blocking_read_only_session_with(
        &self,
        scope: ConnectionScope,
    ) -> Result<ReadOnlySession> {
        let runtime = runtime()?;
        let inner = runtime.block_on(self.open_read_only_session_with(scope))?;
        Ok(ReadOnlySession { inner, runtime })
    }

    pub fn open_blocking_session(&self) -> Result<Session> {
        self.open_blocking_session_with(self.configuration().scope)
    }

    pub fn open_blocking_session_with(&self, scope: ConnectionScope) -> Result<Session> {
        let runtime = runtime()?;
        let inner = runtime.block_on(self.open_session_with(scope))?;
        Ok(Session { inner, runtime })
    }
}
