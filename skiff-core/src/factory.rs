use crate::{
    ConnectionManager, ConnectionScope, DbDriver, DbProviderFactory, Error,
    IdentifierStrategyListener, IsolationLevel, ListenerFactory, ReadOnlySession, Result, Session,
    listener_factory,
};
use std::{fmt, sync::Arc};

/// Everything a [`SessionFactory`] needs to know about a database.
#[derive(Clone)]
pub struct Configuration {
    /// Name identifying the connection, used in logs.
    pub connection_name: String,
    pub connection_string: String,
    /// Name of the dialect, for example `MsSql2012Dialect`.
    pub dialect_name: String,
    pub provider: Arc<dyn DbProviderFactory>,
    pub scope: ConnectionScope,
    pub isolation_level: IsolationLevel,
    /// Timeout applied to the queries that keep the default one.
    pub command_timeout: Option<u32>,
    /// Invoked once per session, hooks run in this order.
    pub listeners: Vec<ListenerFactory>,
}

impl Configuration {
    /// Configuration with the default scope and isolation level and the identifier checks.
    pub fn new(
        connection_name: impl Into<String>,
        connection_string: impl Into<String>,
        dialect_name: impl Into<String>,
        provider: Arc<dyn DbProviderFactory>,
    ) -> Self {
        Self {
            connection_name: connection_name.into(),
            connection_string: connection_string.into(),
            dialect_name: dialect_name.into(),
            provider,
            scope: ConnectionScope::default(),
            isolation_level: IsolationLevel::default(),
            command_timeout: None,
            listeners: vec![listener_factory(|| IdentifierStrategyListener)],
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("connection_name", &self.connection_name)
            .field("dialect_name", &self.dialect_name)
            .field("scope", &self.scope)
            .field("isolation_level", &self.isolation_level)
            .field("command_timeout", &self.command_timeout)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Opens sessions on one database. Every call returns a new session, nothing is pooled.
pub struct SessionFactory {
    configuration: Configuration,
    driver: Arc<dyn DbDriver>,
}

impl SessionFactory {
    /// Fails when `driver` does not speak the dialect named in `configuration`.
    pub fn new(configuration: Configuration, driver: Arc<dyn DbDriver>) -> Result<Self> {
        if driver.dialect().name() != configuration.dialect_name {
            return Err(Error::Configuration(format!(
                "The connection {} uses {} but the driver speaks {}",
                configuration.connection_name,
                configuration.dialect_name,
                driver.dialect().name()
            )));
        }
        Ok(Self {
            configuration,
            driver,
        })
    }

    pub fn connection_name(&self) -> &str {
        &self.configuration.connection_name
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn driver(&self) -> &Arc<dyn DbDriver> {
        &self.driver
    }

    async fn open_base(&self, scope: ConnectionScope) -> Result<ReadOnlySession> {
        log::debug!(
            "Opening a session on {} ({:?})",
            self.configuration.connection_name,
            scope
        );
        let connection = self.driver.get_connection(scope)?;
        let connection = ConnectionManager::new(connection, scope).await?;
        Ok(ReadOnlySession::new(
            self.driver.clone(),
            connection,
            self.configuration.isolation_level,
            self.configuration.command_timeout,
        ))
    }

    pub async fn open_read_only_session(&self) -> Result<ReadOnlySession> {
        self.open_base(self.configuration.scope).await
    }

    pub async fn open_read_only_session_with(
        &self,
        scope: ConnectionScope,
    ) -> Result<ReadOnlySession> {
        self.open_base(scope).await
    }

    pub async fn open_session(&self) -> Result<Session> {
        self.open_session_with(self.configuration.scope).await
    }

    pub async fn open_session_with(&self, scope: ConnectionScope) -> Result<Session> {
        let base = self.open_base(scope).await?;
        let listeners = self.configuration.listeners.iter().map(|f| f()).collect();
        Ok(Session::new(base, listeners))
    }
}
