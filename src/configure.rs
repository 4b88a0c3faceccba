use crate::{
    firebird::FirebirdDriver,
    mssql::{MsSql2005Dialect, MsSql2012Dialect, MsSqlDriver, SqlServerCeDriver},
    mysql::MySqlDriver,
    postgres::PostgreSqlDriver,
    sqlite::SQLiteDriver,
};
use skiff_core::{
    Configuration, ConnectionScope, DbDriver, DbProviderFactory, Error, GenericDriver,
    IsolationLevel, Listener, Result, SessionFactory, listener_factory,
};
use std::sync::Arc;

/// Names accepted by [`driver_for`].
pub const DIALECT_NAMES: [&str; 8] = [
    "MsSql2005Dialect",
    "MsSql2012Dialect",
    "SqlServerCeDialect",
    "MySqlDialect",
    "PostgreSqlDialect",
    "SQLiteDialect",
    "FirebirdDialect",
    "GenericDialect",
];

/// Driver speaking the dialect called `dialect_name`.
pub fn driver_for(
    dialect_name: &str,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: impl Into<String>,
) -> Result<Arc<dyn DbDriver>> {
    let connection_string = connection_string.into();
    Ok(match dialect_name {
        "MsSql2005Dialect" => Arc::new(MsSqlDriver::<MsSql2005Dialect>::new(
            provider,
            connection_string,
        )),
        "MsSql2012Dialect" => Arc::new(MsSqlDriver::<MsSql2012Dialect>::new(
            provider,
            connection_string,
        )),
        "SqlServerCeDialect" => Arc::new(SqlServerCeDriver::new(provider, connection_string)),
        "MySqlDialect" => Arc::new(MySqlDriver::new(provider, connection_string)),
        "PostgreSqlDialect" => Arc::new(PostgreSqlDriver::new(provider, connection_string)),
        "SQLiteDialect" => Arc::new(SQLiteDriver::new(provider, connection_string)),
        "FirebirdDialect" => Arc::new(FirebirdDriver::new(provider, connection_string)),
        "GenericDialect" => Arc::new(GenericDriver::new(provider, connection_string)),
        _ => {
            return Err(Error::Configuration(format!(
                "Unknown dialect {}, expected one of: {}",
                dialect_name,
                DIALECT_NAMES.join(", ")
            )));
        }
    })
}

/// Fluent construction of a [`SessionFactory`].
///
/// ```
/// # use skiff::{Configure, ConnectionScope};
/// # fn provider() -> std::sync::Arc<dyn skiff::DbProviderFactory> { unimplemented!() }
/// # fn example() -> skiff::Result<()> {
/// let factory = Configure::connection("sales", "Server=.;Database=Sales", "MsSql2012Dialect")
///     .provider(provider())
///     .scope(ConnectionScope::PerSession)
///     .command_timeout(60)
///     .create_session_factory()?;
/// # Ok(())
/// # }
/// ```
pub struct Configure {
    connection_name: String,
    connection_string: String,
    dialect_name: String,
    provider: Option<Arc<dyn DbProviderFactory>>,
    scope: ConnectionScope,
    isolation_level: IsolationLevel,
    command_timeout: Option<u32>,
    identifier_checks: bool,
    listeners: Vec<skiff_core::ListenerFactory>,
}

impl Configure {
    pub fn connection(
        connection_name: impl Into<String>,
        connection_string: impl Into<String>,
        dialect_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_name: connection_name.into(),
            connection_string: connection_string.into(),
            dialect_name: dialect_name.into(),
            provider: None,
            scope: ConnectionScope::default(),
            isolation_level: IsolationLevel::default(),
            command_timeout: None,
            identifier_checks: true,
            listeners: Vec::new(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn DbProviderFactory>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn scope(mut self, scope: ConnectionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn isolation_level(mut self, isolation_level: IsolationLevel) -> Self {
        self.isolation_level = isolation_level;
        self
    }

    /// Seconds, applied to the queries keeping the default timeout.
    pub fn command_timeout(mut self, seconds: u32) -> Self {
        self.command_timeout = Some(seconds);
        self
    }

    /// Adds a listener, each session gets its own instance from `create`.
    pub fn listener<L, F>(mut self, create: F) -> Self
    where
        L: Listener + 'static,
        F: Fn() -> L + Send + Sync + 'static,
    {
        self.listeners.push(listener_factory(create));
        self
    }

    /// Drops the identifier strategy checks registered by default.
    pub fn without_identifier_checks(mut self) -> Self {
        self.identifier_checks = false;
        self
    }

    pub fn create_session_factory(self) -> Result<SessionFactory> {
        let provider = self.provider.ok_or_else(|| {
            Error::Configuration(format!(
                "The connection {} has no provider factory",
                self.connection_name
            ))
        })?;
        if self.connection_string.trim().is_empty() {
            return Err(Error::argument_null("connection_string"));
        }
        let driver = driver_for(&self.dialect_name, provider.clone(), &self.connection_string)?;
        let mut configuration = Configuration::new(
            self.connection_name,
            self.connection_string,
            self.dialect_name,
            provider,
        );
        configuration.scope = self.scope;
        configuration.isolation_level = self.isolation_level;
        configuration.command_timeout = self.command_timeout;
        if !self.identifier_checks {
            configuration.listeners.clear();
        }
        configuration.listeners.extend(self.listeners);
        log::debug!("Configured {:?}", configuration);
        SessionFactory::new(configuration, driver)
    }
}
