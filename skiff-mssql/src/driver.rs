use crate::{MsSql2012Dialect, SqlServerCeDialect};
use skiff_core::{DbDriver, DbProviderFactory, SqlDialect};
use std::sync::Arc;

/// SQL Server driver, `D` selects the server version.
pub struct MsSqlDriver<D: SqlDialect = MsSql2012Dialect> {
    dialect: D,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: String,
}

impl<D: SqlDialect + Default> MsSqlDriver<D> {
    pub fn new(provider: Arc<dyn DbProviderFactory>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect: D::default(),
            provider,
            connection_string: connection_string.into(),
        }
    }
}

impl<D: SqlDialect> DbDriver for MsSqlDriver<D> {
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
}

/// SQL Server Compact driver, one statement per command.
pub struct SqlServerCeDriver {
    dialect: SqlServerCeDialect,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: String,
}

impl SqlServerCeDriver {
    pub fn new(provider: Arc<dyn DbProviderFactory>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect: SqlServerCeDialect,
            provider,
            connection_string: connection_string.into(),
        }
    }
}

impl DbDriver for SqlServerCeDriver {
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
