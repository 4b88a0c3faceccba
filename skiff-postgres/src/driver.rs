use crate::PostgreSqlDialect;
use skiff_core::{DbDriver, DbProviderFactory, SqlDialect};
use std::sync::Arc;

pub struct PostgreSqlDriver {
    dialect: PostgreSqlDialect,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: String,
}

impl PostgreSqlDriver {
    pub fn new(provider: Arc<dyn DbProviderFactory>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect: PostgreSqlDialect,
            provider,
            connection_string: connection_string.into(),
        }
    }
}

impl DbDriver for PostgreSqlDriver {
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
