use crate::MySqlDialect;
use skiff_core::{DbDriver, DbProviderFactory, SqlDialect};
use std::sync::Arc;

pub struct MySqlDriver {
    dialect: MySqlDialect,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: String,
}

impl MySqlDriver {
    pub fn new(provider: Arc<dyn DbProviderFactory>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect: MySqlDialect,
            provider,
            connection_string: connection_string.into(),
        }
    }
}

impl DbDriver for MySqlDriver {
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
