use crate::FirebirdDialect;
use skiff_core::{DbDriver, DbProviderFactory, SqlDialect};
use std::sync::Arc;

/// Firebird driver, one statement per command.
pub struct FirebirdDriver {
    dialect: FirebirdDialect,
    provider: Arc<dyn DbProviderFactory>,
    connection_string: String,
}

impl FirebirdDriver {
    pub fn new(provider: Arc<dyn DbProviderFactory>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect: FirebirdDialect,
            provider,
            connection_string: connection_string.into(),
        }
    }
}

impl DbDriver for FirebirdDriver {
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
