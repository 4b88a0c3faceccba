use crate::{Entity, Error, IdentifierStrategy, Result, SqlQuery, TableInfo, Value, column_value};
use std::sync::Arc;

/// Hooks around the statements a [`crate::Session`] runs for an entity.
///
/// Every hook is optional. The `*_query` hooks run after the statement is built and before it
/// is executed, they can inspect or rewrite it. Hooks of the listeners of a session run in
/// registration order, an error aborts the operation.
#[allow(unused_variables)]
pub trait Listener: Send + Sync {
    fn before_insert(&self, table: &TableInfo, instance: &mut dyn Entity) -> Result<()> {
        Ok(())
    }

    fn before_insert_query(
        &self,
        table: &TableInfo,
        instance: &dyn Entity,
        query: &mut SqlQuery,
    ) -> Result<()> {
        Ok(())
    }

    /// `identifier` is the value read back from the database, `None` for assigned identifiers.
    fn after_insert(
        &self,
        table: &TableInfo,
        instance: &dyn Entity,
        identifier: Option<&Value>,
    ) -> Result<()> {
        Ok(())
    }

    fn before_update(&self, table: &TableInfo, instance: &mut dyn Entity) -> Result<()> {
        Ok(())
    }

    fn before_update_query(
        &self,
        table: &TableInfo,
        instance: &dyn Entity,
        query: &mut SqlQuery,
    ) -> Result<()> {
        Ok(())
    }

    fn after_update(
        &self,
        table: &TableInfo,
        instance: &dyn Entity,
        rows_affected: u64,
    ) -> Result<()> {
        Ok(())
    }

    fn before_delete(&self, table: &TableInfo, instance: &dyn Entity) -> Result<()> {
        Ok(())
    }

    fn before_delete_query(
        &self,
        table: &TableInfo,
        instance: &dyn Entity,
        query: &mut SqlQuery,
    ) -> Result<()> {
        Ok(())
    }

    fn after_delete(
        &self,
        table: &TableInfo,
        instance: &dyn Entity,
        rows_affected: u64,
    ) -> Result<()> {
        Ok(())
    }
}

/// Creates the listener instance of a session, invoked once per session.
pub type ListenerFactory = Arc<dyn Fn() -> Box<dyn Listener> + Send + Sync>;

/// Wraps a closure into a [`ListenerFactory`].
pub fn listener_factory<L, F>(create: F) -> ListenerFactory
where
    L: Listener + 'static,
    F: Fn() -> L + Send + Sync + 'static,
{
    Arc::new(move || Box::new(create()))
}

/// Checks the identifier against its strategy.
///
/// Assigned identifiers must be set before insert, generated ones must not. Updates and
/// deletes need an identifier.
#[derive(Default, Debug, Clone, Copy)]
pub struct IdentifierStrategyListener;

impl IdentifierStrategyListener {
    fn identifier(table: &TableInfo, instance: &dyn Entity) -> Value {
        column_value(instance, table.identifier_column())
    }

    fn require_identifier(table: &TableInfo, instance: &dyn Entity, operation: &str) -> Result<()> {
        if Self::identifier(table, instance).is_default() {
            return Err(Error::argument(
                "instance",
                format!(
                    "Cannot {} a {} without an identifier",
                    operation,
                    table.name()
                ),
            ));
        }
        Ok(())
    }
}

impl Listener for IdentifierStrategyListener {
    fn before_insert(&self, table: &TableInfo, instance: &mut dyn Entity) -> Result<()> {
        let column = table.identifier_column();
        let is_default = Self::identifier(table, instance).is_default();
        match column.identifier_strategy {
            IdentifierStrategy::Assigned if is_default => Err(Error::argument(
                "instance",
                format!(
                    "The identifier {}.{} is assigned and must be set before insert",
                    table.name(),
                    column.name
                ),
            )),
            strategy if strategy.is_generated() && !is_default => Err(Error::argument(
                "instance",
                format!(
                    "The identifier {}.{} is generated by the database, it must not be set before insert",
                    table.name(),
                    column.name
                ),
            )),
            _ => Ok(()),
        }
    }

    fn before_update(&self, table: &TableInfo, instance: &mut dyn Entity) -> Result<()> {
        Self::require_identifier(table, instance, "update")
    }

    fn before_delete(&self, table: &TableInfo, instance: &dyn Entity) -> Result<()> {
        Self::require_identifier(table, instance, "delete")
    }
}
