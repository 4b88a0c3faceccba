#[cfg(test)]
mod tests {
    use skiff_core::{
        ConnectionManager, ConnectionScope, DbProviderFactory, Error, GenericDriver,
        IsolationLevel, SqlQuery,
    };
    use skiff_tests::{Call, FakeProvider, silent_logs};
    use std::sync::Arc;

    async fn manager(provider: &FakeProvider, scope: ConnectionScope) -> ConnectionManager {
        let connection = provider
            .create_connection("Data Source=memory")
            .expect("Could not create the connection");
        ConnectionManager::new(connection, scope)
            .await
            .expect("Could not create the connection manager")
    }

    #[tokio::test]
    async fn per_transaction_scope() {
        let provider = FakeProvider::new();
        let driver = GenericDriver::new(Arc::new(provider.clone()), "Data Source=memory");
        let mut manager = manager(&provider, ConnectionScope::PerTransaction).await;
        assert!(!manager.is_open());

        let command = manager
            .create_command(&driver, &SqlQuery::new("DELETE FROM Customers"))
            .unwrap();
        manager.execute_non_query(&command).await.unwrap();
        assert!(manager.is_open());
        manager.release().await;
        assert!(!manager.is_open());

        let id = manager.begin(IsolationLevel::Snapshot).await.unwrap();
        assert_eq!(manager.current_transaction(), Some(id));
        let command = manager
            .create_command(&driver, &SqlQuery::new("DELETE FROM Customers"))
            .unwrap();
        assert_eq!(command.transaction, Some(id));
        manager.execute_non_query(&command).await.unwrap();
        manager.release().await;
        assert!(manager.is_open(), "The transaction keeps the connection open");
        manager.commit(id).await.unwrap();
        assert!(!manager.is_open());
        assert!(matches!(manager.commit(id).await, Err(Error::InvalidState(..))));

        manager.close().await;
        manager.close().await;
        assert!(manager.is_closed());
        assert!(matches!(
            manager.execute_non_query(&command).await,
            Err(Error::Disposed("connection"))
        ));
        assert_eq!(
            provider.lifecycle(),
            [
                Call::Open,
                Call::Close,
                Call::Open,
                Call::Begin(IsolationLevel::Snapshot),
                Call::Commit,
                Call::Close
            ]
        );
    }

    #[tokio::test]
    async fn per_session_scope() {
        let provider = FakeProvider::new();
        let mut manager = manager(&provider, ConnectionScope::PerSession).await;
        assert!(manager.is_open());
        let id = manager.begin(IsolationLevel::ReadCommitted).await.unwrap();
        manager.rollback(id).await.unwrap();
        assert!(manager.is_open());
        manager.close().await;
        assert_eq!(
            provider.lifecycle(),
            [
                Call::Open,
                Call::Begin(IsolationLevel::ReadCommitted),
                Call::Rollback,
                Call::Close
            ]
        );
    }

    #[tokio::test]
    async fn failed_begin_releases_the_connection() {
        let provider = FakeProvider::new();
        let mut manager = manager(&provider, ConnectionScope::PerTransaction).await;
        provider.push_failure("Too many transactions");
        silent_logs! {
            let result = manager.begin(IsolationLevel::ReadCommitted).await;
            assert!(
                matches!(&result, Err(Error::Execution { message, .. }) if message == "Too many transactions"),
                "{:?}",
                result
            );
        }
        assert_eq!(manager.current_transaction(), None);
        assert!(!manager.is_open());
        manager.close().await;
    }

    #[tokio::test]
    async fn close_rolls_back_the_active_transaction() {
        let provider = FakeProvider::new();
        let mut manager = manager(&provider, ConnectionScope::PerTransaction).await;
        manager.begin(IsolationLevel::Serializable).await.unwrap();
        manager.close().await;
        assert_eq!(manager.current_transaction(), None);
        assert_eq!(
            provider.lifecycle(),
            [
                Call::Open,
                Call::Begin(IsolationLevel::Serializable),
                Call::Rollback,
                Call::Close
            ]
        );
    }
}
