use crate::{Call, FakeProvider, Shipment};
use skiff_core::{
    ConnectionScope, Error, IsolationLevel, SessionFactory, SqlQuery, TransactionState,
};

pub async fn transaction1(factory: &SessionFactory, provider: &FakeProvider) {
    let mut session = factory
        .open_session_with(ConnectionScope::PerTransaction)
        .await
        .expect("Could not open the session");
    let isolation_level = factory.configuration().isolation_level;

    // Commit
    provider.clear();
    {
        let mut transaction = session
            .begin_transaction()
            .await
            .expect("Could not begin the transaction");
        let mut shipment = Shipment::new("Oslo");
        transaction
            .insert(&mut shipment)
            .await
            .expect("Could not insert in the transaction");
        transaction
            .commit()
            .await
            .expect("Could not commit the transaction");
        assert_eq!(transaction.state(), TransactionState::Committed);
        assert!(matches!(
            transaction.commit().await,
            Err(Error::InvalidState(..))
        ));
        assert!(matches!(
            transaction.rollback().await,
            Err(Error::InvalidState(..))
        ));
        let id = transaction.id();
        transaction.dispose().await;
        transaction.dispose().await;
        assert!(matches!(
            transaction.commit().await,
            Err(Error::Disposed("transaction"))
        ));
        let command = provider.last_command().expect("No insert was executed");
        assert_eq!(command.transaction, Some(id));
    }
    assert_eq!(
        provider.lifecycle(),
        [
            Call::Open,
            Call::Begin(isolation_level),
            Call::Commit,
            Call::Close
        ]
    );

    // Dispose rolls back
    provider.clear();
    {
        let mut transaction = session
            .begin_transaction_with(IsolationLevel::Serializable)
            .await
            .expect("Could not begin the transaction");
        assert!(transaction.is_active());
        transaction
            .execute(SqlQuery::new("DELETE FROM Shipments"))
            .await
            .expect("Could not delete in the transaction");
        transaction.dispose().await;
        assert_eq!(transaction.state(), TransactionState::RolledBack);
    }
    assert_eq!(
        provider.lifecycle(),
        [
            Call::Open,
            Call::Begin(IsolationLevel::Serializable),
            Call::Rollback,
            Call::Close
        ]
    );

    // Failed commit, rolled back on dispose
    provider.clear();
    {
        let mut transaction = session
            .begin_transaction()
            .await
            .expect("Could not begin the transaction");
        provider.push_failure("The server went away");
        let result = transaction.commit().await;
        assert!(matches!(result, Err(Error::Execution { .. })), "{:?}", result);
        assert_eq!(transaction.state(), TransactionState::Failed);
        transaction.dispose().await;
    }
    assert_eq!(
        provider.lifecycle(),
        [
            Call::Open,
            Call::Begin(isolation_level),
            Call::Commit,
            Call::Rollback,
            Call::Close
        ]
    );

    // Dropped without dispose, rolled back before the next statement
    provider.clear();
    {
        let transaction = session
            .begin_transaction()
            .await
            .expect("Could not begin the transaction");
        drop(transaction);
    }
    session
        .execute(SqlQuery::new("DELETE FROM Shipments"))
        .await
        .expect("Could not execute after the dropped transaction");
    assert_eq!(
        provider.lifecycle(),
        [
            Call::Open,
            Call::Begin(isolation_level),
            Call::Rollback,
            Call::Close,
            Call::Open,
            Call::Close
        ]
    );

    // One transaction at a time
    {
        let mut transaction = session
            .begin_transaction()
            .await
            .expect("Could not begin the transaction");
        assert!(matches!(
            transaction.begin_transaction().await,
            Err(Error::InvalidState(..))
        ));
        transaction.dispose().await;
    }

    session.close().await;
}
