#[cfg(test)]
mod tests {
    use skiff::{
        Configure, ConnectionScope, DIALECT_NAMES, DbProviderFactory, Entity, Error,
        IsolationLevel, Listener, Result, SqlQuery, TableInfo, driver_for,
    };
    use skiff_tests::{Call, Customer, FakeProvider, Shipment, execute_tests, init_logs};
    use std::sync::{Arc, Mutex};

    fn provider() -> (FakeProvider, Arc<dyn DbProviderFactory>) {
        let provider = FakeProvider::new();
        let shared: Arc<dyn DbProviderFactory> = Arc::new(provider.clone());
        (provider, shared)
    }

    #[test]
    fn every_dialect_has_a_driver() {
        let (_, shared) = provider();
        for name in DIALECT_NAMES {
            let driver = driver_for(name, shared.clone(), "Data Source=memory")
                .expect("Could not create the driver");
            assert_eq!(driver.dialect().name(), name);
            assert_eq!(driver.connection_string(), "Data Source=memory");
        }
        let batched = DIALECT_NAMES
            .iter()
            .filter(|name| {
                driver_for(name, shared.clone(), "Data Source=memory")
                    .is_ok_and(|d| d.supports_batched_queries())
            })
            .count();
        assert_eq!(batched, 5);
    }

    #[test]
    fn unknown_dialect() {
        let (_, shared) = provider();
        let result = Configure::connection("sales", "Server=.", "OracleDialect")
            .provider(shared)
            .create_session_factory();
        assert!(
            matches!(&result, Err(Error::Configuration(message)) if message.contains("OracleDialect")),
            "{:?}",
            result.err()
        );
    }

    #[test]
    fn incomplete_configuration() {
        assert!(matches!(
            Configure::connection("sales", "Server=.", "MySqlDialect").create_session_factory(),
            Err(Error::Configuration(..))
        ));
        let (_, shared) = provider();
        assert!(matches!(
            Configure::connection("sales", " ", "MySqlDialect")
                .provider(shared)
                .create_session_factory(),
            Err(Error::Argument {
                parameter: "connection_string",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn configured_defaults_reach_the_session() {
        init_logs();
        let (provider, shared) = provider();
        let factory = Configure::connection("sales", "Data Source=memory", "SQLiteDialect")
            .provider(shared)
            .scope(ConnectionScope::PerSession)
            .isolation_level(IsolationLevel::RepeatableRead)
            .command_timeout(90)
            .create_session_factory()
            .expect("Could not configure the session factory");
        assert_eq!(factory.connection_name(), "sales");

        let mut session = factory
            .open_session()
            .await
            .expect("Could not open the session");
        assert_eq!(provider.lifecycle(), [Call::Open]);
        session
            .execute(SqlQuery::new("DELETE FROM Shipments"))
            .await
            .expect("Could not execute");
        session
            .execute(SqlQuery::new("DELETE FROM Customers").timeout(5))
            .await
            .expect("Could not execute");
        let commands = provider.commands();
        assert_eq!(commands[0].timeout, 90);
        assert_eq!(commands[1].timeout, 5);

        {
            let mut transaction = session
                .begin_transaction()
                .await
                .expect("Could not begin the transaction");
            transaction.commit().await.expect("Could not commit");
            transaction.dispose().await;
        }
        session.close().await;
        assert_eq!(
            provider.lifecycle(),
            [
                Call::Open,
                Call::Begin(IsolationLevel::RepeatableRead),
                Call::Commit,
                Call::Close
            ]
        );
    }

    struct Audit {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Listener for Audit {
        fn before_insert(&self, table: &TableInfo, _instance: &mut dyn Entity) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{} before {}", self.name, table.name()));
            Ok(())
        }

        fn before_insert_query(
            &self,
            _table: &TableInfo,
            _instance: &dyn Entity,
            query: &mut SqlQuery,
        ) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{} query {}", self.name, query.arguments().len()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn listeners_run_in_registration_order() {
        let (provider, shared) = provider();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (log.clone(), log.clone());
        let factory = Configure::connection("sales", "Data Source=memory", "MySqlDialect")
            .provider(shared)
            .listener(move || Audit {
                name: "first",
                log: first.clone(),
            })
            .listener(move || Audit {
                name: "second",
                log: second.clone(),
            })
            .create_session_factory()
            .expect("Could not configure the session factory");
        let mut session = factory
            .open_session()
            .await
            .expect("Could not open the session");
        let mut shipment = Shipment::new("Vienna");
        session
            .insert(&mut shipment)
            .await
            .expect("Could not insert the shipment");
        assert_eq!(
            *log.lock().unwrap(),
            [
                "first before Shipments",
                "second before Shipments",
                "first query 3",
                "second query 3"
            ]
        );

        // The identifier checks come first
        let mut shipment = Shipment::default();
        assert!(matches!(
            session.insert(&mut shipment).await,
            Err(Error::Argument {
                parameter: "instance",
                ..
            })
        ));
        assert_eq!(log.lock().unwrap().len(), 4);
        assert_eq!(provider.commands().len(), 1);
        session.close().await;
    }

    #[tokio::test]
    async fn without_identifier_checks() {
        let (provider, shared) = provider();
        let factory = Configure::connection("sales", "Data Source=memory", "PostgreSqlDialect")
            .provider(shared)
            .without_identifier_checks()
            .create_session_factory()
            .expect("Could not configure the session factory");
        let mut session = factory
            .open_session()
            .await
            .expect("Could not open the session");
        provider.push_scalar(3i64);
        let mut customer = Customer {
            id: 99,
            name: "Initech".into(),
            ..Default::default()
        };
        session
            .insert(&mut customer)
            .await
            .expect("Could not insert the customer");
        assert_eq!(customer.id, 3);
        session.close().await;
    }

    #[tokio::test]
    async fn generic_dialect() {
        init_logs();
        let (provider, shared) = provider();
        let factory = Configure::connection("fake", "Data Source=memory", "GenericDialect")
            .provider(shared)
            .create_session_factory()
            .expect("Could not configure the session factory");
        assert!(!factory.driver().dialect().supports_select_inserted_identifier());
        let mut session = factory
            .open_session()
            .await
            .expect("Could not open the session");
        let mut customer = Customer {
            name: "Acme".into(),
            ..Default::default()
        };
        provider.push_scalar(5i64);
        session
            .insert(&mut customer)
            .await
            .expect("Could not insert the customer");
        assert_eq!(customer.id, 5, "The insert itself returns the identifier");
        session.close().await;
        execute_tests(&factory, &provider).await;
    }
}
