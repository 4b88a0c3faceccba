#[cfg(test)]
mod tests {
    use skiff_core::{
        CancellationToken, ConnectionScope, DbDriver, DbProviderFactory, Entity, Error,
        GenericDialect, GenericDriver, Listener, Result, SqlDialect, SqlQuery, TableInfo, Value,
        listener_factory, sql_query,
    };
    use skiff_tests::{
        Call, Customer, FakeProvider, Invoice, Shipment, init_logs, result_set, session_factory,
        silent_logs,
    };
    use std::{
        error::Error as _,
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// Generic SQL sent in batches.
    struct BatchedDriver {
        dialect: GenericDialect,
        provider: Arc<dyn DbProviderFactory>,
        connection_string: String,
    }

    impl DbDriver for BatchedDriver {
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

    fn batched(provider: &FakeProvider) -> skiff_core::SessionFactory {
        session_factory(provider, |provider, connection_string| BatchedDriver {
            dialect: GenericDialect,
            provider,
            connection_string,
        })
    }

    #[tokio::test]
    async fn includes_share_one_command() {
        init_logs();
        let provider = FakeProvider::new();
        let factory = batched(&provider);
        let mut session = factory.open_read_only_session().await.unwrap();
        let customers = session
            .include_many::<Customer>(sql_query!(
                "SELECT CustomerId, Name FROM Customers WHERE Status = ?",
                1
            ))
            .unwrap();
        let limit = session
            .include_scalar::<Option<i64>>(sql_query!(
                "SELECT MAX(CreditLimit) FROM Customers WHERE Status = ?",
                1
            ))
            .unwrap();
        let shipment = session.include_single::<Shipment>(uuid_of(9)).unwrap();
        assert!(customers.value().is_none());
        provider.push_result_sets(vec![
            result_set(
                ["CustomerId", "Name"],
                vec![
                    [Value::Int32(Some(1)), Value::Varchar(Some("Acme".into()))],
                    [Value::Int32(Some(2)), Value::Varchar(Some("Globex".into()))],
                ],
            ),
            result_set(["Max"], vec![]),
        ]);
        session.execute_pending_queries().await.unwrap();

        let customers = customers.into_value().unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[1].name, "Globex");
        assert_eq!(limit.into_value(), Some(None), "No rows is NULL");
        assert_eq!(shipment.into_value(), Some(None), "Missing result set is no row");

        let readers = provider
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Reader(command) => Some(command),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0].text.matches(";\n").count(), 2);
        assert_eq!(
            readers[0]
                .parameters
                .iter()
                .map(|p| p.value.clone())
                .collect::<Vec<_>>(),
            [Value::Int32(Some(1)), Value::Int32(Some(1)), uuid_of(9)]
        );

        // Nothing pending, nothing executed
        provider.clear();
        session.execute_pending_queries().await.unwrap();
        assert!(provider.calls().is_empty());
        session.close().await;
    }

    fn uuid_of(n: u128) -> Value {
        Value::Uuid(Some(uuid::Uuid::from_u128(n)))
    }

    #[tokio::test]
    async fn mapping_errors_name_the_column() {
        let provider = FakeProvider::new();
        let factory = batched(&provider);
        let mut session = factory.open_read_only_session().await.unwrap();
        provider.push_result_sets(vec![result_set(
            ["CustomerId", "Name"],
            vec![[
                Value::Varchar(Some("one".into())),
                Value::Varchar(Some("Acme".into())),
            ]],
        )]);
        let result = session
            .fetch::<Customer>(SqlQuery::new("SELECT CustomerId, Name FROM Customers"))
            .await;
        assert!(
            matches!(&result, Err(Error::Mapping(message)) if message.contains("Customers.CustomerId")),
            "{:?}",
            result
        );
        session.close().await;
    }

    #[tokio::test]
    async fn provider_errors_keep_their_source() {
        let provider = FakeProvider::new();
        let factory = batched(&provider);
        let mut session = factory.open_session().await.unwrap();
        provider.push_failure("Deadlock victim");
        silent_logs! {
            let result = session.execute(SqlQuery::new("DELETE FROM Customers")).await;
            let Err(error) = result else {
                panic!("The failure was not reported");
            };
            assert!(matches!(&error, Error::Execution { .. }));
            assert_eq!(error.to_string(), "Deadlock victim");
            assert_eq!(
                error.source().map(|e| e.to_string()).as_deref(),
                Some("Deadlock victim")
            );
        }
        assert!(
            matches!(provider.calls().last(), Some(Call::Close)),
            "The connection is released after a failure"
        );
        session.close().await;
    }

    #[tokio::test]
    async fn cancellation() {
        let provider = FakeProvider::new();
        let factory = batched(&provider);
        let mut session = factory.open_session().await.unwrap();
        let token = CancellationToken::new();
        session.set_cancellation_token(token.clone());

        provider.set_delay(Some(Duration::from_secs(5)));
        let cancel = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            }
        });
        let result = session.execute(SqlQuery::new("DELETE FROM Customers")).await;
        assert!(matches!(result, Err(Error::Cancelled)), "{:?}", result);
        cancel.await.unwrap();
        assert!(
            !provider.calls().iter().any(|c| c.command().is_some()),
            "The command never completed"
        );

        // Already cancelled
        provider.set_delay(None);
        provider.clear();
        assert!(matches!(
            session.execute_scalar::<i64>(SqlQuery::new("SELECT COUNT(*) FROM Customers")).await,
            Err(Error::Cancelled)
        ));
        assert!(provider.commands().is_empty());

        session.set_cancellation_token(CancellationToken::new());
        session
            .execute(SqlQuery::new("DELETE FROM Customers"))
            .await
            .expect("A new token allows new operations");
        session.close().await;
    }

    #[tokio::test]
    async fn per_session_scope() {
        let provider = FakeProvider::new();
        let factory = batched(&provider);
        let mut session = factory
            .open_session_with(ConnectionScope::PerSession)
            .await
            .unwrap();
        for _ in 0..3 {
            session
                .execute(SqlQuery::new("DELETE FROM Customers"))
                .await
                .unwrap();
        }
        {
            let mut transaction = session.begin_transaction().await.unwrap();
            transaction.rollback().await.unwrap();
            transaction.dispose().await;
        }
        assert_eq!(provider.lifecycle()[..1], [Call::Open]);
        session.close().await;
        session.close().await;
        assert!(session.is_closed());
        assert_eq!(
            provider.lifecycle(),
            [
                Call::Open,
                Call::Begin(Default::default()),
                Call::Rollback,
                Call::Close
            ]
        );
        assert!(matches!(
            session.fetch::<Customer>(SqlQuery::new("SELECT * FROM Customers")).await,
            Err(Error::Disposed("session"))
        ));
    }

    struct Recorder {
        hooks: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn push(&self, hook: &str, table: &TableInfo) {
            self.hooks
                .lock()
                .unwrap()
                .push(format!("{} {}", hook, table.name()));
        }
    }

    impl Listener for Recorder {
        fn before_insert_query(
            &self,
            table: &TableInfo,
            _instance: &dyn Entity,
            query: &mut SqlQuery,
        ) -> Result<()> {
            self.push("before_insert_query", table);
            *query = SqlQuery::with_arguments(
                format!("{} /* audited */", query.command_text()),
                query.arguments().to_vec(),
            );
            Ok(())
        }

        fn after_insert(
            &self,
            table: &TableInfo,
            _instance: &dyn Entity,
            identifier: Option<&Value>,
        ) -> Result<()> {
            self.push(&format!("after_insert {:?}", identifier), table);
            Ok(())
        }

        fn before_update(&self, table: &TableInfo, _instance: &mut dyn Entity) -> Result<()> {
            self.push("before_update", table);
            Ok(())
        }

        fn after_update(
            &self,
            table: &TableInfo,
            _instance: &dyn Entity,
            rows_affected: u64,
        ) -> Result<()> {
            self.push(&format!("after_update {}", rows_affected), table);
            Ok(())
        }

        fn before_delete(&self, table: &TableInfo, _instance: &dyn Entity) -> Result<()> {
            if table.name() == "Invoices" {
                return Err(Error::InvalidState("Invoices are never deleted".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn listener_hooks() {
        let provider = FakeProvider::new();
        let hooks = Arc::new(Mutex::new(Vec::new()));
        let recorded = hooks.clone();
        let driver: Arc<dyn DbDriver> = Arc::new(GenericDriver::new(
            Arc::new(provider.clone()),
            "Data Source=memory",
        ));
        let mut configuration = skiff_core::Configuration::new(
            "audited",
            "Data Source=memory",
            "GenericDialect",
            driver.provider().clone(),
        );
        configuration.listeners.push(listener_factory(move || Recorder {
            hooks: recorded.clone(),
        }));
        let factory = skiff_core::SessionFactory::new(configuration, driver).unwrap();
        let mut session = factory.open_session().await.unwrap();

        provider.push_scalar(31i64);
        let mut customer = Customer {
            name: "Acme".into(),
            ..Default::default()
        };
        session.insert(&mut customer).await.unwrap();
        assert!(
            provider
                .last_command()
                .is_some_and(|c| c.text.ends_with("/* audited */"))
        );

        provider.push_non_query(1);
        customer.status = 2;
        session.update(&mut customer).await.unwrap();

        let invoice = Invoice {
            id: 4,
            customer_id: 31,
            ..Default::default()
        };
        let commands = provider.commands().len();
        assert!(matches!(
            session.delete(&invoice).await,
            Err(Error::InvalidState(..))
        ));
        assert_eq!(provider.commands().len(), commands);

        assert_eq!(
            *hooks.lock().unwrap(),
            [
                "before_insert_query Customers",
                "after_insert Some(Int64(Some(31))) Customers",
                "before_update Customers",
                "after_update 1 Customers",
            ]
        );
        session.close().await;
    }

    #[tokio::test]
    async fn insert_or_update() {
        let provider = FakeProvider::new();
        let factory = batched(&provider);
        let mut session = factory.open_session().await.unwrap();

        // Generated identifier not set
        provider.push_scalar(8i64);
        let mut customer = Customer {
            name: "Acme".into(),
            ..Default::default()
        };
        session.insert_or_update(&mut customer).await.unwrap();
        assert_eq!(customer.id, 8);

        // Assigned identifier not found by the update
        provider.clear();
        provider.push_non_query(0).push_non_query(1);
        let mut shipment = Shipment::new("Madrid");
        session.insert_or_update(&mut shipment).await.unwrap();
        let commands = provider.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].text.starts_with("UPDATE "));
        assert!(commands[1].text.starts_with("INSERT INTO "));
        session.close().await;
    }
}
