#[cfg(test)]
mod tests {
    use skiff_core::{
        CommandType, DbDriver, Entity, PagingOptions, Session, SqlDialect, SqlQuery, Value,
        sql_query,
    };
    use skiff_firebird::{FirebirdDialect, FirebirdDriver};
    use skiff_tests::{
        Call, Customer, FakeProvider, Product, execute_tests, init_logs, session_factory,
    };
    use std::sync::Arc;

    #[test]
    fn rows_paging() {
        let query = SqlQuery::new(r#"SELECT * FROM "Customers" ORDER BY "Name""#);
        let paged = FirebirdDialect
            .page_query(&query, PagingOptions::for_page(2, 10).unwrap())
            .unwrap();
        assert_eq!(
            paged.command_text(),
            r#"SELECT * FROM "Customers" ORDER BY "Name" ROWS @p0 TO @p1"#
        );
        assert_eq!(
            paged
                .arguments()
                .iter()
                .map(|a| a.value().clone())
                .collect::<Vec<_>>(),
            [Value::Int64(Some(11)), Value::Int64(Some(20))]
        );
    }

    #[test]
    fn identifiers_are_returned_by_the_insert() {
        let product = Product {
            name: "Widget".into(),
            ..Default::default()
        };
        let insert = FirebirdDialect
            .build_insert(Product::table_info(), &product)
            .unwrap();
        assert_eq!(
            insert.command_text(),
            r#"INSERT INTO "Products" ("ProductId", "Name") VALUES (GEN_ID(ProductSeq, 1), @p0) RETURNING "ProductId""#
        );
        assert_eq!(insert.arguments().len(), 1);

        let insert = FirebirdDialect
            .build_insert(Customer::table_info(), &Customer::default())
            .unwrap();
        assert_eq!(
            insert.command_text(),
            r#"INSERT INTO "Customers" ("Name", "Status", "CreditLimit") VALUES (@p0, @p1, @p2) RETURNING "CustomerId""#
        );
        assert!(!FirebirdDialect.supports_select_inserted_identifier());
    }

    #[test]
    fn execute_procedure() {
        let driver = FirebirdDriver::new(Arc::new(FakeProvider::new()), "Database=app.fdb");
        assert!(!driver.supports_batched_queries());
        let command = driver
            .build_command(&sql_query!("EXECUTE PROCEDURE ARCHIVE_CUSTOMERS @p0", 30))
            .unwrap();
        assert_eq!(command.command_type, CommandType::StoredProcedure);
        assert_eq!(command.text, "ARCHIVE_CUSTOMERS");
    }

    #[tokio::test]
    async fn insert_reads_the_returned_identifier() {
        init_logs();
        let provider = FakeProvider::new();
        let factory = session_factory(&provider, |p, c| FirebirdDriver::new(p, c));
        let mut session: Session = factory
            .open_session()
            .await
            .expect("Could not open the session");
        provider.clear();
        provider.push_scalar(41i64);
        let mut product = Product {
            name: "Widget".into(),
            ..Default::default()
        };
        session
            .insert(&mut product)
            .await
            .expect("Could not insert the product");
        assert_eq!(product.id, 41);
        let commands = provider.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].text.ends_with(r#"RETURNING "ProductId""#));
        assert!(matches!(provider.calls().last(), Some(Call::Close)));
        session.close().await;
    }

    #[tokio::test]
    async fn firebird() {
        init_logs();
        let provider = FakeProvider::new();
        let factory = session_factory(&provider, |p, c| FirebirdDriver::new(p, c));
        execute_tests(&factory, &provider).await;
    }
}
