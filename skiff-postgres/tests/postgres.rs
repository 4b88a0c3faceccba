#[cfg(test)]
mod tests {
    use skiff_core::{
        CommandType, DbDriver, Entity, PagingOptions, SqlDialect, SqlQuery, Value, sql_query,
    };
    use skiff_postgres::{PostgreSqlDialect, PostgreSqlDriver};
    use skiff_tests::{
        Customer, FakeProvider, Product, execute_tests, init_logs, session_factory,
    };
    use std::sync::Arc;

    #[test]
    fn limit_offset_paging() {
        let query = sql_query!(
            r#"SELECT * FROM "Customers" WHERE "Status" = :p0 ORDER BY "Name""#,
            1
        );
        let paged = PostgreSqlDialect
            .page_query(&query, PagingOptions::skip_take(30, 15).unwrap())
            .unwrap();
        assert_eq!(
            paged.command_text(),
            r#"SELECT * FROM "Customers" WHERE "Status" = :p0 ORDER BY "Name" LIMIT :p1 OFFSET :p2"#
        );
        assert_eq!(
            paged
                .arguments()
                .iter()
                .map(|a| a.value().clone())
                .collect::<Vec<_>>(),
            [
                Value::Int32(Some(1)),
                Value::Int64(Some(15)),
                Value::Int64(Some(30))
            ]
        );
    }

    #[test]
    fn sequences() {
        let product = Product {
            name: "Widget".into(),
            ..Default::default()
        };
        let insert = PostgreSqlDialect
            .build_insert(Product::table_info(), &product)
            .unwrap();
        assert_eq!(
            insert.command_text(),
            r#"INSERT INTO "Products" ("ProductId", "Name") VALUES (nextval('ProductSeq'), :p0)"#
        );
        assert_eq!(
            PostgreSqlDialect
                .build_select_inserted_id(Product::table_info())
                .command_text(),
            "SELECT currval('ProductSeq')"
        );
        assert_eq!(
            PostgreSqlDialect
                .build_select_inserted_id(Customer::table_info())
                .command_text(),
            "SELECT lastval()"
        );
    }

    #[test]
    fn functions_are_stored_procedures() {
        let driver = PostgreSqlDriver::new(Arc::new(FakeProvider::new()), "Host=localhost");
        let command = driver
            .build_command(&sql_query!("SELECT customers_by_status(:p0)", 2))
            .unwrap();
        assert_eq!(command.command_type, CommandType::StoredProcedure);
        assert_eq!(command.text, "customers_by_status");
        assert_eq!(command.parameters[0].name, ":p0");

        for text in [
            r#"SELECT "Name" FROM "Customers""#,
            "SELECT COUNT(*) FROM Customers",
            "SELECT 1",
        ] {
            let command = driver.build_command(&SqlQuery::new(text)).unwrap();
            assert_eq!(command.command_type, CommandType::Text, "{}", text);
            assert_eq!(command.text, text);
        }
    }

    #[test]
    fn functions_with_literals_run_as_text() {
        let driver = PostgreSqlDriver::new(Arc::new(FakeProvider::new()), "Host=localhost");
        let currval = PostgreSqlDialect.build_select_inserted_id(Product::table_info());
        for query in [
            currval,
            SqlQuery::new("SELECT nextval('Customers_seq')"),
            SqlQuery::new("SELECT upper('abc')"),
            sql_query!("SELECT round(:p0, 2)", 1.5),
        ] {
            let command = driver.build_command(&query).unwrap();
            assert_eq!(command.command_type, CommandType::Text);
            assert_eq!(command.text, query.command_text());
        }
    }

    #[test]
    fn casts_are_not_parameters() {
        let driver = PostgreSqlDriver::new(Arc::new(FakeProvider::new()), "Host=localhost");
        let command = driver
            .build_command(&sql_query!(
                r#"SELECT "Name" FROM "Customers" WHERE "CreditLimit" > :p0::numeric"#,
                100
            ))
            .unwrap();
        assert_eq!(command.parameters.len(), 1);
    }

    #[tokio::test]
    async fn postgres() {
        init_logs();
        let provider = FakeProvider::new();
        let factory = session_factory(&provider, |p, c| PostgreSqlDriver::new(p, c));
        execute_tests(&factory, &provider).await;
    }
}
