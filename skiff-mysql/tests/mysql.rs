#[cfg(test)]
mod tests {
    use skiff_core::{
        CommandType, DbDriver, Entity, PagingOptions, SqlDialect, SqlQuery, Value, sql_query,
    };
    use skiff_mysql::{MySqlDialect, MySqlDriver};
    use skiff_tests::{
        Customer, FakeProvider, Product, Shipment, execute_tests, init_logs, session_factory,
    };
    use std::sync::Arc;

    #[test]
    fn limit_paging() {
        let query = sql_query!("SELECT * FROM Customers WHERE Status = @p0 ORDER BY Name", 1);
        let paged = MySqlDialect
            .page_query(&query, PagingOptions::for_page(3, 20).unwrap())
            .unwrap();
        assert_eq!(
            paged.command_text(),
            "SELECT * FROM Customers WHERE Status = @p0 ORDER BY Name LIMIT @p1,@p2"
        );
        assert_eq!(
            paged
                .arguments()
                .iter()
                .map(|a| a.value().clone())
                .collect::<Vec<_>>(),
            [
                Value::Int32(Some(1)),
                Value::Int64(Some(40)),
                Value::Int64(Some(20))
            ]
        );
    }

    #[test]
    fn insert_columns_follow_the_identifier_strategy() {
        let customer = Customer {
            name: "Acme".into(),
            ..Default::default()
        };
        let insert = MySqlDialect
            .build_insert(Customer::table_info(), &customer)
            .unwrap();
        assert_eq!(
            insert.command_text(),
            "INSERT INTO `Customers` (`Name`, `Status`, `CreditLimit`) VALUES (@p0, @p1, @p2)"
        );
        let insert = MySqlDialect
            .build_insert(Shipment::table_info(), &Shipment::new("Lyon"))
            .unwrap();
        assert_eq!(
            insert.command_text(),
            "INSERT INTO `logistics`.`Shipments` (`ShipmentId`, `Destination`, `Shipped`) VALUES (@p0, @p1, @p2)"
        );
        assert!(
            MySqlDialect
                .build_insert(Product::table_info(), &Product::default())
                .is_err(),
            "MySql has no sequences"
        );
        assert_eq!(
            MySqlDialect
                .build_select_inserted_id(Customer::table_info())
                .command_text(),
            "SELECT LAST_INSERT_ID()"
        );
    }

    #[test]
    fn call_procedure() {
        let driver = MySqlDriver::new(Arc::new(FakeProvider::new()), "Server=localhost");
        let command = driver
            .build_command(&sql_query!("CALL archive_customers(@p0)", 30))
            .unwrap();
        assert_eq!(command.command_type, CommandType::StoredProcedure);
        assert_eq!(command.text, "archive_customers");
        assert_eq!(command.parameters.len(), 1);
        assert!(
            driver
                .build_command(&SqlQuery::new("SELECT * FROM Customers WHERE Id = @p0"))
                .is_err()
        );
    }

    #[tokio::test]
    async fn mysql() {
        init_logs();
        let provider = FakeProvider::new();
        let factory = session_factory(&provider, |p, c| MySqlDriver::new(p, c));
        assert!(factory.driver().supports_batched_queries());
        execute_tests(&factory, &provider).await;
    }
}
