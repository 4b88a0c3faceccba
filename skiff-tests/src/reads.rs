use crate::{Call, Customer, FakeProvider, result_set};
use skiff_core::{
    ConnectionScope, Error, PagingOptions, ResultSet, SessionFactory, SqlArgument, SqlQuery,
    Value,
};

fn customers(rows: &[(i32, &str, i32)]) -> ResultSet {
    result_set(
        ["CustomerId", "Name", "Status", "Unmapped"],
        rows.iter()
            .map(|(id, name, status)| {
                [
                    Value::Int32(Some(*id)),
                    Value::Varchar(Some(name.to_string())),
                    Value::Int32(Some(*status)),
                    Value::Boolean(Some(true)),
                ]
            })
            .collect(),
    )
}

fn readers(provider: &FakeProvider) -> usize {
    provider
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Reader(..)))
        .count()
}

pub async fn reads(factory: &SessionFactory, provider: &FakeProvider) {
    let batched = factory.driver().supports_batched_queries();
    let p0 = factory.driver().characters().parameter_name(0);
    let by_status = SqlQuery::with_arguments(
        format!(
            "SELECT CustomerId, Name, Status FROM Customers WHERE Status = {} ORDER BY Name",
            p0
        ),
        [SqlArgument::new(1)],
    );
    let mut session = factory
        .open_read_only_session_with(ConnectionScope::PerTransaction)
        .await
        .expect("Could not open the session");

    // Single by identifier
    provider.clear();
    provider.push_result_sets(vec![customers(&[(7, "Acme", 1)])]);
    let customer = session
        .single::<Customer>(7)
        .await
        .expect("Could not read the customer")
        .expect("The customer was not found");
    assert_eq!(customer.id, 7);
    assert_eq!(customer.name, "Acme");
    assert_eq!(customer.credit_limit, None);
    let select = provider.last_command().expect("No select was executed");
    assert!(select.text.starts_with("SELECT "));
    assert_eq!(select.parameters[0].value, Value::Int32(Some(7)));
    assert_eq!(
        provider.lifecycle(),
        [Call::Open, Call::Close],
        "Each read outside of a transaction opens and closes the connection"
    );

    // Missing row
    provider.push_result_sets(vec![customers(&[])]);
    assert!(
        session
            .single::<Customer>(8)
            .await
            .expect("Could not read the customer")
            .is_none()
    );

    // Includes run together
    provider.clear();
    let first = customers(&[(1, "Acme", 1), (2, "Globex", 1)]);
    let second = result_set(["Total"], vec![[Value::Int64(Some(2))]]);
    if batched {
        provider.push_result_sets(vec![first, second]);
    } else {
        provider.push_result_sets(vec![first]);
        provider.push_result_sets(vec![second]);
    }
    let many = session
        .include_many::<Customer>(by_status.clone())
        .expect("Could not include the customers");
    let total = session
        .include_scalar::<i64>(SqlQuery::new("SELECT COUNT(*) FROM Customers"))
        .expect("Could not include the count");
    assert!(!many.has_value());
    session
        .execute_pending_queries()
        .await
        .expect("Could not execute the pending queries");
    assert_eq!(readers(provider), if batched { 1 } else { 2 });
    assert_eq!(many.value().map(Vec::len), Some(2));
    assert_eq!(total.value(), Some(&2));

    // Paging
    provider.clear();
    let count = result_set(["Count"], vec![[Value::Int64(Some(60))]]);
    let page = customers(&[(26, "Initech", 1), (27, "Umbrella", 1)]);
    if batched {
        provider.push_result_sets(vec![count, page]);
    } else {
        provider.push_result_sets(vec![count]);
        provider.push_result_sets(vec![page]);
    }
    let paged = session
        .paged::<Customer>(
            by_status.clone(),
            PagingOptions::for_page(2, 25).expect("Invalid paging"),
        )
        .await
        .expect("Could not read the page");
    assert_eq!(readers(provider), if batched { 1 } else { 2 });
    assert_eq!(paged.page(), 2);
    assert_eq!(paged.results().len(), 2);
    assert_eq!(paged.total_results(), 60);
    assert_eq!(paged.total_pages(), 3);
    assert!(paged.more_results_available());
    let commands = provider.commands();
    let paging_arguments = commands
        .last()
        .map(|c| c.parameters.len())
        .unwrap_or_default();
    assert_eq!(paging_arguments, if batched { 4 } else { 3 });
    let issued = provider.commands().len();
    let page_zero = PagingOptions::ForPage {
        page: 0,
        results_per_page: 25,
    };
    let result = session.paged::<Customer>(by_status.clone(), page_zero).await;
    assert!(matches!(
        result,
        Err(Error::Argument {
            parameter: "paging",
            ..
        })
    ));
    assert_eq!(provider.commands().len(), issued);

    // Projection
    provider.push_result_sets(vec![customers(&[(3, "Hooli", 2)])]);
    let rows = session
        .projection(by_status)
        .await
        .expect("Could not read the projection");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::Varchar(Some("Hooli".into()))));

    session.close().await;
    session.close().await;
    assert!(session.is_closed());
}
