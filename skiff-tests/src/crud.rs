use crate::{Call, Customer, FakeProvider, Invoice, Shipment};
use rust_decimal::Decimal;
use skiff_core::{ConnectionScope, Error, ObjectDelta, SessionFactory, Value};

fn executions(provider: &FakeProvider) -> Vec<Call> {
    provider
        .calls()
        .into_iter()
        .filter(|c| c.command().is_some())
        .collect()
}

pub async fn crud(factory: &SessionFactory, provider: &FakeProvider) {
    let mut session = factory
        .open_session_with(ConnectionScope::PerTransaction)
        .await
        .expect("Could not open the session");

    // Generated identifier read back
    provider.clear();
    provider.push_scalar(12i64);
    let mut customer = Customer {
        name: "Acme".into(),
        status: 1,
        ..Default::default()
    };
    session
        .insert(&mut customer)
        .await
        .expect("Could not insert the customer");
    assert_eq!(customer.id, 12);
    let insert = &provider.commands()[0];
    assert!(insert.text.starts_with("INSERT INTO "));
    assert_eq!(
        insert
            .parameters
            .iter()
            .map(|p| p.value.clone())
            .collect::<Vec<_>>(),
        [
            Value::Varchar(Some("Acme".into())),
            Value::Int32(Some(1)),
            Value::Null
        ]
    );
    assert!(matches!(executions(provider).last(), Some(Call::Scalar(..))));

    // Assigned identifier, no read back
    provider.clear();
    let mut shipment = Shipment::new("Turin");
    session
        .insert(&mut shipment)
        .await
        .expect("Could not insert the shipment");
    let calls = executions(provider);
    assert_eq!(calls.len(), 1);
    let Some(Call::NonQuery(command)) = calls.first() else {
        panic!("Expected a non query, found {:?}", calls);
    };
    assert_eq!(command.parameters[0].value, Value::Uuid(Some(shipment.id)));

    // Assigned identifier missing
    provider.clear();
    let result = session.insert(&mut Shipment::default()).await;
    assert!(
        matches!(
            result,
            Err(Error::Argument {
                parameter: "instance",
                ..
            })
        ),
        "Expected an argument error, found {:?}",
        result
    );
    assert!(provider.commands().is_empty());

    // Versioned update
    let mut invoice = Invoice {
        id: 5,
        customer_id: 12,
        total: Decimal::new(1050, 2),
        version: 3,
    };
    provider.clear();
    provider.push_non_query(1);
    assert!(
        session
            .update(&mut invoice)
            .await
            .expect("Could not update the invoice")
    );
    assert_eq!(invoice.version, 4);
    let update = provider.last_command().expect("No update was executed");
    assert!(update.text.starts_with("UPDATE "));
    assert_eq!(
        update
            .parameters
            .iter()
            .map(|p| p.value.clone())
            .collect::<Vec<_>>(),
        [
            Value::Decimal(Some(Decimal::new(1050, 2))),
            Value::Int32(Some(4)),
            Value::Int64(Some(5)),
            Value::Int32(Some(3)),
        ]
    );

    // Someone else changed it
    provider.push_non_query(0);
    let result = session.update(&mut invoice).await;
    assert!(matches!(result, Err(ref e) if e.is_concurrency()), "{:?}", result);
    assert_eq!(invoice.version, 4);

    // Versioned delete
    provider.clear();
    provider.push_non_query(1);
    assert!(
        session
            .delete(&invoice)
            .await
            .expect("Could not delete the invoice")
    );
    let delete = provider.last_command().expect("No delete was executed");
    assert!(delete.text.starts_with("DELETE FROM "));
    assert_eq!(delete.parameters.len(), 2);
    provider.push_non_query(0);
    assert!(session.delete(&invoice).await.is_err_and(|e| e.is_concurrency()));

    // Delete by identifier only reports the rows affected
    provider.push_non_query(0);
    assert!(
        !session
            .delete_by_id::<Customer>(99)
            .await
            .expect("Could not delete by identifier")
    );
    assert!(matches!(
        session.delete_by_id::<Customer>(Value::Int32(None)).await,
        Err(Error::Argument {
            parameter: "identifier",
            ..
        })
    ));
    provider.push_non_query(0);
    assert!(
        session
            .delete_by_id_with_version::<Invoice>(5i64, 4)
            .await
            .is_err_and(|e| e.is_concurrency())
    );

    // Partial update
    provider.clear();
    let delta = ObjectDelta::new::<Customer>(12).add_change("Status", 2);
    assert!(
        session
            .update_delta(&delta)
            .await
            .expect("Could not update the delta")
    );
    let command = provider.last_command().expect("No update was executed");
    assert_eq!(command.parameters.len(), 2);
    assert_eq!(command.parameters[0].value, Value::Int32(Some(2)));
    assert_eq!(command.parameters[1].value, Value::Int32(Some(12)));
    assert!(matches!(
        session
            .update_delta(&ObjectDelta::new::<Customer>(12))
            .await,
        Err(Error::Argument {
            parameter: "delta",
            ..
        })
    ));

    // Set identifier means update
    provider.clear();
    session
        .insert_or_update(&mut customer)
        .await
        .expect("Could not save the customer");
    assert!(
        provider
            .last_command()
            .is_some_and(|c| c.text.starts_with("UPDATE "))
    );

    // Raw statements
    provider.push_non_query(3);
    assert_eq!(
        session
            .execute(skiff_core::SqlQuery::new("DELETE FROM Customers"))
            .await
            .expect("Could not execute"),
        3
    );
    provider.push_scalar(42i64);
    let count: i32 = session
        .execute_scalar(skiff_core::SqlQuery::new("SELECT COUNT(*) FROM Customers"))
        .await
        .expect("Could not execute the scalar");
    assert_eq!(count, 42);

    session.close().await;
    assert!(matches!(
        session.execute(skiff_core::SqlQuery::new("SELECT 1")).await,
        Err(Error::Disposed("session"))
    ));
}
