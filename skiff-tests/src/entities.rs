use rust_decimal::Decimal;
use skiff_core::{
    AsValue, ColumnInfo, DbType, Entity, IdentifierStrategy, Result, TableInfo, Value,
};
use std::sync::LazyLock;
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Identity identifier.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub status: i32,
    pub credit_limit: Option<Decimal>,
}

impl Entity for Customer {
    fn table_info() -> &'static TableInfo {
        static TABLE: LazyLock<TableInfo> = LazyLock::new(|| {
            TableInfo::new(
                "",
                "Customers",
                vec![
                    ColumnInfo::new("CustomerId", DbType::Int32)
                        .identifier(IdentifierStrategy::Identity),
                    ColumnInfo::new("Name", DbType::String),
                    ColumnInfo::new("Status", DbType::Int32),
                    ColumnInfo::new("CreditLimit", DbType::Decimal),
                ],
            )
            .expect("Customers mapping")
        });
        &TABLE
    }

    fn get_value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "CustomerId" => self.id.as_value(),
            "Name" => self.name.clone().as_value(),
            "Status" => self.status.as_value(),
            "CreditLimit" => self.credit_limit.as_value(),
            _ => return None,
        })
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        match column {
            "CustomerId" => self.id = AsValue::try_from_value(value)?,
            "Name" => self.name = AsValue::try_from_value(value)?,
            "Status" => self.status = AsValue::try_from_value(value)?,
            "CreditLimit" => self.credit_limit = AsValue::try_from_value(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Assigned identifier, set by the caller before insert.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Shipment {
    pub id: Uuid,
    pub destination: String,
    pub shipped: Option<PrimitiveDateTime>,
}

impl Shipment {
    pub fn new(destination: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination: destination.into(),
            shipped: None,
        }
    }
}

impl Entity for Shipment {
    fn table_info() -> &'static TableInfo {
        static TABLE: LazyLock<TableInfo> = LazyLock::new(|| {
            TableInfo::new(
                "logistics",
                "Shipments",
                vec![
                    ColumnInfo::new("ShipmentId", DbType::Guid)
                        .identifier(IdentifierStrategy::Assigned),
                    ColumnInfo::new("Destination", DbType::String),
                    ColumnInfo::new("Shipped", DbType::DateTime),
                ],
            )
            .expect("Shipments mapping")
        });
        &TABLE
    }

    fn get_value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "ShipmentId" => self.id.as_value(),
            "Destination" => self.destination.clone().as_value(),
            "Shipped" => self.shipped.as_value(),
            _ => return None,
        })
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        match column {
            "ShipmentId" => self.id = AsValue::try_from_value(value)?,
            "Destination" => self.destination = AsValue::try_from_value(value)?,
            "Shipped" => self.shipped = AsValue::try_from_value(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Database generated identifier and a version column.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: i32,
    pub total: Decimal,
    pub version: i32,
}

impl Entity for Invoice {
    fn table_info() -> &'static TableInfo {
        static TABLE: LazyLock<TableInfo> = LazyLock::new(|| {
            TableInfo::new(
                "",
                "Invoices",
                vec![
                    ColumnInfo::new("InvoiceId", DbType::Int64)
                        .identifier(IdentifierStrategy::DbGenerated),
                    ColumnInfo::new("CustomerId", DbType::Int32).update(false),
                    ColumnInfo::new("Total", DbType::Decimal),
                    ColumnInfo::new("Version", DbType::Int32).version(),
                ],
            )
            .expect("Invoices mapping")
        });
        &TABLE
    }

    fn get_value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "InvoiceId" => self.id.as_value(),
            "CustomerId" => self.customer_id.as_value(),
            "Total" => self.total.as_value(),
            "Version" => self.version.as_value(),
            _ => return None,
        })
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        match column {
            "InvoiceId" => self.id = AsValue::try_from_value(value)?,
            "CustomerId" => self.customer_id = AsValue::try_from_value(value)?,
            "Total" => self.total = AsValue::try_from_value(value)?,
            "Version" => self.version = AsValue::try_from_value(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Identifier taken from the `ProductSeq` sequence.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
}

impl Entity for Product {
    fn table_info() -> &'static TableInfo {
        static TABLE: LazyLock<TableInfo> = LazyLock::new(|| {
            TableInfo::new(
                "",
                "Products",
                vec![
                    ColumnInfo::new("ProductId", DbType::Int64).sequence("ProductSeq"),
                    ColumnInfo::new("Name", DbType::String),
                ],
            )
            .expect("Products mapping")
        });
        &TABLE
    }

    fn get_value(&self, column: &str) -> Option<Value> {
        Some(match column {
            "ProductId" => self.id.as_value(),
            "Name" => self.name.clone().as_value(),
            _ => return None,
        })
    }

    fn set_value(&mut self, column: &str, value: Value) -> Result<()> {
        match column {
            "ProductId" => self.id = AsValue::try_from_value(value)?,
            "Name" => self.name = AsValue::try_from_value(value)?,
            _ => {}
        }
        Ok(())
    }
}
