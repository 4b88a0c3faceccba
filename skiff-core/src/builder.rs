use crate::{Entity, Error, Result, Row, RowLabeled, RowNames, TableInfo};
use std::any;

/// Materialize `row` as a `T`.
///
/// Columns that are not mapped are ignored, NULL leaves the default value of the property.
/// A value that cannot be converted fails with a mapping error naming the column.
pub fn build_instance<T: Entity + Default>(table: &TableInfo, row: &RowLabeled) -> Result<T> {
    let mut instance = T::default();
    for (label, value) in row.iter() {
        let Some(column) = table.column(label) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        instance
            .set_value(column.name, value.clone())
            .map_err(|e| {
                Error::Mapping(format!(
                    "Cannot map column {}.{} of {}: {}",
                    table.name(),
                    column.name,
                    any::type_name::<T>(),
                    e
                ))
            })?;
    }
    Ok(instance)
}

/// Row kept as name/value pairs, for projections.
pub fn build_dynamic(labels: &RowNames, values: Row) -> RowLabeled {
    RowLabeled::new(labels.clone(), values)
}
