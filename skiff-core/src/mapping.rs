use crate::{DbType, Error, Result, Value};

/// How the value of an identifier column is produced.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierStrategy {
    /// Set by the caller before insert.
    Assigned,
    /// Generated by the database by some mean not further specified.
    #[default]
    DbGenerated,
    /// Taken from a named database sequence.
    Sequence,
    /// Auto increment column (MySql, SQLite).
    AutoIncrement,
    /// Identity column (MsSql).
    Identity,
}

impl IdentifierStrategy {
    /// True when the database produces the value.
    pub fn is_generated(&self) -> bool {
        *self != IdentifierStrategy::Assigned
    }
}

/// Mapping of one property to one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub db_type: DbType,
    pub allow_insert: bool,
    pub allow_update: bool,
    pub is_identifier: bool,
    pub identifier_strategy: IdentifierStrategy,
    pub sequence_name: Option<&'static str>,
    pub is_version: bool,
}

impl ColumnInfo {
    /// Regular column, both insertable and updatable.
    pub const fn new(name: &'static str, db_type: DbType) -> Self {
        Self {
            name,
            db_type,
            allow_insert: true,
            allow_update: true,
            is_identifier: false,
            identifier_strategy: IdentifierStrategy::Assigned,
            sequence_name: None,
            is_version: false,
        }
    }

    /// Mark as the identifier. Identifiers are never updated.
    pub const fn identifier(mut self, strategy: IdentifierStrategy) -> Self {
        self.is_identifier = true;
        self.identifier_strategy = strategy;
        self.allow_update = false;
        self
    }

    /// Identifier taken from `sequence`.
    pub const fn sequence(mut self, sequence: &'static str) -> Self {
        self = self.identifier(IdentifierStrategy::Sequence);
        self.sequence_name = Some(sequence);
        self
    }

    /// Mark as the optimistic concurrency column.
    pub const fn version(mut self) -> Self {
        self.is_version = true;
        self
    }

    pub const fn insert(mut self, allow: bool) -> Self {
        self.allow_insert = allow;
        self
    }

    pub const fn update(mut self, allow: bool) -> Self {
        self.allow_update = allow;
        self
    }
}

/// Mapping of a type to a table.
///
/// Built once per type, usually inside a `LazyLock` returned from [`Entity::table_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    schema: &'static str,
    name: &'static str,
    columns: Vec<ColumnInfo>,
    identifier: usize,
    version: Option<usize>,
}

impl TableInfo {
    /// Validate and build the mapping of a table.
    ///
    /// Fails with a mapping error unless there is exactly one identifier column, at most one
    /// version column and every sequence identifier names its sequence.
    pub fn new(schema: &'static str, name: &'static str, columns: Vec<ColumnInfo>) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Mapping("The table name cannot be empty".into()));
        }
        let mut identifiers = columns.iter().enumerate().filter(|(_, c)| c.is_identifier);
        let Some((identifier, column)) = identifiers.next() else {
            return Err(Error::Mapping(format!(
                "The table {} does not map an identifier column",
                name
            )));
        };
        if let Some((_, other)) = identifiers.next() {
            return Err(Error::Mapping(format!(
                "The table {} maps more than one identifier column ({} and {})",
                name, column.name, other.name
            )));
        }
        if column.identifier_strategy == IdentifierStrategy::Sequence
            && column.sequence_name.is_none_or(str::is_empty)
        {
            return Err(Error::Mapping(format!(
                "The identifier {}.{} uses a sequence but does not name it",
                name, column.name
            )));
        }
        let mut versions = columns.iter().enumerate().filter(|(_, c)| c.is_version);
        let version = versions.next().map(|(i, _)| i);
        if versions.next().is_some() {
            return Err(Error::Mapping(format!(
                "The table {} maps more than one version column",
                name
            )));
        }
        if version == Some(identifier) {
            return Err(Error::Mapping(format!(
                "The column {}.{} cannot be both identifier and version",
                name, column.name
            )));
        }
        Ok(Self {
            schema,
            name,
            columns,
            identifier,
            version,
        })
    }

    pub fn schema(&self) -> &'static str {
        self.schema
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `schema.name`, or just `name` without a schema.
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn identifier_column(&self) -> &ColumnInfo {
        &self.columns[self.identifier]
    }

    pub fn identifier_strategy(&self) -> IdentifierStrategy {
        self.identifier_column().identifier_strategy
    }

    pub fn version_column(&self) -> Option<&ColumnInfo> {
        self.version.map(|i| &self.columns[i])
    }

    /// Columns written by an update, in declaration order.
    pub fn updatable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns
            .iter()
            .filter(|c| !c.is_identifier && (c.allow_update || c.is_version))
    }
}

/// A type mapped to a table.
///
/// `Default` plays the role of the parameterless constructor the object builder needs.
///
/// ```rust
/// use skiff_core::{ColumnInfo, DbType, Entity, IdentifierStrategy, TableInfo, Value, AsValue};
/// use std::sync::LazyLock;
///
/// #[derive(Default)]
/// struct Customer {
///     id: i32,
///     name: String,
/// }
///
/// impl Entity for Customer {
///     fn table_info() -> &'static TableInfo {
///         static TABLE: LazyLock<TableInfo> = LazyLock::new(|| {
///             TableInfo::new(
///                 "",
///                 "Customers",
///                 vec![
///                     ColumnInfo::new("Id", DbType::Int32).identifier(IdentifierStrategy::Identity),
///                     ColumnInfo::new("Name", DbType::String),
///                 ],
///             )
///             .expect("valid mapping")
///         });
///         &TABLE
///     }
///     fn get_value(&self, column: &str) -> Option<Value> {
///         match column {
///             "Id" => Some(self.id.as_value()),
///             "Name" => Some(self.name.clone().as_value()),
///             _ => None,
///         }
///     }
///     fn set_value(&mut self, column: &str, value: Value) -> skiff_core::Result<()> {
///         match column {
///             "Id" => self.id = AsValue::try_from_value(value)?,
///             "Name" => self.name = AsValue::try_from_value(value)?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// assert_eq!(Customer::table_info().identifier_column().name, "Id");
/// ```
pub trait Entity: Send + Sync {
    fn table_info() -> &'static TableInfo
    where
        Self: Sized;

    /// Current value of `column`, `None` when the column is not mapped.
    fn get_value(&self, column: &str) -> Option<Value>;

    /// Assign `column`, unknown columns are ignored.
    fn set_value(&mut self, column: &str, value: Value) -> Result<()>;
}

/// Value of a mapped column, NULL when the entity does not expose it.
pub(crate) fn column_value(instance: &dyn Entity, column: &ColumnInfo) -> Value {
    instance
        .get_value(column.name)
        .unwrap_or_else(|| Value::null_of(column.db_type))
}

/// A partial update: some columns of the row identified by `identifier`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDelta {
    table: &'static TableInfo,
    identifier: Value,
    changes: Vec<(String, Value)>,
}

impl ObjectDelta {
    pub fn new<T: Entity>(identifier: impl Into<Value>) -> Self {
        Self::for_table(T::table_info(), identifier)
    }

    pub fn for_table(table: &'static TableInfo, identifier: impl Into<Value>) -> Self {
        Self {
            table,
            identifier: identifier.into(),
            changes: Vec::new(),
        }
    }

    pub fn add_change(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.push((column.into(), value.into()));
        self
    }

    pub fn table(&self) -> &'static TableInfo {
        self.table
    }

    pub fn identifier(&self) -> &Value {
        &self.identifier
    }

    pub fn changes(&self) -> &[(String, Value)] {
        &self.changes
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }
}
