//! # Schema descriptors
//!
//! A [`Schema`] is the immutable metadata bundle for one entity type: its
//! table, primary key, ordered persistent fields and, per field, the column
//! it maps to plus a getter/setter pair. Descriptors are built once, checked
//! against their invariants, and never mutated.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::DataType;

type Getter<E> = Box<dyn Fn(&E) -> anyhow::Result<DataType> + Send + Sync>;
type Setter<E> = Box<dyn Fn(&mut E, DataType) -> anyhow::Result<()> + Send + Sync>;
type Constructor<E> = Box<dyn Fn() -> anyhow::Result<E> + Send + Sync>;

/// A persistent field: logical name, physical column and typed accessors.
pub struct FieldDescriptor<E> {
    name: &'static str,
    column: &'static str,
    getter: Getter<E>,
    setter: Setter<E>,
}

impl<E> FieldDescriptor<E> {
    /// Creates a descriptor from a getter/setter pair targeting the same attribute.
    pub fn new<G, S>(name: &'static str, column: &'static str, getter: G, setter: S) -> Self
    where
        G: Fn(&E) -> anyhow::Result<DataType> + Send + Sync + 'static,
        S: Fn(&mut E, DataType) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name,
            column,
            getter: Box::new(getter),
            setter: Box::new(setter),
        }
    }

    /// Logical field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Physical column name.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.column
    }

    /// Read the field from a live instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessorFailure`] if the getter fails.
    pub fn get(&self, entity: &E) -> Result<DataType> {
        (self.getter)(entity).map_err(|cause| Error::AccessorFailure {
            field: self.name.to_string(),
            cause,
        })
    }

    /// Write the field on a live instance. No coercion is applied to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessorFailure`] if the setter fails.
    pub fn set(&self, entity: &mut E, value: DataType) -> Result<()> {
        self.apply(entity, value).map_err(|cause| Error::AccessorFailure {
            field: self.name.to_string(),
            cause,
        })
    }

    // Raw setter call; the binder reports failures as `BindFailure`.
    pub(crate) fn apply(&self, entity: &mut E, value: DataType) -> anyhow::Result<()> {
        (self.setter)(entity, value)
    }
}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

/// Immutable metadata for an entity type `E`.
pub struct Schema<E> {
    entity: &'static str,
    table: &'static str,
    primary_key: usize,
    fields: Vec<FieldDescriptor<E>>,
    by_field: HashMap<&'static str, usize>,
    by_column: HashMap<&'static str, usize>,
    constructor: Constructor<E>,
}

impl<E> Schema<E> {
    /// Start building a schema for `table` keyed by the `primary_key` field.
    #[must_use]
    pub fn builder(table: &'static str, primary_key: &'static str) -> SchemaBuilder<E> {
        SchemaBuilder {
            table,
            primary_key,
            fields: Vec::new(),
            constructor: None,
        }
    }

    /// Rust type name of the entity.
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    /// Physical table name.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// The primary key field.
    #[must_use]
    pub fn primary_key(&self) -> &FieldDescriptor<E> {
        &self.fields[self.primary_key]
    }

    /// Persistent fields in declaration order, which is also `INSERT` column order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor<E>] {
        &self.fields
    }

    /// Look up a field by logical name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<E>> {
        self.by_field.get(name).map(|&index| &self.fields[index])
    }

    /// Look up the field mapped to a column. Falls back to an ASCII
    /// case-insensitive match when there is no exact one.
    #[must_use]
    pub fn field_for_column(&self, column: &str) -> Option<&FieldDescriptor<E>> {
        self.by_column.get(column).map_or_else(
            || self.fields.iter().find(|field| field.column.eq_ignore_ascii_case(column)),
            |&index| Some(&self.fields[index]),
        )
    }

    /// Column mapped to a logical field.
    #[must_use]
    pub fn column_of(&self, field: &str) -> Option<&'static str> {
        self.field(field).map(FieldDescriptor::column)
    }

    /// Logical field mapped to a column.
    #[must_use]
    pub fn field_of(&self, column: &str) -> Option<&'static str> {
        self.field_for_column(column).map(FieldDescriptor::name)
    }

    /// Resolve a caller supplied field name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty or unknown name.
    pub fn resolve(&self, field: &str) -> Result<&FieldDescriptor<E>> {
        if field.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty field name for `{}`",
                self.entity
            )));
        }
        self.field(field).ok_or_else(|| {
            Error::InvalidArgument(format!("`{}` has no field `{field}`", self.entity))
        })
    }

    /// Read a field value from a live instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown field and
    /// [`Error::AccessorFailure`] if the getter fails.
    pub fn get_value(&self, entity: &E, field: &str) -> Result<DataType> {
        self.resolve(field)?.get(entity)
    }

    /// Write a field value on a live instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown field and
    /// [`Error::AccessorFailure`] if the setter fails.
    pub fn set_value(&self, entity: &mut E, field: &str, value: DataType) -> Result<()> {
        self.resolve(field)?.set(entity, value)
    }

    /// Allocate a fresh instance with the registered constructor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstructionFailure`] if the constructor fails.
    pub fn instantiate(&self) -> Result<E> {
        (self.constructor)().map_err(|cause| Error::ConstructionFailure {
            entity: self.entity,
            cause,
        })
    }
}

impl<E> fmt::Debug for Schema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("entity", &self.entity)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key().name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<E> {
    table: &'static str,
    primary_key: &'static str,
    fields: Vec<FieldDescriptor<E>>,
    constructor: Option<Constructor<E>>,
}

impl<E> SchemaBuilder<E> {
    /// Sets the zero-argument constructor used to allocate fresh instances.
    #[must_use]
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> anyhow::Result<E> + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(constructor));
        self
    }

    /// Use `E::default()` as the constructor.
    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        E: Default,
    {
        self.constructor(|| Ok(E::default()))
    }

    /// Appends a persistent field. Field order determines `INSERT` column order.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor<E>) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate and freeze the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] when the table or a name is empty, a
    /// field or column is declared twice, the primary key is not a field, or
    /// no constructor was set.
    pub fn build(self) -> Result<Schema<E>> {
        let entity = type_name::<E>();
        let invalid = |reason: String| Error::InvalidSchema { entity, reason };

        if self.table.is_empty() {
            return Err(invalid("empty table name".to_string()));
        }
        let Some(constructor) = self.constructor else {
            return Err(invalid("no constructor".to_string()));
        };

        let mut by_field = HashMap::with_capacity(self.fields.len());
        let mut by_column = HashMap::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() || field.column.is_empty() {
                return Err(invalid(format!("field {index} has an empty name or column")));
            }
            if by_field.insert(field.name, index).is_some() {
                return Err(invalid(format!("field `{}` declared twice", field.name)));
            }
            // columns must stay unique under the case-insensitive lookup
            if self.fields[..index].iter().any(|f| f.column.eq_ignore_ascii_case(field.column)) {
                return Err(invalid(format!("column `{}` mapped twice", field.column)));
            }
            by_column.insert(field.column, index);
        }

        let Some(&primary_key) = by_field.get(self.primary_key) else {
            return Err(invalid(format!("primary key `{}` is not a field", self.primary_key)));
        };

        Ok(Schema {
            entity,
            table: self.table,
            primary_key,
            fields: self.fields,
            by_field,
            by_column,
            constructor,
        })
    }
}
