//! # Repository
//!
//! The user facing operations for one entity type. A [`Repository`] pairs the
//! entity's registered [`Schema`] with a [`SqlHandle`] and glues the SQL
//! builders and the row binder together. It carries no other state, so it is
//! cheap to clone and share between tasks.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use keyset_sql::SqlHandle;

use crate::bind::{bind, bind_many};
use crate::criteria::{Criteria, Direction};
use crate::error::{Error, Result};
use crate::executor::{Executor, TokioExecutor};
use crate::query::Query;
use crate::registry::Registry;
use crate::schema::Schema;
use crate::scroll::{ScrollResult, paginate};
use crate::{DataType, Row, insert, scroll, select, update};

/// CRUD and pagination for entity type `E`.
pub struct Repository<E> {
    schema: Arc<Schema<E>>,
    handle: Arc<dyn SqlHandle>,
    executor: Arc<dyn Executor>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            handle: Arc::clone(&self.handle),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &self.schema.entity())
            .field("table", &self.schema.table())
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl<E: 'static> Repository<E> {
    /// Create a repository using the process-wide registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`] if no registry is installed or `E` is
    /// not registered in it.
    pub fn new(handle: Arc<dyn SqlHandle>) -> Result<Self> {
        let registry = Registry::global().ok_or(Error::NotRegistered(type_name::<E>()))?;
        Self::from_registry(registry, handle)
    }

    /// Create a repository using the given registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`] if `E` is not registered.
    pub fn from_registry(registry: &Registry, handle: Arc<dyn SqlHandle>) -> Result<Self> {
        Ok(Self::from_schema(registry.describe::<E>()?, handle))
    }

    /// Create a repository from a schema directly.
    #[must_use]
    pub fn from_schema(schema: Arc<Schema<E>>, handle: Arc<dyn SqlHandle>) -> Self {
        Self {
            schema,
            handle,
            executor: Arc::new(TokioExecutor::default()),
        }
    }

    /// Use `executor` for [`Self::async_save`] and [`Self::async_update`].
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// The entity's schema.
    #[must_use]
    pub fn schema(&self) -> &Schema<E> {
        &self.schema
    }

    /// Insert a new row from every field of `entity`, primary key included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessorFailure`] if a getter fails and
    /// [`Error::SqlFailure`] if the statement fails.
    pub async fn save(&self, entity: &E) -> Result<u64> {
        let query = insert::insert(&self.schema, entity)?;
        self.execute(query).await
    }

    /// Update the row identified by the entity's primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPrimaryKey`] if the key is null,
    /// [`Error::AccessorFailure`] if a getter fails and
    /// [`Error::SqlFailure`] if the statement fails.
    pub async fn update(&self, entity: &E) -> Result<u64> {
        let query = update::update(&self.schema, entity)?;
        self.execute(query).await
    }

    /// Submit [`Self::save`] to the executor and return immediately.
    ///
    /// The repository owns `entity` until the write completes. Failures are
    /// only logged. Two submitted writes may run in either order.
    pub fn async_save(&self, entity: E)
    where
        E: Send,
    {
        self.submit("save", entity, insert::insert);
    }

    /// Submit [`Self::update`] to the executor and return immediately.
    ///
    /// The repository owns `entity` until the write completes. Failures are
    /// only logged. Two submitted writes may run in either order.
    pub fn async_update(&self, entity: E)
    where
        E: Send,
    {
        self.submit("update", entity, update::update);
    }

    /// Look up an entity by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for no row, [`Error::PrimaryKeyAmbiguous`]
    /// for more than one, [`Error::BindFailure`] if the row cannot be bound
    /// and [`Error::SqlFailure`] if the query fails.
    pub async fn find_by_id(&self, id: impl Into<DataType>) -> Result<E> {
        let query = select::find_by_id(&self.schema, id.into());
        let mut rows = self.fetch(query).await?;

        match rows.len() {
            0 => Err(Error::NotFound {
                table: self.schema.table(),
            }),
            1 => bind(&self.schema, rows.remove(0)),
            count => Err(Error::PrimaryKeyAmbiguous {
                table: self.schema.table(),
                rows: count,
            }),
        }
    }

    /// Run a caller supplied query with `LIMIT 1` appended and bind the row.
    ///
    /// `sql` is passed through untouched and must include its `FROM` clause.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for no row, [`Error::BindFailure`] if the
    /// row cannot be bound and [`Error::SqlFailure`] if the query fails.
    pub async fn find_first(&self, sql: &str, params: Vec<DataType>) -> Result<E> {
        let query = select::find_first(sql, params);
        let row = self.fetch(query).await?.into_iter().next().ok_or(Error::NotFound {
            table: self.schema.table(),
        })?;
        bind(&self.schema, row)
    }

    /// Fetch up to `size` entities matching every predicate, ordered by `order_field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a zero size or an empty or
    /// unknown field, [`Error::BindFailure`] if a row cannot be bound and
    /// [`Error::SqlFailure`] if the query fails.
    pub async fn find_by_map(
        &self, criteria: &Criteria, order_field: &str, direction: Direction, size: u32,
    ) -> Result<Vec<E>> {
        let query = select::find_by_map(&self.schema, criteria, order_field, direction, size)?;
        let rows = self.fetch(query).await?;
        bind_many(&self.schema, rows)
    }

    /// Fetch the page of entities strictly after `cursor` in `order_field`.
    ///
    /// `order_field` must be unique and monotonic in `direction`; pass the
    /// returned [`ScrollResult::last_value`] as the next cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a zero page size, a non-numeric
    /// cursor or an empty or unknown field, [`Error::BindFailure`] if a row
    /// cannot be bound and [`Error::SqlFailure`] if the query fails.
    pub async fn scroll(
        &self, order_field: &str, cursor: impl Into<DataType>, direction: Direction,
        criteria: &Criteria, page_size: u32,
    ) -> Result<ScrollResult<E>> {
        let query =
            scroll::scroll(&self.schema, order_field, cursor.into(), direction, criteria, page_size)?;
        let order_column = self.schema.resolve(order_field)?.column();
        let rows = self.fetch(query).await?;
        paginate(&self.schema, order_column, rows, page_size)
    }

    async fn execute(&self, query: Query) -> Result<u64> {
        self.handle.update(query.sql, query.params).await.map_err(Error::SqlFailure)
    }

    async fn fetch(&self, query: Query) -> Result<Vec<Row>> {
        self.handle.query_for_list(query.sql, query.params).await.map_err(Error::SqlFailure)
    }

    fn submit(&self, operation: &'static str, entity: E, build: fn(&Schema<E>, &E) -> Result<Query>)
    where
        E: Send,
    {
        let repository = self.clone();

        self.executor.execute(Box::pin(async move {
            let built = build(&repository.schema, &entity);
            let result = match built {
                Ok(query) => repository.execute(query).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(affected) => tracing::debug!(
                    table = repository.schema.table(),
                    operation,
                    affected,
                    "async write completed"
                ),
                Err(err) => tracing::error!(
                    table = repository.schema.table(),
                    operation,
                    error = ?err,
                    "async write failed"
                ),
            }
        }));
    }
}
