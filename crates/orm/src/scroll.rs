//! # Keyset pagination
//!
//! A scroll page is the rows strictly after a cursor value of the ordering
//! column. One extra row is requested to learn whether another page exists
//! without a `COUNT`.
//!
//! The ordering column must be unique and monotonic in the scroll direction
//! for pages to neither skip nor repeat rows. This is not verified.

use serde::Serialize;

use crate::bind::bind_many;
use crate::criteria::{Criteria, Direction};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::schema::Schema;
use crate::{DataType, Row};

/// One page of a keyset scroll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollResult<E> {
    data: Vec<E>,
    has_more: bool,
    last_value: Option<DataType>,
    page_size: u32,
}

impl<E> ScrollResult<E> {
    /// Entities on this page, at most `page_size`.
    #[must_use]
    pub fn data(&self) -> &[E] {
        &self.data
    }

    /// Whether another page follows.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Ordering column value of the last entity, the cursor for the next
    /// page. `None` when the page is empty.
    #[must_use]
    pub const fn last_value(&self) -> Option<&DataType> {
        self.last_value.as_ref()
    }

    /// Requested page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of entities on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the page holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take ownership of the page's entities and cursor.
    #[must_use]
    pub fn into_parts(self) -> (Vec<E>, bool, Option<DataType>) {
        (self.data, self.has_more, self.last_value)
    }
}

/// Build a scroll page query:
///
/// ```text
/// SELECT * FROM <table> WHERE c_o <cmp> ? AND c_k = ? … ORDER BY c_o <dir> LIMIT <n+1>
/// ```
///
/// `cmp` is `>` ascending and `<` descending. The cursor is the first
/// parameter, followed by predicate values in `criteria` order.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `page_size` is zero, the cursor is
/// null or not numeric, or a field name is empty or unknown.
pub fn scroll<E>(
    schema: &Schema<E>, order_field: &str, cursor: DataType, direction: Direction,
    criteria: &Criteria, page_size: u32,
) -> Result<Query> {
    if page_size == 0 {
        return Err(Error::InvalidArgument("page size must be at least 1".to_string()));
    }
    if !cursor.is_numeric() {
        return Err(Error::InvalidArgument(format!(
            "scroll cursor must be numeric, found {}",
            cursor.type_name()
        )));
    }
    let order_column = schema.resolve(order_field)?.column();
    let predicates = criteria.resolve(schema)?;

    let mut clauses = Vec::with_capacity(predicates.len() + 1);
    let mut params = Vec::with_capacity(predicates.len() + 1);
    clauses.push(format!("{order_column} {} ?", direction.comparator()));
    params.push(cursor);
    for (column, value) in predicates {
        clauses.push(format!("{column} = ?"));
        params.push(value);
    }

    let sql = format!(
        "SELECT * FROM {} WHERE {} ORDER BY {order_column} {direction} LIMIT {}",
        schema.table(),
        clauses.join(" AND "),
        u64::from(page_size) + 1
    );

    tracing::debug!(
        table = schema.table(),
        sql = %sql,
        param_count = params.len(),
        "scroll generated SQL"
    );

    Ok(Query { sql, params })
}

/// Turn the (up to `page_size + 1`) rows of a scroll query into a page.
pub(crate) fn paginate<E>(
    schema: &Schema<E>, order_column: &str, mut rows: Vec<Row>, page_size: u32,
) -> Result<ScrollResult<E>> {
    let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
    let has_more = rows.len() > limit;
    rows.truncate(limit);

    let last_value = rows.last().and_then(|row| row.get(order_column)).cloned();
    let data = bind_many(schema, rows)?;

    Ok(ScrollResult {
        data,
        has_more,
        last_value,
        page_size,
    })
}
