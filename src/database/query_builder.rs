use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, Postgres};

use super::value::{bind_value_query, bind_value_query_as, FieldValue};

/// SQL text plus its positional parameters (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub query: String,
    pub params: Vec<FieldValue>,
}

impl SqlStatement {
    pub fn new(query: impl Into<String>, params: Vec<FieldValue>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }

    /// Build a query with every parameter bound, for statements without typed rows.
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.query), |q, v| bind_value_query(q, v))
    }

    /// Build a typed query with every parameter bound.
    pub fn query_as<T>(&self) -> QueryAs<'_, Postgres, T, PgArguments>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        self.params
            .iter()
            .fold(sqlx::query_as::<_, T>(&self.query), |q, v| {
                bind_value_query_as(q, v)
            })
    }
}

/// `SELECT * FROM table [WHERE c1 = $1 AND c2 = $2 ...]`
pub fn select_where(table: &str, criteria: Vec<(&'static str, FieldValue)>) -> SqlStatement {
    if criteria.is_empty() {
        return SqlStatement::new(format!("SELECT * FROM {}", table), vec![]);
    }

    let (columns, params): (Vec<_>, Vec<_>) = criteria.into_iter().unzip();
    let predicate = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");

    SqlStatement::new(format!("SELECT * FROM {} WHERE {}", table, predicate), params)
}

/// `INSERT INTO table (c1, ...) VALUES ($1, ...) RETURNING *`
pub fn insert_returning(table: &str, values: Vec<(&'static str, FieldValue)>) -> SqlStatement {
    let (columns, params): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let placeholders = (1..=columns.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");

    SqlStatement::new(
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table,
            columns.join(", "),
            placeholders
        ),
        params,
    )
}

/// `UPDATE table SET c1 = $1, ... WHERE id = $n` with the id bound last.
pub fn update_by_id(table: &str, values: Vec<(&'static str, FieldValue)>, id: i32) -> SqlStatement {
    let (columns, mut params): (Vec<_>, Vec<_>) = values.into_iter().unzip();
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    params.push(FieldValue::Integer(Some(id)));

    SqlStatement::new(
        format!(
            "UPDATE {} SET {} WHERE id = ${}",
            table,
            assignments,
            params.len()
        ),
        params,
    )
}

pub fn delete_by_id(table: &str, id: i32) -> SqlStatement {
    SqlStatement::new(
        format!("DELETE FROM {} WHERE id = $1", table),
        vec![FieldValue::Integer(Some(id))],
    )
}
