use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use super::query_builder::{self, SqlStatement};
use super::value::{FieldKind, FieldValue};

/// Errors raised while building statements for a model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Cannot build statement for {0} without an id")]
    MissingId(&'static str),
    #[error("No updatable fields supplied for {0}")]
    NoUpdatableFields(&'static str),
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// A column a model exposes. The name is used verbatim in SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Maps one entity to its table. Implementors declare the field whitelist, how a typed
/// value lands on a struct field, and which columns an insert or update writes.
pub trait Model: Default + Serialize + for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;

    /// Every known attribute, in serialization order.
    const FIELDS: &'static [Field];

    fn id(&self) -> Option<i32>;

    /// Store `value` on the field called `name`. Unknown names and mismatched kinds are
    /// ignored.
    fn assign(&mut self, name: &str, value: FieldValue);

    /// Columns written by a full update.
    fn persisted_values(&self) -> Vec<(&'static str, FieldValue)>;

    /// Columns written by insert, with insert-time defaults applied.
    fn insert_values(&self) -> Vec<(&'static str, FieldValue)> {
        self.persisted_values()
    }

    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    fn from_map(input: &Map<String, Value>) -> Self {
        let mut model = Self::default();
        model.update_from_map(input);
        model
    }

    fn update_from_map(&mut self, input: &Map<String, Value>) {
        for (name, value) in accepted_values::<Self>(input) {
            self.assign(name, value);
        }
    }

    fn to_json(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::error!("Failed to serialize {} record", Self::TABLE);
                Map::new()
            }
        }
    }

    fn insert_query(&self) -> SqlStatement {
        query_builder::insert_returning(Self::TABLE, self.insert_values())
    }

    fn update_query(&self) -> Result<SqlStatement, ModelError> {
        let id = self.id().ok_or(ModelError::MissingId(Self::TABLE))?;
        Ok(query_builder::update_by_id(Self::TABLE, self.persisted_values(), id))
    }

    /// Update only the known, type-compatible keys of `updates`.
    fn update_fields_query(&self, updates: &Map<String, Value>) -> Result<SqlStatement, ModelError> {
        let id = self.id().ok_or(ModelError::MissingId(Self::TABLE))?;
        let values: Vec<_> = accepted_values::<Self>(updates)
            .into_iter()
            .filter(|(name, _)| *name != "id")
            .collect();
        if values.is_empty() {
            return Err(ModelError::NoUpdatableFields(Self::TABLE));
        }
        Ok(query_builder::update_by_id(Self::TABLE, values, id))
    }

    fn delete_query(&self) -> Result<SqlStatement, ModelError> {
        let id = self.id().ok_or(ModelError::MissingId(Self::TABLE))?;
        Ok(query_builder::delete_by_id(Self::TABLE, id))
    }

    /// Equality filter over known fields. Unknown names and values of the wrong kind are
    /// dropped; the first occurrence of a repeated name wins.
    fn filter<'a, I>(criteria: I) -> SqlStatement
    where
        I: IntoIterator<Item = (&'a str, FieldValue)>,
    {
        let mut known: Vec<(&'static str, FieldValue)> = Vec::new();
        for (name, value) in criteria {
            let Some(field) = Self::field(name) else { continue };
            if field.kind != value.kind() || known.iter().any(|(n, _)| *n == field.name) {
                continue;
            }
            known.push((field.name, value));
        }
        query_builder::select_where(Self::TABLE, known)
    }

    /// Equality filter from query-string pairs. Unknown names are ignored; values of known
    /// fields must parse as the field's kind.
    fn filter_params<'a, I>(params: I) -> Result<SqlStatement, ModelError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut criteria = Vec::new();
        for (name, text) in params {
            let Some(field) = Self::field(name) else { continue };
            let value = FieldValue::parse(field.kind, text).ok_or_else(|| ModelError::InvalidValue {
                field: name.to_string(),
                value: text.to_string(),
            })?;
            criteria.push((field.name, value));
        }
        Ok(Self::filter(criteria))
    }
}

fn accepted_values<M: Model>(input: &Map<String, Value>) -> Vec<(&'static str, FieldValue)> {
    input
        .iter()
        .filter_map(|(name, value)| {
            let field = M::field(name)?;
            FieldValue::from_json(field.kind, value).map(|v| (field.name, v))
        })
        .collect()
}
