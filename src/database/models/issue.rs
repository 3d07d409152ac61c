use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::model::{Field, Model};
use crate::database::value::{serialize_timestamp, FieldKind, FieldValue};

/// An issue row. Tree bounds (`lft`, `rgt`) and `lock_version` are assigned at insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Issue {
    pub id: Option<i32>,
    pub tracker_id: Option<i32>,
    pub project_id: Option<i32>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub status_id: Option<i32>,
    pub assigned_to_id: Option<i32>,
    pub priority_id: Option<i32>,
    pub author_id: Option<i32>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_on: Option<NaiveDateTime>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_on: Option<NaiveDateTime>,
    pub root_id: Option<i32>,
    pub lock_version: Option<i32>,
    pub lft: Option<i32>,
    pub rgt: Option<i32>,
}

impl Model for Issue {
    const TABLE: &'static str = "issues";

    const FIELDS: &'static [Field] = &[
        Field::new("id", FieldKind::Integer),
        Field::new("tracker_id", FieldKind::Integer),
        Field::new("project_id", FieldKind::Integer),
        Field::new("subject", FieldKind::Text),
        Field::new("description", FieldKind::Text),
        Field::new("category_id", FieldKind::Integer),
        Field::new("status_id", FieldKind::Integer),
        Field::new("assigned_to_id", FieldKind::Integer),
        Field::new("priority_id", FieldKind::Integer),
        Field::new("author_id", FieldKind::Integer),
        Field::new("created_on", FieldKind::Timestamp),
        Field::new("updated_on", FieldKind::Timestamp),
        Field::new("root_id", FieldKind::Integer),
        Field::new("lock_version", FieldKind::Integer),
        Field::new("lft", FieldKind::Integer),
        Field::new("rgt", FieldKind::Integer),
    ];

    fn id(&self) -> Option<i32> {
        self.id
    }

    fn assign(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("id", FieldValue::Integer(v)) => self.id = v,
            ("tracker_id", FieldValue::Integer(v)) => self.tracker_id = v,
            ("project_id", FieldValue::Integer(v)) => self.project_id = v,
            ("subject", FieldValue::Text(v)) => self.subject = v,
            ("description", FieldValue::Text(v)) => self.description = v,
            ("category_id", FieldValue::Integer(v)) => self.category_id = v,
            ("status_id", FieldValue::Integer(v)) => self.status_id = v,
            ("assigned_to_id", FieldValue::Integer(v)) => self.assigned_to_id = v,
            ("priority_id", FieldValue::Integer(v)) => self.priority_id = v,
            ("author_id", FieldValue::Integer(v)) => self.author_id = v,
            ("created_on", FieldValue::Timestamp(v)) => self.created_on = v,
            ("updated_on", FieldValue::Timestamp(v)) => self.updated_on = v,
            ("root_id", FieldValue::Integer(v)) => self.root_id = v,
            ("lock_version", FieldValue::Integer(v)) => self.lock_version = v,
            ("lft", FieldValue::Integer(v)) => self.lft = v,
            ("rgt", FieldValue::Integer(v)) => self.rgt = v,
            _ => {}
        }
    }

    fn persisted_values(&self) -> Vec<(&'static str, FieldValue)> {
        self.column_values(
            self.lock_version.unwrap_or(1),
            self.lft.unwrap_or(1),
            self.rgt.unwrap_or(2),
        )
    }

    fn insert_values(&self) -> Vec<(&'static str, FieldValue)> {
        self.column_values(1, 1, 2)
    }
}

impl Issue {
    fn column_values(&self, lock_version: i32, lft: i32, rgt: i32) -> Vec<(&'static str, FieldValue)> {
        let now = Utc::now().naive_utc();
        vec![
            ("tracker_id", FieldValue::Integer(self.tracker_id)),
            ("project_id", FieldValue::Integer(self.project_id)),
            ("subject", FieldValue::Text(self.subject.clone())),
            ("description", FieldValue::Text(self.description.clone())),
            ("category_id", FieldValue::Integer(self.category_id)),
            ("status_id", FieldValue::Integer(self.status_id)),
            ("assigned_to_id", FieldValue::Integer(self.assigned_to_id)),
            ("priority_id", FieldValue::Integer(self.priority_id)),
            ("author_id", FieldValue::Integer(self.author_id)),
            ("created_on", FieldValue::Timestamp(Some(self.created_on.unwrap_or(now)))),
            ("updated_on", FieldValue::Timestamp(Some(self.updated_on.unwrap_or(now)))),
            ("lock_version", FieldValue::Integer(Some(lock_version))),
            ("lft", FieldValue::Integer(Some(lft))),
            ("rgt", FieldValue::Integer(Some(rgt))),
            ("root_id", FieldValue::Integer(self.root_id.or(self.id))),
        ]
    }
}
