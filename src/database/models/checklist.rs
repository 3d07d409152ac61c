use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::model::{Field, Model};
use crate::database::value::{serialize_timestamp, FieldKind, FieldValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Checklist {
    pub id: Option<i32>,
    pub is_done: Option<bool>,
    pub subject: Option<String>,
    pub position: Option<i32>,
    pub issue_id: Option<i32>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
    pub is_section: Option<bool>,
}

impl Model for Checklist {
    const TABLE: &'static str = "checklists";

    const FIELDS: &'static [Field] = &[
        Field::new("id", FieldKind::Integer),
        Field::new("is_done", FieldKind::Boolean),
        Field::new("subject", FieldKind::Text),
        Field::new("position", FieldKind::Integer),
        Field::new("issue_id", FieldKind::Integer),
        Field::new("created_at", FieldKind::Timestamp),
        Field::new("updated_at", FieldKind::Timestamp),
        Field::new("is_section", FieldKind::Boolean),
    ];

    fn id(&self) -> Option<i32> {
        self.id
    }

    fn assign(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("id", FieldValue::Integer(v)) => self.id = v,
            ("is_done", FieldValue::Boolean(v)) => self.is_done = v,
            ("subject", FieldValue::Text(v)) => self.subject = v,
            ("position", FieldValue::Integer(v)) => self.position = v,
            ("issue_id", FieldValue::Integer(v)) => self.issue_id = v,
            ("created_at", FieldValue::Timestamp(v)) => self.created_at = v,
            ("updated_at", FieldValue::Timestamp(v)) => self.updated_at = v,
            ("is_section", FieldValue::Boolean(v)) => self.is_section = v,
            _ => {}
        }
    }

    fn persisted_values(&self) -> Vec<(&'static str, FieldValue)> {
        let now = Utc::now().naive_utc();
        vec![
            ("is_done", FieldValue::Boolean(Some(self.is_done.unwrap_or(false)))),
            ("subject", FieldValue::Text(self.subject.clone())),
            ("position", FieldValue::Integer(self.position)),
            ("issue_id", FieldValue::Integer(self.issue_id)),
            ("created_at", FieldValue::Timestamp(Some(self.created_at.unwrap_or(now)))),
            ("updated_at", FieldValue::Timestamp(Some(self.updated_at.unwrap_or(now)))),
            ("is_section", FieldValue::Boolean(Some(self.is_section.unwrap_or(false)))),
        ]
    }
}
