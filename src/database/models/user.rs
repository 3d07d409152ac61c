use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::model::{Field, Model};
use crate::database::query_builder::SqlStatement;
use crate::database::value::{FieldKind, FieldValue};

/// An authenticated account. Password material never leaves the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub login: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl User {
    /// Look up a user by login and password. The stored hash is
    /// `sha1(salt || hex(sha1(password)))`, compared inside the database (pgcrypto).
    pub fn login_query(login: &str, password: &str) -> SqlStatement {
        SqlStatement::new(
            format!(
                "SELECT id, login, firstname, lastname FROM {} \
                 WHERE login = $1 \
                 AND hashed_password = encode(digest(salt || encode(digest($2, 'sha1'), 'hex'), 'sha1'), 'hex')",
                Self::TABLE
            ),
            vec![
                FieldValue::Text(Some(login.to_string())),
                FieldValue::Text(Some(password.to_string())),
            ],
        )
    }
}

impl Model for User {
    const TABLE: &'static str = "users";

    const FIELDS: &'static [Field] = &[
        Field::new("id", FieldKind::Integer),
        Field::new("login", FieldKind::Text),
        Field::new("firstname", FieldKind::Text),
        Field::new("lastname", FieldKind::Text),
    ];

    fn id(&self) -> Option<i32> {
        Some(self.id).filter(|id| *id > 0)
    }

    fn assign(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("id", FieldValue::Integer(Some(v))) => self.id = v,
            ("login", FieldValue::Text(Some(v))) => self.login = v,
            ("firstname", FieldValue::Text(v)) => self.firstname = v,
            ("lastname", FieldValue::Text(v)) => self.lastname = v,
            _ => {}
        }
    }

    fn persisted_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("login", FieldValue::Text(Some(self.login.clone()))),
            ("firstname", FieldValue::Text(self.firstname.clone())),
            ("lastname", FieldValue::Text(self.lastname.clone())),
        ]
    }
}
