pub mod manager;
pub mod model;
pub mod models;
pub mod query_builder;
pub mod transaction;
pub mod value;

pub use manager::{DatabaseError, DatabaseManager};
pub use model::{Field, Model, ModelError};
pub use query_builder::SqlStatement;
pub use transaction::transactional;
pub use value::{FieldKind, FieldValue};
