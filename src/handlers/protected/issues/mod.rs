pub mod create;
pub mod list;
pub mod position;

pub use create::post as create_issue;
pub use list::get as list_issues;
pub use position::PositionAllocator;
