pub mod checklist;
pub mod issue;
pub mod user;

pub use checklist::Checklist;
pub use issue::Issue;
pub use user::User;
