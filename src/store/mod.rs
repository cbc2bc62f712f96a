//! Persistence layer — user records behind the `UserStore` trait.

pub mod libsql_backend;
pub mod migrations;
pub mod model;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use model::{NewUser, User};
pub use traits::UserStore;
