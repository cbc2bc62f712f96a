//! Registrar — chat-based registration and role management.

pub mod approvals;
pub mod bot;
pub mod channels;
pub mod config;
pub mod dialog;
pub mod error;
pub mod listing;
pub mod roles;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
