//! Bot layer — event routing, the registration dialogue, and the admin
//! panel, with all reply rendering in one place.

pub mod admin;
pub mod dispatcher;
pub mod onboarding;
pub mod render;

pub use dispatcher::{Bot, Notice, Response};
