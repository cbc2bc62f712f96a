//! Conversational state: dialogue steps and the per-identity session store.

pub mod sessions;
pub mod state;

pub use sessions::SessionStore;
pub use state::{AdminAction, DialogState};
