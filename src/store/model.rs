//! User record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
///
/// `telegram_id` is the platform-assigned identity and the primary
/// correlation key across sessions, records, and the approval queue.
/// It and `email` are unique across all records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields collected during onboarding, ready to be persisted.
///
/// The backend stamps `created_at` and starts every record with
/// `is_admin = false`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub telegram_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}
