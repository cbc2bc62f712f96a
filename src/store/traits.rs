//! `UserStore` trait — single async interface for user persistence.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::store::model::{NewUser, User};

/// Backend-agnostic user repository.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by their platform identity.
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, StorageError>;

    /// Look up a user matching either email or platform identity.
    ///
    /// Registration uses this as its uniqueness probe: a hit on either
    /// field means the registration must be rejected.
    async fn find_by_email_or_telegram_id(
        &self,
        email: &str,
        telegram_id: i64,
    ) -> Result<Option<User>, StorageError>;

    /// Create a new user record. Starts with `is_admin = false`.
    async fn create(&self, new_user: NewUser) -> Result<User, StorageError>;

    /// Persist changes to an existing record (currently only `is_admin`
    /// ever changes after creation).
    async fn update(&self, user: &User) -> Result<(), StorageError>;

    /// Permanently remove a record. Returns false if no record existed.
    async fn delete(&self, telegram_id: i64) -> Result<bool, StorageError>;

    /// Total number of registered users.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Fetch a window of users in registration order.
    async fn find_page(&self, limit: u32, offset: u64) -> Result<Vec<User>, StorageError>;

    /// All users with the admin flag set, in registration order.
    async fn find_admins(&self) -> Result<Vec<User>, StorageError>;
}
