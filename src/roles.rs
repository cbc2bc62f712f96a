//! Role lifecycle operations — register, promote, demote, delete, and the
//! admin request flow, each validating preconditions against the user store
//! and the approval queue.
//!
//! Methods return outcome enums rather than replies; the bot layer turns
//! outcomes into user-facing text. Only store failures surface as errors.

use std::sync::Arc;

use tracing::{error, info};

use crate::approvals::{ApprovalQueue, RequestOutcome};
use crate::error::StorageError;
use crate::store::{NewUser, User, UserStore};

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// The email or identity already has a record; nothing was created.
    AlreadyRegistered,
    Registered(User),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromoteOutcome {
    NotFound,
    Promoted(User),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DemoteOutcome {
    NotFoundOrNotAdmin,
    Demoted(User),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    NotFound,
    Deleted(User),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequestOutcome {
    NotRegistered,
    AlreadyAdmin,
    AlreadyPending,
    Submitted,
}

/// Coordinates role state across the user store and the approval queue.
pub struct RoleService {
    store: Arc<dyn UserStore>,
    queue: Arc<ApprovalQueue>,
}

impl RoleService {
    pub fn new(store: Arc<dyn UserStore>, queue: Arc<ApprovalQueue>) -> Self {
        Self { store, queue }
    }

    /// Authorization gate for admin-only operations. True only when the
    /// caller has a record with the admin flag set. Store failures are
    /// logged and treated as "not authorized".
    pub async fn is_admin(&self, telegram_id: i64) -> bool {
        match self.store.find_by_telegram_id(telegram_id).await {
            Ok(Some(user)) => user.is_admin,
            Ok(None) => false,
            Err(err) => {
                error!(telegram_id, error = %err, "Admin check failed, treating caller as unauthorized");
                false
            }
        }
    }

    /// Create a record for a completed onboarding dialogue. The email and
    /// identity must both be unused; a constraint violation from a racing
    /// registration is reported the same way as a failed probe.
    pub async fn register(&self, new_user: NewUser) -> Result<RegisterOutcome, StorageError> {
        let existing = self
            .store
            .find_by_email_or_telegram_id(&new_user.email, new_user.telegram_id)
            .await?;
        if existing.is_some() {
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        match self.store.create(new_user).await {
            Ok(user) => {
                info!(telegram_id = user.telegram_id, name = %user.full_name, "User registered");
                Ok(RegisterOutcome::Registered(user))
            }
            Err(StorageError::Constraint(_)) => Ok(RegisterOutcome::AlreadyRegistered),
            Err(err) => Err(err),
        }
    }

    /// Grant admin rights. Also drops any pending request from the target.
    /// Promoting an existing admin succeeds (the flag is already true).
    pub async fn promote(&self, target: i64) -> Result<PromoteOutcome, StorageError> {
        let Some(mut user) = self.store.find_by_telegram_id(target).await? else {
            return Ok(PromoteOutcome::NotFound);
        };

        user.is_admin = true;
        self.store.update(&user).await?;
        self.queue.remove(target).await;

        info!(telegram_id = target, name = %user.full_name, "User promoted to admin");
        Ok(PromoteOutcome::Promoted(user))
    }

    /// Revoke admin rights. Targets without a record or without the flag
    /// are reported together, without revealing which.
    pub async fn demote(&self, target: i64) -> Result<DemoteOutcome, StorageError> {
        let found = self.store.find_by_telegram_id(target).await?;
        let Some(mut user) = found.filter(|u| u.is_admin) else {
            return Ok(DemoteOutcome::NotFoundOrNotAdmin);
        };

        user.is_admin = false;
        self.store.update(&user).await?;

        info!(telegram_id = target, name = %user.full_name, "Admin demoted");
        Ok(DemoteOutcome::Demoted(user))
    }

    /// Remove a record permanently. No queue interaction and no
    /// notification to the deleted user.
    pub async fn delete_user(&self, target: i64) -> Result<DeleteOutcome, StorageError> {
        let Some(user) = self.store.find_by_telegram_id(target).await? else {
            return Ok(DeleteOutcome::NotFound);
        };

        self.store.delete(target).await?;

        info!(telegram_id = target, name = %user.full_name, "User deleted");
        Ok(DeleteOutcome::Deleted(user))
    }

    /// Queue the caller for admin approval. Only registered callers may
    /// request, and only on their own behalf.
    pub async fn request_admin(&self, caller: i64) -> Result<AdminRequestOutcome, StorageError> {
        let Some(user) = self.store.find_by_telegram_id(caller).await? else {
            return Ok(AdminRequestOutcome::NotRegistered);
        };

        Ok(match self.queue.request(user).await {
            RequestOutcome::AlreadyAdmin => AdminRequestOutcome::AlreadyAdmin,
            RequestOutcome::AlreadyPending => AdminRequestOutcome::AlreadyPending,
            RequestOutcome::Submitted => AdminRequestOutcome::Submitted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;
    use async_trait::async_trait;

    async fn service() -> RoleService {
        let store = LibSqlBackend::memory().await.unwrap();
        RoleService::new(Arc::new(store), ApprovalQueue::new())
    }

    fn new_user(telegram_id: i64) -> NewUser {
        NewUser {
            telegram_id,
            full_name: format!("User {telegram_id}"),
            email: format!("user{telegram_id}@example.com"),
            phone_number: "+12025550100".into(),
        }
    }

    #[tokio::test]
    async fn register_then_promote_then_demote() {
        let service = service().await;

        let outcome = service.register(new_user(1)).await.unwrap();
        let RegisterOutcome::Registered(user) = outcome else {
            panic!("expected registration");
        };
        assert!(!user.is_admin);
        assert!(!service.is_admin(1).await);

        let outcome = service.promote(1).await.unwrap();
        assert!(matches!(outcome, PromoteOutcome::Promoted(ref u) if u.is_admin));
        assert!(service.is_admin(1).await);

        let outcome = service.demote(1).await.unwrap();
        assert!(matches!(outcome, DemoteOutcome::Demoted(ref u) if !u.is_admin));
        assert!(!service.is_admin(1).await);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_identity_and_email() {
        let service = service().await;
        service.register(new_user(1)).await.unwrap();

        // Same identity, fresh email
        let mut dup = new_user(1);
        dup.email = "fresh@example.com".into();
        assert_eq!(
            service.register(dup).await.unwrap(),
            RegisterOutcome::AlreadyRegistered
        );

        // Fresh identity, same email
        let mut dup = new_user(2);
        dup.email = "user1@example.com".into();
        assert_eq!(
            service.register(dup).await.unwrap(),
            RegisterOutcome::AlreadyRegistered
        );
    }

    #[tokio::test]
    async fn promote_clears_pending_request() {
        let service = service().await;
        service.register(new_user(1)).await.unwrap();

        assert_eq!(
            service.request_admin(1).await.unwrap(),
            AdminRequestOutcome::Submitted
        );
        assert_eq!(service.queue.len().await, 1);

        service.promote(1).await.unwrap();
        assert!(service.queue.is_empty().await);
    }

    #[tokio::test]
    async fn request_admin_preconditions() {
        let service = service().await;

        assert_eq!(
            service.request_admin(9).await.unwrap(),
            AdminRequestOutcome::NotRegistered
        );

        service.register(new_user(1)).await.unwrap();
        assert_eq!(
            service.request_admin(1).await.unwrap(),
            AdminRequestOutcome::Submitted
        );
        assert_eq!(
            service.request_admin(1).await.unwrap(),
            AdminRequestOutcome::AlreadyPending
        );

        service.promote(1).await.unwrap();
        assert_eq!(
            service.request_admin(1).await.unwrap(),
            AdminRequestOutcome::AlreadyAdmin
        );
    }

    #[tokio::test]
    async fn missing_targets_are_reported() {
        let service = service().await;
        service.register(new_user(1)).await.unwrap();

        assert_eq!(service.promote(404).await.unwrap(), PromoteOutcome::NotFound);
        assert_eq!(
            service.demote(404).await.unwrap(),
            DemoteOutcome::NotFoundOrNotAdmin
        );
        assert_eq!(
            service.delete_user(404).await.unwrap(),
            DeleteOutcome::NotFound
        );

        // Registered but not admin
        assert_eq!(
            service.demote(1).await.unwrap(),
            DemoteOutcome::NotFoundOrNotAdmin
        );
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let service = service().await;
        service.register(new_user(1)).await.unwrap();

        let outcome = service.delete_user(1).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted(_)));
        assert_eq!(service.delete_user(1).await.unwrap(), DeleteOutcome::NotFound);
    }

    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn find_by_telegram_id(&self, _: i64) -> Result<Option<User>, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn find_by_email_or_telegram_id(
            &self,
            _: &str,
            _: i64,
        ) -> Result<Option<User>, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn create(&self, _: NewUser) -> Result<User, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn update(&self, _: &User) -> Result<(), StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn delete(&self, _: i64) -> Result<bool, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn count(&self) -> Result<u64, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn find_page(&self, _: u32, _: u64) -> Result<Vec<User>, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
        async fn find_admins(&self) -> Result<Vec<User>, StorageError> {
            Err(StorageError::Query("simulated outage".into()))
        }
    }

    #[tokio::test]
    async fn admin_check_fails_closed_on_store_error() {
        let service = RoleService::new(Arc::new(FailingStore), ApprovalQueue::new());
        assert!(!service.is_admin(1).await);
    }
}
