//! Approval queue — in-memory queue of members waiting for admin rights.
//!
//! The queue is ephemeral: entries live only as long as the process.
//! A restart drops pending requests and the member simply asks again.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::store::User;

/// Result of submitting an admin request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Queued for review.
    Submitted,
    /// The requester already holds admin rights.
    AlreadyAdmin,
    /// An earlier request from the same member is still waiting.
    AlreadyPending,
}

/// In-memory queue of admin requests, oldest first.
pub struct ApprovalQueue {
    pending: RwLock<VecDeque<User>>,
}

impl ApprovalQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: RwLock::new(VecDeque::new()),
        })
    }

    /// Submit an admin request. The duplicate check and the append
    /// happen under one write guard so two rapid taps cannot enqueue
    /// the same member twice.
    pub async fn request(&self, user: User) -> RequestOutcome {
        if user.is_admin {
            debug!(telegram_id = user.telegram_id, "Admin re-requested admin rights");
            return RequestOutcome::AlreadyAdmin;
        }

        let mut pending = self.pending.write().await;
        if pending.iter().any(|u| u.telegram_id == user.telegram_id) {
            debug!(telegram_id = user.telegram_id, "Duplicate admin request ignored");
            return RequestOutcome::AlreadyPending;
        }

        info!(
            telegram_id = user.telegram_id,
            name = %user.full_name,
            "Admin request queued"
        );
        pending.push_back(user);
        RequestOutcome::Submitted
    }

    /// Snapshot of waiting requests in submission order.
    pub async fn pending(&self) -> Vec<User> {
        self.pending.read().await.iter().cloned().collect()
    }

    /// Drop a member's request, if one is queued. Idempotent: called at
    /// promotion, and a no-op when the identity is absent.
    pub async fn remove(&self, telegram_id: i64) -> bool {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|u| u.telegram_id != telegram_id);
        let removed = pending.len() < before;

        if removed {
            debug!(telegram_id, "Admin request removed from queue");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.pending.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.read().await.is_empty()
    }
}
