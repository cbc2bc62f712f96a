//! Admin panel operations — listings, role-action prompts, target
//! dispatch, profiles, and admin requests.

use crate::bot::dispatcher::{Bot, Response};
use crate::bot::render;
use crate::channels::{InboundEvent, Reply};
use crate::dialog::{AdminAction, DialogState};
use crate::error::Error;
use crate::listing::page_window;
use crate::roles::{AdminRequestOutcome, DeleteOutcome, DemoteOutcome, PromoteOutcome};

impl Bot {
    // ── Listings ────────────────────────────────────────────────────

    /// One page of registered users with previous/next controls.
    /// Out-of-range pages clamp to the nearest valid page.
    pub(crate) async fn on_list_users(
        &self,
        event: &InboundEvent,
        page: u32,
    ) -> Result<Response, Error> {
        if !self.roles.is_admin(event.user_id).await {
            return Ok(Response::text("Unauthorized."));
        }

        let total = self.store.count().await?;
        let window = page_window(page, self.config.page_size, total);
        let users = self
            .store
            .find_page(self.config.page_size, window.offset)
            .await?;

        if users.is_empty() {
            return Ok(Response::text("No users found."));
        }

        let mut reply = Reply::text(render::user_list(&users));
        if let Some(keyboard) = render::page_buttons(&window) {
            reply = reply.with_keyboard(keyboard);
        }
        Ok(Response::reply(reply))
    }

    pub(crate) async fn on_list_admins(&self, event: &InboundEvent) -> Result<Response, Error> {
        if !self.roles.is_admin(event.user_id).await {
            return Ok(Response::text("Unauthorized."));
        }

        let admins = self.store.find_admins().await?;
        if admins.is_empty() {
            return Ok(Response::text("There are no admins."));
        }
        Ok(Response::text(render::admin_list(&admins)))
    }

    pub(crate) async fn on_pending_approvals(
        &self,
        event: &InboundEvent,
    ) -> Result<Response, Error> {
        if !self.roles.is_admin(event.user_id).await {
            return Ok(Response::text("Unauthorized."));
        }

        let pending = self.queue.pending().await;
        if pending.is_empty() {
            return Ok(Response::text("No pending approvals."));
        }
        Ok(Response::text(render::pending_list(&pending)))
    }

    // ── Role-action prompts ─────────────────────────────────────────

    pub(crate) async fn on_promote_prompt(&self, event: &InboundEvent) -> Result<Response, Error> {
        self.prompt_for_target(
            event,
            AdminAction::Promote,
            "Send the Telegram ID of the user to promote:",
        )
        .await
    }

    pub(crate) async fn on_delete_prompt(&self, event: &InboundEvent) -> Result<Response, Error> {
        self.prompt_for_target(
            event,
            AdminAction::Delete,
            "Send the Telegram ID of the user to delete:",
        )
        .await
    }

    pub(crate) async fn on_unpromote_prompt(
        &self,
        event: &InboundEvent,
    ) -> Result<Response, Error> {
        self.prompt_for_target(
            event,
            AdminAction::Unpromote,
            "Send the Telegram ID of the admin to unpromote:",
        )
        .await
    }

    async fn prompt_for_target(
        &self,
        event: &InboundEvent,
        action: AdminAction,
        prompt: &str,
    ) -> Result<Response, Error> {
        if !self.roles.is_admin(event.user_id).await {
            return Ok(Response::text("Unauthorized."));
        }
        self.sessions
            .set(event.user_id, DialogState::AwaitTarget(action))
            .await;
        Ok(Response::text(prompt))
    }

    // ── Target dispatch ─────────────────────────────────────────────

    /// The text sent after a role-action prompt. A target that does not
    /// parse as a Telegram id matches no record, so it reports the same
    /// way as an unknown id.
    pub(crate) async fn on_admin_target(
        &self,
        action: AdminAction,
        text: &str,
    ) -> Result<Response, Error> {
        let Ok(target) = text.trim().parse::<i64>() else {
            return Ok(Response::text(match action {
                AdminAction::Unpromote => "User not found or not an admin.",
                AdminAction::Promote | AdminAction::Delete => "User not found.",
            }));
        };

        match action {
            AdminAction::Promote => match self.roles.promote(target).await? {
                PromoteOutcome::NotFound => Ok(Response::text("User not found.")),
                PromoteOutcome::Promoted(user) => Ok(Response::text(format!(
                    "{} is now an admin.",
                    user.full_name
                ))
                .with_notice(
                    target.to_string(),
                    "Congratulations! You have been promoted to an admin. You now have access to the admin panel.",
                )),
            },
            AdminAction::Delete => match self.roles.delete_user(target).await? {
                DeleteOutcome::NotFound => Ok(Response::text("User not found.")),
                DeleteOutcome::Deleted(user) => Ok(Response::text(format!(
                    "{} has been deleted.",
                    user.full_name
                ))),
            },
            AdminAction::Unpromote => match self.roles.demote(target).await? {
                DemoteOutcome::NotFoundOrNotAdmin => {
                    Ok(Response::text("User not found or not an admin."))
                }
                DemoteOutcome::Demoted(user) => Ok(Response::text(format!(
                    "{} is no longer an admin.",
                    user.full_name
                ))),
            },
        }
    }

    // ── Profile & admin requests ────────────────────────────────────

    /// Panel button: plain-text profile. Not admin-gated.
    pub(crate) async fn on_profile_button(&self, event: &InboundEvent) -> Result<Response, Error> {
        let Some(user) = self.store.find_by_telegram_id(event.user_id).await? else {
            return Ok(Response::text("You are not registered."));
        };
        Ok(Response::text(render::profile(&user)))
    }

    /// Inline callback: Markdown profile.
    pub(crate) async fn on_profile_callback(
        &self,
        event: &InboundEvent,
    ) -> Result<Response, Error> {
        let Some(user) = self.store.find_by_telegram_id(event.user_id).await? else {
            return Ok(Response::text("You are not registered. Use /start to sign up."));
        };
        Ok(Response::text(render::profile_markdown(&user)))
    }

    pub(crate) async fn on_request_admin(&self, event: &InboundEvent) -> Result<Response, Error> {
        match self.roles.request_admin(event.user_id).await? {
            AdminRequestOutcome::NotRegistered => Ok(Response::text(
                "You are not registered. Please register first.",
            )),
            AdminRequestOutcome::AlreadyAdmin => Ok(Response::text("You are already an admin.")),
            AdminRequestOutcome::AlreadyPending => Ok(Response::text(
                "Your request to become an admin is already pending.",
            )),
            AdminRequestOutcome::Submitted => Ok(Response::text(
                "Your request to become an admin has been submitted and is awaiting approval.",
            )),
        }
    }
}
