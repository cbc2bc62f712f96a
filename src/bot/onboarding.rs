//! Registration dialogue — /start and the step-by-step onboarding flow.

use crate::bot::dispatcher::{Bot, Response, or_error};
use crate::bot::render;
use crate::channels::{InboundEvent, Reply};
use crate::dialog::{AdminAction, DialogState};
use crate::error::Error;
use crate::roles::RegisterOutcome;
use crate::store::NewUser;
use crate::validation::{is_valid_email, is_valid_phone};

impl Bot {
    /// `/start`: begin onboarding for unknown identities, and show the
    /// panel to admins.
    pub(crate) async fn on_start(&self, event: &InboundEvent) -> Result<Response, Error> {
        let caller = self.store.find_by_telegram_id(event.user_id).await?;
        let is_admin = caller.as_ref().is_some_and(|user| user.is_admin);

        let mut response = match caller {
            Some(_) => Response::text("You are already registered."),
            None => {
                self.sessions
                    .set(event.user_id, DialogState::AskFullName)
                    .await;
                Response::text("Welcome! Please enter your full name:")
            }
        };

        if is_admin {
            response = response
                .then_reply(Reply::text("Admin Panel:").with_keyboard(render::admin_keyboard()));
        }

        Ok(response)
    }

    /// Free text that matched no command or panel button: either the
    /// target id for a pending admin action, or an onboarding answer.
    pub(crate) async fn on_session_text(&self, event: &InboundEvent, text: &str) -> Response {
        let session = self.sessions.get(event.user_id).await;

        if let DialogState::AwaitTarget(action) = session {
            // The pending action is consumed by this message, whatever
            // the dispatch outcome.
            self.sessions.clear(event.user_id).await;
            let message = match action {
                AdminAction::Promote => "An error occurred while promoting the user.",
                AdminAction::Delete => "An error occurred while deleting the user.",
                AdminAction::Unpromote => "An error occurred while unpromoting the admin.",
            };
            return or_error(self.on_admin_target(action, text), message).await;
        }

        or_error(
            self.advance_onboarding(event, session, text),
            "An error occurred while processing your message.",
        )
        .await
    }

    /// Drive the onboarding machine one step.
    ///
    /// The name is taken as-is; email and phone re-prompt on invalid
    /// input without losing what was already collected. A storage
    /// failure at the final step leaves the session at `AskPhone`, so
    /// resending the phone number retries the registration.
    async fn advance_onboarding(
        &self,
        event: &InboundEvent,
        session: DialogState,
        text: &str,
    ) -> Result<Response, Error> {
        match session {
            DialogState::AskFullName => {
                self.sessions
                    .set(
                        event.user_id,
                        DialogState::AskEmail {
                            full_name: text.to_string(),
                        },
                    )
                    .await;
                Ok(Response::text("Now enter your email:"))
            }
            DialogState::AskEmail { full_name } => {
                if !is_valid_email(text) {
                    return Ok(Response::text("Please enter a valid email."));
                }
                self.sessions
                    .set(
                        event.user_id,
                        DialogState::AskPhone {
                            full_name,
                            email: text.to_string(),
                        },
                    )
                    .await;
                Ok(Response::text("Now enter your phone number:"))
            }
            DialogState::AskPhone { full_name, email } => {
                if !is_valid_phone(text) {
                    return Ok(Response::text("Please enter a valid phone number."));
                }
                let outcome = self
                    .roles
                    .register(NewUser {
                        telegram_id: event.user_id,
                        full_name,
                        email,
                        phone_number: text.to_string(),
                    })
                    .await?;
                self.sessions.clear(event.user_id).await;

                match outcome {
                    RegisterOutcome::AlreadyRegistered => Ok(Response::text(
                        "This email or Telegram ID is already registered.",
                    )),
                    RegisterOutcome::Registered(_) => {
                        Ok(Response::text("Registration complete!").then_reply(
                            Reply::text("You are now registered! Choose an option below:")
                                .with_keyboard(render::user_keyboard()),
                        ))
                    }
                }
            }
            // Idle text belongs to no dialogue; AwaitTarget is consumed
            // by the caller before this point.
            DialogState::Idle | DialogState::AwaitTarget(_) => Ok(Response::none()),
        }
    }
}
