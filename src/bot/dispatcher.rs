//! Bot coordinator — owns the collaborators and the main event loop.
//!
//! Routing lives here; the handlers themselves are split across
//! `onboarding` (registration dialogue) and `admin` (panel operations).

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::approvals::ApprovalQueue;
use crate::bot::render::{actions, buttons};
use crate::channels::{ChannelManager, EventKind, InboundEvent, Reply};
use crate::config::Config;
use crate::dialog::SessionStore;
use crate::error::Error;
use crate::roles::RoleService;
use crate::store::UserStore;

/// A direct message to an identity other than the event's sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub chat_id: String,
    pub text: String,
}

/// Everything a handler wants sent: replies to the caller, plus
/// notifications to third parties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub replies: Vec<Reply>,
    pub notices: Vec<Notice>,
}

impl Response {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::reply(Reply::text(text))
    }

    pub fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            notices: Vec::new(),
        }
    }

    pub fn then_text(mut self, text: impl Into<String>) -> Self {
        self.replies.push(Reply::text(text));
        self
    }

    pub fn then_reply(mut self, reply: Reply) -> Self {
        self.replies.push(reply);
        self
    }

    pub fn with_notice(mut self, chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.notices.push(Notice {
            chat_id: chat_id.into(),
            text: text.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty() && self.notices.is_empty()
    }
}

/// The registration bot. Consumes the merged channel stream and routes
/// each event to a handler.
pub struct Bot {
    pub(crate) config: Config,
    pub(crate) store: Arc<dyn UserStore>,
    pub(crate) sessions: SessionStore,
    pub(crate) queue: Arc<ApprovalQueue>,
    pub(crate) roles: RoleService,
    pub(crate) channels: Arc<ChannelManager>,
}

impl Bot {
    pub fn new(config: Config, store: Arc<dyn UserStore>, channels: ChannelManager) -> Self {
        let queue = ApprovalQueue::new();
        let roles = RoleService::new(Arc::clone(&store), Arc::clone(&queue));

        Self {
            config,
            store,
            sessions: SessionStore::new(),
            queue,
            roles,
            channels: Arc::new(channels),
        }
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until Ctrl+C or until every channel stream ends.
    pub async fn run(self) -> Result<(), Error> {
        let mut events = self.channels.start_all().await?;

        info!("Registrar ready and listening");

        loop {
            let event = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(event) => event,
                        None => {
                            info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let response = self.handle_event(&event).await;
            self.dispatch(&event, response).await;
        }

        info!("Registrar shutting down...");
        self.channels.shutdown_all().await?;

        Ok(())
    }

    // ── Event routing ───────────────────────────────────────────────

    /// Route one inbound event to its handler and collect the output.
    pub async fn handle_event(&self, event: &InboundEvent) -> Response {
        match &event.kind {
            EventKind::Text(text) => self.handle_text(event, text).await,
            EventKind::Action(name) => self.handle_action(event, name).await,
        }
    }

    /// Button labels are matched before session state, so a panel press
    /// always means the panel action even mid-dialogue.
    async fn handle_text(&self, event: &InboundEvent, text: &str) -> Response {
        if is_start_command(text) {
            return or_error(
                self.on_start(event),
                "An error occurred while starting the bot. Please try again.",
            )
            .await;
        }

        match text {
            buttons::LIST_USERS => {
                or_error(
                    self.on_list_users(event, 1),
                    "An error occurred while fetching the user list.",
                )
                .await
            }
            buttons::LIST_ADMINS => {
                or_error(
                    self.on_list_admins(event),
                    "An error occurred while fetching the admin list.",
                )
                .await
            }
            buttons::DELETE_USER => {
                or_error(
                    self.on_delete_prompt(event),
                    "An error occurred while initiating the delete action.",
                )
                .await
            }
            buttons::PROMOTE_USER => {
                or_error(
                    self.on_promote_prompt(event),
                    "An error occurred while initiating the promote action.",
                )
                .await
            }
            buttons::UNPROMOTE_ADMIN => {
                or_error(
                    self.on_unpromote_prompt(event),
                    "An error occurred while initiating the unpromote action.",
                )
                .await
            }
            buttons::APPROVE_PENDING => {
                or_error(
                    self.on_pending_approvals(event),
                    "An error occurred while approving pending admins.",
                )
                .await
            }
            buttons::MY_PROFILE => {
                or_error(
                    self.on_profile_button(event),
                    "An error occurred while fetching your profile.",
                )
                .await
            }
            _ => self.on_session_text(event, text).await,
        }
    }

    async fn handle_action(&self, event: &InboundEvent, name: &str) -> Response {
        if name == actions::MY_PROFILE {
            return or_error(
                self.on_profile_callback(event),
                "An error occurred while fetching your profile.",
            )
            .await;
        }
        if name == actions::REQUEST_ADMIN {
            return or_error(
                self.on_request_admin(event),
                "An error occurred while submitting your admin request.",
            )
            .await;
        }
        if let Some(page) = parse_page_action(name) {
            return or_error(
                self.on_list_users(event, page),
                "An error occurred while fetching the user list.",
            )
            .await;
        }

        debug!(action = name, "Ignoring unknown action");
        Response::none()
    }

    // ── Outbound ────────────────────────────────────────────────────

    /// Send a handler's output. Failed replies are logged and dropped;
    /// notices are best-effort (the state change already happened).
    async fn dispatch(&self, event: &InboundEvent, response: Response) {
        for reply in response.replies {
            if let Err(err) = self.channels.respond(event, reply).await {
                error!(channel = %event.channel, error = %err, "Failed to send reply");
            }
        }
        for notice in response.notices {
            if let Err(err) = self
                .channels
                .notify(&event.channel, &notice.chat_id, &notice.text)
                .await
            {
                warn!(
                    channel = %event.channel,
                    chat_id = %notice.chat_id,
                    error = %err,
                    "Failed to deliver notification"
                );
            }
        }
    }
}

/// Wrap a handler so a collaborator failure becomes the generic reply the
/// caller sees, with the detail kept in the operator log.
pub(crate) async fn or_error<F>(handler: F, message: &str) -> Response
where
    F: Future<Output = Result<Response, Error>>,
{
    match handler.await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "Handler failed");
            Response::text(message)
        }
    }
}

/// Matches "/start" and "/start@BotName", with or without arguments.
fn is_start_command(text: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or("");
    first == "/start" || first.starts_with("/start@")
}

fn parse_page_action(name: &str) -> Option<u32> {
    name.strip_prefix(actions::PAGE_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command_forms() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@RegistrarBot"));
        assert!(is_start_command("/start deep-link-payload"));
        assert!(is_start_command("  /start"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("start"));
        assert!(!is_start_command("hello /start"));
    }

    #[test]
    fn page_actions_parse() {
        assert_eq!(parse_page_action("page_2"), Some(2));
        assert_eq!(parse_page_action("page_10"), Some(10));
        assert_eq!(parse_page_action("page_"), None);
        assert_eq!(parse_page_action("page_two"), None);
        assert_eq!(parse_page_action("my_profile"), None);
    }

    #[test]
    fn response_accumulates_replies_and_notices() {
        let response = Response::text("first")
            .then_text("second")
            .with_notice("42", "you were promoted");

        assert_eq!(response.replies.len(), 2);
        assert_eq!(response.replies[0].text, "first");
        assert_eq!(response.replies[1].text, "second");
        assert_eq!(
            response.notices,
            vec![Notice {
                chat_id: "42".to_string(),
                text: "you were promoted".to_string(),
            }]
        );
        assert!(!response.is_empty());
        assert!(Response::none().is_empty());
    }
}
