//! Channel abstraction — inbound events, outbound replies, and the trait
//! every transport implements.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// Stream of inbound events produced by a started channel.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// What the sender did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A plain text message. Commands like `/start` arrive as text.
    Text(String),
    /// A named button callback.
    Action(String),
}

/// An inbound message or button press, normalized across transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Name of the channel that produced the event.
    pub channel: String,
    /// Conversation to send the reply to.
    pub chat_id: String,
    /// Platform identity of the sender.
    pub user_id: i64,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn text(channel: &str, chat_id: &str, user_id: i64, text: &str) -> Self {
        Self {
            channel: channel.to_string(),
            chat_id: chat_id.to_string(),
            user_id,
            kind: EventKind::Text(text.to_string()),
        }
    }

    pub fn action(channel: &str, chat_id: &str, user_id: i64, name: &str) -> Self {
        Self {
            channel: channel.to_string(),
            chat_id: chat_id.to_string(),
            user_id,
            kind: EventKind::Action(name.to_string()),
        }
    }
}

/// Button layout attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons under the message: rows of (label, callback name).
    Inline(Vec<Vec<(String, String)>>),
    /// Persistent keyboard: rows of labels the client sends back as text.
    Reply(Vec<Vec<String>>),
}

/// An outbound reply, optionally carrying buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A message transport. Implementations own their own polling or REPL
/// loop and surface everything as `InboundEvent`s.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable channel name used for routing replies.
    fn name(&self) -> &str;

    /// Start listening and return the stream of inbound events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Send a reply back to the conversation an event came from.
    async fn respond(&self, event: &InboundEvent, reply: Reply) -> Result<(), ChannelError>;

    /// Send a direct message to an arbitrary identity on this channel,
    /// outside any inbound conversation.
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), ChannelError>;

    /// Release resources before exit.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_builder() {
        let reply = Reply::text("hello");
        assert_eq!(reply.text, "hello");
        assert!(reply.keyboard.is_none());

        let reply = Reply::text("pick one").with_keyboard(Keyboard::Inline(vec![vec![(
            "My Profile".into(),
            "my_profile".into(),
        )]]));
        assert!(matches!(reply.keyboard, Some(Keyboard::Inline(_))));
    }

    #[test]
    fn event_constructors() {
        let event = InboundEvent::text("telegram", "42", 42, "/start");
        assert_eq!(event.channel, "telegram");
        assert_eq!(event.kind, EventKind::Text("/start".into()));

        let event = InboundEvent::action("telegram", "42", 42, "page_2");
        assert_eq!(event.kind, EventKind::Action("page_2".into()));
    }
}
