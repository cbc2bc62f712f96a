//! ChannelManager — owns the channels, merges their inbound streams, and
//! routes outbound traffic by channel name.

use futures::stream::select_all;
use tracing::info;

use crate::channels::channel::{Channel, EventStream, InboundEvent, Reply};
use crate::error::ChannelError;

#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Start every channel and merge their event streams into one.
    pub async fn start_all(&self) -> Result<EventStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            info!(channel = channel.name(), "Starting channel");
            streams.push(channel.start().await?);
        }
        Ok(Box::pin(select_all(streams)))
    }

    /// Route a reply back to the channel an event arrived on.
    pub async fn respond(&self, event: &InboundEvent, reply: Reply) -> Result<(), ChannelError> {
        self.find(&event.channel)?.respond(event, reply).await
    }

    /// Send a direct message to an identity via a named channel.
    pub async fn notify(
        &self,
        channel: &str,
        chat_id: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.find(channel)?.notify(chat_id, text).await
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            channel.shutdown().await?;
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Result<&dyn Channel, ChannelError> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
            .ok_or_else(|| ChannelError::UnknownChannel(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct RecordingChannel {
        name: &'static str,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<EventStream, ChannelError> {
            Ok(Box::pin(futures::stream::empty()))
        }

        async fn respond(&self, _event: &InboundEvent, reply: Reply) -> Result<(), ChannelError> {
            self.sent.lock().await.push(reply.text);
            Ok(())
        }

        async fn notify(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
            self.sent.lock().await.push(format!("{chat_id}: {text}"));
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn recording(name: &'static str) -> (Box<RecordingChannel>, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let channel = Box::new(RecordingChannel {
            name,
            sent: Arc::clone(&sent),
        });
        (channel, sent)
    }

    #[tokio::test]
    async fn respond_routes_by_event_channel() {
        let (first, first_sent) = recording("first");
        let (second, second_sent) = recording("second");

        let mut manager = ChannelManager::new();
        manager.add(first);
        manager.add(second);

        let event = InboundEvent::text("second", "7", 7, "hi");
        manager.respond(&event, Reply::text("hello")).await.unwrap();

        assert!(first_sent.lock().await.is_empty());
        assert_eq!(*second_sent.lock().await, vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn notify_routes_by_name() {
        let (channel, sent) = recording("only");
        let mut manager = ChannelManager::new();
        manager.add(channel);

        manager.notify("only", "42", "you were promoted").await.unwrap();
        assert_eq!(*sent.lock().await, vec!["42: you were promoted".to_string()]);
    }

    #[tokio::test]
    async fn unknown_channel_is_an_error() {
        let manager = ChannelManager::new();
        let event = InboundEvent::text("ghost", "1", 1, "hi");

        let err = manager.respond(&event, Reply::text("x")).await.unwrap_err();
        assert!(matches!(err, ChannelError::UnknownChannel(name) if name == "ghost"));
    }
}
