//! CLI channel — stdin/stdout REPL for local testing.
//!
//! Lines are delivered as text events; `/action <name>` simulates
//! pressing an inline button. The local operator gets a fixed identity.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::channel::{Channel, EventStream, InboundEvent, Keyboard, Reply};
use crate::error::ChannelError;

/// Identity assigned to the local operator.
const CLI_USER_ID: i64 = 0;
const CLI_CHAT_ID: &str = "local";

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            // Print prompt
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let event = match line.strip_prefix("/action ") {
                            Some(name) => {
                                InboundEvent::action("cli", CLI_CHAT_ID, CLI_USER_ID, name.trim())
                            }
                            None => InboundEvent::text("cli", CLI_CHAT_ID, CLI_USER_ID, &line),
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(&self, _event: &InboundEvent, reply: Reply) -> Result<(), ChannelError> {
        println!("\n{}", reply.text);
        if let Some(keyboard) = &reply.keyboard {
            print_keyboard(keyboard);
        }
        println!();
        eprint!("> ");
        Ok(())
    }

    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        println!("\n[to {chat_id}] {text}\n");
        eprint!("> ");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Show buttons so the operator can see what to press. Inline buttons
/// list the `/action` incantation that simulates them.
fn print_keyboard(keyboard: &Keyboard) {
    match keyboard {
        Keyboard::Inline(rows) => {
            for row in rows {
                for (label, callback) in row {
                    println!("  [{label}] → /action {callback}");
                }
            }
        }
        Keyboard::Reply(rows) => {
            for row in rows {
                println!("  {}", row.join(" | "));
            }
        }
    }
}
