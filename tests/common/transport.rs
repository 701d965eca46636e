//! Recording transport.

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_opbot::config::OpBotConfig;
use slirc_opbot::error::TransportError;
use slirc_opbot::network::Transport;
use slirc_opbot::registry::RegistryStore;
use slirc_opbot::services::OpBot;
use std::sync::Arc;
use std::time::Duration;

/// Side effect requested by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Lookup(String),
    Mode {
        channel: String,
        nick: String,
        grant: bool,
    },
    Send {
        target: String,
        text: String,
    },
    Notice {
        target: String,
        text: String,
    },
}

/// Transport that records every call instead of talking to a network.
pub struct MockTransport {
    nick: String,
    events: Mutex<Vec<Event>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(nick: &str) -> Arc<Self> {
        Arc::new(Self {
            nick: nick.to_string(),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Texts sent to `target`, oldest first.
    pub fn sent_to(&self, target: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Send { target: t, text } if t == target => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Last text sent to `target`.
    pub fn last_sent(&self, target: &str) -> Option<String> {
        self.sent_to(target).pop()
    }

    /// Poll until an event matching `predicate` is recorded.
    pub async fn wait_for<F>(&self, predicate: F) -> Event
    where
        F: Fn(&Event) -> bool,
    {
        for _ in 0..200 {
            if let Some(event) = self.events().into_iter().find(|e| predicate(e)) {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("event not seen; recorded: {:#?}", self.events());
    }

    /// Poll until a message containing `needle` is sent to `target`.
    pub async fn wait_for_text(&self, target: &str, needle: &str) -> String {
        let event = self
            .wait_for(|e| {
                matches!(e, Event::Send { target: t, text } if t == target && text.contains(needle))
            })
            .await;
        match event {
            Event::Send { text, .. } => text,
            other => unreachable!("unexpected event {other:?}"),
        }
    }

    pub async fn wait_for_lookup(&self, nick: &str) {
        self.wait_for(|e| matches!(e, Event::Lookup(n) if n == nick))
            .await;
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn own_nick(&self) -> String {
        self.nick.clone()
    }

    async fn lookup(&self, nick: &str) -> Result<(), TransportError> {
        self.events.lock().push(Event::Lookup(nick.to_string()));
        Ok(())
    }

    async fn set_privilege(
        &self,
        channel: &str,
        nick: &str,
        grant: bool,
    ) -> Result<(), TransportError> {
        self.events.lock().push(Event::Mode {
            channel: channel.to_string(),
            nick: nick.to_string(),
            grant,
        });
        Ok(())
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.events.lock().push(Event::Send {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn notify(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.events.lock().push(Event::Notice {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Build a bot over `transport` with a short WHOIS timeout.
#[allow(dead_code)]
pub fn bot_with(
    transport: Arc<MockTransport>,
    store: RegistryStore,
    whois_timeout_ms: u64,
) -> Arc<OpBot> {
    let config = OpBotConfig {
        opfile: store.path().to_path_buf(),
        whois_timeout_ms,
        ..OpBotConfig::default()
    };
    Arc::new(OpBot::new(store, transport, &config))
}
