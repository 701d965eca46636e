//! IRC client connection.
//!
//! Connects, registers, joins the configured channels and feeds network
//! events into the [`OpBot`] on a single task, in arrival order. Outbound
//! lines go through a bounded queue to a writer task so that [`IrcHandle`]
//! can be cloned into background work freely.

use super::Transport;
use super::message::{self, IrcLine};
use super::stream::BotStream;
use super::tls::upgrade_to_tls;
use crate::config::IrcConfig;
use crate::error::TransportError;
use crate::hostmask::{HostMask, irc_eq};
use crate::services::opbot::OpBot;
use crate::telemetry::spans;
use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{Instrument, debug, error, info, warn};

/// Outbound queue depth.
const OUTBOUND_QUEUE_SIZE: usize = 256;

/// Longest line accepted from the server.
const MAX_LINE_LENGTH: usize = 8192;

const RPL_WELCOME: &str = "001";
const RPL_WHOISUSER: &str = "311";
const ERR_NOSUCHNICK: &str = "401";
const ERR_ERRONEUSNICKNAME: &str = "432";
const ERR_NICKNAMEINUSE: &str = "433";
const ERR_PASSWDMISMATCH: &str = "464";

/// Cloneable handle for sending to the server.
#[derive(Clone)]
pub struct IrcHandle {
    tx: mpsc::Sender<String>,
    nick: Arc<RwLock<String>>,
}

impl IrcHandle {
    /// Queue a raw line for sending.
    pub async fn send_line(&self, line: String) -> Result<(), TransportError> {
        self.tx.send(line).await.map_err(|_| TransportError::Closed)
    }

    fn set_nick(&self, nick: &str) {
        *self.nick.write() = nick.to_string();
    }
}

#[async_trait]
impl Transport for IrcHandle {
    fn own_nick(&self) -> String {
        self.nick.read().clone()
    }

    async fn lookup(&self, nick: &str) -> Result<(), TransportError> {
        self.send_line(format!("WHOIS {}", message::sanitize(nick)))
            .await
    }

    async fn set_privilege(
        &self,
        channel: &str,
        nick: &str,
        grant: bool,
    ) -> Result<(), TransportError> {
        self.send_line(message::op_mode(channel, nick, grant)).await
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), TransportError> {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.send_line(message::privmsg(target, line)).await?;
        }
        Ok(())
    }

    async fn notify(&self, target: &str, text: &str) -> Result<(), TransportError> {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.send_line(message::notice(target, line)).await?;
        }
        Ok(())
    }
}

/// An IRC client that has not connected yet.
pub struct IrcClient {
    config: IrcConfig,
    handle: IrcHandle,
    outbound_rx: mpsc::Receiver<String>,
}

impl IrcClient {
    pub fn new(config: IrcConfig) -> Self {
        let (tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let handle = IrcHandle {
            tx,
            nick: Arc::new(RwLock::new(config.nick.clone())),
        };
        Self {
            config,
            handle,
            outbound_rx,
        }
    }

    /// Handle for the bot to send through. Valid before and after `run`.
    pub fn handle(&self) -> IrcHandle {
        self.handle.clone()
    }

    /// Connect and process events until the connection ends.
    ///
    /// Always returns an error: the bot does not reconnect.
    pub async fn run(self, bot: Arc<OpBot>) -> Result<(), TransportError> {
        let span = spans::connection(&self.config.server, &self.config.nick);
        self.run_inner(bot).instrument(span).await
    }

    async fn run_inner(self, bot: Arc<OpBot>) -> Result<(), TransportError> {
        let Self {
            config,
            handle,
            mut outbound_rx,
        } = self;

        let tcp = TcpStream::connect(&config.server).await?;
        let stream = if config.tls {
            BotStream::Tls(Box::new(
                upgrade_to_tls(tcp, config.host(), config.verify_cert).await?,
            ))
        } else {
            BotStream::Plain(tcp)
        };
        info!(server = %config.server, tls = stream.is_tls(), "Connected");

        let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let (mut sink, mut lines) = framed.split();

        let writer = tokio::spawn(async move {
            while let Some(line) = outbound_rx.recv().await {
                debug!(line = %line, "-> server");
                if let Err(e) = sink.send(line).await {
                    error!(error = %e, "Failed to write to server");
                    break;
                }
            }
        });

        let mut session = Session {
            config: &config,
            handle: &handle,
            bot: &bot,
            registered: false,
        };
        let result = session.pump(&mut lines).await;

        writer.abort();
        if let Err(e) = &result {
            error!(error = %e, code = e.error_code(), "Connection ended");
        }
        result
    }
}

/// Per-connection event routing.
struct Session<'a> {
    config: &'a IrcConfig,
    handle: &'a IrcHandle,
    bot: &'a Arc<OpBot>,
    registered: bool,
}

impl Session<'_> {
    async fn pump<S>(&mut self, lines: &mut S) -> Result<(), TransportError>
    where
        S: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    {
        self.register().await?;
        while let Some(line) = lines.next().await {
            let line = line?;
            match line.parse::<IrcLine>() {
                Ok(msg) => self.route(msg).await?,
                Err(e) => debug!(error = %e, "Ignoring unparsable line"),
            }
        }
        Err(TransportError::Closed)
    }

    async fn register(&mut self) -> Result<(), TransportError> {
        if let Some(password) = &self.config.password {
            self.handle
                .send_line(format!("PASS {}", message::sanitize(password)))
                .await?;
        }
        self.handle
            .send_line(format!("NICK {}", message::sanitize(&self.config.nick)))
            .await?;
        self.handle
            .send_line(format!(
                "USER {} 0 * :{}",
                message::sanitize(&self.config.user),
                message::sanitize(&self.config.realname)
            ))
            .await
    }

    async fn route(&mut self, msg: IrcLine) -> Result<(), TransportError> {
        match msg.command.as_str() {
            "PING" => {
                let token = msg.param(0).unwrap_or_default();
                self.handle
                    .send_line(format!("PONG :{}", message::sanitize(token)))
                    .await?;
            }
            "ERROR" => {
                let reason = msg.param(0).unwrap_or("closing link").to_string();
                warn!(reason = %reason, "Server closed the link");
                return Err(TransportError::Closed);
            }
            RPL_WELCOME => {
                self.registered = true;
                if let Some(nick) = msg.param(0) {
                    self.handle.set_nick(nick);
                }
                info!(nick = %self.handle.own_nick(), "Registered");
                for (channel, key) in self.config.channel_joins() {
                    self.handle
                        .send_line(message::join(&channel, key.as_deref()))
                        .await?;
                }
            }
            ERR_NICKNAMEINUSE if !self.registered => {
                let next = format!("{}_", self.handle.own_nick());
                warn!(nick = %next, "Nick in use, retrying");
                self.handle.set_nick(&next);
                self.handle
                    .send_line(format!("NICK {}", message::sanitize(&next)))
                    .await?;
            }
            ERR_ERRONEUSNICKNAME | ERR_PASSWDMISMATCH if !self.registered => {
                let reason = msg.params.last().cloned().unwrap_or_default();
                return Err(TransportError::Registration(format!(
                    "{} {}",
                    msg.command, reason
                )));
            }
            "NICK" => {
                if let (Some(old), Some(new)) = (msg.source_nick(), msg.param(0))
                    && irc_eq(old, &self.handle.own_nick())
                {
                    self.handle.set_nick(new);
                }
            }
            "JOIN" => {
                let (Some(mask), Some(channel)) = (msg.source_mask(), msg.param(0)) else {
                    return Ok(());
                };
                self.bot.on_join(channel, &mask.nick, &mask.to_string()).await;
            }
            "PRIVMSG" => {
                let (Some(mask), Some(target), Some(text)) =
                    (msg.source_mask(), msg.param(0), msg.param(1))
                else {
                    return Ok(());
                };
                self.bot.on_privmsg(&mask, target, text).await;
            }
            RPL_WHOISUSER => {
                // :server 311 <me> <nick> <user> <host> * :<realname>
                if let (Some(nick), Some(user), Some(host)) =
                    (msg.param(1), msg.param(2), msg.param(3))
                {
                    self.bot.on_whois_user(HostMask::new(nick, user, host));
                }
            }
            ERR_NOSUCHNICK => {
                if let Some(nick) = msg.param(1) {
                    self.bot.on_no_such_nick(nick);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
