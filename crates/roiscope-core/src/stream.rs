//! Shared, self-healing frame channel connection.
//!
//! One [`StreamManager`] is constructed per process (or per browser tab) and
//! handed by cheap clone to every consumer. It owns the socket, the observer
//! list, the reconnect deadline and the single subscribed channel id.
//!
//! The manager is single-threaded and poll driven: the host calls
//! [`StreamManager::poll`] from its event loop, which drains transport events,
//! dispatches decoded messages and fires a due reconnect.
//!
//! Only one channel is subscribed per connection. Switching channels from one
//! consumer changes what every other consumer receives; handlers must filter
//! by `channel_id` themselves.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use serde::{Deserialize, Serialize};

use crate::protocol::{ChannelCommand, ChannelId, StreamMessage};
use crate::transport::{FrameTransport, PlatformTransport, TransportEvent};

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;
/// Default ceiling on consecutive reconnect attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Path of the frame channel endpoint on the service.
pub const CHANNEL_PATH: &str = "/ws/channel";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// WebSocket URL of the frame channel endpoint.
    pub url: String,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay_ms: u64,
    /// Reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: format!("ws://127.0.0.1:8080{}", CHANNEL_PATH),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl StreamConfig {
    /// Endpoint on `host` (`host[:port]`), `wss` when `secure`.
    pub fn for_host(host: &str, secure: bool) -> Self {
        let scheme = if secure { "wss" } else { "ws" };
        Self {
            url: format!("{}://{}{}", scheme, host, CHANNEL_PATH),
            ..Self::default()
        }
    }

    /// Endpoint on the host serving the current page.
    #[cfg(target_arch = "wasm32")]
    pub fn from_location() -> Option<Self> {
        let location = web_sys::window()?.location();
        let host = location.host().ok()?;
        let secure = location.protocol().ok()? == "https:";
        Some(Self::for_host(&host, secure))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// A handshake is in flight or a reconnect is scheduled.
    Connecting,
    Connected,
    /// The reconnect ceiling was reached; nothing more happens automatically.
    Stalled,
}

/// Registration token for a message handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Registration token for a one-shot open callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenCallbackId(u64);

type MessageHandler = Rc<dyn Fn(&StreamMessage)>;
type OpenCallback = Box<dyn FnOnce()>;

struct PendingReconnect {
    at: Instant,
    channel: Option<ChannelId>,
}

struct Inner {
    config: StreamConfig,
    transport: Box<dyn FrameTransport>,
    open: bool,
    connecting: bool,
    subscribed: Option<ChannelId>,
    pending: Option<ChannelId>,
    reconnect_attempts: u32,
    reconnect: Option<PendingReconnect>,
    handlers: Vec<(HandlerId, MessageHandler)>,
    open_callbacks: Vec<(OpenCallbackId, OpenCallback)>,
    next_token: u64,
}

impl Inner {
    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        if self.reconnect_attempts >= self.config.max_reconnect_attempts {
            log::error!(
                "Frame stream: reconnect ceiling reached ({} attempts)",
                self.config.max_reconnect_attempts
            );
            return;
        }
        if self.reconnect.is_some() {
            return;
        }

        self.reconnect_attempts += 1;
        log::info!(
            "Frame stream: reconnecting ({}/{}) in {} ms",
            self.reconnect_attempts,
            self.config.max_reconnect_attempts,
            self.config.reconnect_delay_ms
        );
        self.reconnect = Some(PendingReconnect {
            at: now + self.config.reconnect_delay(),
            channel: self.subscribed.or(self.pending),
        });
    }
}

/// Shared handle to the frame channel connection.
#[derive(Clone)]
pub struct StreamManager {
    inner: Rc<RefCell<Inner>>,
}

/// Non-owning handle, for callbacks stored inside the manager itself.
#[derive(Clone)]
pub struct WeakStreamManager {
    inner: Weak<RefCell<Inner>>,
}

impl WeakStreamManager {
    pub fn upgrade(&self) -> Option<StreamManager> {
        self.inner.upgrade().map(|inner| StreamManager { inner })
    }
}

impl StreamManager {
    /// Create a manager over the platform WebSocket transport.
    pub fn new(config: StreamConfig) -> Self {
        Self::with_transport(config, Box::new(PlatformTransport::default()))
    }

    /// Create a manager over any transport.
    pub fn with_transport(config: StreamConfig, transport: Box<dyn FrameTransport>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                transport,
                open: false,
                connecting: false,
                subscribed: None,
                pending: None,
                reconnect_attempts: 0,
                reconnect: None,
                handlers: Vec::new(),
                open_callbacks: Vec::new(),
                next_token: 0,
            })),
        }
    }

    pub fn downgrade(&self) -> WeakStreamManager {
        WeakStreamManager {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Open the connection, or switch the subscription on an open one.
    ///
    /// Idempotent: while a handshake is in flight only `channel` is recorded
    /// as pending, so back-to-back calls produce a single connection attempt.
    pub fn connect(&self, channel: Option<ChannelId>) {
        self.connect_at(channel, Instant::now());
    }

    fn connect_at(&self, channel: Option<ChannelId>, now: Instant) {
        let mut inner = self.inner.borrow_mut();

        if inner.open {
            drop(inner);
            if let Some(id) = channel {
                self.subscribe_channel(id);
            }
            return;
        }
        if let Some(id) = channel {
            inner.pending = Some(id);
        }
        if inner.connecting {
            return;
        }

        inner.connecting = true;
        let url = inner.config.url.clone();
        if let Err(e) = inner.transport.open(&url) {
            log::error!("Frame stream: failed to open {}: {}", url, e);
            inner.connecting = false;
            inner.schedule_reconnect(now);
        }
    }

    /// Send a subscribe directive. Returns whether it was sent.
    ///
    /// Not retried when the socket is closed; register an
    /// [`on_open`](Self::on_open) callback for that.
    pub fn subscribe_channel(&self, channel: ChannelId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.open {
            log::warn!("Frame stream: not connected, cannot subscribe to channel {}", channel);
            return false;
        }

        let payload = match (ChannelCommand::Subscribe { channel_id: channel }).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Frame stream: failed to encode subscribe: {}", e);
                return false;
            }
        };
        match inner.transport.send(&payload) {
            Ok(()) => {
                log::info!("Frame stream: subscribing to channel {}", channel);
                true
            }
            Err(e) => {
                log::error!("Frame stream: subscribe to channel {} failed: {}", channel, e);
                false
            }
        }
    }

    /// Register an observer for every decoded inbound message.
    ///
    /// Observers run synchronously in registration order.
    pub fn add_message_handler(&self, handler: impl Fn(&StreamMessage) + 'static) -> HandlerId {
        let mut inner = self.inner.borrow_mut();
        let id = HandlerId(inner.token());
        inner.handlers.push((id, Rc::new(handler)));
        id
    }

    pub fn remove_message_handler(&self, id: HandlerId) {
        self.inner.borrow_mut().handlers.retain(|(h, _)| *h != id);
    }

    /// Run `callback` once the connection is open.
    ///
    /// Runs immediately when already connected, otherwise on the next
    /// successful open, after which it is discarded.
    pub fn on_open(&self, callback: impl FnOnce() + 'static) -> OpenCallbackId {
        let mut inner = self.inner.borrow_mut();
        let id = OpenCallbackId(inner.token());
        if inner.open {
            drop(inner);
            callback();
        } else {
            inner.open_callbacks.push((id, Box::new(callback)));
        }
        id
    }

    pub fn remove_on_open_callback(&self, id: OpenCallbackId) {
        self.inner.borrow_mut().open_callbacks.retain(|(c, _)| *c != id);
    }

    /// Full teardown: close the socket, cancel any reconnect, drop all
    /// handlers and forget the subscription.
    pub fn disconnect(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.reconnect = None;
        inner.transport.close();
        // Anything still queued belongs to the socket we just closed
        let _ = inner.transport.poll_events();
        inner.open = false;
        inner.connecting = false;
        inner.handlers.clear();
        inner.reconnect_attempts = 0;
        inner.subscribed = None;
        inner.pending = None;
        log::info!("Frame stream: disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.inner.borrow().open
    }

    /// Channel last confirmed by the service.
    pub fn subscribed_channel_id(&self) -> Option<ChannelId> {
        self.inner.borrow().subscribed
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.borrow().reconnect_attempts
    }

    pub fn connection_state(&self) -> ConnectionState {
        let inner = self.inner.borrow();
        if inner.open {
            ConnectionState::Connected
        } else if inner.connecting || inner.reconnect.is_some() {
            ConnectionState::Connecting
        } else if inner.reconnect_attempts >= inner.config.max_reconnect_attempts {
            ConnectionState::Stalled
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Drain transport events and fire a due reconnect.
    pub fn poll(&self) {
        self.poll_at(Instant::now());
    }

    /// [`poll`](Self::poll) against an explicit clock.
    pub fn poll_at(&self, now: Instant) {
        let events = self.inner.borrow_mut().transport.poll_events();
        for event in events {
            self.handle_event(event, now);
        }

        let due = {
            let mut inner = self.inner.borrow_mut();
            if inner.reconnect.as_ref().is_some_and(|r| now >= r.at) {
                inner.reconnect.take().map(|r| r.channel)
            } else {
                None
            }
        };
        if let Some(channel) = due {
            self.connect_at(channel, now);
        }
    }

    fn handle_event(&self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Opened => self.handle_open(),
            TransportEvent::Text(text) => self.dispatch(&text),
            TransportEvent::Error(message) => {
                log::error!("Frame stream error: {}", message);
                self.inner.borrow_mut().connecting = false;
            }
            TransportEvent::Closed => {
                let mut inner = self.inner.borrow_mut();
                log::info!("Frame stream: connection closed");
                inner.open = false;
                inner.connecting = false;
                if let Some(channel) = inner.subscribed.take() {
                    inner.pending = Some(channel);
                }
                inner.schedule_reconnect(now);
            }
        }
    }

    fn handle_open(&self) {
        let (pending, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            log::info!("Frame stream: connected to {}", inner.config.url);
            inner.open = true;
            inner.connecting = false;
            inner.reconnect_attempts = 0;
            (inner.pending.take(), std::mem::take(&mut inner.open_callbacks))
        };

        if let Some(channel) = pending {
            self.subscribe_channel(channel);
        }
        for (_, callback) in callbacks {
            callback();
        }
    }

    fn dispatch(&self, text: &str) {
        let message = match StreamMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Frame stream: dropping malformed message: {}", e);
                return;
            }
        };

        let handlers: Vec<(HandlerId, MessageHandler)> = {
            let mut inner = self.inner.borrow_mut();
            if let StreamMessage::SubscriptionConfirmed { channel_id, .. } = message {
                log::info!("Frame stream: subscribed to channel {}", channel_id);
                inner.subscribed = Some(channel_id);
            }
            inner.handlers.clone()
        };

        for (id, handler) in handlers {
            // Skip observers removed by an earlier observer in this dispatch
            let registered = self.inner.borrow().handlers.iter().any(|(h, _)| *h == id);
            if registered {
                handler(&message);
            }
        }
    }
}
