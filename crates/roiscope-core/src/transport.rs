//! WebSocket transports for the frame channel.
//!
//! A transport owns one socket at a time and reports what happened to it as
//! [`TransportEvent`]s, which the stream manager drains with `poll_events()`.

use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Already connected")]
    AlreadyOpen,
    #[error("Not connected")]
    NotOpen,
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Connection failed: {0}")]
    Connect(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Something that happened on the socket since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket finished its handshake.
    Opened,
    /// One inbound text payload.
    Text(String),
    /// The socket is gone (after a drop, a failed handshake, or a close).
    Closed,
    /// A transport-level error. Always followed by `Closed` when fatal.
    Error(String),
}

/// Leading characters of a payload for debug logs. Never splits a character.
#[cfg(not(target_arch = "wasm32"))]
fn log_preview(text: &str) -> &str {
    const PREVIEW_CHARS: usize = 100;
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// A bidirectional text transport.
pub trait FrameTransport {
    /// Start opening a socket to `url`. Completion is reported as `Opened`.
    fn open(&mut self, url: &str) -> TransportResult<()>;

    /// Send a text payload over the open socket.
    fn send(&mut self, text: &str) -> TransportResult<()>;

    /// Close the socket. No further events are produced for it.
    fn close(&mut self);

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Whether the socket is currently open.
    fn is_open(&self) -> bool;
}

// ============================================================================
// WASM WebSocket Transport
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod wasm_transport {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

    /// WebSocket transport for WASM.
    ///
    /// Browser callbacks push into a shared queue drained by `poll_events()`.
    pub struct WasmTransport {
        ws: Option<WebSocket>,
        open: Rc<RefCell<bool>>,
        events: Rc<RefCell<Vec<TransportEvent>>>,
        // Keep closures alive for as long as the socket
        _on_open: Option<Closure<dyn Fn()>>,
        _on_message: Option<Closure<dyn Fn(MessageEvent)>>,
        _on_close: Option<Closure<dyn Fn(CloseEvent)>>,
        _on_error: Option<Closure<dyn Fn(ErrorEvent)>>,
    }

    impl WasmTransport {
        pub fn new() -> Self {
            Self {
                ws: None,
                open: Rc::new(RefCell::new(false)),
                events: Rc::new(RefCell::new(Vec::new())),
                _on_open: None,
                _on_message: None,
                _on_close: None,
                _on_error: None,
            }
        }

        fn drop_socket(&mut self) {
            if let Some(ws) = self.ws.take() {
                ws.set_onopen(None);
                ws.set_onmessage(None);
                ws.set_onclose(None);
                ws.set_onerror(None);
                let _ = ws.close();
            }
            *self.open.borrow_mut() = false;
            self._on_open = None;
            self._on_message = None;
            self._on_close = None;
            self._on_error = None;
        }
    }

    impl FrameTransport for WasmTransport {
        fn open(&mut self, url: &str) -> TransportResult<()> {
            if self.ws.is_some() {
                return Err(TransportError::AlreadyOpen);
            }

            let ws = WebSocket::new(url)
                .map_err(|e| TransportError::Connect(format!("{:?}", e)))?;
            ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

            let events_open = self.events.clone();
            let open_flag = self.open.clone();
            let on_open = Closure::wrap(Box::new(move || {
                *open_flag.borrow_mut() = true;
                events_open.borrow_mut().push(TransportEvent::Opened);
            }) as Box<dyn Fn()>);
            ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

            let events_msg = self.events.clone();
            let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
                if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
                    events_msg.borrow_mut().push(TransportEvent::Text(txt.into()));
                }
            }) as Box<dyn Fn(MessageEvent)>);
            ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

            let events_close = self.events.clone();
            let close_flag = self.open.clone();
            let on_close = Closure::wrap(Box::new(move |_e: CloseEvent| {
                *close_flag.borrow_mut() = false;
                events_close.borrow_mut().push(TransportEvent::Closed);
            }) as Box<dyn Fn(CloseEvent)>);
            ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

            let events_err = self.events.clone();
            let on_error = Closure::wrap(Box::new(move |_e: ErrorEvent| {
                events_err
                    .borrow_mut()
                    .push(TransportEvent::Error("WebSocket error".to_string()));
            }) as Box<dyn Fn(ErrorEvent)>);
            ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

            self.ws = Some(ws);
            self._on_open = Some(on_open);
            self._on_message = Some(on_message);
            self._on_close = Some(on_close);
            self._on_error = Some(on_error);
            Ok(())
        }

        fn send(&mut self, text: &str) -> TransportResult<()> {
            match self.ws {
                Some(ref ws) if *self.open.borrow() => ws
                    .send_with_str(text)
                    .map_err(|e| TransportError::Send(format!("{:?}", e))),
                _ => Err(TransportError::NotOpen),
            }
        }

        fn close(&mut self) {
            self.drop_socket();
            self.events.borrow_mut().clear();
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let events = std::mem::take(&mut *self.events.borrow_mut());
            if events.contains(&TransportEvent::Closed) {
                // The browser already closed it; forget the handle so a new open can proceed
                self.ws = None;
                self._on_open = None;
                self._on_message = None;
                self._on_close = None;
                self._on_error = None;
            }
            events
        }

        fn is_open(&self) -> bool {
            *self.open.borrow()
        }
    }

    impl Default for WasmTransport {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_transport::WasmTransport;

// ============================================================================
// Native WebSocket Transport
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod native_transport {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread;
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the socket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket transport for native platforms.
    ///
    /// A background thread owns the blocking socket.
    pub struct NativeTransport {
        open: bool,
        cmd_tx: Option<Sender<WsCommand>>,
        event_rx: Option<Receiver<TransportEvent>>,
    }

    impl NativeTransport {
        pub fn new() -> Self {
            Self {
                open: false,
                cmd_tx: None,
                event_rx: None,
            }
        }
    }

    fn run_socket(url: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<TransportEvent>) {
        log::info!("Frame socket: connecting to {}", url);

        let (mut socket, response) = match connect(&url) {
            Ok(ok) => ok,
            Err(e) => {
                log::error!("Frame socket connection failed: {}", e);
                let _ = event_tx.send(TransportEvent::Error(format!("Connection failed: {}", e)));
                let _ = event_tx.send(TransportEvent::Closed);
                return;
            }
        };

        log::info!("Frame socket connected, status: {}", response.status());
        if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        let _ = event_tx.send(TransportEvent::Opened);

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    log::debug!("Frame socket sending: {}", super::log_preview(&msg));
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("Frame socket send error: {}", e);
                        let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                Ok(WsCommand::Close) => {
                    let _ = socket.close(None);
                    return;
                }
                Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    return;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => {
                    if event_tx.send(TransportEvent::Text(txt)).is_err() {
                        return;
                    }
                }
                Ok(Message::Ping(data)) => {
                    let _ = socket.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => {
                    log::info!("Frame socket received close frame");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("Frame socket read error: {}", e);
                    let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                    break;
                }
            }
        }

        let _ = event_tx.send(TransportEvent::Closed);
    }

    impl FrameTransport for NativeTransport {
        fn open(&mut self, url: &str) -> TransportResult<()> {
            if self.cmd_tx.is_some() {
                return Err(TransportError::AlreadyOpen);
            }

            let parsed =
                Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    parsed.scheme()
                )));
            }

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<TransportEvent>();
            let url = url.to_string();
            thread::spawn(move || run_socket(url, cmd_rx, event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            Ok(())
        }

        fn send(&mut self, text: &str) -> TransportResult<()> {
            match self.cmd_tx {
                Some(ref tx) if self.open => tx
                    .send(WsCommand::Send(text.to_string()))
                    .map_err(|e| TransportError::Send(e.to_string())),
                _ => Err(TransportError::NotOpen),
            }
        }

        fn close(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self.open = false;
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let mut events = Vec::new();
            let mut closed = false;
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match event {
                        TransportEvent::Opened => self.open = true,
                        TransportEvent::Closed => {
                            self.open = false;
                            closed = true;
                        }
                        _ => {}
                    }
                    events.push(event);
                }
            }
            if closed {
                // Thread has exited; allow the next open
                self.cmd_tx = None;
                self.event_rx = None;
            }
            events
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    impl Default for NativeTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeTransport {
        fn drop(&mut self) {
            self.close();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_transport::NativeTransport;

// ============================================================================
// Platform type alias
// ============================================================================

/// Platform-specific transport type.
#[cfg(target_arch = "wasm32")]
pub type PlatformTransport = WasmTransport;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformTransport = NativeTransport;

// ============================================================================
// Scripted transport for tests
// ============================================================================
