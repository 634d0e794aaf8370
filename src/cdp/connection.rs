//! CDP WebSocket connection implementation
//!
//! One connection per page target. Writes go through a locked sink while a
//! reader task owns the stream half and routes frames: responses to the
//! pending command with the same ID, events to every subscriber.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpEvent, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingCommands = Arc<Mutex<HashMap<u64, PendingCommand>>>;
type EventSubscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<CdpEvent>>>>;

/// CDP timeout configuration
#[derive(Debug, Clone)]
pub struct CdpTimeoutConfig {
    /// Default timeout for most commands
    pub default_timeout: Duration,
    /// Timeout for screenshot commands
    pub screenshot_timeout: Duration,
    /// Timeout for page navigation commands
    pub navigation_timeout: Duration,
    /// Timeout for JavaScript execution
    pub execution_timeout: Duration,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            screenshot_timeout: Duration::from_secs(90),
            navigation_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpTimeoutConfig {
    /// Get timeout duration for a specific command method
    pub fn timeout_for(&self, method: &str) -> Duration {
        match method {
            "Page.captureScreenshot" => self.screenshot_timeout,
            "Page.navigate" | "Page.reload" => self.navigation_timeout,
            "Runtime.evaluate" | "Runtime.callFunctionOn" => self.execution_timeout,
            _ => self.default_timeout,
        }
    }
}

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    /// Response channel sender
    sender: oneshot::Sender<CdpResponse>,
    /// Command method (for logging)
    method: String,
}

/// CDP WebSocket connection implementation
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the WebSocket
    sink: Mutex<SplitSink<WsStream, Message>>,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending_commands: PendingCommands,
    /// Event subscribers
    event_subscribers: EventSubscribers,
    /// Cleared when the socket closes from either side
    is_active: Arc<AtomicBool>,
    /// Timeout configuration
    timeout_config: CdpTimeoutConfig,
    /// Reader task
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for CdpWebSocketConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpWebSocketConnection")
            .field("url", &self.url)
            .field("is_active", &self.is_active.load(Ordering::SeqCst))
            .finish()
    }
}

impl CdpWebSocketConnection {
    /// Connect to a target WebSocket URL
    /// (e.g., "ws://127.0.0.1:9222/devtools/page/ABC123")
    pub async fn new<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        Self::with_timeouts(url, CdpTimeoutConfig::default()).await
    }

    /// Connect with explicit per-command timeouts
    pub async fn with_timeouts<S: Into<String>>(
        url: S,
        timeout_config: CdpTimeoutConfig,
    ) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;
        let (sink, stream) = ws_stream.split();

        let pending_commands: PendingCommands = Arc::new(Mutex::new(HashMap::new()));
        let event_subscribers: EventSubscribers = Arc::new(Mutex::new(Vec::new()));
        let is_active = Arc::new(AtomicBool::new(true));

        let reader = tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&pending_commands),
            Arc::clone(&event_subscribers),
            Arc::clone(&is_active),
        ));

        info!("CDP WebSocket connection established");

        Ok(Arc::new(Self {
            url,
            sink: Mutex::new(sink),
            next_id: AtomicU64::new(1),
            pending_commands,
            event_subscribers,
            is_active,
            timeout_config,
            reader: std::sync::Mutex::new(Some(reader)),
        }))
    }

    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        pending_commands: PendingCommands,
        event_subscribers: EventSubscribers,
        is_active: Arc<AtomicBool>,
    ) {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match CdpMessage::parse(&text) {
                    Some(CdpMessage::Response(response)) => {
                        Self::handle_response(response, &pending_commands).await
                    }
                    Some(CdpMessage::Notification(notification)) => {
                        Self::handle_notification(notification, &event_subscribers).await
                    }
                    None => warn!("Unknown message format: {}", text),
                },
                Ok(Message::Close(_)) => {
                    info!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket read failed: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);

        // Dropping the senders wakes every waiter with a closed channel
        let mut pending = pending_commands.lock().await;
        if !pending.is_empty() {
            warn!("Connection closed with {} commands in flight", pending.len());
        }
        pending.clear();
    }

    async fn handle_response(response: CdpRpcResponse, pending_commands: &PendingCommands) {
        let mut pending = pending_commands.lock().await;

        match pending.remove(&response.id) {
            Some(command) => {
                debug!("Received response for command {}: {}", response.id, command.method);
                let _ = command.sender.send(CdpResponse {
                    id: response.id,
                    result: Some(response.result),
                    error: response.error.map(|e| CdpErrorResponse {
                        code: e.code,
                        message: e.message,
                        data: e.data,
                    }),
                });
            }
            None => warn!("Received response for unknown command ID: {}", response.id),
        }
    }

    async fn handle_notification(notification: CdpNotification, event_subscribers: &EventSubscribers) {
        debug!("Received event: {}", notification.method);

        let event = CdpEvent {
            method: notification.method,
            params: notification.params,
            session_id: notification.session_id,
        };

        let mut subscribers = event_subscribers.lock().await;
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
            session_id: None,
        };
        let json = serde_json::to_string(&request)?;

        debug!("Sending CDP command {}: {}", id, method);

        let (sender, receiver) = oneshot::channel();
        self.pending_commands.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        let sent = self.sink.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            self.pending_commands.lock().await.remove(&id);
            return Err(Error::websocket(format!("Failed to send {}: {}", method, e)));
        }

        let timeout = self.timeout_config.timeout_for(method);
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{}: {} (code: {})",
                        method, error.message, error.code
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed before {} (command {}) was answered",
                method, id
            ))),
            Err(_) => {
                self.pending_commands.lock().await.remove(&id);
                Err(Error::timeout(format!("{} (command {}) timed out after {:?}", method, id, timeout)))
            }
        }
    }

    async fn listen_events(&self) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        let (sender, receiver) = mpsc::channel(100);
        let (unbounded_sender, mut unbounded_receiver) = mpsc::unbounded_channel();

        self.event_subscribers.lock().await.push(unbounded_sender);

        // Forward events to bounded channel
        tokio::spawn(async move {
            while let Some(event) = unbounded_receiver.recv().await {
                if sender.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(receiver)
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            debug!("CDP connection to {} already closed", self.url);
            return Ok(());
        }

        info!("Closing CDP WebSocket connection to {}", self.url);

        let closed = self.sink.lock().await.close().await;

        if let Ok(mut reader) = self.reader.lock() {
            if let Some(handle) = reader.take() {
                handle.abort();
            }
        }

        closed.map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_per_method() {
        let config = CdpTimeoutConfig::default();
        assert_eq!(config.timeout_for("Page.captureScreenshot"), Duration::from_secs(90));
        assert_eq!(config.timeout_for("Page.navigate"), Duration::from_secs(60));
        assert_eq!(config.timeout_for("Runtime.evaluate"), Duration::from_secs(30));
        assert_eq!(config.timeout_for("Input.dispatchKeyEvent"), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let err = CdpWebSocketConnection::new("ws://127.0.0.1:1/devtools/page/none")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WebSocket(_)));
    }
}
