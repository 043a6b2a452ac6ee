//! Hot reload messages and the channel that carries them to clients.
//!
//! Payloads follow Vite's WebSocket protocol, so a stock client understands
//! them:
//!
//! ```json
//! {"type":"full-reload","path":"/about.html"}
//! ```

use serde::Serialize;
use tokio::sync::broadcast;

/// Reload path meaning "whatever page the client is on".
pub const WILDCARD_PATH: &str = "*";

/// Buffered messages per client before it starts lagging.
pub const HMR_CHANNEL_CAPACITY: usize = 64;

/// Message sent to connected dev clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrPayload {
    /// Connected confirmation.
    Connected,
    /// Discard state and re-fetch. `path` limits the reload to clients on that page.
    FullReload {
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    /// A hook failed while handling a change.
    Error { message: String },
}

impl HmrPayload {
    /// Full reload of the page at `path`.
    pub fn full_reload(path: impl Into<String>) -> Self {
        Self::FullReload {
            path: Some(path.into()),
        }
    }

    /// Serialize to the JSON text frame sent over the socket.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Only strings and unit variants: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Broadcast channel from the dev server to every connected client.
#[derive(Debug, Clone)]
pub struct HmrChannel {
    tx: broadcast::Sender<HmrPayload>,
}

impl HmrChannel {
    /// Create a channel buffering up to `capacity` messages per client.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Send to every connected client, returning how many received it.
    ///
    /// Sending with no clients connected is not an error.
    pub fn send(&self, payload: HmrPayload) -> usize {
        tracing::debug!(payload = %payload.to_json(), "hmr send");
        self.tx.send(payload).unwrap_or(0)
    }

    /// Subscribe as a new client.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HmrPayload> {
        self.tx.subscribe()
    }
}

impl Default for HmrChannel {
    fn default() -> Self {
        Self::new(HMR_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json() {
        assert_eq!(
            HmrPayload::full_reload("/about.html").to_json(),
            r#"{"type":"full-reload","path":"/about.html"}"#
        );
        assert_eq!(
            HmrPayload::FullReload { path: None }.to_json(),
            r#"{"type":"full-reload"}"#
        );
        assert_eq!(HmrPayload::Connected.to_json(), r#"{"type":"connected"}"#);
        assert_eq!(
            HmrPayload::Error {
                message: "boom".into()
            }
            .to_json(),
            r#"{"type":"error","message":"boom"}"#
        );
    }

    #[test]
    fn test_send_without_clients() {
        let channel = HmrChannel::default();
        assert_eq!(channel.send(HmrPayload::Connected), 0);
    }

    #[test]
    fn test_subscribers_receive() {
        let channel = HmrChannel::default();
        let mut rx = channel.subscribe();

        assert_eq!(channel.send(HmrPayload::full_reload("/index.html")), 1);
        assert_eq!(rx.try_recv().unwrap(), HmrPayload::full_reload("/index.html"));
    }
}
