//! Per-channel latest-frame buffers and alert fan-out.

use dashmap::DashMap;
use roiscope_core::protocol::{ChannelId, StreamMessage};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

const ALERT_CAPACITY: usize = 64;

/// Encoded frame message, shared by every subscriber of a channel.
pub type FramePayload = Option<Arc<str>>;

/// Shared relay state.
pub struct RelayState {
    /// Latest frame per channel. Receivers only ever see the newest value, so
    /// a slow subscriber skips stale frames instead of queueing them.
    feeds: DashMap<ChannelId, watch::Sender<FramePayload>>,
    alerts: broadcast::Sender<Arc<str>>,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayState {
    pub fn new() -> Self {
        let (alerts, _) = broadcast::channel(ALERT_CAPACITY);
        Self {
            feeds: DashMap::new(),
            alerts,
        }
    }

    /// Start receiving a channel's frames. Only frames published after this
    /// call are delivered.
    pub fn subscribe(&self, channel_id: ChannelId) -> watch::Receiver<FramePayload> {
        self.feeds
            .entry(channel_id)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    /// Forget a channel's buffer once its last receiver is gone.
    pub fn release(&self, channel_id: ChannelId) {
        if self
            .feeds
            .remove_if(&channel_id, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            debug!("Channel {} has no subscribers left", channel_id);
        }
    }

    pub fn channel_count(&self) -> usize {
        self.feeds.len()
    }

    pub fn has_subscribers(&self, channel_id: ChannelId) -> bool {
        self.feeds
            .get(&channel_id)
            .is_some_and(|tx| tx.receiver_count() > 0)
    }

    /// Publish a frame. Nothing is encoded when the channel has no
    /// subscribers; returns whether the frame went out.
    pub fn publish_frame(&self, channel_id: ChannelId, jpeg: &[u8], timestamp: String) -> bool {
        if !self.has_subscribers(channel_id) {
            return false;
        }
        let message = StreamMessage::frame(channel_id, jpeg, Some(timestamp));
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode frame for channel {}: {}", channel_id, e);
                return false;
            }
        };
        match self.feeds.get(&channel_id) {
            Some(tx) => {
                tx.send_replace(Some(Arc::from(json)));
                true
            }
            None => false,
        }
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Arc<str>> {
        self.alerts.subscribe()
    }

    /// Fan an alert out to every alert connection.
    pub fn publish_alert(&self, alert: &StreamMessage) {
        match alert.to_json() {
            Ok(json) => {
                let receivers = self.alerts.send(Arc::from(json)).unwrap_or(0);
                debug!("Alert delivered to {} connections", receivers);
            }
            Err(e) => warn!("Failed to encode alert: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_only_encoded_with_subscribers() {
        let state = RelayState::new();
        assert!(!state.publish_frame(1, b"jpeg", "t".to_string()));

        let rx = state.subscribe(1);
        assert!(state.has_subscribers(1));
        assert!(state.publish_frame(1, b"jpeg", "t".to_string()));

        drop(rx);
        assert!(!state.has_subscribers(1));
    }

    #[test]
    fn test_release_prunes_idle_channels() {
        let state = RelayState::new();
        let a = state.subscribe(9000);
        let b = state.subscribe(9000);
        assert_eq!(state.channel_count(), 1);

        drop(a);
        state.release(9000);
        assert_eq!(state.channel_count(), 1);

        drop(b);
        state.release(9000);
        assert_eq!(state.channel_count(), 0);
        assert!(!state.has_subscribers(9000));
    }

    #[tokio::test]
    async fn test_slow_subscriber_sees_latest_only() {
        let state = RelayState::new();
        let mut rx = state.subscribe(2);

        state.publish_frame(2, b"first", "1".to_string());
        state.publish_frame(2, b"second", "2".to_string());

        rx.changed().await.unwrap();
        let payload = rx.borrow_and_update().clone().unwrap();
        match StreamMessage::decode(&payload).unwrap() {
            StreamMessage::Frame { timestamp, .. } => assert_eq!(timestamp.as_deref(), Some("2")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_channels_are_isolated() {
        let state = RelayState::new();
        let rx = state.subscribe(1);
        state.publish_frame(3, b"x", "t".to_string());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_alert_fan_out() {
        let state = RelayState::new();
        let mut a = state.subscribe_alerts();
        let mut b = state.subscribe_alerts();
        state.publish_alert(&StreamMessage::AlertSubscriptionConfirmed {
            timestamp: Some("t".to_string()),
        });
        assert_eq!(a.recv().await.unwrap(), b.recv().await.unwrap());
    }
}
