use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::WidgetInstanceId,
    error::WidgetError,
    protocol::{HostMessage, ValueChanged},
};
use tokio::sync::mpsc;

/// Outbound half of the host protocol. Callers log failures; nothing is retried.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn signal_ready(&self, instance_id: WidgetInstanceId) -> Result<()>;
    async fn notify_value(&self, payload: &ValueChanged) -> Result<()>;
    async fn request_resize(&self, height_px: u32) -> Result<()>;
}

/// Used when the widget runs without an embedding host.
pub struct MissingHostBridge;

#[async_trait]
impl HostBridge for MissingHostBridge {
    async fn signal_ready(&self, _instance_id: WidgetInstanceId) -> Result<()> {
        Err(unavailable())
    }

    async fn notify_value(&self, _payload: &ValueChanged) -> Result<()> {
        Err(unavailable())
    }

    async fn request_resize(&self, _height_px: u32) -> Result<()> {
        Err(unavailable())
    }
}

fn unavailable() -> anyhow::Error {
    anyhow!(WidgetError::Bridge("no embedding host".into()))
}

/// Forwards every frame into a channel drained by the embedding transport.
#[derive(Clone)]
pub struct ChannelHostBridge {
    tx: mpsc::UnboundedSender<HostMessage>,
}

impl ChannelHostBridge {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: HostMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| anyhow!(WidgetError::Bridge("host channel closed".into())))
    }
}

#[async_trait]
impl HostBridge for ChannelHostBridge {
    async fn signal_ready(&self, instance_id: WidgetInstanceId) -> Result<()> {
        self.send(HostMessage::Ready { instance_id })
    }

    async fn notify_value(&self, payload: &ValueChanged) -> Result<()> {
        self.send(HostMessage::ValueChanged(payload.clone()))
    }

    async fn request_resize(&self, height_px: u32) -> Result<()> {
        self.send(HostMessage::Resize { height_px })
    }
}
