use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Fired when an undo window elapses. The owner feeds it back into
/// [`crate::CounterWidget::expire_undo`] on its own event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoExpired {
    pub generation: u64,
}

/// Holds at most one scheduled expiry. Arming always cancels the previous one.
pub struct UndoTimer {
    tx: mpsc::UnboundedSender<UndoExpired>,
    handle: Option<JoinHandle<()>>,
}

impl UndoTimer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UndoExpired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, handle: None }, rx)
    }

    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self, generation: u64, after: Duration) {
        self.cancel();
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // The receiver is gone once the widget is torn down.
            let _ = tx.send(UndoExpired { generation });
        }));
        debug!(generation, after_ms = after.as_millis() as u64, "armed undo expiry");
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for UndoTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
