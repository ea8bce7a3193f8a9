//! Hand-off of update batches from the fetcher task to the cooperative loop.

use telegram_client::Update;
use tokio::sync::mpsc;

/// The receiving side is gone; the fetcher should stop.
#[derive(Debug, thiserror::Error)]
#[error("inbox consumer has shut down")]
pub struct InboxClosed;

/// Create a connected inbox pair.
pub fn channel() -> (InboxSender, InboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboxSender { tx }, InboxReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::UnboundedSender<Vec<Update>>,
}

impl InboxSender {
    /// Enqueue one batch. Never blocks.
    pub fn push(&self, batch: Vec<Update>) -> Result<(), InboxClosed> {
        self.tx.send(batch).map_err(|_| InboxClosed)
    }
}

#[derive(Debug)]
pub struct InboxReceiver {
    rx: mpsc::UnboundedReceiver<Vec<Update>>,
}

impl InboxReceiver {
    /// Take every batch pushed so far, oldest first. Never blocks.
    pub fn drain_nonblocking(&mut self) -> Vec<Vec<Update>> {
        let mut batches = Vec::new();
        while let Ok(batch) = self.rx.try_recv() {
            batches.push(batch);
        }
        batches
    }
}
