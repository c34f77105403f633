//! Work queue of refresh requests.
//!
//! Producers only see [`RefreshQueue`]. The in-process [`ChannelQueue`] is an
//! mpsc channel that also counts requests not yet fully handled, so one-shot
//! callers can wait for a fan-out wave to drain.
//!
//! Handlers push fan-out requests from inside workers, so the channel never
//! blocks a producer. `capacity` is a high-water mark that is only logged.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use tokio::sync::{Notify, mpsc};
use tracing::{trace, warn};

use crate::domain::notification::{MetadataNotification, RequestId};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
  #[error("Queue is closed")]
  Closed,
}

#[async_trait::async_trait]
pub trait RefreshQueue: Send + Sync {
  /// Enqueue a request.
  async fn push(&self, notification: MetadataNotification) -> Result<RequestId, QueueError>;
}

#[derive(Debug, Default)]
struct Pending {
  count: AtomicUsize,
  idle: Notify,
}

impl Pending {
  fn finish(&self) {
    if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
      self.idle.notify_waiters();
    }
  }
}

#[derive(Clone)]
pub struct ChannelQueue {
  tx: mpsc::UnboundedSender<MetadataNotification>,
  pending: Arc<Pending>,
  high_water: usize,
}

impl ChannelQueue {
  pub fn new(capacity: usize) -> (Self, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(Pending::default());
    let receiver = QueueReceiver {
      rx,
      pending: pending.clone(),
    };
    let queue = Self {
      tx,
      pending,
      high_water: capacity.max(1),
    };
    (queue, receiver)
  }

  /// Requests pushed but not yet finished.
  pub fn pending(&self) -> usize {
    self.pending.count.load(Ordering::Acquire)
  }

  /// Wait until every pushed request, including ones pushed while waiting,
  /// has been handled.
  pub async fn wait_idle(&self) {
    loop {
      let notified = self.pending.idle.notified();
      if self.pending() == 0 {
        return;
      }
      notified.await;
    }
  }
}

#[async_trait::async_trait]
impl RefreshQueue for ChannelQueue {
  async fn push(&self, notification: MetadataNotification) -> Result<RequestId, QueueError> {
    let request_id = notification.event_id.clone();
    let pending = self.pending.count.fetch_add(1, Ordering::AcqRel) + 1;

    if self.tx.send(notification).is_err() {
      self.pending.finish();
      return Err(QueueError::Closed);
    }

    if pending == self.high_water {
      warn!(pending, "Refresh queue reached its configured capacity");
    }

    trace!(request_id = %request_id, "Request queued");
    Ok(request_id)
  }
}

/// Consumer half of a [`ChannelQueue`].
pub struct QueueReceiver {
  rx: mpsc::UnboundedReceiver<MetadataNotification>,
  pending: Arc<Pending>,
}

impl QueueReceiver {
  /// Next request, or `None` once every sender is gone.
  pub async fn recv(&mut self) -> Option<QueuedRequest> {
    let notification = self.rx.recv().await?;
    Some(QueuedRequest {
      notification,
      pending: self.pending.clone(),
    })
  }
}

/// A dequeued request. Dropping it marks the request finished.
pub struct QueuedRequest {
  pub notification: MetadataNotification,
  pending: Arc<Pending>,
}

impl Drop for QueuedRequest {
  fn drop(&mut self) {
    self.pending.finish();
  }
}
