//! Refresh workers.

use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};

use super::queue::QueueReceiver;
use crate::service::refresh::RefreshHandler;

/// Refresh worker - runs the handler for one request at a time.
///
/// Workers pull from a shared receiver. Each request runs on its own task so
/// a panicking handler only loses that request.
pub async fn refresh_worker(
  worker_id: usize,
  rx: Arc<Mutex<QueueReceiver>>,
  handler: Arc<RefreshHandler>,
  cancel: CancellationToken,
) {
  trace!(worker_id, "Refresh worker starting");
  let mut processed = 0u64;

  loop {
    let request = {
      let mut rx_guard = rx.lock().await;
      tokio::select! {
          biased;
          _ = cancel.cancelled() => {
              trace!(worker_id, processed, "Refresh worker cancelled");
              break;
          }
          request = rx_guard.recv() => request
      }
    };

    let Some(request) = request else {
      trace!(worker_id, processed, "Refresh worker: queue closed");
      break;
    };

    let handler = handler.clone();
    let notification = request.notification.clone();
    let gav = notification.gav();
    let task = tokio::spawn(async move { handler.handle(&notification).await });

    match task.await {
      Ok(response) if response.has_errors() => {
        warn!(worker_id, gav = %gav, errors = ?response.errors, "Refresh completed with errors");
      }
      Ok(_) => {}
      Err(e) => error!(worker_id, gav = %gav, error = %e, "Refresh task failed"),
    }

    drop(request);
    processed += 1;
  }

  trace!(worker_id, processed, "Refresh worker finished");
}

/// Spawn `workers` refresh workers over one receiver.
pub fn spawn_workers(
  workers: usize,
  receiver: QueueReceiver,
  handler: Arc<RefreshHandler>,
  cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
  let rx = Arc::new(Mutex::new(receiver));
  (0..workers.max(1))
    .map(|worker_id| {
      let rx = rx.clone();
      let handler = handler.clone();
      let cancel = cancel.clone();
      tokio::spawn(async move {
        refresh_worker(worker_id, rx, handler, cancel).await;
      })
    })
    .collect()
}
