use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::messages::SessionMsg;
use crate::actor::worker::EditWorker;

/// Run the worker until it stops or the shutdown signal fires.
pub(super) async fn run_worker(
    worker: EditWorker,
    signal: Option<(Receiver<()>, mpsc::Sender<SessionMsg>)>,
) {
    let mut worker_handle = tokio::spawn(worker.run());

    let Some((shutdown_rx, tx)) = signal else {
        let _ = worker_handle.await;
        return;
    };

    loop {
        if shutdown_rx.try_recv().is_ok() {
            crate::debug!("actor"; "shutdown signal received");
            break;
        }
        if worker_handle.is_finished() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let _ = tx.send(SessionMsg::Shutdown).await;
    drop(tx);
    if tokio::time::timeout(Duration::from_millis(500), &mut worker_handle)
        .await
        .is_err()
    {
        worker_handle.abort();
    }
}
