use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Returns a pair that stops a running `ReplicaServer`. Calling `shutdown()` on the handle, or
/// simply dropping it, resolves the signal.
pub fn shutdown_signal() -> (ReplicaShutdownHandle, ReplicaShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (ReplicaShutdownHandle { tx }, ReplicaShutdownSignal { rx })
}

pub struct ReplicaShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl ReplicaShutdownHandle {
    pub fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

pub struct ReplicaShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for ReplicaShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Sent or dropped, both mean stop.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}
