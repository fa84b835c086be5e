use crate::replica::counter::CounterClient;
use crate::replica::fault::CrashFault;
use crate::replica::ReplicaShutdownSignal;
use crate::wire::{Command, LineStream, Reply};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Why `ReplicaServer::run` returned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReplicaExit {
    /// The shutdown signal fired.
    Shutdown,
    /// A crash fault fired. The listener is gone and every open connection was cut without a
    /// reply. A standalone replica process should exit immediately.
    Crashed,
}

/// How a single accepted connection ended.
enum ConnectionOutcome {
    Served,
    /// Peer hung up, or sent something unreadable, before a request line arrived.
    NoRequest,
    /// Crash fault fired after reading the request. The stream is handed back unanswered so it
    /// is torn down together with the rest of the replica.
    Crashed(TcpStream),
}

/// ReplicaServer answers `GET_COUNTER` on one listening socket. Each connection carries exactly
/// one request and one reply.
pub struct ReplicaServer {
    logger: slog::Logger,
    listener: TcpListener,
    handler: ConnectionHandler,
}

#[derive(Clone)]
struct ConnectionHandler {
    logger: slog::Logger,
    counter: CounterClient,
    crash_fault: CrashFault,
    /// Set by whichever connection fires the crash fault. Other in-flight connections check it
    /// before touching the counter and before replying.
    crashed: Arc<AtomicBool>,
}

impl ReplicaServer {
    pub(super) fn new(
        logger: slog::Logger,
        listener: TcpListener,
        counter: CounterClient,
        crash_fault: CrashFault,
    ) -> Self {
        let handler = ConnectionHandler {
            logger: logger.clone(),
            counter,
            crash_fault,
            crashed: Arc::new(AtomicBool::new(false)),
        };

        ReplicaServer {
            logger,
            listener,
            handler,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self, mut shutdown_signal: ReplicaShutdownSignal) -> ReplicaExit {
        let ReplicaServer {
            logger,
            listener,
            handler,
        } = self;
        if let Ok(addr) = listener.local_addr() {
            slog::info!(logger, "Listening on '{}'", addr);
        }

        let (crash_tx, mut crash_rx) = mpsc::channel::<TcpStream>(1);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                Some(unanswered) = crash_rx.recv() => {
                    slog::warn!(logger, "Simulating crash! Dropping listener and all open connections");
                    drop(listener);
                    drop(connections);
                    drop(unanswered);
                    return ReplicaExit::Crashed;
                }
                _ = &mut shutdown_signal => {
                    match handler.counter.read().await {
                        Ok(counter) => slog::info!(logger, "Shutting down"; "counter" => counter),
                        Err(_) => slog::info!(logger, "Shutting down"),
                    }
                    return ReplicaExit::Shutdown;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let handler = handler.clone();
                        let crash_tx = crash_tx.clone();
                        connections.spawn(async move {
                            if let ConnectionOutcome::Crashed(stream) = handler.serve(stream, peer).await {
                                let _ = crash_tx.send(stream).await;
                            }
                        });
                    }
                    Err(e) => {
                        slog::warn!(logger, "Accept failed: {}", e);
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {
                    // Reap finished connection tasks.
                }
            }
        }
    }
}

impl ConnectionHandler {
    async fn serve(self, stream: TcpStream, peer: SocketAddr) -> ConnectionOutcome {
        let mut lines = LineStream::new(stream);

        let message = match lines.read_line().await {
            Ok(Some(message)) => message,
            Ok(None) => {
                slog::debug!(self.logger, "Peer {} closed before sending a request", peer);
                return ConnectionOutcome::NoRequest;
            }
            Err(e) => {
                slog::warn!(self.logger, "Error reading request from {}: {}", peer, e);
                return ConnectionOutcome::NoRequest;
            }
        };
        let message = message.trim();
        slog::info!(self.logger, "Received from {}: {}", peer, message);

        if self.crash_fault.should_crash() {
            slog::warn!(self.logger, "Crash fault fired while serving {}", peer);
            self.crashed.store(true, Ordering::SeqCst);
            return ConnectionOutcome::Crashed(lines.into_inner());
        }
        if self.has_crashed() {
            return ConnectionOutcome::Crashed(lines.into_inner());
        }

        let reply = match Command::parse(message) {
            Command::GetCounter => match self.counter.increment().await {
                Ok(counter) => Reply::Counter(counter),
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::Unrecognized(_) => Reply::unknown_command(),
        };

        if self.has_crashed() {
            return ConnectionOutcome::Crashed(lines.into_inner());
        }

        let reply = reply.to_string();
        match lines.write_line(&reply).await {
            Ok(()) => slog::info!(self.logger, "Replied with: {}", reply; "peer" => %peer),
            Err(e) => slog::warn!(self.logger, "Failed to reply to {}: {}", peer, e),
        }

        ConnectionOutcome::Served
    }

    fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::{counter, shutdown_signal};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::task::JoinHandle;
    use tokio::time::Duration;

    async fn start(
        crash_probability: f64,
    ) -> (SocketAddr, crate::replica::ReplicaShutdownHandle, JoinHandle<ReplicaExit>) {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (counter, actor) = counter::create(logger.clone(), 16);
        tokio::spawn(actor.run_event_loop());

        let server = ReplicaServer::new(logger, listener, counter, CrashFault::new(crash_probability));
        let addr = server.local_addr().unwrap();
        let (handle, signal) = shutdown_signal();
        let join = tokio::spawn(server.run(signal));

        (addr, handle, join)
    }

    async fn request(addr: SocketAddr, line: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(line.as_bytes()).await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn counter_increments_per_request() {
        let (addr, handle, join) = start(0.0).await;

        assert_eq!(request(addr, "GET_COUNTER\n").await, "OK 1\n");
        assert_eq!(request(addr, "  GET_COUNTER  \n").await, "OK 2\n");
        assert_eq!(request(addr, "DELETE_EVERYTHING\n").await, "ERROR unknown command\n");
        assert_eq!(request(addr, "GET_COUNTER\n").await, "OK 3\n");

        handle.shutdown();
        assert_eq!(join.await.unwrap(), ReplicaExit::Shutdown);
    }

    #[tokio::test]
    async fn silent_peer_does_not_disturb_others() {
        let (addr, handle, join) = start(0.0).await;

        let silent = TcpStream::connect(addr).await.unwrap();
        drop(silent);
        let lingering = TcpStream::connect(addr).await.unwrap();

        assert_eq!(request(addr, "GET_COUNTER\n").await, "OK 1\n");

        drop(lingering);
        drop(handle);
        assert_eq!(join.await.unwrap(), ReplicaExit::Shutdown);
    }

    #[tokio::test]
    async fn crash_cuts_connection_and_takes_replica_down() {
        let (addr, _handle, join) = start(1.0).await;

        assert_eq!(request(addr, "GET_COUNTER\n").await, "");

        let exit = tokio::time::timeout(Duration::from_secs(5), join)
            .await
            .expect("Replica should stop after crashing")
            .unwrap();
        assert_eq!(exit, ReplicaExit::Crashed);

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn connections_in_flight_stop_once_a_crash_fired() {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let (counter, actor) = counter::create(logger.clone(), 16);
        tokio::spawn(actor.run_event_loop());
        let handler = ConnectionHandler {
            logger,
            counter: counter.clone(),
            crash_fault: CrashFault::new(0.0),
            crashed: Arc::new(AtomicBool::new(true)),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::spawn(request(addr, "GET_COUNTER\n"));
        let (stream, peer) = listener.accept().await.unwrap();

        let outcome = handler.serve(stream, peer).await;
        assert!(matches!(outcome, ConnectionOutcome::Crashed(_)));
        drop(outcome);

        assert_eq!(client.await.unwrap(), "");
        assert_eq!(counter.read().await.unwrap(), 0);
    }
}
