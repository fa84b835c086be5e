use tokio::sync::{mpsc, oneshot};

pub(super) fn create(logger: slog::Logger, buffer_size: usize) -> (CounterClient, CounterActor) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let client = CounterClient { sender: tx };
    let actor = CounterActor {
        logger,
        receiver: rx,
        state: ReplicaCounterState { counter: 0 },
    };

    (client, actor)
}

#[derive(Debug)]
enum Event {
    // Increment, then reply with the new value.
    Increment(Callback<u64>),

    // Reply with the current value, no mutation.
    Read(Callback<u64>),
}

#[derive(Debug)]
struct Callback<T>(oneshot::Sender<T>);

impl<T> Callback<T> {
    fn send(self, value: T) {
        // Requester may have hung up (its connection task got aborted). That's fine.
        let _ = self.0.send(value);
    }
}

#[derive(Debug, thiserror::Error)]
#[error("counter unavailable")]
pub(super) struct CounterActorExited;

/// CounterClient is the only way to reach the counter. Cloned into every connection task.
#[derive(Clone)]
pub(super) struct CounterClient {
    sender: mpsc::Sender<Event>,
}

impl CounterClient {
    pub(super) async fn increment(&self) -> Result<u64, CounterActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Increment(Callback(tx))).await?;

        rx.await.map_err(|_| CounterActorExited)
    }

    pub(super) async fn read(&self) -> Result<u64, CounterActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Read(Callback(tx))).await?;

        rx.await.map_err(|_| CounterActorExited)
    }

    async fn send(&self, event: Event) -> Result<(), CounterActorExited> {
        self.sender.send(event).await.map_err(|_| CounterActorExited)
    }
}

/// Local to one replica. Starts at 0, never reset, never shared with other replicas.
struct ReplicaCounterState {
    counter: u64,
}

/// CounterActor owns the counter. It exits once every `CounterClient` is dropped.
pub(super) struct CounterActor {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    state: ReplicaCounterState,
}

impl CounterActor {
    pub(super) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }

        slog::debug!(self.logger, "Counter actor exiting"; "counter" => self.state.counter);
    }

    // Not async: each event is applied in full before the next one is looked at.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Increment(callback) => {
                self.state.counter += 1;
                callback.send(self.state.counter);
            }
            Event::Read(callback) => {
                callback.send(self.state.counter);
            }
        }
    }
}
