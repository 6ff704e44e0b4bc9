//! # Stream Session
//!
//! A [`StreamSession`] keeps one client-streaming call open for the lifetime of the
//! process and multiplexes every repeated message onto it instead of opening a call per
//! message.
//!
//! Producers append to an unbounded [`Pending`] queue from any task. A single supervisor
//! task owns the open stream and is the only writer to it:
//!
//! ```text
//! Disconnected -> Connecting -> Active -> Draining -> Connecting -> ...
//!                     |            |
//!                   Failed       Closed
//! ```
//!
//! * **Connecting**: opens a call, retrying with exponential backoff per
//!   [`ReconnectPolicy`]. Running out of attempts moves the session to `Failed`.
//! * **Active**: takes the next item from the queue. A payload is sent on the stream; the
//!   close signal half-closes the stream, waits for the aggregate response and stops.
//! * **Draining**: a send failed. The stream is abandoned without waiting for its
//!   response and the payload that failed is dropped, so delivery is at-most-once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quadrpc_core::{CallClient, CallMetadata, ReconnectPolicy, StreamSession};
//! use quadrpc_core::session::GrpcConnector;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CallClient::connect("http://localhost:38888").await?;
//! let connector = GrpcConnector::new(client, CallMetadata::uniform("repeatedStream"));
//! let session = StreamSession::spawn(connector, ReconnectPolicy::default());
//!
//! session.enqueue("Hello, 1")?;
//! session.enqueue("Hello, 2")?;
//!
//! let report = session.close().await?;
//! println!("{:?}", report.response);
//! # Ok(())
//! # }
//! ```
mod connector;
mod policy;

pub use connector::{GrpcConnector, GrpcStream, OutboundStream, StreamConnector, StreamSendError};
pub use policy::ReconnectPolicy;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tonic::Status;
use tracing::{debug, info, warn};

/// An item of the pending queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Payload(String),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The supervisor has not started yet.
    Disconnected,
    /// Opening a stream; `attempt` is 1-based within the current connect phase.
    Connecting { attempt: u32 },
    /// Sending on the `generation`-th stream opened by this session.
    Active { generation: u64 },
    /// A send failed and the current stream is being abandoned.
    Draining,
    Closed,
    /// The reconnect budget ran out.
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Stream session is closed")]
    Closed,
    #[error("Failed to open a client stream after {attempts} attempts: '{source}'")]
    ConnectAttemptsExhausted {
        attempts: u32,
        #[source]
        source: Status,
    },
    #[error("Stream session supervisor failed: '{0}'")]
    Supervisor(#[from] tokio::task::JoinError),
}

/// What a session did over its lifetime, returned by [`StreamSession::close`].
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Payloads accepted by a stream.
    ///
    /// Acceptance is not acknowledgement: a payload handed to a call that the server
    /// aborts right after is counted here, and the aggregate it was part of is lost.
    pub sent: u64,
    /// Payloads lost to a failed send or enqueued after close.
    pub dropped: u64,
    /// Streams recreated after a send failure.
    pub reconnects: u64,
    /// The server's answer to the last stream when it was half-closed.
    pub response: Result<String, Status>,
}

/// Cloneable handle for feeding a session's pending queue from other tasks.
#[derive(Debug, Clone)]
pub struct SessionProducer {
    queue: mpsc::UnboundedSender<Pending>,
}

impl SessionProducer {
    /// Appends a payload without blocking. Fails once the session has closed.
    pub fn enqueue(&self, payload: impl Into<String>) -> Result<(), SessionError> {
        self.queue
            .send(Pending::Payload(payload.into()))
            .map_err(|_| SessionError::Closed)
    }
}

/// The persistent client-stream multiplexer. See the [module docs](self).
#[derive(Debug)]
pub struct StreamSession {
    producer: SessionProducer,
    state: watch::Receiver<SessionState>,
    supervisor: JoinHandle<Result<SessionReport, SessionError>>,
}

impl StreamSession {
    /// Starts the supervisor task. Must be called within a tokio runtime.
    pub fn spawn<C: StreamConnector>(connector: C, policy: ReconnectPolicy) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);

        let supervisor = Supervisor {
            connector,
            policy,
            queue: queue_rx,
            state: state_tx,
            sent: 0,
            dropped: 0,
            reconnects: 0,
        };

        Self {
            producer: SessionProducer { queue: queue_tx },
            state: state_rx,
            supervisor: tokio::spawn(supervisor.run()),
        }
    }

    /// Appends a payload without blocking.
    pub fn enqueue(&self, payload: impl Into<String>) -> Result<(), SessionError> {
        self.producer.enqueue(payload)
    }

    pub fn producer(&self) -> SessionProducer {
        self.producer.clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver notified on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Queues the close signal behind every payload already enqueued and waits for the
    /// supervisor to stop.
    pub async fn close(self) -> Result<SessionReport, SessionError> {
        if self.producer.queue.send(Pending::Close).is_err() {
            debug!("stream session supervisor already stopped");
        }
        self.supervisor.await?
    }
}

struct Supervisor<C> {
    connector: C,
    policy: ReconnectPolicy,
    queue: mpsc::UnboundedReceiver<Pending>,
    state: watch::Sender<SessionState>,
    sent: u64,
    dropped: u64,
    reconnects: u64,
}

impl<C: StreamConnector> Supervisor<C> {
    async fn run(mut self) -> Result<SessionReport, SessionError> {
        let mut generation = 0;

        'connect: loop {
            let mut stream = match self.connect().await {
                Ok(stream) => stream,
                Err(err) => {
                    self.transition(SessionState::Failed);
                    self.reject_pending();
                    return Err(err);
                }
            };

            generation += 1;
            self.transition(SessionState::Active { generation });
            info!(generation, "client stream active");

            loop {
                match self.queue.recv().await {
                    Some(Pending::Payload(payload)) => match stream.send(payload).await {
                        Ok(()) => {
                            self.sent += 1;
                            debug!(generation, sent = self.sent, "payload sent");
                        }
                        Err(StreamSendError(payload)) => {
                            warn!(generation, %payload, "send failed, recreating client stream");
                            self.dropped += 1;
                            self.reconnects += 1;
                            self.transition(SessionState::Draining);
                            drop(stream);
                            continue 'connect;
                        }
                    },
                    Some(Pending::Close) | None => {
                        info!(generation, "closing client stream");
                        let response = stream.finish().await;
                        match &response {
                            Ok(response) => info!(%response, "client stream closed"),
                            Err(status) => warn!(error = %status, "client stream closed with error"),
                        }

                        self.transition(SessionState::Closed);
                        self.reject_pending();
                        return Ok(SessionReport {
                            sent: self.sent,
                            dropped: self.dropped,
                            reconnects: self.reconnects,
                            response,
                        });
                    }
                }
            }
        }
    }

    async fn connect(&mut self) -> Result<C::Stream, SessionError> {
        let attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            self.transition(SessionState::Connecting { attempt });

            match self.connector.open().await {
                Ok(stream) => return Ok(stream),
                Err(status) if attempt >= attempts => {
                    warn!(attempt, error = %status, "giving up on client stream");
                    return Err(SessionError::ConnectAttemptsExhausted {
                        attempts,
                        source: status,
                    });
                }
                Err(status) => {
                    let backoff = self.policy.backoff(attempt);
                    warn!(attempt, ?backoff, error = %status, "failed to open client stream");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!(?previous, ?next, "stream session transition");
    }

    /// Stops accepting payloads and drops whatever is still queued.
    fn reject_pending(&mut self) {
        self.queue.close();
        while let Ok(item) = self.queue.try_recv() {
            if let Pending::Payload(payload) = item {
                warn!(%payload, "dropping payload enqueued after close");
                self.dropped += 1;
            }
        }
    }
}
