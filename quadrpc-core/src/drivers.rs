//! # Interaction Drivers
//!
//! One routine per call shape, each a fixed sequence of calls against the dispatcher or
//! the stream session. The interactive client maps its menu entries onto these.
//!
//! Streaming drivers render responses through a callback as they arrive instead of
//! collecting them, so the caller sees server pacing.
use crate::{
    BoxError, CallClient, CallError,
    metadata::CallMetadata,
    session::{SessionError, SessionProducer},
};
use futures_util::StreamExt;
use http_body::Body as HttpBody;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Status, client::GrpcService, transport::Channel};

pub const UNARY_MESSAGE: &str = "Hello, Unary RPC!";
pub const SERVER_STREAM_MESSAGE: &str = "Hello, Server Stream RPC!";
pub const REPEATED_MESSAGES: [&str; 3] = ["Hello, 1", "Hello, 2", "Hello, 3"];

/// Payloads sent by the client-streaming and bidirectional drivers.
const STREAMED_MESSAGES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("gRPC call failed: code={:?} message={:?}", .0.code(), .0.message())]
    Status(#[from] Status),
    #[error("Failed to send on the request stream, the call already ended")]
    SendFailed,
    #[error("Request sender task failed: '{0}'")]
    Sender(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Pacing of the drivers' outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Pause after each client-streaming send.
    pub client_stream_spacing: Duration,
    /// Pause after each bidirectional send.
    pub bidirectional_spacing: Duration,
    /// Pause between repeated-stream enqueues.
    pub repeated_spacing: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            client_stream_spacing: Duration::from_millis(10),
            bidirectional_spacing: Duration::from_secs(1),
            repeated_spacing: Duration::from_millis(100),
        }
    }
}

pub struct Drivers<S = Channel> {
    client: CallClient<S>,
    config: DriverConfig,
}

impl<S> Drivers<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(client: CallClient<S>, config: DriverConfig) -> Self {
        Self { client, config }
    }

    /// One unary call.
    pub async fn unary(&mut self) -> Result<String, DriverError> {
        let response = self
            .client
            .unary(UNARY_MESSAGE.to_string(), CallMetadata::uniform("unaryRPC"))
            .await??;
        Ok(response)
    }

    /// Three paced sends, then half-close and wait for the aggregate response.
    pub async fn client_stream(&mut self) -> Result<String, DriverError> {
        let messages = (0..STREAMED_MESSAGES)
            .map(|i| format!("Client Stream Message {i}"))
            .collect();
        let (requests, sender) = spawn_sender(messages, self.config.client_stream_spacing);

        let response = self
            .client
            .client_streaming(requests, CallMetadata::uniform("clientStream"))
            .await??;
        sender.await??;

        Ok(response)
    }

    /// Drains the server's responses until end-of-input. Returns how many arrived.
    pub async fn server_stream(
        &mut self,
        mut on_response: impl FnMut(String),
    ) -> Result<usize, DriverError> {
        let responses = self
            .client
            .server_streaming(
                SERVER_STREAM_MESSAGE.to_string(),
                CallMetadata::uniform("serverStream"),
            )
            .await??;
        tokio::pin!(responses);

        let mut received = 0;
        while let Some(response) = responses.next().await {
            on_response(response?);
            received += 1;
        }
        Ok(received)
    }

    /// Sends three paced payloads from a separate task while draining responses, and
    /// half-closes after the third. Returns how many responses arrived.
    pub async fn bidirectional(
        &mut self,
        mut on_response: impl FnMut(String),
    ) -> Result<usize, DriverError> {
        let messages = (0..STREAMED_MESSAGES)
            .map(|i| format!("Bidirectional Stream Message {i}"))
            .collect();
        let (requests, sender) = spawn_sender(messages, self.config.bidirectional_spacing);

        let responses = self
            .client
            .bidirectional_streaming(requests, CallMetadata::uniform("bidirectionalStream"))
            .await??;
        tokio::pin!(responses);

        let mut received = 0;
        while let Some(response) = responses.next().await {
            on_response(response?);
            received += 1;
        }
        sender.await??;

        Ok(received)
    }

    /// Enqueues the three repeated messages on the persistent session. Fire-and-forget.
    pub async fn repeated_stream(&self, producer: &SessionProducer) -> Result<(), DriverError> {
        for (i, message) in REPEATED_MESSAGES.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.repeated_spacing).await;
            }
            producer.enqueue(*message)?;
        }
        Ok(())
    }
}

/// Feeds `messages` into a request stream from its own task, sleeping `spacing` after
/// each. The stream ends, half-closing the call, once the last message is out.
fn spawn_sender(
    messages: Vec<String>,
    spacing: Duration,
) -> (ReceiverStream<String>, JoinHandle<Result<(), DriverError>>) {
    let (tx, rx) = mpsc::channel(1);

    let sender = tokio::spawn(async move {
        for message in messages {
            tx.send(message)
                .await
                .map_err(|_| DriverError::SendFailed)?;
            tokio::time::sleep(spacing).await;
        }
        Ok::<(), DriverError>(())
    });

    (ReceiverStream::new(rx), sender)
}
