//! # Stream Connectors
//!
//! The seam between a [`super::StreamSession`] and the transport. A connector opens
//! client-streaming calls; each opened [`OutboundStream`] accepts payloads until the
//! call breaks, and can be half-closed to collect the server's aggregate response.
//!
//! [`GrpcConnector`] is the production implementation on top of [`CallClient`].
use crate::{BoxError, CallClient, metadata::CallMetadata};
use http_body::Body as HttpBody;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Status, client::GrpcService, transport::Channel};

/// Payloads buffered between the supervisor and the call task of one stream.
const STREAM_BUFFER: usize = 1;

/// A send on a stream that no longer accepts payloads. Carries the payload back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("client stream closed, could not send '{0}'")]
pub struct StreamSendError(pub String);

/// Opens client-streaming calls.
#[tonic::async_trait]
pub trait StreamConnector: Send + 'static {
    type Stream: OutboundStream;

    /// Starts a new client-streaming call. Errors are treated as call setup failures.
    async fn open(&mut self) -> Result<Self::Stream, Status>;
}

/// The send side of one open client-streaming call.
#[tonic::async_trait]
pub trait OutboundStream: Send + 'static {
    async fn send(&mut self, payload: String) -> Result<(), StreamSendError>;

    /// Half-closes the send side and waits for the server's single response.
    async fn finish(self) -> Result<String, Status>;
}

/// Opens `ClientStreamCall`s through a [`CallClient`].
#[derive(Debug, Clone)]
pub struct GrpcConnector<S = Channel> {
    client: CallClient<S>,
    metadata: CallMetadata,
}

impl<S> GrpcConnector<S> {
    pub fn new(client: CallClient<S>, metadata: CallMetadata) -> Self {
        Self { client, metadata }
    }
}

#[tonic::async_trait]
impl<S> StreamConnector for GrpcConnector<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + 'static,
    S::Error: Into<BoxError> + Send,
    S::Future: Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    type Stream = GrpcStream;

    async fn open(&mut self) -> Result<GrpcStream, Status> {
        self.client
            .ready()
            .await
            .map_err(|err| Status::unavailable(err.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let mut client = self.client.clone();
        let metadata = self.metadata.clone();

        let call = tokio::spawn(async move {
            match client
                .client_streaming(ReceiverStream::new(rx), metadata)
                .await
            {
                Ok(result) => result,
                Err(err) => Err(Status::unavailable(err.to_string())),
            }
        });

        Ok(GrpcStream { tx, call })
    }
}

/// A client-streaming call driven by its own task.
///
/// A send succeeds once the payload is in the one-slot buffer. A call that has
/// already failed is only noticed on the next send, after its task drops the buffer.
///
/// Dropping it without [`OutboundStream::finish`] abandons the call: the send side
/// closes and nobody waits for the response.
#[derive(Debug)]
pub struct GrpcStream {
    tx: mpsc::Sender<String>,
    call: JoinHandle<Result<String, Status>>,
}

#[tonic::async_trait]
impl OutboundStream for GrpcStream {
    async fn send(&mut self, payload: String) -> Result<(), StreamSendError> {
        self.tx
            .send(payload)
            .await
            .map_err(|err| StreamSendError(err.0))
    }

    async fn finish(self) -> Result<String, Status> {
        drop(self.tx);
        self.call
            .await
            .map_err(|err| Status::internal(format!("client stream task failed: {err}")))?
    }
}
