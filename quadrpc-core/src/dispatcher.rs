//! # Call Dispatcher
//!
//! The server side of `streaming.StreamingService`.
//!
//! Each handler owns its per-call state. The client-streaming handler keeps an
//! aggregation buffer that lives exactly as long as the call. Streaming handlers run
//! their send loop on a spawned task feeding a bounded channel, and the channel's
//! receiver is returned to tonic as the response stream.
//!
//! End-of-input (`Ok(None)` from [`Streaming::message`]) is the normal way for a
//! streaming call to finish; any receive error is handed back to the client as the
//! call's terminal status.
use crate::metadata::{self, CALL_FROM, CLIENT_IP, CUSTOM_HEADER};
use quadrpc_proto::StreamingService;
use quadrpc_proto::pb::{
    BidirectionalStreamRequest, BidirectionalStreamResponse, ClientStreamRequest,
    ClientStreamResponse, ServerStreamRequest, ServerStreamResponse, UnaryRequest, UnaryResponse,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

/// Number of responses produced by a server-streaming call.
pub const SERVER_STREAM_RESPONSES: usize = 3;

/// Default pause between successive sends of the streaming handlers.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(10);

const RESPONSE_BUFFER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Pause applied after every send of the server-streaming and bidirectional handlers.
    pub delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }
}

/// Implementation of the four `streaming.StreamingService` handlers.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }
}

pub fn unary_response(message: &str) -> String {
    format!("Unary RPC response: {message}")
}

/// Renders the aggregation buffer of a client-streaming call, e.g. `[a b c]`.
pub fn client_stream_response(messages: &[String]) -> String {
    format!("Client Stream RPC response: [{}]", messages.join(" "))
}

pub fn server_stream_response(index: usize, message: &str) -> String {
    format!("Server Stream RPC response {index}: {message}")
}

pub fn bidirectional_response(message: &str) -> String {
    format!("Bidirectional Stream RPC response: {message}")
}

fn log_metadata(call: &'static str, metadata: &MetadataMap) {
    debug!(
        call,
        custom_header = metadata::header(metadata, CUSTOM_HEADER),
        client_ip = metadata::header(metadata, CLIENT_IP),
        call_from = metadata::header(metadata, CALL_FROM),
        "call started"
    );
}

#[tonic::async_trait]
impl StreamingService for Dispatcher {
    type ServerStreamCallStream = ReceiverStream<Result<ServerStreamResponse, Status>>;
    type BidirectionalStreamCallStream = ReceiverStream<Result<BidirectionalStreamResponse, Status>>;

    async fn unary_call(
        &self,
        request: Request<UnaryRequest>,
    ) -> Result<Response<UnaryResponse>, Status> {
        log_metadata("unary", request.metadata());

        let message = request.into_inner().message;
        Ok(Response::new(UnaryResponse {
            response: unary_response(&message),
        }))
    }

    async fn client_stream_call(
        &self,
        request: Request<Streaming<ClientStreamRequest>>,
    ) -> Result<Response<ClientStreamResponse>, Status> {
        log_metadata("client_stream", request.metadata());

        let mut stream = request.into_inner();
        let mut messages = Vec::new();

        loop {
            match stream.message().await {
                Ok(Some(req)) => messages.push(req.message),
                Ok(None) => break,
                Err(status) => {
                    warn!(received = messages.len(), error = %status, "client stream aborted");
                    return Err(status);
                }
            }
        }

        info!(received = messages.len(), "client stream completed");
        Ok(Response::new(ClientStreamResponse {
            response: client_stream_response(&messages),
        }))
    }

    async fn server_stream_call(
        &self,
        request: Request<ServerStreamRequest>,
    ) -> Result<Response<Self::ServerStreamCallStream>, Status> {
        log_metadata("server_stream", request.metadata());

        let message = request.into_inner().message;
        let delay = self.config.delay;
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        tokio::spawn(async move {
            for i in 0..SERVER_STREAM_RESPONSES {
                let response = ServerStreamResponse {
                    response: server_stream_response(i, &message),
                };
                if tx.send(Ok(response)).await.is_err() {
                    warn!(sent = i, "server stream receiver dropped, aborting");
                    return;
                }
                tokio::time::sleep(delay).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn bidirectional_stream_call(
        &self,
        request: Request<Streaming<BidirectionalStreamRequest>>,
    ) -> Result<Response<Self::BidirectionalStreamCallStream>, Status> {
        log_metadata("bidirectional", request.metadata());

        let mut in_stream = request.into_inner();
        let delay = self.config.delay;
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        tokio::spawn(async move {
            loop {
                match in_stream.message().await {
                    Ok(Some(req)) => {
                        let response = BidirectionalStreamResponse {
                            response: bidirectional_response(&req.message),
                        };
                        if tx.send(Ok(response)).await.is_err() {
                            warn!("bidirectional receiver dropped, aborting");
                            break;
                        }
                        tokio::time::sleep(delay).await;
                    }
                    Ok(None) => {
                        debug!("bidirectional stream half-closed by client");
                        break;
                    }
                    Err(status) => {
                        warn!(error = %status, "bidirectional stream failed");
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
