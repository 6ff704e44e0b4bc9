//! # Call Client
//!
//! This module wraps `tonic::client::Grpc` to provide one method per call shape of
//! `streaming.StreamingService`.
//!
//! ## How it works
//!
//! The [`CallClient`] speaks the generated prost messages through `tonic_prost::ProstCodec`
//! but exposes only plain strings: callers pass payloads in and get `response` fields out.
//!
//! `quadrpc-proto` generates no client. The method paths below are written out by hand
//! so every shape shares one `Grpc<S>` with the bounds the session connector relies on,
//! and the string-in/string-out surface stays in one place.
//!
//! ## Features
//!
//! * **Metadata Handling**: Converts a [`CallMetadata`] into Tonic's `MetadataMap`.
//! * **Access Patterns**: Unary, Server Streaming, Client Streaming and Bidirectional
//!   Streaming calls.
//!
//! # Error Handling
//!
//! - **`CallError`**: the call could not be issued (client not ready, invalid headers).
//! - **`tonic::Status`**: the call was issued and the server answered with an error code.
//!
//! Every call returns `Result<Result<T, Status>, CallError>` to keep the two apart.
use crate::{BoxError, metadata::CallMetadata};
use futures_util::{Stream, StreamExt};
use http::uri::PathAndQuery;
use http_body::Body as HttpBody;
use quadrpc_proto::pb::{
    BidirectionalStreamRequest, BidirectionalStreamResponse, ClientStreamRequest,
    ClientStreamResponse, ServerStreamRequest, ServerStreamResponse, UnaryRequest, UnaryResponse,
};
use std::str::FromStr;
use tonic::{
    Request, Status,
    client::GrpcService,
    metadata::{
        MetadataKey, MetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    transport::{Channel, Endpoint},
};

const UNARY_PATH: &str = "/streaming.StreamingService/UnaryCall";
const CLIENT_STREAM_PATH: &str = "/streaming.StreamingService/ClientStreamCall";
const SERVER_STREAM_PATH: &str = "/streaming.StreamingService/ServerStreamCall";
const BIDIRECTIONAL_PATH: &str = "/streaming.StreamingService/BidirectionalStreamCall";

#[derive(thiserror::Error, Debug)]
pub enum CallError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
}

/// A typed client for `streaming.StreamingService` over any gRPC service.
#[derive(Debug, Clone)]
pub struct CallClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl CallClient<Channel> {
    /// Connects to a server.
    ///
    /// # Arguments
    ///
    /// * `addr` - The server URI (e.g., `http://localhost:38888`).
    pub async fn connect(addr: &str) -> Result<Self, CallError> {
        let endpoint = Endpoint::new(addr.to_string())
            .map_err(|e| CallError::InvalidUrl(addr.to_string(), e))?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| CallError::ConnectionFailed(addr.to_string(), e))?;

        Ok(Self::new(channel))
    }
}

impl<S> CallClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Waits until the underlying service can accept a new call.
    pub async fn ready(&mut self) -> Result<(), CallError> {
        self.client
            .ready()
            .await
            .map_err(|e| CallError::ClientNotReady(e.into()))
    }

    /// Performs a Unary call (Single Request -> Single Response).
    ///
    /// # Returns
    /// * `Ok(Ok(String))` - Successful RPC execution.
    /// * `Ok(Err(Status))` - RPC executed, but server returned an error.
    /// * `Err(CallError)` - Failed to send request or connect.
    pub async fn unary(
        &mut self,
        message: String,
        metadata: CallMetadata,
    ) -> Result<Result<String, Status>, CallError> {
        self.ready().await?;

        let codec = tonic_prost::ProstCodec::<UnaryRequest, UnaryResponse>::default();
        let path = PathAndQuery::from_static(UNARY_PATH);
        let request = build_request(UnaryRequest { message }, metadata)?;

        match self.client.unary(request, path, codec).await {
            Ok(response) => Ok(Ok(response.into_inner().response)),
            Err(status) => Ok(Err(status)),
        }
    }

    /// Performs a Client Streaming call (Stream of Requests -> Single Response).
    ///
    /// The request stream ending is the end-of-input signal for the server, so the
    /// response only arrives after `messages` is exhausted.
    pub async fn client_streaming(
        &mut self,
        messages: impl Stream<Item = String> + Send + 'static,
        metadata: CallMetadata,
    ) -> Result<Result<String, Status>, CallError> {
        self.ready().await?;

        let codec = tonic_prost::ProstCodec::<ClientStreamRequest, ClientStreamResponse>::default();
        let path = PathAndQuery::from_static(CLIENT_STREAM_PATH);
        let requests = messages.map(|message| ClientStreamRequest { message });
        let request = build_request(requests, metadata)?;

        match self.client.client_streaming(request, path, codec).await {
            Ok(response) => Ok(Ok(response.into_inner().response)),
            Err(status) => Ok(Err(status)),
        }
    }

    /// Performs a Server Streaming call (Single Request -> Stream of Responses).
    ///
    /// # Returns
    ///
    /// * `Ok(Ok(Stream))` - Successful RPC execution.
    /// * `Ok(Err(Status))` - RPC executed, but server returned an error.
    /// * `Err(CallError)` - Failed to send request or connect.
    pub async fn server_streaming(
        &mut self,
        message: String,
        metadata: CallMetadata,
    ) -> Result<Result<impl Stream<Item = Result<String, Status>>, Status>, CallError> {
        self.ready().await?;

        let codec = tonic_prost::ProstCodec::<ServerStreamRequest, ServerStreamResponse>::default();
        let path = PathAndQuery::from_static(SERVER_STREAM_PATH);
        let request = build_request(ServerStreamRequest { message }, metadata)?;

        match self.client.server_streaming(request, path, codec).await {
            Ok(response) => Ok(Ok(response
                .into_inner()
                .map(|item| item.map(|r| r.response)))),
            Err(status) => Ok(Err(status)),
        }
    }

    /// Performs a Bidirectional Streaming call (Stream of Requests -> Stream of Responses).
    ///
    /// The send side is half-closed when `messages` ends.
    pub async fn bidirectional_streaming(
        &mut self,
        messages: impl Stream<Item = String> + Send + 'static,
        metadata: CallMetadata,
    ) -> Result<Result<impl Stream<Item = Result<String, Status>>, Status>, CallError> {
        self.ready().await?;

        let codec = tonic_prost::ProstCodec::<
            BidirectionalStreamRequest,
            BidirectionalStreamResponse,
        >::default();
        let path = PathAndQuery::from_static(BIDIRECTIONAL_PATH);
        let requests = messages.map(|message| BidirectionalStreamRequest { message });
        let request = build_request(requests, metadata)?;

        match self.client.streaming(request, path, codec).await {
            Ok(response) => Ok(Ok(response
                .into_inner()
                .map(|item| item.map(|r| r.response)))),
            Err(status) => Ok(Err(status)),
        }
    }
}

fn build_request<T>(payload: T, metadata: CallMetadata) -> Result<Request<T>, CallError> {
    let mut request = Request::new(payload);
    for (k, v) in metadata {
        let key = MetadataKey::from_str(&k).map_err(|source| CallError::InvalidMetadataKey {
            key: k.clone(),
            source,
        })?;
        let val = MetadataValue::from_str(&v)
            .map_err(|source| CallError::InvalidMetadataValue { key: k, source })?;
        request.metadata_mut().insert(key, val);
    }
    Ok(request)
}
