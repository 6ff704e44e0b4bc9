//! # quadrpc core
//!
//! `quadrpc-core` holds everything with behaviour in the quadrpc demo: the server-side
//! call dispatcher, a typed client for the four gRPC call shapes, and the persistent
//! client-stream session that multiplexes repeated messages onto one long-lived call.
//!
//! ## Key Components
//!
//! * **[`Dispatcher`]:** The `streaming.StreamingService` implementation. Unary, client
//!   streaming (aggregating), server streaming (three delayed responses) and bidirectional
//!   (one response per request) handlers.
//! * **[`CallClient`]:** A thin client over `tonic::client::Grpc` for any `GrpcService`,
//!   usable with a real `Channel` or directly against an in-process server.
//! * **[`StreamSession`]:** Owns one client-streaming call for the lifetime of the process,
//!   fed from an unbounded queue and recreated with backoff whenever a send fails.
//! * **[`drivers`]:** One routine per call shape, used by the interactive client.
//!
//! ## Re-exports
//!
//! This crate re-exports `tonic` and the protocol crate so binaries use compatible versions.
pub mod dispatcher;
pub mod drivers;
pub mod grpc;
pub mod metadata;
pub mod session;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use grpc::client::{CallClient, CallError};
pub use metadata::CallMetadata;
pub use session::{ReconnectPolicy, SessionError, SessionState, StreamSession};

// Re-exports
pub use quadrpc_proto as proto;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
