//! # gRPC Transport
//!
//! Low-level building blocks for calling `streaming.StreamingService`.
//!
//! The server trait is generated by `quadrpc-proto`; the client side is written here on
//! top of `tonic::client::Grpc` so it can run over any `GrpcService`, which lets tests
//! call the dispatcher in-process as easily as over a `Channel`.
pub mod client;
