//! # quadrpc protocol
//!
//! Generated message types and server trait for the `streaming.StreamingService`
//! contract, plus the encoded descriptor set used to serve gRPC reflection.
//!
//! Every request carries a single `message` string and every response a single
//! `response` string. The four RPCs differ only in their streaming shape.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/streaming.rs"));
}

pub use pb::streaming_service_server::{StreamingService, StreamingServiceServer};

/// Fully qualified gRPC service name.
pub const SERVICE_NAME: &str = "streaming.StreamingService";

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");
