//! # CLI
//!
//! Command-line interfaces of both binaries, defined with `clap`. Every flag can also
//! be set through its environment variable, and the binaries load a `.env` file before
//! parsing.
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "quadrpc-server",
    version,
    about = "gRPC server answering unary, client, server and bidirectional streaming calls"
)]
pub struct ServerArgs {
    /// IP address to bind.
    ///
    /// Environment variable: `QUADRPC_BIND_HOST`
    #[arg(long, env = "QUADRPC_BIND_HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    /// Port to listen on.
    ///
    /// Environment variable: `QUADRPC_PORT`
    #[arg(short, long, env = "QUADRPC_PORT", default_value_t = 38888)]
    pub port: u16,

    /// Pause in milliseconds after each send of the server-streaming and bidirectional
    /// handlers.
    ///
    /// Environment variable: `QUADRPC_DELAY_MS`
    #[arg(short, long, env = "QUADRPC_DELAY_MS", default_value_t = 10)]
    pub delay: u64,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "quadrpc-client",
    version,
    about = "Interactive client driving the four gRPC call shapes"
)]
pub struct ClientArgs {
    /// Server host name or address.
    ///
    /// Environment variable: `QUADRPC_HOST`
    #[arg(long, env = "QUADRPC_HOST", default_value_t = String::from("localhost"))]
    pub host: String,

    /// Server port.
    ///
    /// Environment variable: `QUADRPC_PORT`
    #[arg(short, long, env = "QUADRPC_PORT", default_value_t = 38888)]
    pub port: u16,

    /// Pause in milliseconds after each client-streaming send.
    ///
    /// Environment variable: `QUADRPC_DELAY_MS`
    #[arg(short, long, env = "QUADRPC_DELAY_MS", default_value_t = 10)]
    pub delay: u64,

    /// Attempts to open the persistent client stream before the session gives up.
    ///
    /// Environment variable: `QUADRPC_MAX_RECONNECTS`
    #[arg(long, env = "QUADRPC_MAX_RECONNECTS", default_value_t = 5)]
    pub max_reconnects: u32,

    /// Pause in milliseconds after the first failed attempt. Doubles on each retry.
    ///
    /// Environment variable: `QUADRPC_INITIAL_BACKOFF_MS`
    #[arg(long, env = "QUADRPC_INITIAL_BACKOFF_MS", default_value_t = 100)]
    pub initial_backoff_ms: u64,

    /// Upper bound in milliseconds for the pause between attempts.
    ///
    /// Environment variable: `QUADRPC_MAX_BACKOFF_MS`
    #[arg(long, env = "QUADRPC_MAX_BACKOFF_MS", default_value_t = 5000)]
    pub max_backoff_ms: u64,
}
