use crate::cli::{ClientArgs, ServerArgs};
use anyhow::{Context, bail};
use quadrpc_core::drivers::DriverConfig;
use quadrpc_core::{DispatcherConfig, ReconnectPolicy};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Runtime configuration of `quadrpc-server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub dispatcher: DispatcherConfig,
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let ip: IpAddr = args
            .host
            .trim()
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", args.host))?;

        Ok(Self {
            addr: SocketAddr::new(ip, args.port),
            dispatcher: DispatcherConfig {
                delay: Duration::from_millis(args.delay),
            },
        })
    }
}

/// Runtime configuration of `quadrpc-client`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server URL, e.g. `http://localhost:38888`.
    pub url: String,
    pub drivers: DriverConfig,
    pub reconnect: ReconnectPolicy,
}

impl TryFrom<ClientArgs> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(args: ClientArgs) -> Result<Self, Self::Error> {
        let host = args.host.trim();

        if host.is_empty() {
            bail!("QUADRPC_HOST must not be empty");
        }

        if args.port == 0 {
            bail!("QUADRPC_PORT must be greater than 0");
        }

        if args.max_reconnects == 0 {
            bail!("QUADRPC_MAX_RECONNECTS must be greater than 0");
        }

        if args.max_backoff_ms < args.initial_backoff_ms {
            bail!(
                "QUADRPC_MAX_BACKOFF_MS ({}) must not be lower than QUADRPC_INITIAL_BACKOFF_MS ({})",
                args.max_backoff_ms,
                args.initial_backoff_ms
            );
        }

        Ok(Self {
            url: format!("http://{host}:{}", args.port),
            drivers: DriverConfig {
                client_stream_spacing: Duration::from_millis(args.delay),
                ..DriverConfig::default()
            },
            reconnect: ReconnectPolicy {
                max_attempts: args.max_reconnects,
                initial_backoff: Duration::from_millis(args.initial_backoff_ms),
                max_backoff: Duration::from_millis(args.max_backoff_ms),
            },
        })
    }
}
