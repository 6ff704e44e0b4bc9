//! # quadrpc server
//!
//! Serves `streaming.StreamingService` and the gRPC reflection service on a TCP port
//! until Ctrl+C or SIGTERM, then lets in-flight calls finish.
use clap::Parser;
use quadrpc::cli::ServerArgs;
use quadrpc::config::ServerConfig;
use quadrpc::telemetry;
use quadrpc_core::Dispatcher;
use quadrpc_core::proto::{FILE_DESCRIPTOR_SET, SERVICE_NAME, StreamingServiceServer};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = ServerArgs::parse();
    let config = ServerConfig::try_from(args)?;

    telemetry::init_tracing();

    let listener = TcpListener::bind(config.addr).await?;
    info!(
        addr = %listener.local_addr()?,
        service = SERVICE_NAME,
        delay = ?config.dispatcher.delay,
        "listening"
    );

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .add_service(reflection)
        .add_service(StreamingServiceServer::new(Dispatcher::new(
            config.dispatcher,
        )))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }

    info!("shutdown signal received, waiting for in-flight calls");
}
