//! # quadrpc client
//!
//! Interactive console client. Drives the application lifecycle:
//!
//! 1. **Initialization**: parses [`ClientArgs`] and connects to the server.
//! 2. **Session**: starts the persistent [`StreamSession`] that carries every repeated
//!    message.
//! 3. **Menu**: runs one driver per menu choice until `Exit` or end of stdin.
//! 4. **Shutdown**: closes the session and prints its aggregate response. A failed
//!    call also closes the session, then exits with status 1.
use clap::Parser;
use quadrpc::cli::ClientArgs;
use quadrpc::config::ClientConfig;
use quadrpc::formatter::{FormattedString, GenericError};
use quadrpc::menu::{Choice, MENU};
use quadrpc::telemetry;
use quadrpc_core::drivers::{DriverError, Drivers};
use quadrpc_core::session::{GrpcConnector, SessionProducer};
use quadrpc_core::{CallClient, CallMetadata, StreamSession};
use std::io::Write;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum MenuError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("Failed to read stdin: {0}")]
    Stdin(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = ClientArgs::parse();
    let config = ClientConfig::try_from(args)?;

    telemetry::init_tracing();

    let client = connect_or_exit(&config.url).await;
    let session = StreamSession::spawn(
        GrpcConnector::new(client.clone(), CallMetadata::uniform("repeatedStream")),
        config.reconnect,
    );
    let mut drivers = Drivers::new(client, config.drivers);

    let outcome = run_menu(&mut drivers, &session.producer()).await;

    match session.close().await {
        Ok(report) => println!("{}", FormattedString::from(report)),
        Err(err) => eprintln!("{}", FormattedString::from(err)),
    }

    match outcome {
        Ok(()) => Ok(()),
        Err(MenuError::Driver(err)) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
        Err(err @ MenuError::Stdin(_)) => {
            eprintln!("{}", FormattedString::from(GenericError("Client Failed", err)));
            process::exit(1);
        }
    }
}

async fn connect_or_exit(url: &str) -> CallClient {
    match CallClient::connect(url).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

/// Prompts until the user picks `Exit` or stdin ends.
async fn run_menu(drivers: &mut Drivers, producer: &SessionProducer) -> Result<(), MenuError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{MENU}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let choice = match line.parse::<Choice>() {
            Ok(choice) => choice,
            Err(msg) => {
                println!("{}", FormattedString(msg));
                continue;
            }
        };

        match choice {
            Choice::Unary => {
                let response = drivers.unary().await?;
                println!("{}", FormattedString::from(response));
            }
            Choice::ClientStream => {
                let response = drivers.client_stream().await?;
                println!("{}", FormattedString::from(response));
            }
            Choice::ServerStream => {
                drivers.server_stream(|response| println!("{response}")).await?;
            }
            Choice::Bidirectional => {
                drivers.bidirectional(|response| println!("{response}")).await?;
            }
            Choice::RepeatedStream => {
                drivers.repeated_stream(producer).await?;
                println!(
                    "{}",
                    FormattedString("Repeated messages queued on the persistent stream".into())
                );
            }
            Choice::Exit => return Ok(()),
        }
    }
}
