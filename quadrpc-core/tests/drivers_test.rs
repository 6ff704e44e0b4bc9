use quadrpc_core::drivers::{DriverConfig, Drivers};
use quadrpc_core::session::GrpcConnector;
use quadrpc_core::{CallClient, CallMetadata, DispatcherConfig, ReconnectPolicy, StreamSession};
use std::time::Duration;
use test_server::spawn_server;


fn fast_config() -> DriverConfig {
    DriverConfig {
        client_stream_spacing: Duration::from_millis(1),
        bidirectional_spacing: Duration::from_millis(5),
        repeated_spacing: Duration::from_millis(100),
    }
}

async fn setup() -> (String, Drivers) {
    let url = spawn_server(DispatcherConfig {
        delay: Duration::from_millis(1),
    })
    .await;
    let client = CallClient::connect(&url).await.unwrap();
    (url, Drivers::new(client, fast_config()))
}

#[tokio::test]
async fn test_unary_driver() {
    let (_, mut drivers) = setup().await;

    let res = drivers.unary().await.unwrap();

    assert_eq!(res, "Unary RPC response: Hello, Unary RPC!");
}

#[tokio::test]
async fn test_client_stream_driver() {
    let (_, mut drivers) = setup().await;

    let res = drivers.client_stream().await.unwrap();

    assert_eq!(
        res,
        "Client Stream RPC response: [Client Stream Message 0 Client Stream Message 1 Client Stream Message 2]"
    );
}

#[tokio::test]
async fn test_server_stream_driver() {
    let (_, mut drivers) = setup().await;
    let mut rendered = Vec::new();

    let count = drivers
        .server_stream(|response| rendered.push(response))
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        rendered,
        (0..3)
            .map(|i| format!("Server Stream RPC response {i}: Hello, Server Stream RPC!"))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_bidirectional_driver() {
    let (_, mut drivers) = setup().await;
    let mut rendered = Vec::new();

    let count = drivers
        .bidirectional(|response| rendered.push(response))
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        rendered,
        (0..3)
            .map(|i| format!(
                "Bidirectional Stream RPC response: Bidirectional Stream Message {i}"
            ))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_repeated_stream_driver_is_aggregated_in_order_on_close() {
    let (url, drivers) = setup().await;
    let client = CallClient::connect(&url).await.unwrap();
    let session = StreamSession::spawn(
        GrpcConnector::new(client, CallMetadata::uniform("repeatedStream")),
        ReconnectPolicy::default(),
    );

    drivers.repeated_stream(&session.producer()).await.unwrap();
    let report = session.close().await.unwrap();

    assert_eq!(report.sent, 3);
    assert_eq!(report.reconnects, 0);
    assert_eq!(
        report.response.unwrap(),
        "Client Stream RPC response: [Hello, 1 Hello, 2 Hello, 3]"
    );
}
