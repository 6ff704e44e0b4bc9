use quadrpc_core::proto::StreamingServiceServer;
use quadrpc_core::{CallClient, CallMetadata, Dispatcher, DispatcherConfig};
use std::time::{Duration, Instant};
use test_server::spawn_server;
use tokio_stream::StreamExt;


#[tokio::test]
async fn test_unary() {
    let url = spawn_server(DispatcherConfig::default()).await;
    let mut client = CallClient::connect(&url).await.unwrap();

    let res = client
        .unary("hello".to_string(), CallMetadata::uniform("unaryRPC"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(res, "Unary RPC response: hello");
}

#[tokio::test]
async fn test_unary_in_process() {
    let mut client = CallClient::new(StreamingServiceServer::new(Dispatcher::default()));

    let res = client
        .unary(String::new(), CallMetadata::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(res, "Unary RPC response: ");
}

#[tokio::test]
async fn test_client_streaming_aggregates_in_order() {
    let url = spawn_server(DispatcherConfig::default()).await;
    let mut client = CallClient::connect(&url).await.unwrap();

    let messages = tokio_stream::iter(vec![
        "A".to_string(),
        "B".to_string(),
        "C".to_string(),
    ]);

    let res = client
        .client_streaming(messages, CallMetadata::uniform("clientStream"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(res, "Client Stream RPC response: [A B C]");
}

#[tokio::test]
async fn test_client_streaming_without_payloads() {
    let mut client = CallClient::new(StreamingServiceServer::new(Dispatcher::default()));

    let res = client
        .client_streaming(tokio_stream::empty(), CallMetadata::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(res, "Client Stream RPC response: []");
}

#[tokio::test]
async fn test_server_streaming_yields_three_delayed_responses() {
    let delay = Duration::from_millis(50);
    let url = spawn_server(DispatcherConfig { delay }).await;
    let mut client = CallClient::connect(&url).await.unwrap();

    let stream = client
        .server_streaming("stream".to_string(), CallMetadata::uniform("serverStream"))
        .await
        .unwrap()
        .unwrap();

    let results: Vec<_> = stream
        .map(|r| (r.unwrap(), Instant::now()))
        .collect()
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "Server Stream RPC response 0: stream");
    assert_eq!(results[1].0, "Server Stream RPC response 1: stream");
    assert_eq!(results[2].0, "Server Stream RPC response 2: stream");

    // Allow a little scheduling slack below the configured delay.
    let slack = Duration::from_millis(5);
    for pair in results.windows(2) {
        assert!(pair[1].1.duration_since(pair[0].1) + slack >= delay);
    }
}

#[tokio::test]
async fn test_bidirectional_streaming_answers_each_payload_in_order() {
    let url = spawn_server(DispatcherConfig {
        delay: Duration::ZERO,
    })
    .await;
    let mut client = CallClient::connect(&url).await.unwrap();

    let payloads: Vec<String> = (0..5).map(|i| format!("Ping {i}")).collect();

    let stream = client
        .bidirectional_streaming(
            tokio_stream::iter(payloads.clone()),
            CallMetadata::uniform("bidirectionalStream"),
        )
        .await
        .unwrap()
        .unwrap();

    let results: Vec<_> = stream.map(|r| r.unwrap()).collect().await;
    let expected: Vec<_> = payloads
        .iter()
        .map(|p| format!("Bidirectional Stream RPC response: {p}"))
        .collect();

    assert_eq!(results, expected);
}

#[tokio::test]
async fn test_bidirectional_streaming_paces_responses() {
    let delay = Duration::from_millis(50);
    let url = spawn_server(DispatcherConfig { delay }).await;
    let mut client = CallClient::connect(&url).await.unwrap();

    let payloads: Vec<String> = (0..3).map(|i| format!("Ping {i}")).collect();

    let stream = client
        .bidirectional_streaming(
            tokio_stream::iter(payloads),
            CallMetadata::uniform("bidirectionalStream"),
        )
        .await
        .unwrap()
        .unwrap();

    let arrivals: Vec<_> = stream
        .map(|r| {
            r.unwrap();
            Instant::now()
        })
        .collect()
        .await;

    assert_eq!(arrivals.len(), 3);

    // All payloads are sent at once, so the gaps come from the server's delay.
    let slack = Duration::from_millis(5);
    for pair in arrivals.windows(2) {
        assert!(pair[1].duration_since(pair[0]) + slack >= delay);
    }
}

#[tokio::test]
async fn test_connect_to_invalid_url_fails() {
    let result = CallClient::connect("not a url").await;

    assert!(matches!(
        result,
        Err(quadrpc_core::CallError::InvalidUrl(..))
    ));
}
