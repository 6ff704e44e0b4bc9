use quadrpc_core::proto::pb::{
    BidirectionalStreamRequest, ClientStreamRequest, ClientStreamResponse, ServerStreamRequest,
    UnaryRequest, UnaryResponse,
};
use quadrpc_core::proto::{StreamingService, StreamingServiceServer};
use quadrpc_core::session::GrpcConnector;
use quadrpc_core::{
    CallClient, CallMetadata, Dispatcher, DispatcherConfig, ReconnectPolicy, SessionError,
    SessionState, StreamSession,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use test_server::spawn_server;
use tonic::{Request, Response, Status, Streaming};


/// Aborts its first client-stream call after reading one payload, then answers like the
/// dispatcher.
#[derive(Clone, Default)]
struct AbortFirstClientStream {
    inner: Dispatcher,
    aborted: Arc<AtomicBool>,
}

#[tonic::async_trait]
impl StreamingService for AbortFirstClientStream {
    type ServerStreamCallStream = <Dispatcher as StreamingService>::ServerStreamCallStream;
    type BidirectionalStreamCallStream =
        <Dispatcher as StreamingService>::BidirectionalStreamCallStream;

    async fn unary_call(
        &self,
        request: Request<UnaryRequest>,
    ) -> Result<Response<UnaryResponse>, Status> {
        self.inner.unary_call(request).await
    }

    async fn client_stream_call(
        &self,
        request: Request<Streaming<ClientStreamRequest>>,
    ) -> Result<Response<ClientStreamResponse>, Status> {
        if self.aborted.swap(true, Ordering::SeqCst) {
            return self.inner.client_stream_call(request).await;
        }

        let mut stream = request.into_inner();
        stream.message().await?;
        Err(Status::aborted("first client stream aborted"))
    }

    async fn server_stream_call(
        &self,
        request: Request<ServerStreamRequest>,
    ) -> Result<Response<Self::ServerStreamCallStream>, Status> {
        self.inner.server_stream_call(request).await
    }

    async fn bidirectional_stream_call(
        &self,
        request: Request<Streaming<BidirectionalStreamRequest>>,
    ) -> Result<Response<Self::BidirectionalStreamCallStream>, Status> {
        self.inner.bidirectional_stream_call(request).await
    }
}

#[tokio::test]
async fn test_session_multiplexes_payloads_onto_one_call() {
    let url = spawn_server(DispatcherConfig::default()).await;
    let client = CallClient::connect(&url).await.unwrap();
    let session = StreamSession::spawn(
        GrpcConnector::new(client, CallMetadata::uniform("repeatedStream")),
        ReconnectPolicy::default(),
    );

    for i in 0..20 {
        session.enqueue(format!("m{i}")).unwrap();
    }
    let report = session.close().await.unwrap();

    let expected: Vec<_> = (0..20).map(|i| format!("m{i}")).collect();
    assert_eq!(report.sent, 20);
    assert_eq!(report.dropped, 0);
    assert_eq!(
        report.response.unwrap(),
        format!("Client Stream RPC response: [{}]", expected.join(" "))
    );
}

#[tokio::test]
async fn test_session_in_process_reaches_active_then_closed() {
    let client = CallClient::new(StreamingServiceServer::new(Dispatcher::default()));
    let session = StreamSession::spawn(
        GrpcConnector::new(client, CallMetadata::new()),
        ReconnectPolicy::default(),
    );
    let mut state = session.watch_state();

    state
        .wait_for(|s| matches!(s, SessionState::Active { generation: 1 }))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Active { generation: 1 });

    session.enqueue("only").unwrap();
    let producer = session.producer();
    let report = session.close().await.unwrap();

    assert_eq!(
        report.response.unwrap(),
        "Client Stream RPC response: [only]"
    );
    assert_eq!(*state.borrow_and_update(), SessionState::Closed);
    assert!(matches!(producer.enqueue("late"), Err(SessionError::Closed)));
}

#[tokio::test]
async fn test_close_without_payloads_yields_empty_aggregate() {
    let client = CallClient::new(StreamingServiceServer::new(Dispatcher::default()));
    let session = StreamSession::spawn(
        GrpcConnector::new(client, CallMetadata::new()),
        ReconnectPolicy::default(),
    );

    let report = session.close().await.unwrap();

    assert_eq!(report.sent, 0);
    assert_eq!(report.response.unwrap(), "Client Stream RPC response: []");
}

#[tokio::test]
async fn test_aborted_call_is_replaced_by_one_fresh_stream() {
    let service = AbortFirstClientStream::default();
    let client = CallClient::new(StreamingServiceServer::new(service.clone()));
    let session = StreamSession::spawn(
        GrpcConnector::new(client, CallMetadata::uniform("repeatedStream")),
        ReconnectPolicy::default(),
    );
    let mut state = session.watch_state();

    // "a" is accepted by the first call, which the server then aborts.
    session.enqueue("a").unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(service.aborted.load(Ordering::SeqCst));

    // "b" finds the first call gone and is dropped while the stream is recreated.
    session.enqueue("b").unwrap();
    state
        .wait_for(|s| matches!(s, SessionState::Active { generation: 2 }))
        .await
        .unwrap();

    session.enqueue("c").unwrap();
    let report = session.close().await.unwrap();

    assert_eq!(report.reconnects, 1);
    assert_eq!(report.dropped, 1);
    // "a" counts as sent although its call never produced a response.
    assert_eq!(report.sent, 2);
    assert_eq!(
        report.response.unwrap(),
        "Client Stream RPC response: [c]"
    );
}
