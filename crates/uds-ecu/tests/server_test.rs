//! End-to-end tests: real TCP server on an ephemeral port, driven by UdsClient

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use uds_ecu::{
    ClientError, EcuServer, NegativeResponseCode, ProtocolDispatcher, ServerError,
    TransportConfig, UdsClient, UdsResponse,
};

struct TestServer {
    addr: SocketAddr,
    client: UdsClient,
    dispatcher: Arc<ProtocolDispatcher>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_on("127.0.0.1:0").await
    }

    async fn start_on(listen_address: &str) -> Self {
        let config = TransportConfig {
            listen_address: listen_address.to_string(),
            ..TransportConfig::default()
        };
        let dispatcher = Arc::new(ProtocolDispatcher::new());
        let server = EcuServer::bind(&config, dispatcher.clone())
            .await
            .expect("bind");
        let addr = server.local_addr().expect("local addr");

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        Self {
            addr,
            client: UdsClient::from_socket_addr(addr, Duration::from_secs(5)),
            dispatcher,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.expect("join").expect("server result");
    }
}

#[tokio::test]
async fn read_seeded_memory() {
    let server = TestServer::start().await;
    let response = server
        .client
        .send(&[0x23, 0x00, 0x10, 0x00, 0x03])
        .await
        .unwrap();
    assert_eq!(response, vec![0x63, 0xAA, 0xBB, 0xCC]);
    server.stop().await;
}

#[tokio::test]
async fn write_persists_across_connections() {
    let server = TestServer::start().await;
    let client = &server.client;

    assert_eq!(
        client.send(&[0x3D, 0x00, 0x20, 0x00, 0x05, 0x06]).await.unwrap(),
        vec![0x7D]
    );
    assert_eq!(
        client.send(&[0x23, 0x00, 0x20, 0x00, 0x02]).await.unwrap(),
        vec![0x63, 0x05, 0x06]
    );
    server.stop().await;
}

#[tokio::test]
async fn reset_restores_seeded_bytes() {
    let server = TestServer::start().await;
    let client = &server.client;

    client.write_memory(0x1000, &[0x00]).await.unwrap();
    assert_eq!(
        client.read_memory(0x1000, 1).await.unwrap().payload(),
        Some(&[0x00][..])
    );

    assert_eq!(client.send(&[0x11]).await.unwrap(), vec![0x51]);
    assert_eq!(
        client.send(&[0x23, 0x00, 0x10, 0x00, 0x01]).await.unwrap(),
        vec![0x63, 0xAA]
    );
    server.stop().await;
}

#[tokio::test]
async fn read_data_by_identifier() {
    let server = TestServer::start().await;

    let mut expected = vec![0x62, 0xF1, 0x00];
    expected.extend_from_slice(b"ECU12345");
    assert_eq!(server.client.send(&[0x22, 0xF1, 0x00]).await.unwrap(), expected);

    let response = server.client.read_data_by_identifier(0xF200).await.unwrap();
    assert_eq!(response.payload(), Some(&[0xF2, 0x00, b'1', b'.', b'0', b'.', b'0'][..]));

    let response = server.client.read_data_by_identifier(0x1234).await.unwrap();
    assert_eq!(
        response,
        UdsResponse::Negative {
            service_id: 0x22,
            nrc: NegativeResponseCode::RequestOutOfRange,
        }
    );
    server.stop().await;
}

#[tokio::test]
async fn negative_responses() {
    let server = TestServer::start().await;
    let client = &server.client;

    assert_eq!(client.send(&[0x10, 0x01]).await.unwrap(), vec![0x7F, 0x10, 0x11]);
    assert_eq!(client.send(&[0x23, 0x00]).await.unwrap(), vec![0x7F, 0x23, 0x13]);
    assert_eq!(
        client.send(&[0x23, 0x0F, 0xFF, 0xFF, 0x02]).await.unwrap(),
        vec![0x7F, 0x23, 0x31]
    );
    assert_eq!(
        client.send(&[0x3D, 0x0F, 0xFF, 0xFF, 0x01, 0x02]).await.unwrap(),
        vec![0x7F, 0x3D, 0x31]
    );
    server.stop().await;
}

#[tokio::test]
async fn connection_without_request_gets_no_response() {
    let server = TestServer::start().await;
    assert!(server.client.send(&[]).await.unwrap().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn response_is_sent_before_close() {
    let server = TestServer::start().await;
    let addr = server.addr;

    // Raw socket without half-close: server replies after its single read
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&[0x22, 0xF2, 0x00]).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert_eq!(&response[..3], &[0x62, 0xF2, 0x00]);
    server.stop().await;
}

#[tokio::test]
async fn concurrent_writers_are_never_torn() {
    let server = TestServer::start().await;

    let mut tasks = Vec::new();
    for fill in 1..=16u8 {
        let client = server.client.clone();
        tasks.push(tokio::spawn(async move {
            client.write_memory(0x4_0000, &[fill; 64]).await.unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), UdsResponse::parse(&[0x7D]));
    }

    let response = server.client.read_memory(0x4_0000, 64).await.unwrap();
    let data = response.payload().unwrap();
    assert_eq!(data.len(), 64);
    assert!(data.iter().all(|&b| b == data[0]));

    // Store state agrees with what went over the wire
    assert_eq!(
        server.dispatcher.read_memory(0x4_0000, 64).as_deref(),
        Some(data)
    );
    server.stop().await;
}

#[tokio::test]
async fn write_is_visible_in_store() {
    let server = TestServer::start().await;
    server.client.write_memory(0x0F_FFFE, &[0x11, 0x22]).await.unwrap();
    assert_eq!(
        server.dispatcher.read_memory(0x0F_FFFE, 2),
        Some(vec![0x11, 0x22])
    );
    assert_eq!(server.dispatcher.read_memory(0x0F_FFFF, 2), None);
    server.stop().await;
}

#[tokio::test]
async fn port_in_use_is_a_bind_error() {
    let server = TestServer::start().await;
    let config = TransportConfig {
        listen_address: server.addr.to_string(),
        ..TransportConfig::default()
    };

    let result = EcuServer::bind(&config, Arc::new(ProtocolDispatcher::new())).await;
    match result {
        Err(err @ ServerError::Bind { .. }) => {
            assert!(err.to_string().starts_with("Failed to bind"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second bind on the same port succeeded"),
    }
    server.stop().await;
}

#[tokio::test]
async fn bad_listen_address_is_a_config_error() {
    let config = TransportConfig {
        listen_address: "nowhere".to_string(),
        ..TransportConfig::default()
    };
    let result = EcuServer::bind(&config, Arc::new(ProtocolDispatcher::new())).await;
    assert!(matches!(result, Err(ServerError::Config(_))));
}

#[tokio::test]
async fn client_retries_until_server_is_up() {
    // Reserve a free port, then release it for the late-starting server
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let late_server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        TestServer::start_on(&addr.to_string()).await
    });

    let client = UdsClient::from_socket_addr(addr, Duration::from_secs(5))
        .with_retry(20, Duration::from_millis(50));
    assert_eq!(client.send(&[0x11]).await.unwrap(), vec![0x51]);

    late_server.await.unwrap().stop().await;
}

#[tokio::test]
async fn client_gives_up_after_configured_attempts() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let client = UdsClient::from_socket_addr(addr, Duration::from_secs(5))
        .with_retry(3, Duration::from_millis(100));
    let started = std::time::Instant::now();
    let result = client.send(&[0x11]).await;

    assert!(matches!(result, Err(ClientError::Connect { .. })));
    // Two pauses between three attempts
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn client_rejects_unencodable_requests() {
    let server = TestServer::start().await;
    assert!(server.client.read_memory(0x0100_0000, 1).await.is_err());
    assert!(server.client.write_memory(0x1000, &[]).await.is_err());
    server.stop().await;
}
