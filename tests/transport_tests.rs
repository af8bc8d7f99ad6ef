//! Integration tests for the raw transport against a local loopback listener.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use desyncx::transport::connect;

#[tokio::test]
async fn connect_reaches_a_plain_tcp_listener_and_exchanges_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 5];
        sock.read_exact(&mut buf).await.unwrap();
        sock.write_all(b"pong").await.unwrap();
    });

    let mut conn = connect(
        "127.0.0.1",
        addr.port(),
        Duration::from_secs(2),
        false,
        None,
    )
    .await
    .unwrap();

    conn.write_all(b"hello").await.unwrap();
    let mut response = [0u8; 4];
    conn.read_exact(&mut response).await.unwrap();
    assert_eq!(&response, b"pong");

    server.await.unwrap();
}

#[tokio::test]
async fn connect_fails_quickly_against_a_closed_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = connect("127.0.0.1", addr.port(), Duration::from_millis(500), false, None).await;
    assert!(result.is_err());
}
