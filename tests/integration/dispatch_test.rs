// tests/integration/dispatch_test.rs

//! End-to-end dispatch behavior: protocol branching, registry accounting,
//! and per-client failure isolation.

use super::test_helpers::{MapProcessor, read_reply, send, spawn_server, wait_for};
use dispatchd::core::processor::EchoProcessor;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

#[tokio::test]
async fn test_ping_maps_to_pong() {
    let server = spawn_server(Box::new(MapProcessor::new(&[("ping", "pong")]))).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    send(&mut client, b"ping").await;
    assert_eq!(read_reply(&mut client).await, "commands/pong");

    server.stop().await;
}

#[tokio::test]
async fn test_reply_is_prefixed_raw_bytes() {
    let server = spawn_server(Box::new(EchoProcessor::default())).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    send(&mut client, b"open project").await;

    // The reply is the literal prefix concatenation, no delimiter appended.
    let reply = read_reply(&mut client).await;
    assert_eq!(reply, "commands/open project");
    assert_eq!(reply.len(), "commands/".len() + "open project".len());

    server.stop().await;
}

#[tokio::test]
async fn test_connection_registered_exactly_once() {
    let server = spawn_server(Box::new(EchoProcessor::default())).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    let state = server.state.clone();
    wait_for(|| state.clients.len() == 1, "client to be registered").await;

    // Dispatching messages does not change membership.
    send(&mut client, b"one").await;
    read_reply(&mut client).await;
    send(&mut client, b"two").await;
    read_reply(&mut client).await;
    assert_eq!(state.clients.len(), 1);
    assert_eq!(state.stats.total_connections(), 1);
    assert_eq!(state.stats.total_messages(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_sentinel_closes_and_removes() {
    let server = spawn_server(Box::new(EchoProcessor::default())).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    let state = server.state.clone();
    wait_for(|| state.clients.len() == 1, "client to be registered").await;

    send(&mut client, b"fin").await;
    wait_for(|| state.clients.is_empty(), "client to be removed").await;

    // No reply is sent for the sentinel; the next read observes EOF.
    let mut buf = [0u8; 1024];
    let n = client.read(&mut buf).await.unwrap();
    assert_eq!(n, 0);
    assert_eq!(state.stats.total_messages(), 0);

    server.stop().await;
}

#[tokio::test]
async fn test_sentinel_only_affects_its_own_client() {
    let server = spawn_server(Box::new(MapProcessor::new(&[("ping", "pong")]))).await;
    let state = server.state.clone();

    let mut quitter = TcpStream::connect(server.addr).await.unwrap();
    let mut stayer = TcpStream::connect(server.addr).await.unwrap();
    wait_for(|| state.clients.len() == 2, "both clients registered").await;

    send(&mut quitter, b"fin").await;
    wait_for(|| state.clients.len() == 1, "quitter removed").await;

    send(&mut stayer, b"ping").await;
    assert_eq!(read_reply(&mut stayer).await, "commands/pong");

    server.stop().await;
}

#[tokio::test]
async fn test_two_clients_in_same_window() {
    let server = spawn_server(Box::new(MapProcessor::new(&[
        ("alpha", "first"),
        ("beta", "second"),
    ])))
    .await;
    let state = server.state.clone();

    let mut one = TcpStream::connect(server.addr).await.unwrap();
    let mut two = TcpStream::connect(server.addr).await.unwrap();
    wait_for(|| state.clients.len() == 2, "both clients registered").await;

    // Both requests are in flight at once; each client must get its own
    // mapped reply, in whatever cross-client order the server picks.
    send(&mut one, b"alpha").await;
    send(&mut two, b"beta").await;
    assert_eq!(read_reply(&mut one).await, "commands/first");
    assert_eq!(read_reply(&mut two).await, "commands/second");
    assert_eq!(state.stats.total_messages(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_utf8_closes_only_offender() {
    let server = spawn_server(Box::new(MapProcessor::new(&[("ping", "pong")]))).await;
    let state = server.state.clone();

    let mut offender = TcpStream::connect(server.addr).await.unwrap();
    let mut bystander = TcpStream::connect(server.addr).await.unwrap();
    wait_for(|| state.clients.len() == 2, "both clients registered").await;

    // A malformed payload closes the offending client without touching the
    // rest of the sessions or the accept loop.
    send(&mut offender, &[0xff, 0xfe, 0xfd]).await;
    wait_for(|| state.clients.len() == 1, "offender removed").await;

    let mut buf = [0u8; 1024];
    let n = offender.read(&mut buf).await.unwrap();
    assert_eq!(n, 0);

    send(&mut bystander, b"ping").await;
    assert_eq!(read_reply(&mut bystander).await, "commands/pong");

    // The server keeps accepting after the failure.
    let mut late = TcpStream::connect(server.addr).await.unwrap();
    send(&mut late, b"ping").await;
    assert_eq!(read_reply(&mut late).await, "commands/pong");

    server.stop().await;
}

#[tokio::test]
async fn test_idle_server_neither_raises_nor_blocks() {
    let server = spawn_server(Box::new(EchoProcessor::default())).await;

    // Several idle cycles with zero clients: nothing to poll, nothing fails.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(server.state.clients.is_empty());
    assert_eq!(server.state.stats.total_connections(), 0);

    // And shutdown completes promptly from the idle state.
    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("idle server should shut down promptly");
}

#[tokio::test]
async fn test_peer_disconnect_without_sentinel_is_cleaned_up() {
    let server = spawn_server(Box::new(EchoProcessor::default())).await;
    let state = server.state.clone();

    let client = TcpStream::connect(server.addr).await.unwrap();
    wait_for(|| state.clients.len() == 1, "client to be registered").await;

    // An abrupt close (no "fin") must still remove the registry entry.
    drop(client);
    wait_for(|| state.clients.is_empty(), "client to be removed").await;

    server.stop().await;
}
