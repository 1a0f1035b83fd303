// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client/server control-plane specs over loopback TCP: registration,
//! relay into the outbound queue, and fan-out of observed commands.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use trestle::comm::control;
use trestle::comm::message::Message;
use trestle::comm::server::{ClientRegistry, Server};
use trestle::protocol::command_req::CommandReq;
use trestle::protocol::tmcc1::Tmcc1Command;
use trestle::protocol::tmcc2::Tmcc2Command;

use trestle_specs::Core;

async fn start_server(core: &Core) -> (Arc<Server>, std::net::SocketAddr) {
    let registry = Arc::new(ClientRegistry::new(core.counters.clone()));
    let server = Arc::new(Server {
        registry,
        buffer: core.buffer.clone(),
        listener: core.listener.clone(),
        dispatcher: core.dispatcher.clone(),
        store: core.store.clone(),
    });
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let serving = server.clone();
    let cancel = core.cancel.clone();
    tokio::spawn(async move {
        let _ = serving.serve_on(tcp, cancel).await;
    });
    (server, addr)
}

async fn register(stream: &mut TcpStream, port: u16, uuid: Uuid) {
    let frame = control::register_request(port, uuid, (0, 4, 2));
    stream.write_all(&frame).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn clients_register_and_are_evicted_by_a_new_uuid() {
    let core = Core::assemble();
    let (server, addr) = start_server(&core).await;

    let mut first = TcpStream::connect(addr).await.unwrap();
    let original = Uuid::new_v4();
    register(&mut first, 6001, original).await;
    assert_eq!(server.registry.len(), 1);

    // same advertised (ip, port), new uuid: the old session is evicted
    let mut second = TcpStream::connect(addr).await.unwrap();
    let replacement = Uuid::new_v4();
    register(&mut second, 6001, replacement).await;
    assert_eq!(server.registry.len(), 1);
    assert!(!server.registry.is_client(addr.ip(), 6001, original));
    assert!(server.registry.is_client(addr.ip(), 6001, replacement));
    assert_eq!(core.counters.count(trestle::error::ProtocolError::ClientEvicted), 1);
}

#[tokio::test]
async fn client_commands_are_relayed_and_rebroadcast() {
    let core = Core::assemble();
    let (_server, addr) = start_server(&core).await;
    let mut outbound = core.tap_outbound();

    let mut sender = TcpStream::connect(addr).await.unwrap();
    register(&mut sender, 6002, Uuid::new_v4()).await;
    let mut observer = TcpStream::connect(addr).await.unwrap();
    register(&mut observer, 6003, Uuid::new_v4()).await;

    let ring = CommandReq::tmcc2(Tmcc2Command::RingBell, 10).unwrap();
    sender.write_all(&ring.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // relayed into the shared outbound queue
    let queued = outbound.try_recv().unwrap();
    assert_eq!(queued, ring.as_bytes());

    // echoed to the other client
    let mut chunk = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(1), observer.read(&mut chunk))
        .await
        .unwrap()
        .unwrap();
    assert!(n >= 3);
    // the observer hears both the relay echo and the dispatcher fan-out;
    // the first three bytes are the ring command either way
    assert_eq!(&chunk[..3], ring.as_bytes().as_slice());
}

#[tokio::test]
async fn observed_commands_fan_out_to_clients() {
    let core = Core::assemble();
    let (server, addr) = start_server(&core).await;
    let _forwarding = server.forwarding_subscription();

    let mut client = TcpStream::connect(addr).await.unwrap();
    register(&mut client, 6004, Uuid::new_v4()).await;

    // a command observed on the physical link side
    let ring = CommandReq::tmcc2(Tmcc2Command::RingBell, 22).unwrap();
    core.dispatcher.offer(Message::Tmcc(ring.clone()));

    let mut chunk = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(1), client.read(&mut chunk))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&chunk[..n], ring.as_bytes().as_slice());
}

#[tokio::test]
async fn sync_request_replays_current_state() {
    let core = Core::assemble();
    let (_server, addr) = start_server(&core).await;

    // seed a switch into the mirror
    core.listener
        .offer(&CommandReq::tmcc1(Tmcc1Command::SwitchOut, 5).unwrap().as_bytes());
    assert!(core.settled(1).await);

    let mut client = TcpStream::connect(addr).await.unwrap();
    register(&mut client, 6005, Uuid::new_v4()).await;
    client.write_all(&control::sync_state_request(6005)).await.unwrap();

    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(100), client.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => received.extend_from_slice(&chunk[..n]),
            _ => break,
        }
    }

    // SENDING_STATE leads, SYNC_COMPLETE trails
    assert_eq!(&received[..3], &[0xFE, 0xF0, 0xF6]);
    assert_eq!(&received[received.len() - 3..], &[0xFE, 0xF0, 0xF5]);
    // a BASE_MEMORY record frame for the switch sits in between
    assert!(received.windows(2).any(|w| w == [0xD1, 0x29]));
}
