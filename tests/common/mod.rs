//! Shared fixtures for link integration tests

#![allow(dead_code)]

use std::time::Duration;

use ctglink::protocol::{Frame, PROBE_HANDSHAKE};
use ctglink::transports::{MemoryHandle, MemoryTransport};
use ctglink::{Link, LinkConfig, LinkEvent};

/// Wire bytes of a `'C'` frame with every HR sample at `bpm` and TOCO at `toco / 2`.
pub fn ctg_frame(bpm: u16, toco: u8) -> Vec<u8> {
    let mut payload = vec![b'C', 0x80, 0x01];
    for _ in 0..12 {
        payload.extend_from_slice(&(bpm * 4).to_be_bytes());
    }
    payload.extend_from_slice(&[toco; 4]);
    payload.extend_from_slice(&0x0421u16.to_be_bytes());
    payload.push(0x04);
    payload.push(98);
    Frame::encode(&payload)
}

pub fn temperature_frame(raw: u8) -> Vec<u8> {
    Frame::encode(&[b'T', raw])
}

pub fn handshake() -> Vec<u8> {
    PROBE_HANDSHAKE.to_vec()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A link attached to a fresh memory transport.
pub async fn attached(config: LinkConfig) -> (Link, MemoryHandle) {
    init_tracing();
    let mut link = Link::new(config).expect("valid config");
    let (transport, handle) = MemoryTransport::new();
    link.set_transport(transport).await.expect("memory transport opens");
    (link, handle)
}

/// Next event, failing the test if none arrives within a generous (paused) deadline.
pub async fn next_event(link: &mut Link) -> LinkEvent {
    tokio::time::timeout(Duration::from_secs(60), link.next_event())
        .await
        .expect("event before deadline")
        .expect("event channel open")
}

/// Skip events until one matches.
pub async fn next_matching<F>(link: &mut Link, mut predicate: F) -> LinkEvent
where
    F: FnMut(&LinkEvent) -> bool,
{
    loop {
        let event = next_event(link).await;
        if predicate(&event) {
            return event;
        }
    }
}
