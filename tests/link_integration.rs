//! End-to-end tests of the read loop against a scripted transport.
//!
//! Time is paused, so idle polls, backoffs and the continuous-mode timeout
//! advance instantly.

mod common;

use std::time::Duration;

use common::{attached, ctg_frame, handshake, next_event, next_matching, temperature_frame};
use ctglink::protocol::{DLE, Frame, PLOTTER_HANDSHAKE, STX};
use ctglink::transports::MemoryTransport;
use ctglink::{CrcPolicy, LinkConfig, LinkError, LinkEvent, LinkMode};
use futures::StreamExt;

#[tokio::test(start_paused = true)]
async fn open_discards_input_and_sends_handshake() {
    let (link, handle) = attached(LinkConfig::default()).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(link.is_open());
    assert_eq!(handle.opens(), 1);
    assert_eq!(handle.input_discards(), 1);
    assert_eq!(handle.writes(), vec![PLOTTER_HANDSHAKE.to_vec()]);
}

#[tokio::test(start_paused = true)]
async fn handshake_can_be_disabled() {
    let config = LinkConfig { send_handshake: false, ..LinkConfig::default() };
    let (_link, handle) = attached(config).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(handle.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn framed_session_delivers_records() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.push_packet(handshake());
    handle.push_packet([ctg_frame(140, 20), temperature_frame(120)].concat());

    assert!(matches!(next_event(&mut link).await, LinkEvent::ModeChanged(LinkMode::Framed)));

    let event = next_event(&mut link).await;
    let ctg = event.as_record().and_then(|r| r.as_ctg()).expect("ctg record");
    assert_eq!(ctg.hr1, [140.0; 4]);
    assert_eq!(ctg.mhr, [140.0; 4]);
    assert_eq!(ctg.toco, [10.0; 4]);
    assert_eq!(ctg.spo2, 98);
    assert!(ctg.status.monitor_on());
    assert!(!ctg.malformed);

    let event = next_event(&mut link).await;
    let temperature = event.as_record().and_then(|r| r.as_temperature()).expect("temperature record");
    assert!((temperature.celsius - 37.0).abs() < 1e-9);

    assert_eq!(link.mode(), LinkMode::Framed);
}

#[tokio::test(start_paused = true)]
async fn frames_split_across_packets_are_reassembled() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.push_packet(handshake());
    let wire = ctg_frame(120, 10);
    for chunk in wire.chunks(9) {
        handle.push_packet(chunk);
    }

    assert!(matches!(next_event(&mut link).await, LinkEvent::ModeChanged(LinkMode::Framed)));
    let event = next_event(&mut link).await;
    assert_eq!(event.as_record().and_then(|r| r.as_ctg()).map(|c| c.hr2), Some([120.0; 4]));
}

#[tokio::test(start_paused = true)]
async fn handshake_split_across_packets_switches_mode() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    let hs = handshake();
    handle.push_packet(&hs[..5]);
    handle.push_packet([&hs[5..], temperature_frame(1).as_slice()].concat());

    assert!(matches!(next_event(&mut link).await, LinkEvent::RawData(_)));
    assert!(matches!(next_event(&mut link).await, LinkEvent::ModeChanged(LinkMode::Framed)));
    // Bytes after the handshake in the same packet are not lost
    assert!(next_event(&mut link).await.as_record().is_some());
}

#[tokio::test(start_paused = true)]
async fn text_session_after_threshold() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    for bpm in 140..143 {
        handle.push_packet(format!("HR1:{bpm}\r\n"));
    }

    assert!(matches!(next_event(&mut link).await, LinkEvent::RawData(_)));
    assert!(matches!(next_event(&mut link).await, LinkEvent::RawData(_)));
    assert!(matches!(next_event(&mut link).await, LinkEvent::ModeChanged(LinkMode::Text)));
    match next_event(&mut link).await {
        LinkEvent::TextLine(line) => assert_eq!(line.get("HR1"), Some(142.0)),
        other => panic!("expected text line, got {other:?}"),
    }

    handle.push_packet("HR1:1");
    handle.push_packet("43\tTOCO:7\n");
    match next_event(&mut link).await {
        LinkEvent::TextLine(line) => {
            assert_eq!(line.text, "HR1:143\tTOCO:7");
            assert_eq!(line.get("TOCO"), Some(7.0));
        }
        other => panic!("expected text line, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn packets_are_split_at_idle_gaps() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.push([0x01u8, 0x02]);
    handle.push([0x03u8]);
    handle.gap();
    handle.push_packet([0xFFu8]);

    let first = match next_event(&mut link).await {
        LinkEvent::RawData(packet) => packet,
        other => panic!("expected raw data, got {other:?}"),
    };
    let second = match next_event(&mut link).await {
        LinkEvent::RawData(packet) => packet,
        other => panic!("expected raw data, got {other:?}"),
    };
    assert_eq!(&*first.data, &[0x01, 0x02, 0x03]);
    assert_eq!(&*second.data, &[0xFF]);
    assert!(first.timestamp <= second.timestamp);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_kind_discards_input_and_recovers() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.push_packet(handshake());
    handle.push_packet([Frame::encode(&[b'Z', 1, 2]), temperature_frame(1)].concat());
    handle.push_packet(temperature_frame(2));

    assert!(matches!(next_event(&mut link).await, LinkEvent::ModeChanged(LinkMode::Framed)));
    match next_event(&mut link).await {
        LinkEvent::Error(err) => {
            assert!(matches!(err, LinkError::KindNotRecognized { kind: b'Z' }));
            assert!(err.user_message().starts_with("!Frame not recognised"));
        }
        other => panic!("expected error, got {other:?}"),
    }

    // The rest of the offending packet is discarded with it
    let event = next_event(&mut link).await;
    assert_eq!(event.as_record().and_then(|r| r.as_temperature()).map(|t| t.raw), Some(2));
    assert_eq!(handle.input_discards(), 2);
    assert!(link.is_open());
}

#[tokio::test(start_paused = true)]
async fn structural_error_is_reported_and_stream_continues() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.push_packet(handshake());
    handle.push_packet([vec![DLE, STX, b'C', DLE, 0x7F], temperature_frame(3)].concat());

    let error = next_matching(&mut link, |e| matches!(e, LinkEvent::Error(_))).await;
    let error = error.as_error().expect("error event");
    assert!(matches!(error, LinkError::Structural { byte: 0x7F, .. }));
    assert!(error.user_message().starts_with("!Error reading from CTG: Frame structure error"));

    let event = next_event(&mut link).await;
    assert_eq!(event.as_record().and_then(|r| r.as_temperature()).map(|t| t.raw), Some(3));
}

#[tokio::test(start_paused = true)]
async fn continuous_mode_times_out_and_keeps_running() {
    let (mut link, handle) = attached(LinkConfig::default()).await;

    let wire = link.write("G").await.unwrap();
    assert_eq!(wire, Frame::encode(b"G"));

    match next_event(&mut link).await {
        LinkEvent::Error(err) => {
            assert!(matches!(err, LinkError::Timeout { duration } if duration == Duration::from_secs(2)));
            assert!(err.user_message().starts_with("!Data from CTG has stopped"));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(handle.output_discards(), 1);
    assert!(link.is_open());

    link.write("H").await.unwrap();
    let quiet = tokio::time::timeout(Duration::from_secs(5), link.next_event()).await;
    assert!(quiet.is_err(), "no timeouts after leaving continuous mode");
}

#[tokio::test(start_paused = true)]
async fn silence_is_not_a_fault_outside_continuous_mode() {
    let (mut link, _handle) = attached(LinkConfig::default()).await;
    let quiet = tokio::time::timeout(Duration::from_secs(10), link.next_event()).await;
    assert!(quiet.is_err());
}

#[tokio::test(start_paused = true)]
async fn transport_failure_reports_error_then_disconnect() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.fail("cable pulled");

    match next_event(&mut link).await {
        LinkEvent::Error(err) => {
            assert_eq!(err.user_message(), "!Error reading from CTG: Transport failure: cable pulled");
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(matches!(next_event(&mut link).await, LinkEvent::Disconnected));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.closes(), 1);
    assert!(!link.is_open());
    assert!(matches!(link.write("G").await, Err(LinkError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn device_going_away_is_a_disconnect() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    handle.disconnect();
    assert!(matches!(next_event(&mut link).await, LinkEvent::Disconnected));
}

#[tokio::test(start_paused = true)]
async fn close_stops_loop_without_disconnect_event() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    link.close().await.unwrap();

    assert!(!link.is_open());
    assert!(!handle.is_open());
    assert_eq!(handle.closes(), 1);
    assert!(matches!(link.write("G").await, Err(LinkError::Closed)));

    let quiet = tokio::time::timeout(Duration::from_secs(1), link.next_event()).await;
    assert!(quiet.is_err(), "cancellation must not report a disconnect");

    // Closing twice is harmless
    link.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn set_transport_replaces_previous_connection() {
    let (mut link, first) = attached(LinkConfig::default()).await;
    let (transport, second) = MemoryTransport::named("second");
    link.set_transport(transport).await.unwrap();

    assert!(!first.is_open());
    assert_eq!(first.closes(), 1);
    assert_eq!(second.opens(), 1);

    second.push_packet([0x00u8]);
    assert!(matches!(next_event(&mut link).await, LinkEvent::RawData(_)));
    // A fresh connection starts unclassified
    assert_eq!(link.mode(), LinkMode::Unclassified);
}

#[tokio::test(start_paused = true)]
async fn outbound_payload_is_stuffed() {
    let (link, handle) = attached(LinkConfig::default()).await;
    let wire = link.write([DLE, b'A']).await.unwrap();

    assert_eq!(&wire[..7], &[DLE, STX, DLE, DLE, b'A', DLE, 0x03]);
    assert_eq!(wire.len(), 9);
    assert_eq!(handle.writes().last(), Some(&wire));
}

#[tokio::test(start_paused = true)]
async fn record_stream_filters_events() {
    let (mut link, handle) = attached(LinkConfig::default()).await;
    handle.push_packet(handshake());
    handle.push_packet(temperature_frame(50));

    let mut records = Box::pin(ctglink::events::records(link.take_events().unwrap()));
    let record = tokio::time::timeout(Duration::from_secs(60), records.next()).await.unwrap().unwrap();
    assert_eq!(record.as_temperature().map(|t| t.raw), Some(50));
}

#[tokio::test(start_paused = true)]
async fn malformed_records_follow_configuration() {
    let short = Frame::encode(&[b'C', 0x80, 0x01, 0x02]);

    let config = LinkConfig { deliver_malformed: true, ..LinkConfig::default() };
    let (mut link, handle) = attached(config).await;
    handle.push_packet(handshake());
    handle.push_packet(short);

    let event = next_matching(&mut link, |e| e.as_record().is_some()).await;
    assert!(event.as_record().unwrap().is_malformed());
}

#[tokio::test(start_paused = true)]
async fn crc_mismatch_is_rejected_when_configured() {
    let config = LinkConfig { crc_policy: CrcPolicy::Reject, ..LinkConfig::default() };
    let (mut link, handle) = attached(config).await;
    let mut bad = temperature_frame(9);
    let last = bad.len() - 1;
    bad[last] ^= 0x01;

    handle.push_packet(handshake());
    handle.push_packet([bad, temperature_frame(10)].concat());

    let error = next_matching(&mut link, |e| matches!(e, LinkEvent::Error(_))).await;
    assert!(matches!(error, LinkEvent::Error(LinkError::CrcMismatch { .. })));
    let event = next_event(&mut link).await;
    assert_eq!(event.as_record().and_then(|r| r.as_temperature()).map(|t| t.raw), Some(10));
}
