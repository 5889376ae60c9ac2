//! Reordering, fragmentation and duplicate tolerance (RFC 6347 §4.2.3),
//! plus record-layer edge cases.

mod handshake_common;

use std::sync::Arc;

use dclasp::message::{
    AlertDescription, AlertLevel, AlertMessage, Body, CipherSuite, ContentType, HandshakeType,
    Header,
};
use dclasp::{ClientHandshake, Error, HandshakeConfig, Record, StaticPskStore};
use handshake_common::*;

fn config() -> Arc<HandshakeConfig> {
    Arc::new(
        HandshakeConfig::builder(endpoint())
            .psk_store(Arc::new(StaticPskStore::new("ID", b"KEY")))
            .build()
            .unwrap(),
    )
}

fn config_with_fragment_length(len: usize) -> Arc<HandshakeConfig> {
    Arc::new(
        HandshakeConfig::builder(endpoint())
            .psk_store(Arc::new(StaticPskStore::new("ID", b"KEY")))
            .max_fragment_length(len)
            .build()
            .unwrap(),
    )
}

#[test]
fn server_hello_done_ahead_of_server_hello() {
    let mut hs = ClientHandshake::new(config(), Vec::new());
    hs.start().unwrap();

    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8)),
    );
    let shd_bytes = canonical(1, Body::ServerHelloDone);

    // ServerHelloDone arrives first: parked, no flight yet.
    assert!(hs
        .on_record(handshake_record(0, 1, shd_bytes))
        .unwrap()
        .is_none());

    // Once ServerHello fills the gap, the parked message drains and the
    // whole client flight comes out.
    let flight = hs
        .on_record(handshake_record(0, 0, sh_bytes))
        .unwrap()
        .expect("client flight after drain");
    assert_eq!(
        flight_types(&flight),
        vec![HandshakeType::ClientKeyExchange, HandshakeType::Finished]
    );
}

#[test]
fn fragmented_server_hello_reassembles() {
    let mut hs = ClientHandshake::new(config(), Vec::new());
    hs.start().unwrap();

    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8)),
    );
    let (_, full_header) = Header::parse(&sh_bytes).unwrap();
    let body = &sh_bytes[12..];
    let split = body.len() / 2;

    let frag = |offset: usize, chunk: &[u8]| -> Vec<u8> {
        let mut header = full_header;
        header.fragment_offset = offset as u32;
        header.fragment_length = chunk.len() as u32;
        let mut out = Vec::new();
        header.serialize(&mut out);
        out.extend_from_slice(chunk);
        out
    };

    // Second half first; nothing to process yet.
    assert!(hs
        .on_record(handshake_record(0, 0, frag(split, &body[split..])))
        .unwrap()
        .is_none());

    // First half completes the message.
    assert!(hs
        .on_record(handshake_record(0, 1, frag(0, &body[..split])))
        .unwrap()
        .is_none());

    // The reassembled ServerHello took effect.
    assert_eq!(
        hs.session().cipher_suite(),
        CipherSuite::TLS_PSK_WITH_AES_128_CCM_8
    );
}

#[test]
fn outbound_client_hello_fragments_to_limit() {
    let mut hs = ClientHandshake::new(config_with_fragment_length(10), Vec::new());
    let flight = hs.start().unwrap();

    let fragments = flight_handshakes(&flight);
    assert!(fragments.len() > 1, "hello should not fit one 10-byte chunk");

    let total = fragments[0].0.length as usize;
    let mut covered = 0;
    for (header, bytes) in &fragments {
        assert_eq!(header.msg_type, HandshakeType::ClientHello);
        assert_eq!(header.message_seq, 0);
        assert_eq!(header.length as usize, total);
        assert_eq!(header.fragment_offset as usize, covered);
        assert!(header.fragment_length <= 10);
        assert_eq!(bytes.len(), header.fragment_length as usize);
        covered += bytes.len();
    }
    assert_eq!(covered, total);
}

#[test]
fn hello_request_when_idle_restarts() {
    let mut hs = ClientHandshake::new(config(), Vec::new());

    let flight = hs
        .on_record(handshake_record(0, 0, canonical(0, Body::HelloRequest)))
        .unwrap()
        .expect("kickstarted hello");
    assert_eq!(flight_types(&flight), vec![HandshakeType::ClientHello]);
    assert!(flight.retransmit_needed);
}

#[test]
fn hello_request_mid_handshake_is_dropped() {
    let mut hs = ClientHandshake::new(config(), Vec::new());
    hs.start().unwrap();

    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8)),
    );
    hs.on_record(handshake_record(0, 0, sh_bytes)).unwrap();

    assert!(hs
        .on_record(handshake_record(0, 1, canonical(1, Body::HelloRequest)))
        .unwrap()
        .is_none());
    assert!(!hs.is_closed());
}

#[test]
fn warning_alert_is_ignored_fatal_closes() {
    let mut hs = ClientHandshake::new(config(), Vec::new());
    hs.start().unwrap();

    let mut warning = Vec::new();
    AlertMessage::new(AlertLevel::Warning, AlertDescription::Unknown(112)).serialize(&mut warning);
    assert!(hs
        .on_record(Record::new(ContentType::Alert, 0, 0, warning))
        .unwrap()
        .is_none());

    let mut fatal = Vec::new();
    AlertMessage::new(AlertLevel::Fatal, AlertDescription::HandshakeFailure)
        .serialize(&mut fatal);
    let err = hs
        .on_record(Record::new(ContentType::Alert, 0, 1, fatal))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::PeerAlert(AlertDescription::HandshakeFailure)
    ));

    // No counter-alert for a peer alert; the driver is simply closed.
    assert!(hs.fatal_alert().is_none());
    assert!(matches!(hs.on_record(ccs_record(2)).unwrap_err(), Error::Closed));
}

#[test]
fn application_data_during_handshake_is_fatal() {
    let mut hs = ClientHandshake::new(config(), Vec::new());
    hs.start().unwrap();

    let err = hs
        .on_record(Record::new(
            ContentType::ApplicationData,
            0,
            0,
            vec![0x01, 0x02],
        ))
        .unwrap_err();
    assert!(matches!(err, Error::HandshakeFailure(_)));
}
