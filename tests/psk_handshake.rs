//! PSK handshake scenarios: full negotiation to activation, duplicate
//! suppression, Finished mismatch.

mod handshake_common;

use std::sync::Arc;

use dclasp::message::{
    Body, CipherSuite, ClientKeyExchange, ContentType, Finished, HandshakeType, ParseContext,
};
use dclasp::{ClientHandshake, Error, HandshakeConfig, PeerIdentity, StaticPskStore};
use handshake_common::*;

fn psk_config() -> Arc<HandshakeConfig> {
    Arc::new(
        HandshakeConfig::builder(endpoint())
            .psk_store(Arc::new(StaticPskStore::new("ID", b"KEY")))
            .build()
            .expect("valid PSK config"),
    )
}

fn start_psk_handshake() -> (ClientHandshake, Vec<u8>) {
    let mut hs = ClientHandshake::new(psk_config(), b"hello coap".to_vec());
    let flight1 = hs.start().expect("start flight");

    assert!(flight1.retransmit_needed);
    assert_eq!(flight_types(&flight1), vec![HandshakeType::ClientHello]);

    let client_hello_bytes = find_message(&flight1, HandshakeType::ClientHello);
    (hs, client_hello_bytes)
}

#[test]
fn psk_handshake_to_activation() {
    let (mut hs, client_hello_bytes) = start_psk_handshake();
    let (_, client_hello) = {
        let mut flight = dclasp::Flight::retransmittable();
        flight.records.push(dclasp::Record::new(
            ContentType::Handshake,
            0,
            0,
            client_hello_bytes.clone(),
        ));
        parse_client_hello(&flight)
    };

    // The offered suite list is exactly the PSK suite.
    assert_eq!(
        client_hello.cipher_suites.as_slice(),
        &[CipherSuite::TLS_PSK_WITH_AES_128_CCM_8]
    );
    assert!(client_hello.cookie.is_empty());

    // Server flight: ServerHello then ServerHelloDone.
    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8)),
    );
    let shd_bytes = canonical(1, Body::ServerHelloDone);

    assert!(hs
        .on_record(handshake_record(0, 0, sh_bytes.clone()))
        .expect("ServerHello accepted")
        .is_none());

    let flight2 = hs
        .on_record(handshake_record(0, 1, shd_bytes.clone()))
        .expect("ServerHelloDone accepted")
        .expect("client flight");

    // ClientKeyExchange, ChangeCipherSpec, Finished, in that order.
    assert!(flight2.retransmit_needed);
    assert_eq!(
        flight_types(&flight2),
        vec![HandshakeType::ClientKeyExchange, HandshakeType::Finished]
    );
    let content_types: Vec<_> = flight2.records.iter().map(|r| r.content_type).collect();
    assert_eq!(
        content_types,
        vec![
            ContentType::Handshake,
            ContentType::ChangeCipherSpec,
            ContentType::Handshake
        ]
    );

    // The ClientKeyExchange carries the PSK identity.
    let cke_bytes = find_message(&flight2, HandshakeType::ClientKeyExchange);
    let ctx = ParseContext {
        cipher_suite: Some(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8),
        ..Default::default()
    };
    let (_, cke) = ClientKeyExchange::parse(&cke_bytes[12..], &ctx).unwrap();
    assert_eq!(
        cke,
        ClientKeyExchange::Psk {
            identity: b"ID".to_vec()
        }
    );

    // The Finished goes out at epoch 1, after the epoch-0 CCS.
    let finished_record = flight2.records.last().unwrap();
    assert_eq!(finished_record.epoch, 1);
    assert_eq!(flight2.records[1].epoch, 0);

    // Check the client's verify_data against our own PRF computation.
    let master = psk_master_secret(b"KEY", &client_hello_bytes[14..46], &sh_bytes[14..46]);

    let client_finished_bytes = find_message(&flight2, HandshakeType::Finished);
    let mut transcript = Vec::new();
    transcript.extend_from_slice(&client_hello_bytes);
    transcript.extend_from_slice(&sh_bytes);
    transcript.extend_from_slice(&shd_bytes);
    transcript.extend_from_slice(&cke_bytes);

    let expected = expected_verify_data(&master, "client finished", &transcript);
    assert_eq!(&client_finished_bytes[12..], &expected[..]);

    // Server switches ciphers and finishes.
    assert!(hs.on_record(ccs_record(2)).unwrap().is_none());
    assert_eq!(hs.session().read_epoch(), 1);

    transcript.extend_from_slice(&client_finished_bytes);
    let server_verify = expected_verify_data(&master, "server finished", &transcript);
    let server_finished = canonical(2, Body::Finished(Finished::new(&server_verify)));

    let flight3 = hs
        .on_record(handshake_record(1, 0, server_finished))
        .expect("server Finished verified")
        .expect("application flight");

    // The queued application message is released, not retransmitted.
    assert!(!flight3.retransmit_needed);
    assert_eq!(flight3.records.len(), 1);
    assert_eq!(flight3.records[0].content_type, ContentType::ApplicationData);
    assert_eq!(flight3.records[0].epoch, 1);
    assert_eq!(flight3.records[0].fragment, b"hello coap");

    assert!(hs.session().is_active());
    assert_eq!(
        hs.session().peer_identity(),
        Some(&PeerIdentity::PreSharedKey("ID".to_string()))
    );
    assert_eq!(hs.session().master_secret(), Some(&master[..]));
    assert!(hs.session().write_cipher().is_some());
    assert!(hs.session().read_cipher().is_some());
}

#[test]
fn duplicate_server_hello_is_suppressed() {
    let (mut hs, client_hello_bytes) = start_psk_handshake();

    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8)),
    );

    assert!(hs
        .on_record(handshake_record(0, 0, sh_bytes.clone()))
        .unwrap()
        .is_none());

    // Retransmission with the same message_seq: silently dropped, no state
    // change, no flight.
    assert!(hs
        .on_record(handshake_record(0, 1, sh_bytes.clone()))
        .unwrap()
        .is_none());

    // The handshake proceeds, and the Finished verify_data only matches if
    // the duplicate was appended to the transcript exactly once.
    let shd_bytes = canonical(1, Body::ServerHelloDone);
    let flight2 = hs
        .on_record(handshake_record(0, 2, shd_bytes.clone()))
        .unwrap()
        .expect("client flight");

    let master = psk_master_secret(b"KEY", &client_hello_bytes[14..46], &sh_bytes[14..46]);
    let cke_bytes = find_message(&flight2, HandshakeType::ClientKeyExchange);
    let client_finished_bytes = find_message(&flight2, HandshakeType::Finished);

    let mut transcript = Vec::new();
    transcript.extend_from_slice(&client_hello_bytes);
    transcript.extend_from_slice(&sh_bytes);
    transcript.extend_from_slice(&shd_bytes);
    transcript.extend_from_slice(&cke_bytes);

    let expected = expected_verify_data(&master, "client finished", &transcript);
    assert_eq!(&client_finished_bytes[12..], &expected[..]);
}

#[test]
fn bad_server_finished_fails_decrypt_error() {
    let (mut hs, _) = start_psk_handshake();

    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8)),
    );
    hs.on_record(handshake_record(0, 0, sh_bytes)).unwrap();
    hs.on_record(handshake_record(0, 1, canonical(1, Body::ServerHelloDone)))
        .unwrap()
        .expect("client flight");
    hs.on_record(ccs_record(2)).unwrap();

    let forged = canonical(2, Body::Finished(Finished::new(&[0x42; 12])));
    let err = hs.on_record(handshake_record(1, 0, forged)).unwrap_err();
    assert!(matches!(err, Error::DecryptError(_)));

    // The failure produced a fatal alert and the driver is closed.
    let alert = hs.fatal_alert().expect("alert flight");
    assert_eq!(alert.records[0].content_type, ContentType::Alert);
    assert!(!hs.session().is_active());
    assert!(hs.is_closed());
    assert!(matches!(
        hs.on_record(ccs_record(9)).unwrap_err(),
        Error::Closed
    ));
}

#[test]
fn unknown_selected_suite_fails_handshake() {
    let (mut hs, _) = start_psk_handshake();

    // Server picks a suite we never offered.
    let sh_bytes = canonical(
        0,
        Body::ServerHello(server_hello(
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8,
        )),
    );
    let err = hs.on_record(handshake_record(0, 0, sh_bytes)).unwrap_err();
    assert!(matches!(err, Error::HandshakeFailure(_)));
}
