//! Shared helpers for client handshake integration tests.
//!
//! This file has no `#[test]` functions; Cargo compiles it as a no-op test
//! crate. Import it from other test files via `mod handshake_common;`.

#![allow(unused)]

use std::net::SocketAddr;
use std::sync::Arc;

use dclasp::crypto::{calculate_master_secret, generate_verify_data, psk_premaster_secret};
use dclasp::message::{
    split_messages, Body, CipherSuite, ClientHello, CompressionMethod, ContentType, Finished,
    Handshake, HandshakeType, HashAlgorithm, Header, ParseContext, ProtocolVersion, Random,
    ServerHello, SessionId,
};
use dclasp::{Flight, Record};

pub const ENDPOINT: &str = "127.0.0.1:5684";

pub fn endpoint() -> SocketAddr {
    ENDPOINT.parse().unwrap()
}

/// A fixed server random for scripted flights.
pub fn server_random() -> Random {
    let mut bytes = vec![0x5F, 0x37, 0xA9, 0x4B];
    bytes.extend_from_slice(&[0xA5; 28]);
    Random::parse(&bytes).unwrap().1
}

/// Serialize a body as one canonical (unfragmented) handshake message.
pub fn canonical(message_seq: u16, body: Body) -> Vec<u8> {
    let mut out = Vec::new();
    Handshake::new(message_seq, body).serialize(&mut out);
    out
}

/// Wrap handshake bytes in an inbound record.
pub fn handshake_record(epoch: u16, sequence_number: u64, fragment: Vec<u8>) -> Record {
    Record::new(ContentType::Handshake, epoch, sequence_number, fragment)
}

pub fn ccs_record(sequence_number: u64) -> Record {
    Record::new(
        ContentType::ChangeCipherSpec,
        0,
        sequence_number,
        vec![0x01],
    )
}

/// A plain ServerHello for the given suite, no extensions.
pub fn server_hello(suite: CipherSuite) -> ServerHello {
    ServerHello::new(
        ProtocolVersion::DTLS1_2,
        server_random(),
        SessionId::try_new(&[0xAA]).unwrap(),
        suite,
        CompressionMethod::Null,
    )
}

/// All `(header, fragment bytes)` pairs in a flight's handshake records.
pub fn flight_handshakes(flight: &Flight) -> Vec<(Header, Vec<u8>)> {
    flight
        .records
        .iter()
        .filter(|r| r.content_type == ContentType::Handshake)
        .flat_map(|r| split_messages(&r.fragment).expect("well-formed flight"))
        .collect()
}

/// The handshake message types emitted in a flight, in order.
pub fn flight_types(flight: &Flight) -> Vec<HandshakeType> {
    flight_handshakes(flight)
        .iter()
        .map(|(h, _)| h.msg_type)
        .collect()
}

/// Find one complete message of the given type in a flight and return its
/// canonical bytes (header + body).
pub fn find_message(flight: &Flight, msg_type: HandshakeType) -> Vec<u8> {
    let (header, body) = flight_handshakes(flight)
        .into_iter()
        .find(|(h, _)| h.msg_type == msg_type)
        .unwrap_or_else(|| panic!("flight has no {:?}", msg_type));
    assert!(!header.is_fragment(), "{:?} arrived fragmented", msg_type);

    let mut out = Vec::new();
    header.serialize(&mut out);
    out.extend_from_slice(&body);
    out
}

/// Parse the ClientHello out of a start flight.
pub fn parse_client_hello(flight: &Flight) -> (Header, ClientHello) {
    let bytes = find_message(flight, HandshakeType::ClientHello);
    let (_, header) = Header::parse(&bytes).unwrap();
    let (rest, hello) = ClientHello::parse(&bytes[12..]).unwrap();
    assert!(rest.is_empty());
    (header, hello)
}

/// The expected verify_data of a Finished message over the given
/// transcript bytes.
pub fn expected_verify_data(master_secret: &[u8], label: &str, transcript: &[u8]) -> [u8; 12] {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(transcript);
    generate_verify_data(HashAlgorithm::Sha256, master_secret, label, &hash).unwrap()
}

/// Master secret for a PSK handshake with the given key and randoms.
pub fn psk_master_secret(psk: &[u8], client_random: &[u8], server_random: &[u8]) -> Vec<u8> {
    let premaster = psk_premaster_secret(psk);
    calculate_master_secret(
        HashAlgorithm::Sha256,
        &premaster,
        client_random,
        server_random,
    )
    .unwrap()
}
