#![no_main]

//! Fuzz target for the client driver's inbound record path.
//!
//! Feeds arbitrary bytes as handshake records into a started client and
//! checks it never panics, whatever the server throws at it.

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use dclasp::message::ContentType;
use dclasp::{ClientHandshake, HandshakeConfig, Record, StaticPskStore};

fuzz_target!(|data: &[u8]| {
    let config = HandshakeConfig::builder("127.0.0.1:5684".parse().unwrap())
        .psk_store(Arc::new(StaticPskStore::new("ID", b"KEY")))
        .build()
        .expect("valid config");

    let mut hs = ClientHandshake::new(Arc::new(config), Vec::new());
    let _ = hs.start();

    // One record per content type; the driver must only ever error, never
    // panic.
    for content_type in [
        ContentType::Handshake,
        ContentType::Alert,
        ContentType::ChangeCipherSpec,
    ] {
        let record = Record::new(content_type, 0, 0, data.to_vec());
        if hs.on_record(record).is_err() {
            return;
        }
    }
});
