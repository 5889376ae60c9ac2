#![no_main]

//! Fuzz target for handshake message parsing.
//!
//! Splits arbitrary bytes into handshake messages and decodes each body
//! under every parse context the client can be in, exercising the codec
//! error paths.

use libfuzzer_sys::fuzz_target;

use dclasp::message::{split_messages, Body, CipherSuite, ParseContext};

fuzz_target!(|data: &[u8]| {
    let contexts = [
        ParseContext::default(),
        ParseContext {
            cipher_suite: Some(CipherSuite::TLS_PSK_WITH_AES_128_CCM_8),
            receive_raw_public_key: false,
        },
        ParseContext {
            cipher_suite: Some(CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8),
            receive_raw_public_key: true,
        },
    ];

    let Ok(messages) = split_messages(data) else {
        return;
    };

    for (header, fragment) in messages {
        for ctx in &contexts {
            let _ = Body::parse(header.msg_type, &fragment, ctx);
        }
    }
});
