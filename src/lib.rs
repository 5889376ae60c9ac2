//! dclasp — DTLS 1.2 client handshake (Sans-IO)
//!
//! dclasp is a focused DTLS 1.2 **client handshake** core aimed at
//! constrained-device protocols (CoAP and friends). It is a Sans-IO state
//! machine you embed behind your own UDP record layer: the record layer
//! decrypts and demultiplexes datagrams into typed records, feeds them to the
//! driver, and transmits the flights the driver returns. Retransmission
//! timing is owned by the record layer; the driver itself has no timers.
//!
//! # Goals
//! - **DTLS 1.2**: the client side of the RFC 6347 handshake.
//! - **Three authentication modes**: Pre-Shared Keys ([RFC 4279]),
//!   ECDHE-ECDSA with X.509 certificates, and ECDHE with Raw Public Keys
//!   ([RFC 7250]).
//! - **Safety**: `forbid(unsafe_code)` throughout the crate.
//! - **Minimal Rust-only deps**: small, well-maintained Rust crypto crates.
//!
//! ## Non-goals
//! - **DTLS 1.0 / 1.3**
//! - **Session resumption**
//! - **Renegotiation** (beyond honoring a server `HelloRequest` when idle)
//! - **Async** (the crate is Sans-IO and event-loop agnostic)
//!
//! # Cryptography surface
//! - **Cipher suites (TLS 1.2 over DTLS)**
//!   - `TLS_ECDHE_ECDSA_WITH_AES_128_CCM_8` ([RFC 7251])
//!   - `TLS_PSK_WITH_AES_128_CCM_8` ([RFC 6655])
//! - **Key exchange**: ECDHE (P-256/P-384) or PSK
//! - **Signatures**: ECDSA P-256/SHA-256, ECDSA P-384/SHA-384
//!
//! # Integration model
//! Drive the handshake with two calls:
//! - [`ClientHandshake::start`] — produce the initial ClientHello flight.
//! - [`ClientHandshake::on_record`] — feed one inbound record; collect the
//!   flight it triggers, if any.
//!
//! A [`Flight`] is an ordered list of wire records plus a
//! `retransmit_needed` flag; the record layer replays the last
//! retransmittable flight on its backoff timer without calling back into the
//! driver. When the driver hits a fatal condition, `on_record` returns an
//! error and [`ClientHandshake::fatal_alert`] yields the alert flight that
//! must still go on the wire; afterwards the driver refuses further input.
//!
//! [RFC 4279]: https://www.rfc-editor.org/rfc/rfc4279
//! [RFC 6655]: https://www.rfc-editor.org/rfc/rfc6655
//! [RFC 7250]: https://www.rfc-editor.org/rfc/rfc7250
//! [RFC 7251]: https://www.rfc-editor.org/rfc/rfc7251
#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::len_without_is_empty)]
// IANA cipher-suite names are kept verbatim.
#![allow(non_camel_case_types)]

// This is the full DTLS 1.2 handshake flow
//
// Client                                               Server
//
// 1     ClientHello                  -------->
//
// 2                                  <--------   HelloVerifyRequest
//                                                 (contains cookie)
//
// 3     ClientHello                  -------->
//       (with cookie)
// 4                                                     ServerHello
//                                                      Certificate*
//                                                ServerKeyExchange*
//                                               CertificateRequest*
//                                    <--------      ServerHelloDone
// 5     Certificate*
//       ClientKeyExchange
//       CertificateVerify*
//       [ChangeCipherSpec]
//       Finished                     -------->
// 6                                              [ChangeCipherSpec]
//                                    <--------             Finished
//       Application Data             <------->     Application Data

#[macro_use]
extern crate log;

mod client;
pub use client::ClientHandshake;

pub mod message;

mod flight;
pub use flight::{Flight, Record};

mod reassembly;

mod transcript;

mod session;
pub use session::{PeerIdentity, Session};

mod error;
pub use error::{ConfigError, Error};

mod config;
pub use config::{HandshakeConfig, HandshakeConfigBuilder};

mod psk;
pub use psk::{PskStore, StaticPskStore};

mod trust;
pub use trust::{CertVerifier, RootCertVerifier};

pub mod crypto;
