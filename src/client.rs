// DTLS Client Handshake Flow:
//
// 1. Client sends ClientHello
// 2. Server may respond with HelloVerifyRequest containing a cookie
//    - If so, Client sends another ClientHello with the cookie
// 3. Server sends ServerHello, Certificate, ServerKeyExchange,
//    CertificateRequest (optional), ServerHelloDone
// 4. Client sends Certificate (if requested), ClientKeyExchange,
//    CertificateVerify (if client cert present), ChangeCipherSpec, Finished
// 5. Server sends ChangeCipherSpec, Finished
// 6. Handshake complete, application data can flow
//
// The driver is message-driven and has no timers: the record layer owns
// retransmission and replays the last flight verbatim.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tinyvec::{array_vec, ArrayVec};
use zeroize::Zeroizing;

use crate::crypto::{
    calculate_master_secret, ecdhe_outcome, generate_verify_data, leaf_certificate_info,
    null_outcome, psk_outcome, select_signature_algorithm, sign_handshake_messages,
    verify_signed_params, Ecdhe, KeyExchangeOutcome, KeyMaterial,
};
use crate::flight::{Flight, Record};
use crate::message::{
    split_messages, AlertMessage, Body, Certificate, CertificatePayload, CertificateRequest,
    CertificateVerify, CipherSuite, ClientHello, CompressionMethod, ContentType, Cookie,
    EcdhServerParams, Finished, Handshake, HandshakeType, Header, KeyExchangeAlgorithm,
    ParseContext, ProtocolVersion, Random, ServerHello, ServerKeyExchange, SessionId, HEADER_LEN,
};
use crate::reassembly::{InboundMessage, PendingMessages, Reassembler};
use crate::session::{PeerIdentity, Session};
use crate::transcript::Transcript;
use crate::{Error, HandshakeConfig};

/// The client-side handshake state machine.
///
/// Owns the [`Session`] it negotiates, the transcript, the reassembly
/// buffers and all half-computed key material. Create it, call
/// [`start`](Self::start) for the first flight, then feed every inbound
/// record through [`on_record`](Self::on_record).
pub struct ClientHandshake {
    config: Arc<HandshakeConfig>,

    /// The session being negotiated; handed off after activation.
    session: Session,

    /// The most recently processed or emitted handshake message type.
    /// `None` until `start` has produced the first ClientHello.
    state: Option<HandshakeType>,

    /// Set once a fatal alert went out or came in; all further input is
    /// refused.
    closed: bool,

    /// The alert flight produced by a fatal error, for the record layer to
    /// pick up.
    pending_alert: Option<Flight>,

    /// The hello we sent, kept so the cookie from a HelloVerifyRequest can
    /// be installed without touching any other field.
    client_hello: Option<ClientHello>,

    /// Client random, fixed across the cookie exchange.
    client_random: Option<Random>,

    /// Server random, from ServerHello.
    server_random: Option<Random>,

    /// The suite picked by the server; selects the key-exchange strategy.
    cipher_suite: Option<CipherSuite>,

    /// Whether ServerHello has been accepted; gates HelloVerifyRequest.
    server_hello_seen: bool,

    /// Stored CertificateRequest, honored at ServerHelloDone time.
    certificate_request: Option<CertificateRequest>,

    /// The server's SubjectPublicKeyInfo (from its certificate or RPK).
    server_public_key: Option<Vec<u8>>,

    /// X.500 subject of the server's leaf certificate, if X.509 was used.
    peer_subject: Option<String>,

    /// Ephemeral ECDH context, created when ServerKeyExchange arrives.
    ecdhe: Option<Ecdhe>,

    /// The server's ephemeral public point.
    server_ecdh_point: Option<Vec<u8>>,

    transcript: Transcript,
    reassembler: Reassembler,
    pending: PendingMessages,

    /// Next expected peer handshake message sequence number.
    next_receive_seq: u16,

    /// Next handshake message sequence number for sending.
    next_send_seq: u16,

    master_secret: Option<Zeroizing<Vec<u8>>>,

    /// Transcript hash including our Finished; the input for verifying the
    /// server's Finished.
    server_finished_hash: Option<Vec<u8>>,

    /// The application message that triggered the handshake, emitted once
    /// the session activates.
    initial_message: Vec<u8>,
}

impl ClientHandshake {
    /// Create a driver for one handshake with the configured server.
    ///
    /// `initial_message` is the application datagram to send as soon as the
    /// session is established; pass an empty vec if there is none.
    pub fn new(config: Arc<HandshakeConfig>, initial_message: Vec<u8>) -> ClientHandshake {
        let session = Session::new(config.endpoint());
        ClientHandshake {
            config,
            session,
            state: None,
            closed: false,
            pending_alert: None,
            client_hello: None,
            client_random: None,
            server_random: None,
            cipher_suite: None,
            server_hello_seen: false,
            certificate_request: None,
            server_public_key: None,
            peer_subject: None,
            ecdhe: None,
            server_ecdh_point: None,
            transcript: Transcript::new(),
            reassembler: Reassembler::new(),
            pending: PendingMessages::new(),
            next_receive_seq: 0,
            next_send_seq: 0,
            master_secret: None,
            server_finished_hash: None,
            initial_message,
        }
    }

    /// The session under negotiation.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Hand the session to the record layer once the handshake is done.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Whether a fatal condition has terminated this handshake.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The fatal alert flight produced by the last error, if any. The
    /// record layer sends it and then drops the driver.
    pub fn fatal_alert(&mut self) -> Option<Flight> {
        self.pending_alert.take()
    }

    /// Produce the initial ClientHello flight.
    pub fn start(&mut self) -> Result<Flight, Error> {
        if self.closed {
            return Err(Error::Closed);
        }
        if self.state.is_some() {
            return Err(Error::UnexpectedMessage(
                "handshake already started".to_string(),
            ));
        }
        self.start_flight()
    }

    /// Feed one record from the record layer; returns the flight it
    /// triggers, if any.
    pub fn on_record(&mut self, record: Record) -> Result<Option<Flight>, Error> {
        if self.closed {
            return Err(Error::Closed);
        }

        match self.process_record(record) {
            Ok(flight) => Ok(flight),
            Err(e) => {
                if let Some(alert) = e.alert() {
                    let mut body = Vec::with_capacity(2);
                    alert.serialize(&mut body);
                    let epoch = self.session.write_epoch();
                    let seq = self.session.next_write_sequence(epoch);
                    let mut flight = Flight::unretransmitted();
                    flight.add_record(Record::new(ContentType::Alert, epoch, seq, body));
                    self.pending_alert = Some(flight);
                }
                self.closed = true;
                Err(e)
            }
        }
    }

    fn process_record(&mut self, record: Record) -> Result<Option<Flight>, Error> {
        match record.content_type {
            ContentType::Alert => {
                let (_, alert) = AlertMessage::parse(&record.fragment)?;
                if alert.is_fatal() {
                    return Err(Error::PeerAlert(alert.description));
                }
                warn!("Ignoring warning alert: {:?}", alert.description);
                Ok(None)
            }
            ContentType::ChangeCipherSpec => {
                if record.fragment != [0x01] {
                    return Err(Error::ParseError(nom::error::ErrorKind::Verify));
                }
                debug!("Peer switched to epoch {}", self.session.read_epoch() + 1);
                self.session.increment_read_epoch();
                Ok(None)
            }
            ContentType::Handshake => self.process_handshake_record(&record.fragment),
            other => Err(Error::HandshakeFailure(format!(
                "record layer delivered unsupported content type {:?}",
                other
            ))),
        }
    }

    fn process_handshake_record(&mut self, fragment: &[u8]) -> Result<Option<Flight>, Error> {
        let mut flight: Option<Flight> = None;

        for (header, bytes) in split_messages(fragment)? {
            if header.message_seq < self.next_receive_seq {
                debug!(
                    "Dupe handshake {:?} with message_seq {}",
                    header.msg_type, header.message_seq
                );
                continue;
            }

            let Some(message) = self.reassembler.push_fragment(&header, &bytes)? else {
                continue;
            };

            if message.message_seq != self.next_receive_seq {
                trace!(
                    "Parking {:?} with message_seq {} (expecting {})",
                    message.msg_type,
                    message.message_seq,
                    self.next_receive_seq
                );
                self.pending.park(message);
                continue;
            }

            Self::merge_into(&mut flight, self.process_message(message)?);

            // A message that just became processable may unblock queued
            // ones; drain them in order, removing each exactly once.
            while let Some(next) = self.pending.take(self.next_receive_seq) {
                Self::merge_into(&mut flight, self.process_message(next)?);
            }
        }

        Ok(flight)
    }

    fn merge_into(flight: &mut Option<Flight>, extra: Option<Flight>) {
        match (flight.as_mut(), extra) {
            (Some(f), Some(e)) => f.merge(e),
            (None, Some(e)) => *flight = Some(e),
            _ => {}
        }
    }

    fn process_message(&mut self, message: InboundMessage) -> Result<Option<Flight>, Error> {
        let ctx = ParseContext {
            cipher_suite: self.cipher_suite,
            receive_raw_public_key: self.session.receive_raw_public_key(),
        };
        let body = Body::parse(message.msg_type, &message.body, &ctx)?;

        // Canonical unfragmented form, as the transcript records it.
        let mut canonical = Vec::with_capacity(HEADER_LEN + message.body.len());
        Header {
            msg_type: message.msg_type,
            length: message.body.len() as u32,
            message_seq: message.message_seq,
            fragment_offset: 0,
            fragment_length: message.body.len() as u32,
        }
        .serialize(&mut canonical);
        canonical.extend_from_slice(&message.body);

        self.next_receive_seq = message.message_seq + 1;

        let flight = match body {
            Body::HelloRequest => return self.received_hello_request(),
            Body::HelloVerifyRequest(hvr) => {
                return self.received_hello_verify_request(hvr.cookie).map(Some)
            }
            Body::ServerHello(server_hello) => {
                self.received_server_hello(server_hello)?;
                self.transcript.append(&canonical);
                self.state = Some(HandshakeType::ServerHello);
                None
            }
            Body::Certificate(certificate) => {
                self.received_server_certificate(certificate)?;
                self.transcript.append(&canonical);
                self.state = Some(HandshakeType::Certificate);
                None
            }
            Body::ServerKeyExchange(ske) => {
                let in_transcript = self.received_server_key_exchange(ske)?;
                if in_transcript {
                    self.transcript.append(&canonical);
                    self.state = Some(HandshakeType::ServerKeyExchange);
                }
                None
            }
            Body::CertificateRequest(request) => {
                self.certificate_request = Some(request);
                self.transcript.append(&canonical);
                self.state = Some(HandshakeType::CertificateRequest);
                None
            }
            Body::ServerHelloDone => {
                self.transcript.append(&canonical);
                self.state = Some(HandshakeType::ServerHelloDone);
                Some(self.received_server_hello_done()?)
            }
            Body::Finished(finished) => Some(self.received_server_finished(finished)?),
            other => {
                return Err(Error::UnexpectedMessage(format!(
                    "client received unexpected handshake message {:?}",
                    other.msg_type()
                )))
            }
        };

        Ok(flight)
    }

    /// Used by the server to kickstart a handshake; only honored while
    /// idle, dropped once negotiation is underway.
    fn received_hello_request(&mut self) -> Result<Option<Flight>, Error> {
        if self.state.is_none() {
            self.start_flight().map(Some)
        } else {
            debug!("Dropping HelloRequest mid-handshake");
            Ok(None)
        }
    }

    /// Answer the cookie challenge: the same hello, cookie installed,
    /// nothing else changed. The transcript restarts because the first
    /// hello and the HelloVerifyRequest are excluded from the handshake
    /// hash (RFC 6347 §4.2.1).
    fn received_hello_verify_request(&mut self, cookie: Cookie) -> Result<Flight, Error> {
        if self.server_hello_seen || self.state != Some(HandshakeType::ClientHello) {
            return Err(Error::UnexpectedMessage(
                "HelloVerifyRequest outside the first flight".to_string(),
            ));
        }

        let mut hello = self
            .client_hello
            .clone()
            .ok_or_else(|| Error::UnexpectedMessage("no stored ClientHello".to_string()))?;
        hello.set_cookie(cookie);
        self.client_hello = Some(hello.clone());

        self.transcript.reset();

        let mut flight = Flight::retransmittable();
        self.send_handshake(&mut flight, Body::ClientHello(hello))?;
        Ok(flight)
    }

    /// Store the negotiated security parameters.
    fn received_server_hello(&mut self, server_hello: ServerHello) -> Result<(), Error> {
        if !self
            .config
            .cipher_suites()
            .contains(&server_hello.cipher_suite)
        {
            return Err(Error::HandshakeFailure(format!(
                "server selected a suite we did not offer: {:?}",
                server_hello.cipher_suite
            )));
        }

        self.server_hello_seen = true;
        self.cipher_suite = Some(server_hello.cipher_suite);
        self.server_random = Some(server_hello.random);

        self.session
            .set_protocol_version(server_hello.server_version);
        self.session.set_session_id(server_hello.session_id);
        self.session.set_cipher_suite(server_hello.cipher_suite);
        self.session
            .set_compression_method(server_hello.compression_method);

        // RFC 7250: the certificate-type extensions settle which wire form
        // each side's Certificate takes.
        if let Some(ext) = server_hello.client_certificate_type_extension() {
            if ext.prefers_raw_public_key() {
                self.session.set_send_raw_public_key(true);
            }
        }
        if let Some(ext) = server_hello.server_certificate_type_extension() {
            if ext.prefers_raw_public_key() {
                self.session.set_receive_raw_public_key(true);
            }
        }

        debug!(
            "Negotiated {:?} with {:?}",
            server_hello.cipher_suite,
            self.session.peer()
        );
        Ok(())
    }

    /// Verify the server's certificate (or accept its raw key) and keep
    /// its public key for the ServerKeyExchange signature check.
    fn received_server_certificate(&mut self, certificate: Certificate) -> Result<(), Error> {
        match certificate.payload {
            CertificatePayload::RawPublicKey(spki) => {
                self.server_public_key = Some(spki);
            }
            CertificatePayload::X509(chain) => {
                let verifier = self.config.trust_store().ok_or_else(|| {
                    Error::CertificateError("no trust anchors configured".to_string())
                })?;
                verifier.verify_chain(&chain)?;

                let leaf = leaf_certificate_info(&chain[0].0)?;
                self.server_public_key = Some(leaf.spki_der);
                self.peer_subject = Some(leaf.subject);
            }
        }
        Ok(())
    }

    /// Handle ServerKeyExchange per the negotiated algorithm. Returns
    /// whether the message belongs in the transcript.
    fn received_server_key_exchange(&mut self, ske: ServerKeyExchange) -> Result<bool, Error> {
        match self.key_exchange() {
            KeyExchangeAlgorithm::EcDiffieHellman => {
                let ServerKeyExchange::Ecdh(params) = ske else {
                    return Err(Error::UnexpectedMessage(
                        "ECDH ServerKeyExchange expected".to_string(),
                    ));
                };
                self.received_ecdh_server_key_exchange(params)?;
                Ok(true)
            }
            KeyExchangeAlgorithm::Psk => {
                // Only the identity hint; stored via the transcript.
                Ok(true)
            }
            KeyExchangeAlgorithm::Null => {
                info!("Received unexpected ServerKeyExchange in NULL key exchange mode");
                Ok(false)
            }
        }
    }

    fn received_ecdh_server_key_exchange(
        &mut self,
        params: EcdhServerParams,
    ) -> Result<(), Error> {
        let spki = self.server_public_key.as_ref().ok_or_else(|| {
            Error::HandshakeFailure("ServerKeyExchange before Certificate".to_string())
        })?;
        let client_random = self
            .client_random
            .ok_or_else(|| Error::UnexpectedMessage("no client random".to_string()))?;
        let server_random = self
            .server_random
            .ok_or_else(|| Error::UnexpectedMessage("no server random".to_string()))?;

        verify_signed_params(
            spki,
            &client_random.to_bytes(),
            &server_random.to_bytes(),
            &params.params_bytes(),
            &params.signed,
        )?;

        // Signature checked out: the server has proven its identity.
        let identity = match &self.peer_subject {
            Some(subject) => PeerIdentity::X500Principal(subject.clone()),
            None => PeerIdentity::RawPublicKey(spki.clone()),
        };
        self.session.set_peer_identity(identity);

        // Unknown curves surface as HandshakeFailure from Ecdhe::new.
        self.ecdhe = Some(Ecdhe::new(params.named_curve)?);
        self.server_ecdh_point = Some(params.public_point);

        Ok(())
    }

    /// The server is done with its flight: answer with Certificate (if
    /// requested), ClientKeyExchange, CertificateVerify (if requested),
    /// ChangeCipherSpec and Finished, in exactly that order.
    fn received_server_hello_done(&mut self) -> Result<Flight, Error> {
        let suite = self
            .cipher_suite
            .ok_or_else(|| Error::UnexpectedMessage("ServerHelloDone before ServerHello".to_string()))?;
        let hash_algorithm = suite.hash_algorithm();

        let mut flight = Flight::retransmittable();

        // First, if required by server, send Certificate.
        if self.certificate_request.is_some() {
            let body = if self.session.send_raw_public_key() {
                let spki = self.config.client_spki().ok_or_else(|| {
                    Error::HandshakeFailure(
                        "certificate requested but no public key configured".to_string(),
                    )
                })?;
                Certificate::raw_public_key(spki)
            } else {
                Certificate::x509(self.config.certificate_chain().to_vec())
            };
            self.send_handshake(&mut flight, Body::Certificate(body))?;
        }

        // Second, ClientKeyExchange as the key-exchange algorithm demands.
        let outcome = self.key_exchange_outcome()?;
        self.send_handshake(
            &mut flight,
            Body::ClientKeyExchange(outcome.exchange.clone()),
        )?;

        // Third, derive the master secret and the key block.
        let client_random = self
            .client_random
            .ok_or_else(|| Error::UnexpectedMessage("no client random".to_string()))?
            .to_bytes();
        let server_random = self
            .server_random
            .ok_or_else(|| Error::UnexpectedMessage("no server random".to_string()))?
            .to_bytes();

        let master_secret = calculate_master_secret(
            hash_algorithm,
            &outcome.premaster_secret,
            &client_random,
            &server_random,
        )?;
        let key_material = KeyMaterial::derive(
            hash_algorithm,
            &master_secret,
            &client_random,
            &server_random,
        )?;
        // We read what the server writes and vice versa.
        self.session
            .set_pending_ciphers(key_material.server, key_material.client);
        self.session.set_master_secret(master_secret.clone());
        self.master_secret = Some(Zeroizing::new(master_secret));

        // Fourth, CertificateVerify over everything sent so far.
        if let Some(offered) = self
            .certificate_request
            .as_ref()
            .map(|r| r.supported_signature_algorithms.clone())
        {
            let config = Arc::clone(&self.config);
            let private_key = config.private_key().ok_or_else(|| {
                Error::HandshakeFailure(
                    "certificate requested but no private key configured".to_string(),
                )
            })?;
            let algorithm = select_signature_algorithm(private_key, &offered).ok_or_else(|| {
                Error::HandshakeFailure(
                    "cannot honor any signature algorithm offered by the server".to_string(),
                )
            })?;
            let signed =
                sign_handshake_messages(private_key, algorithm, self.transcript.bytes())?;
            self.send_handshake(
                &mut flight,
                Body::CertificateVerify(CertificateVerify::new(signed)),
            )?;
        }

        // Fifth, ChangeCipherSpec, then switch our write state.
        let ccs_seq = self.session.next_write_sequence(0);
        flight.add_record(Record::new(
            ContentType::ChangeCipherSpec,
            0,
            ccs_seq,
            vec![0x01],
        ));
        self.session.increment_write_epoch();

        // Sixth, Finished over the transcript hash so far.
        let master = self.master_secret.as_ref().expect("just derived");
        let handshake_hash = self.transcript.hash(hash_algorithm);
        let verify_data =
            generate_verify_data(hash_algorithm, master, "client finished", &handshake_hash)?;
        self.send_handshake(&mut flight, Body::Finished(Finished::new(&verify_data)))?;

        // The server's Finished covers our Finished too; the transcript
        // already grew when it was sent.
        self.server_finished_hash = Some(self.transcript.hash(hash_algorithm));

        Ok(flight)
    }

    fn key_exchange_outcome(&mut self) -> Result<KeyExchangeOutcome, Error> {
        match self.key_exchange() {
            KeyExchangeAlgorithm::EcDiffieHellman => {
                let ecdhe = self.ecdhe.as_ref().ok_or_else(|| {
                    Error::HandshakeFailure(
                        "ServerHelloDone without ServerKeyExchange".to_string(),
                    )
                })?;
                let point = self.server_ecdh_point.as_ref().ok_or_else(|| {
                    Error::HandshakeFailure("no server ECDH public point".to_string())
                })?;
                ecdhe_outcome(ecdhe, point)
            }
            KeyExchangeAlgorithm::Psk => {
                let store = self.config.psk_store().ok_or_else(|| {
                    Error::HandshakeFailure("PSK suite negotiated without a PSK store".to_string())
                })?;
                let peer = self.session.peer();
                let identity = store.identity(&peer).ok_or_else(|| {
                    Error::HandshakeFailure(format!("no PSK identity for peer {}", peer))
                })?;
                let key = store.key(&identity).ok_or_else(|| {
                    Error::HandshakeFailure(format!(
                        "no pre-shared key for identity {}",
                        identity
                    ))
                })?;

                debug!("Using PSK identity: {}", identity);
                self.session
                    .set_peer_identity(PeerIdentity::PreSharedKey(identity.clone()));

                Ok(psk_outcome(&identity, &key))
            }
            KeyExchangeAlgorithm::Null => Ok(null_outcome()),
        }
    }

    /// Verify the server's Finished; on success the session goes active
    /// and the queued application message is released.
    fn received_server_finished(&mut self, finished: Finished) -> Result<Flight, Error> {
        let suite = self
            .cipher_suite
            .ok_or_else(|| Error::UnexpectedMessage("Finished before ServerHello".to_string()))?;
        let master = self
            .master_secret
            .as_ref()
            .ok_or_else(|| Error::UnexpectedMessage("Finished before key derivation".to_string()))?;
        let expected_hash = self.server_finished_hash.as_ref().ok_or_else(|| {
            Error::UnexpectedMessage("server Finished before our own".to_string())
        })?;

        let expected = generate_verify_data(
            suite.hash_algorithm(),
            master,
            "server finished",
            expected_hash,
        )?;

        if !bool::from(expected[..].ct_eq(&finished.verify_data)) {
            return Err(Error::DecryptError(
                "server Finished verify_data mismatch".to_string(),
            ));
        }

        self.state = Some(HandshakeType::Finished);
        self.session.set_active(true);
        self.transcript.reset();
        debug!("Handshake complete with {:?}", self.session.peer());

        // Application data is not retransmitted.
        let mut flight = Flight::unretransmitted();
        if !self.initial_message.is_empty() {
            let epoch = self.session.write_epoch();
            let seq = self.session.next_write_sequence(epoch);
            flight.add_record(Record::new(
                ContentType::ApplicationData,
                epoch,
                seq,
                std::mem::take(&mut self.initial_message),
            ));
        }

        Ok(flight)
    }

    /// Build and send the initial ClientHello.
    fn start_flight(&mut self) -> Result<Flight, Error> {
        let mut cipher_suites = ArrayVec::<[CipherSuite; 32]>::new();
        for suite in self.config.cipher_suites() {
            cipher_suites.push(*suite);
        }
        let compression_methods = array_vec![[CompressionMethod; 4] => CompressionMethod::Null];

        let hello = ClientHello::new(
            ProtocolVersion::DTLS1_2,
            Random::new(),
            SessionId::empty(),
            Cookie::empty(),
            cipher_suites,
            compression_methods,
        )
        .with_extensions(self.config.send_raw_key());

        self.client_random = Some(hello.random);
        self.client_hello = Some(hello.clone());
        self.state = Some(HandshakeType::ClientHello);

        let mut flight = Flight::retransmittable();
        self.send_handshake(&mut flight, Body::ClientHello(hello))?;
        Ok(flight)
    }

    fn key_exchange(&self) -> KeyExchangeAlgorithm {
        self.cipher_suite
            .map(|s| s.key_exchange_algorithm())
            .unwrap_or_default()
    }

    /// Wrap a body into a handshake message, record it in the transcript,
    /// and fragment it into records of at most `max_fragment_length` body
    /// bytes each.
    fn send_handshake(&mut self, flight: &mut Flight, body: Body) -> Result<(), Error> {
        let handshake = Handshake::new(self.next_send_seq, body);
        self.next_send_seq += 1;

        let mut canonical = Vec::with_capacity(HEADER_LEN + handshake.header.length as usize);
        handshake.serialize(&mut canonical);
        self.transcript.append(&canonical);

        let body_bytes = &canonical[HEADER_LEN..];
        let total = body_bytes.len();
        let max = self.config.max_fragment_length().max(1);
        let epoch = self.session.write_epoch();

        let mut offset = 0;
        loop {
            let chunk = (total - offset).min(max);

            let mut header = handshake.header;
            header.fragment_offset = offset as u32;
            header.fragment_length = chunk as u32;

            let mut fragment = Vec::with_capacity(HEADER_LEN + chunk);
            header.serialize(&mut fragment);
            fragment.extend_from_slice(&body_bytes[offset..offset + chunk]);

            let seq = self.session.next_write_sequence(epoch);
            flight.add_record(Record::new(ContentType::Handshake, epoch, seq, fragment));

            offset += chunk;
            if offset >= total {
                break;
            }
        }

        Ok(())
    }
}
