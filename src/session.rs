use std::net::SocketAddr;

use zeroize::Zeroizing;

use crate::crypto::CipherState;
use crate::message::{CipherSuite, CompressionMethod, ProtocolVersion, SessionId};

/// Who the peer proved to be during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerIdentity {
    /// The X.500 subject of the peer's leaf certificate.
    X500Principal(String),
    /// The peer's SubjectPublicKeyInfo (Raw Public Key mode).
    RawPublicKey(Vec<u8>),
    /// The negotiated pre-shared-key identity.
    PreSharedKey(String),
}

/// The security parameters of one DTLS connection.
///
/// Mutated exclusively by the handshake driver; handed to the record layer
/// once `active` flips, after which it carries the read/write cipher state
/// for the established connection.
#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,

    protocol_version: ProtocolVersion,
    session_id: SessionId,
    cipher_suite: CipherSuite,
    compression_method: CompressionMethod,

    read_epoch: u16,
    write_epoch: u16,

    /// Cipher negotiated but not yet activated by ChangeCipherSpec.
    pending_read_cipher: Option<CipherState>,
    pending_write_cipher: Option<CipherState>,
    current_read_cipher: Option<CipherState>,
    current_write_cipher: Option<CipherState>,

    /// Record sequence counters per write epoch.
    write_seq_epoch_0: u64,
    write_seq_epoch_n: u64,

    peer_identity: Option<PeerIdentity>,

    send_raw_public_key: bool,
    receive_raw_public_key: bool,

    active: bool,

    master_secret: Option<Zeroizing<Vec<u8>>>,
}

impl Session {
    pub fn new(peer: SocketAddr) -> Self {
        Session {
            peer,
            protocol_version: ProtocolVersion::DTLS1_2,
            session_id: SessionId::empty(),
            cipher_suite: CipherSuite::TLS_NULL_WITH_NULL_NULL,
            compression_method: CompressionMethod::Null,
            read_epoch: 0,
            write_epoch: 0,
            pending_read_cipher: None,
            pending_write_cipher: None,
            current_read_cipher: None,
            current_write_cipher: None,
            write_seq_epoch_0: 0,
            write_seq_epoch_n: 0,
            peer_identity: None,
            send_raw_public_key: false,
            receive_raw_public_key: false,
            active: false,
            master_secret: None,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub(crate) fn set_protocol_version(&mut self, version: ProtocolVersion) {
        self.protocol_version = version;
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub(crate) fn set_session_id(&mut self, id: SessionId) {
        self.session_id = id;
    }

    pub fn cipher_suite(&self) -> CipherSuite {
        self.cipher_suite
    }

    pub(crate) fn set_cipher_suite(&mut self, suite: CipherSuite) {
        self.cipher_suite = suite;
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.compression_method
    }

    pub(crate) fn set_compression_method(&mut self, method: CompressionMethod) {
        self.compression_method = method;
    }

    pub fn read_epoch(&self) -> u16 {
        self.read_epoch
    }

    pub fn write_epoch(&self) -> u16 {
        self.write_epoch
    }

    /// Switch the read state to the pending cipher; called on the peer's
    /// ChangeCipherSpec. Epochs only ever increase.
    pub(crate) fn increment_read_epoch(&mut self) {
        self.current_read_cipher = self.pending_read_cipher.take();
        self.read_epoch += 1;
    }

    /// Switch the write state to the pending cipher; called when we emit
    /// our ChangeCipherSpec.
    pub(crate) fn increment_write_epoch(&mut self) {
        self.current_write_cipher = self.pending_write_cipher.take();
        self.write_epoch += 1;
    }

    pub(crate) fn set_pending_ciphers(&mut self, read: CipherState, write: CipherState) {
        self.pending_read_cipher = Some(read);
        self.pending_write_cipher = Some(write);
    }

    /// The active read cipher, once the peer has switched.
    pub fn read_cipher(&self) -> Option<&CipherState> {
        self.current_read_cipher.as_ref()
    }

    /// The active write cipher, once we have switched.
    pub fn write_cipher(&self) -> Option<&CipherState> {
        self.current_write_cipher.as_ref()
    }

    /// Allocate the next record sequence number for the given write epoch.
    ///
    /// Epoch 0 keeps its own counter so a cookie re-hello continues the
    /// epoch-0 numbering even after the write epoch has advanced.
    pub(crate) fn next_write_sequence(&mut self, epoch: u16) -> u64 {
        let counter = if epoch == 0 {
            &mut self.write_seq_epoch_0
        } else {
            &mut self.write_seq_epoch_n
        };
        let seq = *counter;
        *counter += 1;
        seq
    }

    pub fn peer_identity(&self) -> Option<&PeerIdentity> {
        self.peer_identity.as_ref()
    }

    pub(crate) fn set_peer_identity(&mut self, identity: PeerIdentity) {
        self.peer_identity = Some(identity);
    }

    /// Whether our Certificate goes out as a Raw Public Key.
    pub fn send_raw_public_key(&self) -> bool {
        self.send_raw_public_key
    }

    pub(crate) fn set_send_raw_public_key(&mut self, raw: bool) {
        self.send_raw_public_key = raw;
    }

    /// Whether the server's Certificate arrives as a Raw Public Key.
    pub fn receive_raw_public_key(&self) -> bool {
        self.receive_raw_public_key
    }

    pub(crate) fn set_receive_raw_public_key(&mut self, raw: bool) {
        self.receive_raw_public_key = raw;
    }

    /// True once both Finished messages verified.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn master_secret(&self) -> Option<&[u8]> {
        self.master_secret.as_deref().map(|v| v.as_slice())
    }

    pub(crate) fn set_master_secret(&mut self, secret: Vec<u8>) {
        self.master_secret = Some(Zeroizing::new(secret));
    }
}
