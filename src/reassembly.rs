//! Reassembly of fragmented handshake messages and parking of
//! out-of-order ones (RFC 6347 §4.2.3).

use std::collections::BTreeMap;

use crate::message::{HandshakeType, Header};
use crate::Error;

/// One complete, defragmented handshake message awaiting processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub msg_type: HandshakeType,
    pub message_seq: u16,
    pub body: Vec<u8>,
}

/// Per-message_seq fragment buffer.
#[derive(Debug)]
struct ReassemblyState {
    msg_type: HandshakeType,
    total_len: usize,
    buf: Vec<u8>,
    /// Sorted, non-adjacent coverage ranges (start, end).
    ranges: Vec<(usize, usize)>,
}

impl ReassemblyState {
    fn new(msg_type: HandshakeType, total_len: usize) -> Self {
        ReassemblyState {
            msg_type,
            total_len,
            buf: vec![0; total_len],
            ranges: Vec::new(),
        }
    }

    fn insert(&mut self, offset: usize, fragment: &[u8]) -> Result<(), Error> {
        let end = offset + fragment.len();
        if end > self.total_len {
            return Err(Error::ParseError(nom::error::ErrorKind::LengthValue));
        }

        // Overlaps are tolerated only when byte-identical with what we
        // already hold.
        for &(start, stop) in &self.ranges {
            let lo = offset.max(start);
            let hi = end.min(stop);
            if lo < hi && self.buf[lo..hi] != fragment[lo - offset..hi - offset] {
                return Err(Error::ParseError(nom::error::ErrorKind::Verify));
            }
        }

        self.buf[offset..end].copy_from_slice(fragment);

        self.ranges.push((offset, end));
        self.ranges.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(self.ranges.len());
        for &(start, stop) in &self.ranges {
            match merged.last_mut() {
                Some((_, last_stop)) if start <= *last_stop => {
                    *last_stop = (*last_stop).max(stop);
                }
                _ => merged.push((start, stop)),
            }
        }
        self.ranges = merged;

        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.ranges == [(0, self.total_len)] || (self.total_len == 0 && !self.ranges.is_empty())
    }
}

/// Collects fragments per `message_seq` until a message is whole.
#[derive(Debug, Default)]
pub struct Reassembler {
    states: BTreeMap<u16, ReassemblyState>,
}

impl Reassembler {
    pub fn new() -> Self {
        Reassembler::default()
    }

    /// Feed one fragment. Returns the complete message once coverage is
    /// full; its state entry is released at that point.
    pub fn push_fragment(
        &mut self,
        header: &Header,
        fragment: &[u8],
    ) -> Result<Option<InboundMessage>, Error> {
        if fragment.len() != header.fragment_length as usize {
            return Err(Error::ParseError(nom::error::ErrorKind::LengthValue));
        }

        let state = self
            .states
            .entry(header.message_seq)
            .or_insert_with(|| ReassemblyState::new(header.msg_type, header.length as usize));

        // A peer must not change its mind about a message mid-flight.
        if state.msg_type != header.msg_type || state.total_len != header.length as usize {
            return Err(Error::ParseError(nom::error::ErrorKind::Verify));
        }

        if header.length == 0 {
            // Header-only messages (HelloRequest, ServerHelloDone).
            state.ranges.push((0, 0));
        } else {
            state.insert(header.fragment_offset as usize, fragment)?;
        }

        if !state.is_complete() {
            trace!(
                "Incomplete message_seq {} ({} of {} bytes)",
                header.message_seq,
                state.ranges.iter().map(|(s, e)| e - s).sum::<usize>(),
                state.total_len
            );
            return Ok(None);
        }

        let state = self.states.remove(&header.message_seq).unwrap();
        Ok(Some(InboundMessage {
            msg_type: state.msg_type,
            message_seq: header.message_seq,
            body: state.buf,
        }))
    }
}

/// Complete messages that arrived ahead of their turn, keyed by
/// `message_seq` and drained as gaps fill.
#[derive(Debug, Default)]
pub struct PendingMessages {
    map: BTreeMap<u16, InboundMessage>,
}

impl PendingMessages {
    pub fn new() -> Self {
        PendingMessages::default()
    }

    /// Park a message; a message already waiting under the same sequence
    /// number is a retransmission and the newcomer is dropped.
    pub fn park(&mut self, message: InboundMessage) {
        use std::collections::btree_map::Entry;
        match self.map.entry(message.message_seq) {
            Entry::Vacant(slot) => {
                slot.insert(message);
            }
            Entry::Occupied(_) => {
                debug!("Dupe pending message_seq {}", message.message_seq);
            }
        }
    }

    /// Remove and return the message for `seq` if it has arrived. Removal
    /// happens exactly once; the caller processes what it takes.
    pub fn take(&mut self, seq: u16) -> Option<InboundMessage> {
        self.map.remove(&seq)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(seq: u16, length: u32, offset: u32, frag_len: u32) -> Header {
        Header {
            msg_type: HandshakeType::Certificate,
            length,
            message_seq: seq,
            fragment_offset: offset,
            fragment_length: frag_len,
        }
    }

    #[test]
    fn single_fragment_completes() {
        let mut r = Reassembler::new();
        let msg = r
            .push_fragment(&header(1, 4, 0, 4), &[0x01, 0x02, 0x03, 0x04])
            .unwrap()
            .unwrap();
        assert_eq!(msg.message_seq, 1);
        assert_eq!(msg.body, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn out_of_order_fragments() {
        let mut r = Reassembler::new();
        assert!(r
            .push_fragment(&header(2, 6, 3, 3), &[0x04, 0x05, 0x06])
            .unwrap()
            .is_none());
        let msg = r
            .push_fragment(&header(2, 6, 0, 3), &[0x01, 0x02, 0x03])
            .unwrap()
            .unwrap();
        assert_eq!(msg.body, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn consistent_overlap_tolerated() {
        let mut r = Reassembler::new();
        assert!(r
            .push_fragment(&header(3, 4, 0, 3), &[0x01, 0x02, 0x03])
            .unwrap()
            .is_none());
        let msg = r
            .push_fragment(&header(3, 4, 1, 3), &[0x02, 0x03, 0x04])
            .unwrap()
            .unwrap();
        assert_eq!(msg.body, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn conflicting_overlap_rejected() {
        let mut r = Reassembler::new();
        assert!(r
            .push_fragment(&header(3, 4, 0, 3), &[0x01, 0x02, 0x03])
            .unwrap()
            .is_none());
        assert!(r
            .push_fragment(&header(3, 4, 1, 3), &[0xFF, 0x03, 0x04])
            .is_err());
    }

    #[test]
    fn empty_body_message() {
        let mut r = Reassembler::new();
        let h = Header {
            msg_type: HandshakeType::ServerHelloDone,
            length: 0,
            message_seq: 4,
            fragment_offset: 0,
            fragment_length: 0,
        };
        let msg = r.push_fragment(&h, &[]).unwrap().unwrap();
        assert!(msg.body.is_empty());
    }

    #[test]
    fn pending_dedups_and_takes_once() {
        let mut pending = PendingMessages::new();
        let msg = InboundMessage {
            msg_type: HandshakeType::ServerHelloDone,
            message_seq: 5,
            body: vec![],
        };
        pending.park(msg.clone());
        pending.park(msg.clone());
        assert_eq!(pending.len(), 1);

        assert_eq!(pending.take(5), Some(msg));
        assert_eq!(pending.take(5), None);
    }
}
