//! Wire format.
//!
//! Every field is a big-endian `u32`:
//!
//! ```text
//! +--------+--------+--------+-----------------+
//! |  kind  |  seq   | length | payload ...     |
//! +--------+--------+--------+-----------------+
//!  0        4        8        12
//! ```
//!
//! `decode` clamps the payload to whatever the datagram actually carries, so
//! a header that over-declares its length yields a shorter packet instead of
//! reading past the buffer. Sequence numbers outside the ring and lengths
//! above [`MAX_PAYLOAD`] are rejected outright.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    constants::{HEADER_SIZE, KIND_DATA, KIND_EOT, KIND_SACK, MAX_PAYLOAD},
    error::{RdtError, Result},
    seq::SeqNum,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Sack,
    Data,
    Eot,
}

impl PacketKind {
    pub fn to_wire(self) -> u32 {
        match self {
            PacketKind::Sack => KIND_SACK,
            PacketKind::Data => KIND_DATA,
            PacketKind::Eot => KIND_EOT,
        }
    }

    pub fn from_wire(raw: u32) -> Result<Self> {
        match raw {
            KIND_SACK => Ok(PacketKind::Sack),
            KIND_DATA => Ok(PacketKind::Data),
            KIND_EOT => Ok(PacketKind::Eot),
            other => Err(RdtError::UnknownKind(other)),
        }
    }
}

/// A decoded datagram. The length field is always the payload's length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketKind,
    pub seq: SeqNum,
    pub payload: Bytes,
}

impl Packet {
    pub fn data(seq: SeqNum, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: PacketKind::Data,
            seq,
            payload: payload.into(),
        }
    }

    /// Zero-length selective acknowledgment for `seq`.
    pub fn sack(seq: SeqNum) -> Self {
        Self {
            kind: PacketKind::Sack,
            seq,
            payload: Bytes::new(),
        }
    }

    pub fn eot() -> Self {
        Self {
            kind: PacketKind::Eot,
            seq: SeqNum::default(),
            payload: Bytes::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// An explicit EOT, or any packet without payload, ends the transfer.
    pub fn ends_transmission(&self) -> bool {
        self.kind == PacketKind::Eot || self.is_empty()
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u32(self.kind.to_wire());
        buf.put_u32(self.seq.value());
        buf.put_u32(self.payload.len() as u32);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    pub fn from_bytes(mut buf: Bytes) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(RdtError::Truncated { len: buf.len() });
        }
        let kind = PacketKind::from_wire(buf.get_u32())?;
        let seq = SeqNum::checked(buf.get_u32())?;
        let declared = buf.get_u32() as usize;
        if declared > MAX_PAYLOAD {
            return Err(RdtError::Oversized(declared));
        }
        let payload = buf.split_to(declared.min(buf.len()));

        Ok(Self { kind, seq, payload })
    }
}
