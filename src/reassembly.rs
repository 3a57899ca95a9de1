//! Out-of-order buffering and in-order delivery.
//!
//! [`ReceiverState`] holds the receive base and the payloads that arrived
//! ahead of it. It performs no socket I/O: [`ReceiverState::accept`] reports
//! which sequence number to acknowledge and pushes completed payloads into a
//! [`Sink`] in sequence order.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

use bytes::Bytes;

use crate::{
    cirbuf::CircularBuffer,
    seq::SeqNum,
    window::{classify, Classification},
};

/// Destination for reassembled bytes.
///
/// `append` must not return before the bytes are durable enough for the
/// caller to consider them delivered.
pub trait Sink: Send {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl Sink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Output file synced after every delivered payload.
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    /// Creates `path`, discarding anything a previous run left there.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }
}

impl Sink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.sync_data()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub datagrams_rx: u64,
    pub data_packets: u64,
    /// Retransmissions of already-delivered packets, re-acknowledged.
    pub duplicates: u64,
    /// Retransmissions of packets already buffered in the window.
    pub rebuffered: u64,
    pub out_of_range: u64,
    pub malformed: u64,
    pub bytes_delivered: u64,
}

/// What a single `accept` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub class: Classification,
    /// Sequence number to acknowledge, if any.
    pub ack: Option<SeqNum>,
    /// Number of payloads handed to the sink.
    pub delivered: usize,
}

#[derive(Debug, Default)]
pub struct ReceiverState {
    receive_base: SeqNum,
    pending: CircularBuffer<Bytes>,
    stats: ReceiveStats,
}

impl ReceiverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number expected, the left edge of the window.
    pub fn receive_base(&self) -> SeqNum {
        self.receive_base
    }

    /// Sequence numbers currently buffered ahead of the base.
    pub fn pending(&self) -> impl Iterator<Item = SeqNum> + '_ {
        self.pending.keys()
    }

    pub fn stats(&self) -> &ReceiveStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut ReceiveStats {
        &mut self.stats
    }

    /// Handles one data packet.
    ///
    /// Packets from the previous window are acknowledged again without
    /// touching state. A packet at the base is stored and the window slides
    /// as far as the buffered payloads allow. Other in-window packets are
    /// stored once; a retransmission never replaces the first copy.
    pub fn accept<S: Sink + ?Sized>(
        &mut self,
        seq: SeqNum,
        payload: Bytes,
        sink: &mut S,
    ) -> io::Result<Accepted> {
        self.stats.data_packets += 1;
        let class = classify(self.receive_base, seq);
        let mut delivered = 0;

        match class {
            Classification::PreviousWindow => self.stats.duplicates += 1,
            Classification::Base => {
                self.pending.insert_if_absent(seq, payload);
                delivered = self.slide_window(sink)?;
            }
            Classification::CurrentWindow => {
                if !self.pending.insert_if_absent(seq, payload) {
                    self.stats.rebuffered += 1;
                }
            }
            Classification::OutOfRange => self.stats.out_of_range += 1,
        }

        Ok(Accepted {
            class,
            ack: class.is_acked().then_some(seq),
            delivered,
        })
    }

    /// Delivers every contiguous payload starting at the base. On return
    /// nothing is buffered at the new base.
    fn slide_window<S: Sink + ?Sized>(&mut self, sink: &mut S) -> io::Result<usize> {
        let mut delivered = 0;
        while let Some(payload) = self.pending.get(self.receive_base) {
            sink.append(payload)?;
            self.stats.bytes_delivered += payload.len() as u64;
            self.pending.remove(self.receive_base);
            self.receive_base = self.receive_base.next();
            delivered += 1;
        }
        Ok(delivered)
    }
}
