//! Sequence numbers on a fixed-size ring.
//!
//! A [`SeqNum`] is confined to `[0, RING_SIZE)`. There is no meaningful
//! "less than" between two arbitrary ring values, so the type deliberately
//! implements only equality; ordering questions go through
//! [`SeqNum::distance_to`] or [`SeqNum::within`].

use std::fmt;

use crate::{
    constants::RING_SIZE,
    error::{RdtError, Result},
};

/// A sequence number reduced modulo [`RING_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqNum(u32);

impl SeqNum {
    /// Builds a sequence number, wrapping `raw` onto the ring.
    pub fn new(raw: u32) -> Self {
        Self(raw % RING_SIZE)
    }

    /// Accepts `raw` only if it already names a ring position; values read
    /// off the wire go through here rather than being wrapped.
    pub fn checked(raw: u32) -> Result<Self> {
        if raw < RING_SIZE {
            Ok(Self(raw))
        } else {
            Err(RdtError::SeqOutOfRing(raw))
        }
    }

    /// Ring position of the `index`-th packet of an unbounded stream.
    pub fn from_index(index: u64) -> Self {
        Self((index % RING_SIZE as u64) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Successor on the ring; `RING_SIZE - 1` wraps to `0`.
    pub fn next(self) -> Self {
        self.add(1)
    }

    pub fn add(self, n: u32) -> Self {
        Self((self.0 + n % RING_SIZE) % RING_SIZE)
    }

    pub fn sub(self, n: u32) -> Self {
        Self((self.0 + RING_SIZE - n % RING_SIZE) % RING_SIZE)
    }

    /// Forward distance walking from `self` to `other`, e.g. 31 to 4 is 5.
    pub fn distance_to(self, other: SeqNum) -> u32 {
        (other.0 + RING_SIZE - self.0) % RING_SIZE
    }

    /// Whether `self` lies in the `len` slots starting at `start`.
    pub fn within(self, start: SeqNum, len: u32) -> bool {
        start.distance_to(self) < len
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
