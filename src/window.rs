//! Classification of an incoming sequence number against the receive window.

use crate::{constants::WINDOW_SIZE, seq::SeqNum};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The `WINDOW_SIZE` slots behind the base: already delivered.
    PreviousWindow,
    /// Exactly the receive base.
    Base,
    /// Ahead of the base but inside the window.
    CurrentWindow,
    OutOfRange,
}

impl Classification {
    pub fn is_acked(self) -> bool {
        !matches!(self, Classification::OutOfRange)
    }
}

/// Membership is tested with ring distance, never with integer comparison,
/// so a window starting at 30 correctly covers 30, 31, 0, .., 7.
pub fn classify(base: SeqNum, seq: SeqNum) -> Classification {
    if seq == base {
        Classification::Base
    } else if seq.within(base, WINDOW_SIZE) {
        Classification::CurrentWindow
    } else if seq.within(base.sub(WINDOW_SIZE), WINDOW_SIZE) {
        Classification::PreviousWindow
    } else {
        Classification::OutOfRange
    }
}
