use crate::{constants::RING_SIZE, seq::SeqNum};

/// One slot per ring position. Since the window never exceeds the ring, a
/// slot can only ever hold the payload for a single live sequence number.
#[derive(Clone, Debug)]
pub struct CircularBuffer<T> {
    values: Vec<Option<T>>,
    len: usize,
}

impl<T> Default for CircularBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CircularBuffer<T> {
    pub fn new() -> Self {
        Self {
            values: (0..RING_SIZE).map(|_| None).collect(),
            len: 0,
        }
    }

    /// Stores `val` at `seq` unless the slot is taken. Returns whether it was stored.
    pub fn insert_if_absent(&mut self, seq: SeqNum, val: T) -> bool {
        let slot = &mut self.values[seq.value() as usize];
        if slot.is_some() {
            return false;
        }
        *slot = Some(val);
        self.len += 1;
        true
    }

    pub fn get(&self, seq: SeqNum) -> Option<&T> {
        self.values[seq.value() as usize].as_ref()
    }

    pub fn remove(&mut self, seq: SeqNum) -> Option<T> {
        let val = self.values[seq.value() as usize].take();
        if val.is_some() {
            self.len -= 1;
        }
        val
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Occupied sequence numbers, in slot order.
    pub fn keys(&self) -> impl Iterator<Item = SeqNum> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| SeqNum::new(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut buf = CircularBuffer::new();
        assert!(buf.insert_if_absent(SeqNum::new(3), "first"));
        assert!(!buf.insert_if_absent(SeqNum::new(3), "second"));
        assert_eq!(buf.get(SeqNum::new(3)), Some(&"first"));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn remove_frees_slot() {
        let mut buf = CircularBuffer::new();
        buf.insert_if_absent(SeqNum::new(31), 7u8);
        assert_eq!(buf.remove(SeqNum::new(31)), Some(7));
        assert_eq!(buf.remove(SeqNum::new(31)), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn keys_lists_occupied_slots() {
        let mut buf = CircularBuffer::new();
        buf.insert_if_absent(SeqNum::new(30), ());
        buf.insert_if_absent(SeqNum::new(1), ());
        let keys: Vec<_> = buf.keys().map(SeqNum::value).collect();
        assert_eq!(keys, vec![1, 30]);
    }
}
