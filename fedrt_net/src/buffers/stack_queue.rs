//! `StackQueueRaw`: records grow up from the origin of a byte block while an index of
//! `(offset, size)` pairs grows down from the tail (spec.md §4.2). Used as the swap
//! target of [`crate::buffers::priority_queue::BlockingPriorityQueue`]'s normal channel.

#[derive(Debug, thiserror::Error)]
pub enum StackQueueError {
    #[error("record of {0} bytes does not fit in the remaining buffer space")]
    NoSpace(usize),
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    offset: usize,
    size: usize,
}

/// A dual-ended append-only buffer: data grows up from offset 0, an index of
/// `(offset, size)` entries grows down from the end of `data`.
#[derive(Debug, Default)]
pub struct StackQueueRaw {
    data: Vec<u8>,
    index: Vec<IndexEntry>,
}

impl StackQueueRaw {
    pub fn new() -> Self {
        StackQueueRaw { data: Vec::new(), index: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StackQueueRaw { data: Vec::with_capacity(capacity), index: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Append one record. Grows the backing store as needed; `NoSpace` is reserved for
    /// callers using a fixed-capacity arena (see spec.md §4.2) and is never returned here.
    pub fn push(&mut self, record: &[u8]) -> Result<(), StackQueueError> {
        let offset = self.data.len();
        self.data.extend_from_slice(record);
        self.index.push(IndexEntry { offset, size: record.len() });
        Ok(())
    }

    /// Pop the most recently pushed record (stack order).
    pub fn pop(&mut self) -> Option<Vec<u8>> {
        let entry = self.index.pop()?;
        Some(self.data[entry.offset..entry.offset + entry.size].to_vec())
    }

    /// Reverse extraction order in place by reversing the index array, turning LIFO
    /// pop order into the original push (FIFO) order.
    pub fn reverse(&mut self) {
        self.index.reverse();
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.index.clear();
    }

    /// Move all records out of `self` and into `other`, leaving `self` empty. Used by
    /// the priority queue's push/pull-stack swap.
    pub fn drain_into(&mut self, other: &mut StackQueueRaw) {
        std::mem::swap(self, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_lifo_order_by_default() {
        let mut q = StackQueueRaw::new();
        q.push(b"a").unwrap();
        q.push(b"b").unwrap();
        assert_eq!(q.pop().unwrap(), b"b");
        assert_eq!(q.pop().unwrap(), b"a");
        assert!(q.pop().is_none());
    }

    #[test]
    fn reverse_restores_fifo_order() {
        let mut q = StackQueueRaw::new();
        q.push(b"a").unwrap();
        q.push(b"b").unwrap();
        q.push(b"c").unwrap();
        q.reverse();
        assert_eq!(q.pop().unwrap(), b"a");
        assert_eq!(q.pop().unwrap(), b"b");
        assert_eq!(q.pop().unwrap(), b"c");
    }

    #[test]
    fn drain_into_swaps_contents() {
        let mut a = StackQueueRaw::new();
        let mut b = StackQueueRaw::new();
        a.push(b"x").unwrap();
        a.drain_into(&mut b);
        assert!(a.is_empty());
        assert_eq!(b.pop().unwrap(), b"x");
    }
}
