//! `BlockingPriorityQueue`: single-producer-multi-consumer, with a priority channel
//! drained ahead of a normal channel built from two swapped stacks (spec.md §4.3).

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::circular::{BufferError, CircularBufferRaw};
use super::stack_queue::StackQueueRaw;

struct Inner {
    /// Normal-channel items awaiting a swap into `pull`.
    push_stack: StackQueueRaw,
    /// Normal-channel items ready to pop, in FIFO order.
    pull_stack: StackQueueRaw,
    /// Priority-channel records, backed by an actual ring buffer so a full arena
    /// behaves like the shared-memory transport's bounded lane rather than a plain
    /// deque: it grows (doubling) only when `push` finds no room, never silently.
    priority: CircularBufferRaw,
    priority_len: usize,
    empty: bool,
}

impl Inner {
    fn push_priority_record(&mut self, data: &[u8]) {
        loop {
            match self.priority.push(data) {
                Ok(()) => {
                    self.priority_len += 1;
                    return;
                }
                Err(BufferError::NoSpace(_)) => self.grow_priority_arena(),
                Err(err) => panic!("priority arena corrupt: {err}"),
            }
        }
    }

    fn grow_priority_arena(&mut self) {
        let mut drained = Vec::with_capacity(self.priority_len);
        let mut scratch = vec![0u8; self.priority.capacity() * 2];
        while !self.priority.empty() {
            let n = self.priority.pop(&mut scratch).expect("checked non-empty");
            drained.push(scratch[..n].to_vec());
        }
        self.priority = CircularBufferRaw::new(self.priority.capacity() * 2);
        for record in drained {
            self.priority.push(&record).expect("doubled capacity fits prior contents");
        }
    }

    fn pop_priority_record(&mut self) -> Option<Vec<u8>> {
        if self.priority.empty() {
            return None;
        }
        let mut scratch = vec![0u8; self.priority.capacity()];
        let n = self.priority.pop(&mut scratch).expect("checked non-empty");
        self.priority_len -= 1;
        scratch.truncate(n);
        Some(scratch)
    }
}

/// A blocking MPMC-consumer queue with a priority lane, matching spec.md §4.3's
/// push/pushPriority/pop/tryPop contract. The priority lane is a real
/// [`CircularBufferRaw`], matching the shared-memory transport's layout.
pub struct BlockingPriorityQueue {
    inner: Mutex<Inner>,
    condvar: Condvar,
}

impl BlockingPriorityQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(BlockingPriorityQueue {
            inner: Mutex::new(Inner {
                push_stack: StackQueueRaw::new(),
                pull_stack: StackQueueRaw::new(),
                priority: CircularBufferRaw::new(4096),
                priority_len: 0,
                empty: true,
            }),
            condvar: Condvar::new(),
        })
    }

    pub fn push(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.push_stack.push(&data).expect("unbounded");
        if inner.empty {
            inner.empty = false;
            self.condvar.notify_one();
        }
    }

    pub fn push_priority(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.push_priority_record(&data);
        if inner.empty {
            inner.empty = false;
            self.condvar.notify_one();
        }
    }

    fn try_take(inner: &mut Inner) -> Option<Vec<u8>> {
        if let Some(item) = inner.pop_priority_record() {
            return Some(item);
        }
        if let Some(item) = inner.pull_stack.pop() {
            return Some(item);
        }
        if !inner.push_stack.is_empty() {
            inner.push_stack.drain_into(&mut inner.pull_stack);
            inner.pull_stack.reverse();
            return inner.pull_stack.pop();
        }
        None
    }

    /// Blocks until an item is available, draining priority items first.
    pub fn pop(&self) -> Vec<u8> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(item) = Self::try_take(&mut inner) {
                if inner.priority.empty() && inner.pull_stack.is_empty() && inner.push_stack.is_empty() {
                    inner.empty = true;
                }
                return item;
            }
            inner = self.condvar.wait(inner).unwrap();
        }
    }

    /// Non-blocking pop with the same priority-then-normal ordering.
    pub fn try_pop(&self) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let item = Self::try_take(&mut inner)?;
        if inner.priority.empty() && inner.pull_stack.is_empty() && inner.push_stack.is_empty() {
            inner.empty = true;
        }
        Some(item)
    }

    /// Waits at most `timeout` for an item.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if let Some(item) = Self::try_take(&mut inner) {
                if inner.priority.empty() && inner.pull_stack.is_empty() && inner.push_stack.is_empty() {
                    inner.empty = true;
                }
                return Some(item);
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, result) = self.condvar.wait_timeout(inner, deadline - now).unwrap();
            inner = guard;
            if result.timed_out() {
                return Self::try_take(&mut inner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_drains_before_normal() {
        let q = BlockingPriorityQueue::new();
        q.push(b"normal".to_vec());
        q.push_priority(b"urgent".to_vec());
        assert_eq!(q.try_pop().unwrap(), b"urgent");
        assert_eq!(q.try_pop().unwrap(), b"normal");
        assert!(q.try_pop().is_none());
    }

    #[test]
    fn normal_channel_preserves_fifo_order_across_a_swap() {
        let q = BlockingPriorityQueue::new();
        q.push(b"one".to_vec());
        q.push(b"two".to_vec());
        q.push(b"three".to_vec());
        assert_eq!(q.try_pop().unwrap(), b"one");
        assert_eq!(q.try_pop().unwrap(), b"two");
        assert_eq!(q.try_pop().unwrap(), b"three");
    }

    #[test]
    fn pop_blocks_until_an_item_arrives() {
        let q = BlockingPriorityQueue::new();
        let q2 = q.clone();
        let handle = std::thread::spawn(move || q2.pop());
        std::thread::sleep(Duration::from_millis(20));
        q.push(b"late".to_vec());
        let item = handle.join().unwrap();
        assert_eq!(item, b"late");
    }

    #[test]
    fn pop_timeout_returns_none_when_nothing_arrives() {
        let q = BlockingPriorityQueue::new();
        assert!(q.pop_timeout(Duration::from_millis(10)).is_none());
    }
}
