//! Bounded FIFO queue of owned byte strings.
//!
//! A `Channel` is a fixed-capacity ring buffer guarded by a single
//! structural mutex, with three [`Gate`]s layered on top: `not_full` and
//! `not_empty` implement blocking backpressure, and `finished` is an
//! orthogonal side-band signal a stage's worker raises once it has observed
//! the terminator and exited (see [`crate::stage_host`]).
//!
//! Gates are reset only by the thread about to wait, while still holding the
//! structural mutex — combined with broadcast-on-signal and `while`-loop
//! waits in [`Gate::wait`], this rules out lost wakeups without needing any
//! extra bookkeeping.

use crate::error::{ChannelError, ChannelResult};
use crate::gate::Gate;
use std::sync::Mutex;

struct Ring {
    // `None` marks an empty slot; invariant P1 says exactly the slots in
    // `[head, head + count) mod capacity` are `Some`.
    slots: Vec<Option<Vec<u8>>>,
    head: usize,
    tail: usize,
    count: usize,
    closed: bool,
}

/// A bounded, blocking, single-shot FIFO of owned byte strings.
pub struct Channel {
    capacity: usize,
    ring: Mutex<Ring>,
    not_full: Gate,
    not_empty: Gate,
    finished: Gate,
}

impl Channel {
    /// Allocates a channel with room for `capacity` in-flight items.
    ///
    /// Fails with [`ChannelError::InvalidArgument`] if `capacity < 1`.
    pub fn new(capacity: usize) -> ChannelResult<Self> {
        if capacity < 1 {
            return Err(ChannelError::InvalidArgument(capacity));
        }
        Ok(Self {
            capacity,
            ring: Mutex::new(Ring {
                slots: vec![None; capacity],
                head: 0,
                tail: 0,
                count: 0,
                closed: false,
            }),
            not_full: Gate::new(),
            not_empty: Gate::new(),
            finished: Gate::new(),
        })
    }

    /// Deep-copies `item` into the channel, blocking while the ring is full.
    pub fn put(&self, item: &[u8]) -> ChannelResult<()> {
        let mut ring = self.ring.lock().expect("channel mutex poisoned");
        loop {
            if ring.closed {
                return Err(ChannelError::ShutdownDuringWait);
            }
            if ring.count < self.capacity {
                break;
            }
            self.not_full.reset();
            drop(ring);
            self.not_full.wait();
            ring = self.ring.lock().expect("channel mutex poisoned");
        }

        let tail = ring.tail;
        ring.slots[tail] = Some(item.to_vec());
        ring.tail = (tail + 1) % self.capacity;
        ring.count += 1;
        drop(ring);
        self.not_empty.signal();
        Ok(())
    }

    /// Blocks until an item is available and returns it, transferring
    /// ownership to the caller. Returns [`ChannelError::ShutdownDuringWait`]
    /// if the channel is [`Channel::close`]d while empty.
    pub fn get(&self) -> ChannelResult<Vec<u8>> {
        let mut ring = self.ring.lock().expect("channel mutex poisoned");
        loop {
            if ring.count > 0 {
                let head = ring.head;
                let item = ring.slots[head]
                    .take()
                    .expect("live slot must hold a value");
                ring.head = (head + 1) % self.capacity;
                ring.count -= 1;
                drop(ring);
                self.not_full.signal();
                return Ok(item);
            }
            if ring.closed {
                return Err(ChannelError::ShutdownDuringWait);
            }
            self.not_empty.reset();
            drop(ring);
            self.not_empty.wait();
            ring = self.ring.lock().expect("channel mutex poisoned");
        }
    }

    /// Wakes any thread parked in [`Channel::put`] or [`Channel::get`] with
    /// [`ChannelError::ShutdownDuringWait`] once the ring has drained.
    /// Buffered items already in the ring are still delivered to `get`.
    pub fn close(&self) {
        let mut ring = self.ring.lock().expect("channel mutex poisoned");
        ring.closed = true;
        drop(ring);
        self.not_empty.signal();
        self.not_full.signal();
    }

    /// Signals this channel's `finished` gate. Idempotent.
    pub fn signal_finished(&self) {
        self.finished.signal();
    }

    /// Blocks until [`Channel::signal_finished`] has been called.
    pub fn wait_finished(&self) {
        self.finished.wait();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.ring.lock().expect("channel mutex poisoned").count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Channels are destroyed by ordinary `Drop`: dropping the `Ring`'s `Vec`
// frees any residual owned strings along with the backing storage, and the
// `Mutex`/`Condvar` pairs inside each `Gate` have no external registry entry
// to release. This is the spec's §4.2 `destroy()` step, expressed as RAII
// instead of an explicit call.

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            Channel::new(0),
            Err(ChannelError::InvalidArgument(0))
        ));
    }

    #[test]
    fn fifo_single_producer_single_consumer() {
        let ch = Channel::new(4).unwrap();
        ch.put(b"a").unwrap();
        ch.put(b"b").unwrap();
        ch.put(b"c").unwrap();
        assert_eq!(ch.get().unwrap(), b"a");
        assert_eq!(ch.get().unwrap(), b"b");
        assert_eq!(ch.get().unwrap(), b"c");
    }

    #[test]
    fn get_is_independently_owned() {
        let ch = Channel::new(1).unwrap();
        let mut original = b"hello".to_vec();
        ch.put(&original).unwrap();
        original[0] = b'X';
        let received = ch.get().unwrap();
        assert_eq!(received, b"hello");
    }

    #[test]
    fn capacity_one_alternates_without_deadlock() {
        let ch = Arc::new(Channel::new(1).unwrap());
        let producer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                for i in 0..50u8 {
                    ch.put(&[i]).unwrap();
                }
            })
        };
        let consumer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                let mut received = Vec::new();
                for _ in 0..50 {
                    received.push(ch.get().unwrap()[0]);
                }
                received
            })
        };
        producer.join().unwrap();
        let received = consumer.join().unwrap();
        assert_eq!(received, (0..50).collect::<Vec<u8>>());
    }

    #[test]
    fn put_blocks_while_full_until_a_slot_frees() {
        let ch = Arc::new(Channel::new(1).unwrap());
        ch.put(b"first").unwrap();

        let writer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                ch.put(b"second").unwrap();
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!writer.is_finished());

        assert_eq!(ch.get().unwrap(), b"first");
        writer.join().unwrap();
        assert_eq!(ch.get().unwrap(), b"second");
    }

    #[test]
    fn close_wakes_blocked_get_with_shutdown_error() {
        let ch = Arc::new(Channel::new(1).unwrap());
        let waiter = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.get())
        };
        thread::sleep(Duration::from_millis(20));
        ch.close();
        let result = waiter.join().unwrap();
        assert!(matches!(result, Err(ChannelError::ShutdownDuringWait)));
    }

    #[test]
    fn close_still_delivers_buffered_items() {
        let ch = Channel::new(4).unwrap();
        ch.put(b"queued").unwrap();
        ch.close();
        assert_eq!(ch.get().unwrap(), b"queued");
        assert!(matches!(ch.get(), Err(ChannelError::ShutdownDuringWait)));
    }

    #[test]
    fn finished_gate_orthogonal_to_emptiness() {
        let ch = Channel::new(4).unwrap();
        ch.put(b"still buffered").unwrap();
        ch.signal_finished();
        ch.wait_finished(); // does not block
        assert!(!ch.is_empty());
    }
}
