//! Single-slot, last-write-wins frame buffer.
//!
//! The capture thread writes, the consumer reads. Both sides take the same
//! short-held lock, and the lock is only held for a move (write) or a copy
//! (read), never across a conversion.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Slot contents; only ever touched through the buffer's lock.
struct Slot<F> {
    frame: F,
    fresh: bool,
}

/// Counters describing traffic through one buffer.
#[derive(Debug, Default)]
struct BufferCounters {
    writes: AtomicU64,
    reads: AtomicU64,
    overwritten: AtomicU64,
}

/// Snapshot of a buffer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Frames written by the capture side.
    pub writes: u64,
    /// Frames delivered to the consumer.
    pub reads: u64,
    /// Fresh frames replaced before anyone read them.
    pub overwritten: u64,
}

/// One frame plus a fresh flag behind a mutex.
///
/// A successful read clears the flag, so the same frame is never delivered
/// twice. A write over an unread frame silently replaces it.
pub struct FrameBuffer<F> {
    slot: Mutex<Slot<F>>,
    counters: BufferCounters,
}

impl<F> FrameBuffer<F> {
    /// Creates a buffer holding `initial`, marked as not fresh.
    pub fn new(initial: F) -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame: initial,
                fresh: false,
            }),
            counters: BufferCounters::default(),
        }
    }

    /// Replaces the buffered frame and marks it fresh.
    ///
    /// Returns `true` if an unread frame was overwritten.
    pub fn write(&self, frame: F) -> bool {
        let (previous, overwrote) = {
            let mut slot = self.slot.lock();
            let previous = std::mem::replace(&mut slot.frame, frame);
            let overwrote = std::mem::replace(&mut slot.fresh, true);
            (previous, overwrote)
        };
        // The displaced frame is freed outside the lock.
        drop(previous);

        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.counters.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        overwrote
    }

    /// Runs `read` on the buffered frame if it is fresh, then clears the flag.
    ///
    /// Returns `false` without calling `read` when there is no new data.
    pub fn try_read_with(&self, read: impl FnOnce(&F)) -> bool {
        let mut slot = self.slot.lock();
        if !slot.fresh {
            return false;
        }
        read(&slot.frame);
        slot.fresh = false;
        drop(slot);

        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Returns true if a frame is waiting to be read.
    pub fn has_fresh(&self) -> bool {
        self.slot.lock().fresh
    }

    /// Returns a snapshot of the traffic counters.
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            writes: self.counters.writes.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            overwritten: self.counters.overwritten.load(Ordering::Relaxed),
        }
    }
}

impl<F: Clone> FrameBuffer<F> {
    /// Copies a fresh frame into `out`, reusing its allocation.
    ///
    /// Leaves `out` untouched and returns `false` when there is no new data.
    pub fn try_read(&self, out: &mut F) -> bool {
        self.try_read_with(|frame| out.clone_from(frame))
    }

    /// Returns an owned copy of a fresh frame.
    pub fn take_latest(&self) -> Option<F> {
        let mut latest = None;
        self.try_read_with(|frame| latest = Some(frame.clone()));
        latest
    }
}

impl<F> std::fmt::Debug for FrameBuffer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("fresh", &self.has_fresh())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_read_after_write_then_no_new_data() {
        let buffer = FrameBuffer::new(vec![0u32; 4]);
        let mut out = vec![9u32; 4];

        assert!(!buffer.try_read(&mut out));
        assert_eq!(out, vec![9; 4]);

        buffer.write(vec![1, 2, 3, 4]);
        assert!(buffer.try_read(&mut out));
        assert_eq!(out, vec![1, 2, 3, 4]);

        // Second read without a write: stale data is not re-delivered
        out = vec![7; 4];
        assert!(!buffer.try_read(&mut out));
        assert_eq!(out, vec![7; 4]);
    }

    #[test]
    fn test_last_write_wins() {
        let buffer = FrameBuffer::new(0u32);

        assert!(!buffer.write(1));
        assert!(buffer.write(2));
        assert!(buffer.write(3));

        assert_eq!(buffer.take_latest(), Some(3));
        assert_eq!(buffer.take_latest(), None);

        let stats = buffer.stats();
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.overwritten, 2);
    }

    #[test]
    fn test_try_read_with_skips_closure_when_stale() {
        let buffer = FrameBuffer::new(5u8);
        let mut called = false;
        assert!(!buffer.try_read_with(|_| called = true));
        assert!(!called);
    }

    #[test]
    fn test_try_read_reuses_caller_storage() {
        use crate::frame::{ColorFrame, DepthFrame, Rgba};

        let color = FrameBuffer::new(ColorFrame::blank(64, 64));
        let mut frame = ColorFrame::blank(64, 64);
        frame.image.pixels_mut().fill(Rgba::opaque(1, 2, 3));
        frame.sequence = 7;
        color.write(frame);

        let mut out = ColorFrame::blank(64, 64);
        let before = out.image.pixels().as_ptr();
        assert!(color.try_read(&mut out));
        assert_eq!(out.image.pixels().as_ptr(), before);
        assert_eq!(out.sequence, 7);
        assert_eq!(out.image.get(63, 63), Some(&Rgba::opaque(1, 2, 3)));

        let depth = FrameBuffer::new(DepthFrame::blank(8, 8));
        depth.write(DepthFrame::blank(8, 8));
        let mut out = DepthFrame::blank(8, 8);
        let distance = out.distance.pixels().as_ptr();
        let validity = out.validity.pixels().as_ptr();
        assert!(depth.try_read(&mut out));
        assert_eq!(out.distance.pixels().as_ptr(), distance);
        assert_eq!(out.validity.pixels().as_ptr(), validity);
    }

    #[test]
    fn test_concurrent_reads_never_tear() {
        const WIDTH: usize = 4096;
        const WRITES: u32 = 2000;

        let buffer = Arc::new(FrameBuffer::new(vec![0u32; WIDTH]));

        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for k in 1..=WRITES {
                    buffer.write(vec![k; WIDTH]);
                }
            })
        };

        let mut out = vec![0u32; WIDTH];
        let mut last_seen = 0u32;
        let mut delivered = 0u32;
        loop {
            let finished = writer.is_finished();
            if buffer.try_read(&mut out) {
                let first = out[0];
                assert!(out.iter().all(|&v| v == first), "torn frame observed");
                assert!(first > last_seen, "frame delivered twice or out of order");
                last_seen = first;
                delivered += 1;
            }
            if finished && !buffer.has_fresh() {
                break;
            }
        }
        writer.join().unwrap();

        assert_eq!(last_seen, WRITES);
        let stats = buffer.stats();
        assert_eq!(stats.reads, u64::from(delivered));
        assert_eq!(stats.writes, u64::from(WRITES));
        assert_eq!(stats.reads + stats.overwritten, stats.writes);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Write(u16),
        Read,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![any::<u16>().prop_map(Op::Write), Just(Op::Read)]
    }

    proptest! {
        #[test]
        fn prop_reads_return_latest_unread_write(
            ops in prop::collection::vec(op_strategy(), 0..64)
        ) {
            let buffer = FrameBuffer::new(0u16);
            let mut pending: Option<u16> = None;

            for op in ops {
                match op {
                    Op::Write(v) => {
                        let overwrote = buffer.write(v);
                        prop_assert_eq!(overwrote, pending.is_some());
                        pending = Some(v);
                    }
                    Op::Read => {
                        let mut out = u16::MAX;
                        let got = buffer.try_read(&mut out);
                        prop_assert_eq!(got, pending.is_some());
                        if let Some(expected) = pending.take() {
                            prop_assert_eq!(out, expected);
                        } else {
                            prop_assert_eq!(out, u16::MAX);
                        }
                    }
                }
            }
        }
    }
}
