//! Bounded FIFO queue with ring-buffer overwrite semantics
//!
//! Producers never block: once the queue holds `capacity` entries, pushing a
//! new entry evicts the oldest one. Consumers drain in FIFO order, either by
//! polling (`pop`) or by awaiting the next entry (`recv`).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::warn;

/// Thread-safe bounded queue shared between producers and consumers
///
/// # Examples
///
/// ```
/// use bazarr_common::queue::BoundedQueue;
///
/// let queue = BoundedQueue::new(2);
/// queue.push(1);
/// queue.push(2);
/// assert_eq!(queue.push(3), Some(1)); // oldest entry evicted
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.dropped(), 1);
/// ```
#[derive(Debug)]
pub struct BoundedQueue<T> {
    entries: Mutex<VecDeque<T>>,
    capacity: usize,
    dropped: AtomicU64,
    available: Notify,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` entries
    ///
    /// A capacity of 0 is clamped to 1 so the most recent entry is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            warn!("Queue capacity 0 requested, using 1");
            1
        } else {
            capacity
        };

        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
            available: Notify::new(),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds a consistent deque.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry, evicting and returning the oldest one when full
    pub fn push(&self, item: T) -> Option<T> {
        let evicted = {
            let mut entries = self.lock();
            let evicted = if entries.len() >= self.capacity {
                entries.pop_front()
            } else {
                None
            };
            entries.push_back(item);
            evicted
        };

        if evicted.is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }

        self.available.notify_one();
        evicted
    }

    /// Remove the oldest entry, or `None` when empty
    pub fn pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Remove every entry in FIFO order
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    /// Wait until an entry is available and remove it
    ///
    /// Several consumers may wait concurrently; each entry is delivered to
    /// exactly one of them.
    pub async fn recv(&self) -> T {
        loop {
            // The waiter must be registered before the emptiness check
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.pop() {
                return item;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries evicted because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(10);
        for i in 0..5 {
            assert!(queue.push(i).is_none());
        }

        assert_eq!(queue.len(), 5);
        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let queue = BoundedQueue::new(3);
        for i in 0..3 {
            queue.push(i);
        }

        assert_eq!(queue.push(3), Some(0));
        assert_eq!(queue.push(4), Some(1));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.drain(), vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let queue = BoundedQueue::new(0);
        assert_eq!(queue.capacity(), 1);

        queue.push("a");
        assert_eq!(queue.push("b"), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
    }

    #[tokio::test]
    async fn test_recv_returns_buffered_entry() {
        let queue = BoundedQueue::new(4);
        queue.push(7);
        assert_eq!(queue.recv().await, 7);
    }

    #[tokio::test]
    async fn test_recv_waits_for_push() {
        let queue = Arc::new(BoundedQueue::new(4));

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(42);

        let received = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer should wake up")
            .expect("consumer task should not panic");
        assert_eq!(received, 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_consumers_and_producers_never_stall() {
        const CONSUMERS: usize = 4;
        const PRODUCERS: usize = 4;

        for round in 0..500 {
            let queue = Arc::new(BoundedQueue::new(64));
            let start = Arc::new(tokio::sync::Barrier::new(CONSUMERS + PRODUCERS));

            let mut consumers = Vec::new();
            for _ in 0..CONSUMERS {
                let queue = Arc::clone(&queue);
                let start = Arc::clone(&start);
                consumers.push(tokio::spawn(async move {
                    start.wait().await;
                    tokio::time::timeout(Duration::from_secs(2), queue.recv()).await
                }));
            }

            let mut producers = Vec::new();
            for i in 0..PRODUCERS {
                let queue = Arc::clone(&queue);
                let start = Arc::clone(&start);
                producers.push(tokio::spawn(async move {
                    start.wait().await;
                    queue.push(i);
                }));
            }

            for producer in producers {
                producer.await.expect("producer task should not panic");
            }

            let mut received = Vec::new();
            for consumer in consumers {
                let item = consumer
                    .await
                    .expect("consumer task should not panic")
                    .unwrap_or_else(|_| {
                        panic!(
                            "round {}: consumer stalled with {} entries queued",
                            round,
                            queue.len()
                        )
                    });
                received.push(item);
            }
            received.sort_unstable();
            assert_eq!(received, (0..PRODUCERS).collect::<Vec<_>>());
            assert!(queue.is_empty());
        }
    }

    #[tokio::test]
    async fn test_each_entry_delivered_once() {
        let queue = Arc::new(BoundedQueue::new(100));

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Ok(item) =
                    tokio::time::timeout(Duration::from_millis(100), queue.recv()).await
                {
                    seen.push(item);
                }
                seen
            }));
        }

        for i in 0..50 {
            queue.push(i);
        }

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.expect("consumer task should not panic"));
        }
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }
}
