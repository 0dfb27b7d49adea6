//! Blocking FIFO backing the arrival-ordered queues.
//!
//! A single mutex guards the deque and, when duplicates are rejected, the
//! set of in-flight bodies, so the duplicate check and the enqueue are one
//! step. Blocked takers wait on a condvar signalled by every push.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::time::GxHashSet;
use crate::protocol::Message;

#[derive(Default)]
struct FifoState {
    items: VecDeque<Arc<Message>>,
    bodies: GxHashSet<Arc<str>>,
}

impl FifoState {
    #[inline]
    fn take_front(&mut self) -> Option<Arc<Message>> {
        let message = self.items.pop_front()?;
        self.bodies.remove(message.body());
        Some(message)
    }
}

pub struct FifoQueue {
    state: Mutex<FifoState>,
    available: Condvar,
    /// Mirrors `items.len()`, written under the state lock.
    len: AtomicUsize,
    closed: AtomicBool,
    reject_duplicates: bool,
}

impl FifoQueue {
    pub fn new(reject_duplicates: bool) -> Self {
        Self {
            state: Mutex::new(FifoState::default()),
            available: Condvar::new(),
            len: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            reject_duplicates,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Enqueue at the tail. `false` if duplicates are rejected and a message
    /// with the same body is still queued.
    pub fn push(&self, message: Arc<Message>) -> bool {
        {
            let mut state = self.state.lock();
            if self.reject_duplicates && !state.bodies.insert(message.shared_body()) {
                return false;
            }
            state.items.push_back(message);
            self.len.store(state.items.len(), Ordering::SeqCst);
        }
        self.available.notify_one();
        true
    }

    /// Take the oldest message without waiting.
    pub fn pop(&self) -> Option<Arc<Message>> {
        let mut state = self.state.lock();
        self.take_front(&mut state)
    }

    #[inline]
    fn take_front(&self, state: &mut FifoState) -> Option<Arc<Message>> {
        let message = state.take_front()?;
        self.len.store(state.items.len(), Ordering::SeqCst);
        Some(message)
    }

    /// Take the oldest message, waiting up to `timeout` for one to arrive.
    /// Returns `None` on expiry or once the queue is closed. A timeout too
    /// large to form a deadline waits until a push or `close()`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Arc<Message>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        loop {
            if let Some(message) = self.take_front(&mut state) {
                return Some(message);
            }
            if timeout.is_zero() || self.is_closed() {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        return if self.is_closed() {
                            None
                        } else {
                            self.take_front(&mut state)
                        };
                    }
                }
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Remove the queued message with this id - O(n)
    pub fn remove(&self, id: u64) -> Option<Arc<Message>> {
        let mut state = self.state.lock();
        let pos = state.items.iter().position(|m| m.id() == id)?;
        let message = state.items.remove(pos)?;
        state.bodies.remove(message.body());
        self.len.store(state.items.len(), Ordering::SeqCst);
        Some(message)
    }

    /// Drop every queued message and return how many there were.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.items.len();
        state.items.clear();
        state.bodies.clear();
        self.len.store(0, Ordering::SeqCst);
        dropped
    }

    /// Wake every blocked taker. Later waits return immediately.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _state = self.state.lock();
        self.available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn msg(body: &str) -> Arc<Message> {
        Arc::new(Message::new(body, 0, 1).unwrap())
    }

    #[test]
    fn test_fifo_order() {
        let q = FifoQueue::new(false);
        for body in ["a", "b", "c"] {
            assert!(q.push(msg(body)));
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop().unwrap().body(), "a");
        assert_eq!(q.pop().unwrap().body(), "b");
        assert_eq!(q.pop().unwrap().body(), "c");
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_duplicates_allowed() {
        let q = FifoQueue::new(false);
        assert!(q.push(msg("x")));
        assert!(q.push(msg("x")));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_duplicates_rejected_until_delivered() {
        let q = FifoQueue::new(true);
        assert!(q.push(msg("x")));
        assert!(!q.push(msg("x")));
        assert_eq!(q.len(), 1);

        q.pop().unwrap();
        assert!(q.push(msg("x")));
    }

    #[test]
    fn test_remove_frees_body() {
        let q = FifoQueue::new(true);
        let first = msg("x");
        q.push(Arc::clone(&first));
        q.push(msg("y"));

        assert_eq!(q.remove(first.id()).map(|m| m.id()), Some(first.id()));
        assert!(q.remove(first.id()).is_none());
        assert!(q.push(msg("x")));
        assert_eq!(q.pop().unwrap().body(), "y");
    }

    #[test]
    fn test_clear() {
        let q = FifoQueue::new(true);
        q.push(msg("a"));
        q.push(msg("b"));
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
        assert!(q.push(msg("a")));
    }

    #[test]
    fn test_pop_timeout_wakes_on_push() {
        let q = Arc::new(FifoQueue::new(false));
        let taker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop_timeout(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        q.push(msg("late"));
        assert_eq!(taker.join().unwrap().unwrap().body(), "late");
    }

    #[test]
    fn test_close_wakes_takers() {
        let q = Arc::new(FifoQueue::new(false));
        let taker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop_timeout(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(20));
        q.close();
        assert!(taker.join().unwrap().is_none());
        assert!(q.is_closed());
    }

    #[test]
    fn test_unbounded_timeout_waits_for_close() {
        let q = Arc::new(FifoQueue::new(false));
        let taker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop_timeout(Duration::MAX))
        };

        thread::sleep(Duration::from_millis(20));
        q.close();
        assert!(taker.join().unwrap().is_none());
    }

    #[test]
    fn test_unbounded_timeout_takes_pushed_message() {
        let q = Arc::new(FifoQueue::new(false));
        let taker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop_timeout(Duration::MAX))
        };

        thread::sleep(Duration::from_millis(20));
        q.push(msg("eventually"));
        assert_eq!(taker.join().unwrap().unwrap().body(), "eventually");
        assert!(q.is_empty());
    }
}
