//! Flag-then-lock gate that lets `clear()` stop the world while every other
//! operation stays lock-free.
//!
//! Regular operations register in `active` and then check `clearing`; a clear
//! raises `clearing` and then waits for `active` to drain. Both sides use
//! SeqCst, so either the operation sees the flag (and queues up behind the
//! lock) or the clear sees the operation (and waits for it). No operation
//! ever runs in the middle of a clear.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

pub struct ClearGate {
    clearing: AtomicBool,
    active: AtomicUsize,
    lock: Mutex<()>,
}

/// Deregisters a lock-free operation, also on unwind.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ClearGate {
    pub fn new() -> Self {
        Self {
            clearing: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            lock: Mutex::new(()),
        }
    }

    /// Run a regular operation. Lock-free unless a clear is in flight, in
    /// which case it waits for the clear and runs after it.
    #[inline]
    pub fn run<R>(&self, op: impl FnOnce() -> R) -> R {
        self.active.fetch_add(1, Ordering::SeqCst);
        if !self.clearing.load(Ordering::SeqCst) {
            let _active = ActiveGuard(&self.active);
            return op();
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let _lock = self.lock.lock();
        op()
    }

    /// Run `op` with no regular operation in progress.
    pub fn exclusive<R>(&self, op: impl FnOnce() -> R) -> R {
        let _lock = self.lock.lock();
        self.clearing.store(true, Ordering::SeqCst);

        while self.active.load(Ordering::SeqCst) != 0 {
            std::hint::spin_loop();
            std::thread::yield_now();
        }

        let result = op();
        self.clearing.store(false, Ordering::SeqCst);
        result
    }

    #[inline]
    pub fn is_clearing(&self) -> bool {
        self.clearing.load(Ordering::SeqCst)
    }
}

impl Default for ClearGate {
    fn default() -> Self {
        Self::new()
    }
}
