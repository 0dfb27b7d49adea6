//! Bucketed priority queue whose entries can change priority while queued.
//!
//! Layout:
//! - one `BucketList` per priority level `0..=max_priority`, each behind its
//!   own mutex, with an atomic length readable without the lock
//! - a cursor pointing at the highest bucket that may be non-empty; adds only
//!   ever raise it (CAS), polls lower it one step at a time when they find
//!   the bucket empty
//! - an identity index (`id` or `body`, see `IdentityMode`) mapping to the
//!   live entry, so duplicates and deletes are O(1)
//!
//! Every entry carries its own small lock holding its current bucket and
//! handle. Bumps and removals take that lock first and a bucket lock second;
//! polls pop under the bucket lock and only afterwards take the entry lock,
//! so the lock order never inverts.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry as MapEntry;
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use super::bucket_list::{BucketList, Handle};
use super::gate::ClearGate;
use super::time::GxDashMap;
use crate::error::{LineUpError, Result};
use crate::protocol::{IdentityMode, Message, MessageKey};

/// Result of `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was queued.
    Inserted,
    /// An entry with the same identity was already queued and moved to a
    /// different priority.
    Merged,
    /// An entry with the same identity was already queued at the resulting
    /// priority.
    Unchanged,
    /// An entry with the same identity was already queued and the engine
    /// rejects duplicates.
    Rejected,
}

impl AddOutcome {
    #[inline]
    pub fn is_inserted(&self) -> bool {
        matches!(self, AddOutcome::Inserted)
    }
}

/// What `add` does when an entry with the same identity is already queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Raise the queued entry's priority by the incoming priority.
    #[default]
    Merge,
    /// Leave the queued entry alone and drop the incoming message.
    Reject,
}

/// Result of a priority bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpOutcome {
    Moved,
    Unchanged,
    /// The entry was delivered or removed before the bump got to it.
    Gone,
}

// ============== Entries ==============

#[derive(Debug, Clone, Copy)]
struct Slot {
    bucket: usize,
    /// `None` once the entry has left the queue.
    handle: Option<Handle>,
}

struct QueuedEntry {
    message: Arc<Message>,
    key: MessageKey,
    slot: Mutex<Slot>,
}

enum IndexSlot {
    /// An add owns this identity and is about to publish its entry.
    Reserved,
    Present(Arc<QueuedEntry>),
}

impl IndexSlot {
    #[inline]
    fn holds(&self, entry: &Arc<QueuedEntry>) -> bool {
        matches!(self, IndexSlot::Present(e) if Arc::ptr_eq(e, entry))
    }
}

struct Bucket {
    list: Mutex<BucketList<Arc<QueuedEntry>>>,
    len: AtomicUsize,
}

impl Bucket {
    fn new() -> Self {
        Self {
            list: Mutex::new(BucketList::new()),
            len: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len.load(Ordering::SeqCst) == 0
    }

    fn append(&self, entry: Arc<QueuedEntry>) -> Handle {
        let mut list = self.list.lock();
        let handle = list.append(entry);
        self.len.store(list.len(), Ordering::SeqCst);
        handle
    }

    fn pop_front(&self) -> Option<Arc<QueuedEntry>> {
        let mut list = self.list.lock();
        let entry = list.pop_front();
        self.len.store(list.len(), Ordering::SeqCst);
        entry
    }

    fn remove(&self, handle: Handle) -> Option<Arc<QueuedEntry>> {
        let mut list = self.list.lock();
        let entry = list.remove(handle);
        self.len.store(list.len(), Ordering::SeqCst);
        entry
    }

    fn clear(&self) {
        let mut list = self.list.lock();
        list.clear();
        self.len.store(0, Ordering::SeqCst);
    }
}

// ============== Waiting ==============

/// Parking spot for timed polls. Inserts only touch the lock when somebody
/// is registered as waiting.
struct WaitSignal {
    waiters: AtomicUsize,
    lock: Mutex<()>,
    cond: Condvar,
}

struct WaiterGuard<'a>(&'a AtomicUsize);

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WaitSignal {
    fn new() -> Self {
        Self {
            waiters: AtomicUsize::new(0),
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    #[inline]
    fn notify_one(&self) {
        if self.waiters.load(Ordering::SeqCst) > 0 {
            let _lock = self.lock.lock();
            self.cond.notify_one();
        }
    }

    fn notify_all(&self) {
        let _lock = self.lock.lock();
        self.cond.notify_all();
    }
}

// ============== Engine ==============

pub struct ChangingPriorityQueue {
    max_priority: usize,
    mode: IdentityMode,
    policy: DuplicatePolicy,
    buckets: Box<[Bucket]>,
    cursor: AtomicUsize,
    index: GxDashMap<MessageKey, IndexSlot>,
    /// Body-keyed engines still delete by id: id -> body key.
    aliases: GxDashMap<u64, MessageKey>,
    len: AtomicUsize,
    gate: ClearGate,
    signal: WaitSignal,
    closed: AtomicBool,
}

impl ChangingPriorityQueue {
    /// Engine with buckets `0..=max_priority`.
    pub fn new(max_priority: i32, mode: IdentityMode) -> Result<Self> {
        if max_priority < 0 {
            return Err(LineUpError::InvalidOptions(format!(
                "max_priority must not be negative, got {}",
                max_priority
            )));
        }
        let max_priority = max_priority as usize;
        let buckets = (0..=max_priority).map(|_| Bucket::new()).collect();

        Ok(Self {
            max_priority,
            mode,
            policy: DuplicatePolicy::default(),
            buckets,
            cursor: AtomicUsize::new(0),
            index: GxDashMap::default(),
            aliases: GxDashMap::default(),
            len: AtomicUsize::new(0),
            gate: ClearGate::new(),
            signal: WaitSignal::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn max_priority(&self) -> i32 {
        self.max_priority as i32
    }

    #[inline]
    pub fn mode(&self) -> IdentityMode {
        self.mode
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

    /// Whether an entry with this identity is currently queued.
    pub fn contains(&self, key: &MessageKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Current priority of the queued entry with this identity.
    pub fn priority_of(&self, key: &MessageKey) -> Option<i32> {
        self.lookup(key).map(|entry| entry.message.priority())
    }

    #[inline]
    fn clamp(&self, priority: i64) -> usize {
        priority.clamp(0, self.max_priority as i64) as usize
    }

    /// Raise the cursor to at least `level`. Never lowers it.
    #[inline]
    fn raise_cursor(&self, level: usize) {
        let mut current = self.cursor.load(Ordering::SeqCst);
        while current < level {
            match self.cursor.compare_exchange_weak(
                current,
                level,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    // ============== Add ==============

    /// Queue `message`. If an entry with the same identity is already queued
    /// the duplicate policy applies: merging raises that entry's priority by
    /// `message.priority()`, rejecting drops the incoming message.
    pub fn add(&self, message: Arc<Message>) -> Result<AddOutcome> {
        let priority = message.priority();
        if priority < 0 {
            return Err(LineUpError::InvalidPriority(priority));
        }

        let outcome = self.gate.run(|| self.add_inner(message));
        if outcome.is_inserted() {
            self.signal.notify_one();
        }
        Ok(outcome)
    }

    fn add_inner(&self, message: Arc<Message>) -> AddOutcome {
        let key = message.key(self.mode);

        loop {
            let existing = match self.index.entry(key.clone()) {
                MapEntry::Vacant(vacant) => {
                    vacant.insert(IndexSlot::Reserved);
                    break;
                }
                MapEntry::Occupied(occupied) => {
                    let present = match occupied.get() {
                        IndexSlot::Present(entry) => Some(Arc::clone(entry)),
                        IndexSlot::Reserved => None,
                    };
                    drop(occupied);
                    match present {
                        Some(entry) => entry,
                        None => {
                            // Another add is publishing this identity.
                            std::thread::yield_now();
                            continue;
                        }
                    }
                }
            };

            if self.policy == DuplicatePolicy::Reject {
                if existing.slot.lock().handle.is_some() {
                    return AddOutcome::Rejected;
                }
                self.index.remove_if(&key, |_, slot| slot.holds(&existing));
                continue;
            }

            match self.bump_entry(&existing, message.priority() as i64) {
                BumpOutcome::Moved => return AddOutcome::Merged,
                BumpOutcome::Unchanged => return AddOutcome::Unchanged,
                BumpOutcome::Gone => {
                    // Delivered in between; drop the stale mapping and retry.
                    self.index.remove_if(&key, |_, slot| slot.holds(&existing));
                }
            }
        }

        let level = self.clamp(message.priority() as i64);
        message.set_priority(level as i32);
        let id = message.id();

        let entry = Arc::new(QueuedEntry {
            message,
            key: key.clone(),
            slot: Mutex::new(Slot {
                bucket: level,
                handle: None,
            }),
        });

        {
            let mut slot = entry.slot.lock();
            self.index
                .insert(key.clone(), IndexSlot::Present(Arc::clone(&entry)));
            if self.mode == IdentityMode::ByBody {
                self.aliases.insert(id, key);
            }
            self.len.fetch_add(1, Ordering::SeqCst);
            slot.handle = Some(self.buckets[level].append(Arc::clone(&entry)));
        }

        self.raise_cursor(level);
        trace!(message_id = id, priority = level, "queued");
        AddOutcome::Inserted
    }

    // ============== Bump ==============

    /// Shift the priority of the queued entry with identity `key` by `delta`.
    /// Returns `Gone` if nothing with that identity is queued.
    pub fn bump_priority(&self, key: &MessageKey, delta: i32) -> BumpOutcome {
        self.gate.run(|| match self.lookup(key) {
            Some(entry) => self.bump_entry(&entry, delta as i64),
            None => BumpOutcome::Gone,
        })
    }

    fn bump_entry(&self, entry: &Arc<QueuedEntry>, delta: i64) -> BumpOutcome {
        let mut slot = entry.slot.lock();
        let Some(handle) = slot.handle else {
            return BumpOutcome::Gone;
        };

        let current = slot.bucket;
        let target = self.clamp(current as i64 + delta);
        if target == current {
            return BumpOutcome::Unchanged;
        }

        // A concurrent poll may have popped it without marking the slot yet.
        if self.buckets[current].remove(handle).is_none() {
            return BumpOutcome::Gone;
        }

        entry.message.set_priority(target as i32);
        slot.bucket = target;
        slot.handle = Some(self.buckets[target].append(Arc::clone(entry)));
        drop(slot);

        self.raise_cursor(target);
        trace!(
            message_id = entry.message.id(),
            from = current,
            to = target,
            "priority changed"
        );
        BumpOutcome::Moved
    }

    // ============== Poll ==============

    /// Take the highest-priority message, oldest first within a level.
    pub fn poll(&self) -> Option<Arc<Message>> {
        self.gate.run(|| self.poll_inner())
    }

    fn poll_inner(&self) -> Option<Arc<Message>> {
        loop {
            let current = self.cursor.load(Ordering::SeqCst);

            if let Some(entry) = self.buckets[current].pop_front() {
                self.finish(&entry);
                return Some(Arc::clone(&entry.message));
            }

            if current == 0 {
                if self.cursor.load(Ordering::SeqCst) == 0 {
                    return None;
                }
                continue;
            }

            if self
                .cursor
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
                && !self.buckets[current].is_empty()
            {
                // An add landed here after our pop but before the decrement.
                self.raise_cursor(current);
            }
        }
    }

    /// Bookkeeping for an entry that just left its bucket.
    fn finish(&self, entry: &Arc<QueuedEntry>) {
        entry.slot.lock().handle = None;
        self.index.remove_if(&entry.key, |_, slot| slot.holds(entry));
        if self.mode == IdentityMode::ByBody {
            self.aliases
                .remove_if(&entry.message.id(), |_, key| *key == entry.key);
        }
        self.len.fetch_sub(1, Ordering::SeqCst);
    }

    /// Poll, waiting up to `timeout` for a message to arrive.
    ///
    /// Waiting parks on a condition variable that inserts signal, instead of
    /// spinning on `poll()`. Inserts pay for a lock and a notify only while a
    /// waiter is registered. Returns `None` on expiry or once the engine is
    /// closed. A timeout too large to form a deadline waits until an insert
    /// or `close()`.
    pub fn poll_timeout(&self, timeout: Duration) -> Option<Arc<Message>> {
        if let Some(message) = self.poll() {
            return Some(message);
        }
        if timeout.is_zero() || self.is_closed() {
            return None;
        }

        let deadline = Instant::now().checked_add(timeout);
        loop {
            self.signal.waiters.fetch_add(1, Ordering::SeqCst);
            let _waiter = WaiterGuard(&self.signal.waiters);
            let mut lock = self.signal.lock.lock();

            // Registered as a waiter, so no insert after this poll goes unseen.
            if let Some(message) = self.poll() {
                return Some(message);
            }
            if self.is_closed() {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if self.signal.cond.wait_until(&mut lock, deadline).timed_out() {
                        drop(lock);
                        return if self.is_closed() { None } else { self.poll() };
                    }
                }
                None => self.signal.cond.wait(&mut lock),
            }
        }
    }

    // ============== Remove ==============

    /// Remove the queued entry with identity `key`.
    ///
    /// Id keys work in both modes; body keys only in body-keyed engines.
    pub fn remove(&self, key: &MessageKey) -> Option<Arc<Message>> {
        self.gate.run(|| {
            let entry = self.lookup(key)?;

            let slot = entry.slot.lock();
            let handle = slot.handle?;
            self.buckets[slot.bucket].remove(handle)?;
            drop(slot);

            self.finish(&entry);
            Some(Arc::clone(&entry.message))
        })
    }

    fn lookup(&self, key: &MessageKey) -> Option<Arc<QueuedEntry>> {
        let resolved = match (self.mode, key) {
            (IdentityMode::ByBody, MessageKey::Id(id)) => {
                self.aliases.get(id).map(|alias| alias.value().clone())?
            }
            (IdentityMode::ById, MessageKey::Body(_)) => return None,
            _ => key.clone(),
        };

        let entry = match self.index.get(&resolved)?.value() {
            IndexSlot::Present(entry) => Arc::clone(entry),
            IndexSlot::Reserved => return None,
        };

        if entry.message.as_ref() != key {
            return None;
        }
        Some(entry)
    }

    // ============== Clear / Close ==============

    /// Drop every queued entry. Linearizable against every other operation.
    pub fn clear(&self) -> usize {
        self.gate.exclusive(|| {
            for bucket in self.buckets.iter() {
                bucket.clear();
            }
            self.cursor.store(0, Ordering::SeqCst);
            self.index.clear();
            self.aliases.clear();
            self.len.swap(0, Ordering::SeqCst)
        })
    }

    /// Wake every timed poller. Later timed polls return without waiting.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.signal.notify_all();
    }
}
