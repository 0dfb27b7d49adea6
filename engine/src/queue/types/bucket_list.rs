//! Doubly-linked FIFO list backing a single priority level.
//!
//! Nodes live in a slab (`Vec` + free list) and are linked by index, so
//! append, pop_front and delete-by-handle are all O(1) without unsafe code.
//! Every appended node gets a generation number that is never reused, which
//! makes a stale handle (node already popped, deleted or cleared) harmless:
//! deleting it returns `false` and touches nothing.

const NIL: usize = usize::MAX;

/// Position of a value inside a `BucketList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    slot: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
    generation: u64,
}

#[derive(Debug)]
pub struct BucketList<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
    next_generation: u64,
}

impl<T> BucketList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
            next_generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append at the tail - O(1)
    pub fn append(&mut self, value: T) -> Handle {
        let generation = self.next_generation;
        self.next_generation += 1;

        let node = Node {
            value: Some(value),
            prev: self.tail,
            next: NIL,
            generation,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        if self.tail == NIL {
            self.head = slot;
        } else {
            self.nodes[self.tail].next = slot;
        }
        self.tail = slot;
        self.len += 1;

        Handle { slot, generation }
    }

    /// Remove and return the oldest value - O(1)
    pub fn pop_front(&mut self) -> Option<T> {
        if self.head == NIL {
            return None;
        }
        self.unlink(self.head)
    }

    /// Whether the handle still points at a live node.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.nodes
            .get(handle.slot)
            .is_some_and(|n| n.generation == handle.generation && n.value.is_some())
    }

    /// Remove the value behind `handle` - O(1). Returns `None` if the handle
    /// is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        self.unlink(handle.slot)
    }

    /// Idempotent delete: `true` only for the call that actually unlinked.
    #[inline]
    pub fn delete(&mut self, handle: Handle) -> bool {
        self.remove(handle).is_some()
    }

    /// Drop every value. Generations keep counting so older handles stay stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    fn unlink(&mut self, slot: usize) -> Option<T> {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }

        let node = &mut self.nodes[slot];
        node.prev = NIL;
        node.next = NIL;
        let value = node.value.take();
        self.free.push(slot);
        self.len -= 1;
        value
    }
}

impl<T> Default for BucketList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T>(list: &mut BucketList<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(v) = list.pop_front() {
            out.push(v);
        }
        out
    }

    #[test]
    fn test_fifo_order() {
        let mut list = BucketList::new();
        for i in 0..5 {
            list.append(i);
        }
        assert_eq!(list.len(), 5);
        assert_eq!(drain(&mut list), vec![0, 1, 2, 3, 4]);
        assert!(list.is_empty());
        assert_eq!(list.pop_front(), None);
    }

    #[test]
    fn test_delete_middle_head_tail() {
        let mut list = BucketList::new();
        let a = list.append("a");
        let b = list.append("b");
        let c = list.append("c");
        let d = list.append("d");

        assert!(list.delete(b));
        assert!(list.delete(a));
        assert!(list.delete(d));
        assert_eq!(list.len(), 1);
        assert!(list.contains(c));
        assert_eq!(drain(&mut list), vec!["c"]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut list = BucketList::new();
        let a = list.append(1);
        list.append(2);

        assert!(list.delete(a));
        assert!(!list.delete(a));
        assert_eq!(list.len(), 1);
        assert_eq!(drain(&mut list), vec![2]);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut list = BucketList::new();
        let a = list.append(1);
        assert_eq!(list.pop_front(), Some(1));

        // Slot of `a` is recycled for the new node.
        let b = list.append(2);
        assert!(!list.contains(a));
        assert!(!list.delete(a));
        assert!(list.contains(b));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_clear() {
        let mut list = BucketList::new();
        let a = list.append(1);
        list.append(2);
        list.clear();
        assert!(list.is_empty());

        let b = list.append(3);
        assert!(!list.delete(a));
        assert!(list.contains(b));
        assert_eq!(drain(&mut list), vec![3]);
    }

    #[test]
    fn test_append_after_emptying() {
        let mut list = BucketList::new();
        let a = list.append(1);
        assert!(list.delete(a));
        list.append(2);
        list.append(3);
        assert_eq!(drain(&mut list), vec![2, 3]);
    }
}
