//! Recency ordering for the cache.
//!
//! Entries live in a slot arena and are chained by slot index, head being
//! the most recently used entry and tail the least. Vacated slots go on a
//! free list and are handed out again before the arena grows.

/// Handle to an entry slot. Only meaningful for the order that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

/// One stored key/value pair and its neighbours in the order.
#[derive(Debug)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
    prev: Option<EntryId>,
    next: Option<EntryId>,
}

impl<K, V> Entry<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }
}

#[derive(Debug)]
enum Slot<K, V> {
    Occupied(Entry<K, V>),
    Vacant { next_free: Option<usize> },
}

/// Doubly-linked recency list over an arena of slots.
#[derive(Debug)]
pub struct RecencyOrder<K, V> {
    slots: Vec<Slot<K, V>>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    free: Option<usize>,
    len: usize,
}

impl<K, V> RecencyOrder<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<EntryId> {
        self.head
    }

    pub fn tail(&self) -> Option<EntryId> {
        self.tail
    }

    pub fn entry(&self, id: EntryId) -> &Entry<K, V> {
        match &self.slots[id.0] {
            Slot::Occupied(entry) => entry,
            Slot::Vacant { .. } => panic!("stale entry handle {}", id.0),
        }
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut Entry<K, V> {
        match &mut self.slots[id.0] {
            Slot::Occupied(entry) => entry,
            Slot::Vacant { .. } => panic!("stale entry handle {}", id.0),
        }
    }

    /// Store a new entry as the most recently used one.
    pub fn insert_front(&mut self, key: K, value: V) -> EntryId {
        let id = self.alloc(Entry::new(key, value));
        self.link_front(id);
        self.len += 1;
        id
    }

    /// Mark an existing entry as the most recently used one.
    pub fn move_to_front(&mut self, id: EntryId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    /// Take the least recently used entry out of the order.
    pub fn remove_tail(&mut self) -> Option<Entry<K, V>> {
        let tail = self.tail?;
        Some(self.remove(tail))
    }

    /// Take an arbitrary entry out of the order, freeing its slot.
    pub fn remove(&mut self, id: EntryId) -> Entry<K, V> {
        self.unlink(id);
        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        let mut entry = match std::mem::replace(&mut self.slots[id.0], vacant) {
            Slot::Occupied(entry) => entry,
            Slot::Vacant { .. } => panic!("stale entry handle {}", id.0),
        };
        self.free = Some(id.0);
        self.len -= 1;
        entry.prev = None;
        entry.next = None;
        entry
    }

    /// Drop every entry. The arena keeps its allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
        self.free = None;
        self.len = 0;
    }

    /// Walk from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            order: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn alloc(&mut self, entry: Entry<K, V>) -> EntryId {
        match self.free {
            Some(idx) => {
                let next_free = match self.slots[idx] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at a live slot"),
                };
                self.free = next_free;
                self.slots[idx] = Slot::Occupied(entry);
                EntryId(idx)
            }
            None => {
                self.slots.push(Slot::Occupied(entry));
                EntryId(self.slots.len() - 1)
            }
        }
    }

    fn link_front(&mut self, id: EntryId) {
        let old_head = self.head;
        {
            let entry = self.entry_mut(id);
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(h) => self.entry_mut(h).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn unlink(&mut self, id: EntryId) {
        let (prev, next) = {
            let entry = self.entry(id);
            (entry.prev, entry.next)
        };
        match prev {
            Some(p) => self.entry_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entry_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }
}

pub struct Iter<'a, K, V> {
    order: &'a RecencyOrder<K, V>,
    cursor: Option<EntryId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let entry = self.order.entry(id);
        self.cursor = entry.next;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
