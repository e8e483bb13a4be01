//! The live list: every occupied location, in scheduler iteration order.
//!
//! An arena-backed doubly linked list with a location index, giving O(1)
//! prepend, append and unlink while keeping a stable traversal order.

use voxide_common::Location;

use crate::map::LocationMap;

#[derive(Debug)]
struct Slot {
    location: Location,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
pub struct LiveList {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    index: LocationMap<u32>,
    len: usize,
}

impl LiveList {
    pub fn new(size_hint: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            index: LocationMap::new(size_hint),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, location: Location) -> bool {
        self.index.contains(location)
    }

    /// Insert at the head. The location must not already be listed.
    pub fn push_front(&mut self, location: Location) {
        debug_assert!(!self.contains(location));
        let id = self.alloc(location);
        let head = self.head;
        self.slot_mut(id).next = head;
        match head {
            Some(head) => self.slot_mut(head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Insert at the tail. The location must not already be listed.
    pub fn push_back(&mut self, location: Location) {
        debug_assert!(!self.contains(location));
        let id = self.alloc(location);
        let tail = self.tail;
        self.slot_mut(id).prev = tail;
        match tail {
            Some(tail) => self.slot_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Unlink a location. Returns false when it was not listed.
    pub fn unlink(&mut self, location: Location) -> bool {
        let Some(id) = self.index.remove(location) else {
            return false;
        };

        let (prev, next) = {
            let slot = self.slot(id);
            (slot.prev, slot.next)
        };

        match prev {
            Some(prev) => self.slot_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slot_mut(next).prev = prev,
            None => self.tail = prev,
        }

        self.free.push(id);
        self.len -= 1;
        true
    }

    /// Snapshot of the list in order, head first.
    pub fn locations(&self) -> Vec<Location> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let slot = self.slot(id);
            out.push(slot.location);
            cursor = slot.next;
        }
        out
    }

    fn alloc(&mut self, location: Location) -> u32 {
        let id = match self.free.pop() {
            Some(id) => {
                *self.slot_mut(id) = Slot {
                    location,
                    prev: None,
                    next: None,
                };
                id
            }
            None => {
                self.slots.push(Slot {
                    location,
                    prev: None,
                    next: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.index.insert(location, id);
        self.len += 1;
        id
    }

    fn slot(&self, id: u32) -> &Slot {
        &self.slots[id as usize]
    }

    fn slot_mut(&mut self, id: u32) -> &mut Slot {
        &mut self.slots[id as usize]
    }
}
