//! Location-keyed hashmap with adaptive resize.
//!
//! A hybrid of open addressing and chaining: a primary power-of-two slot
//! array, with colliding keys chained off their primary slot in boxed
//! overflow buckets. The map doubles once the overflow count exceeds the
//! slot count and halves back down (never below `min_size`) when the
//! overflow drains.

use voxide_common::Location;

#[derive(Debug)]
struct Bucket<V> {
    key: Location,
    value: V,
    next: Option<Box<Bucket<V>>>,
}

#[derive(Debug)]
pub struct LocationMap<V> {
    slots: Vec<Option<Bucket<V>>>,
    min_size: usize,
    overflow: usize,
    len: usize,
    resizes: usize,
}

impl<V> LocationMap<V> {
    /// Create a map with at least `min_size` primary slots. The size is
    /// rounded up to a power of two so hashing can mask instead of divide.
    pub fn new(min_size: usize) -> Self {
        let size = min_size.max(1).next_power_of_two();
        Self {
            slots: (0..size).map(|_| None).collect(),
            min_size: size,
            overflow: 0,
            len: 0,
            resizes: 0,
        }
    }

    /// Number of primary slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries living beyond their primary slot.
    pub fn overflow(&self) -> usize {
        self.overflow
    }

    /// How many times the map has been rebuilt.
    pub fn resizes(&self) -> usize {
        self.resizes
    }

    pub fn contains(&self, key: Location) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: Location) -> Option<&V> {
        let mut bucket = self.slots[key.hash(self.slots.len())].as_ref()?;
        loop {
            if bucket.key == key {
                return Some(&bucket.value);
            }
            bucket = bucket.next.as_deref()?;
        }
    }

    pub fn get_mut(&mut self, key: Location) -> Option<&mut V> {
        let hash = key.hash(self.slots.len());
        let mut bucket = self.slots[hash].as_mut()?;
        loop {
            if bucket.key == key {
                return Some(&mut bucket.value);
            }
            bucket = bucket.next.as_deref_mut()?;
        }
    }

    /// Fetch the entry for `key`, inserting `make()` when absent. Grows the
    /// slot array before chaining a new key once overflow exceeds it.
    pub fn get_or_insert_with(&mut self, key: Location, make: impl FnOnce() -> V) -> &mut V {
        if !self.contains(key) {
            if self.overflow > self.slots.len() {
                self.resize(self.slots.len() * 2);
            }
            self.insert_new(key, make());
            self.len += 1;
        }

        match self.get_mut(key) {
            Some(value) => value,
            None => unreachable!("entry inserted above"),
        }
    }

    pub fn insert(&mut self, key: Location, value: V) -> Option<V> {
        match self.get_mut(key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.get_or_insert_with(key, || value);
                None
            }
        }
    }

    /// Remove and return the value under `key`. Shrinks first when the
    /// overflow has drained and the map sits above its minimum size.
    pub fn remove(&mut self, key: Location) -> Option<V> {
        if self.overflow == 0 && self.slots.len() > self.min_size {
            let half = self.slots.len() / 2;
            self.resize(half.max(self.min_size));
        }

        let hash = key.hash(self.slots.len());
        let mut head = self.slots[hash].take()?;

        if head.key == key {
            if let Some(next) = head.next.take() {
                self.slots[hash] = Some(*next);
                self.overflow -= 1;
            }
            self.len -= 1;
            return Some(head.value);
        }

        let mut chain = Vec::new();
        let mut next = head.next.take();
        while let Some(mut bucket) = next {
            next = bucket.next.take();
            chain.push(bucket);
        }

        let mut taken = None;
        if let Some(pos) = chain.iter().position(|bucket| bucket.key == key) {
            taken = Some(chain.remove(pos).value);
            self.overflow -= 1;
            self.len -= 1;
        }

        let mut rebuilt = None;
        for mut bucket in chain.into_iter().rev() {
            bucket.next = rebuilt.take();
            rebuilt = Some(bucket);
        }
        head.next = rebuilt;

        self.slots[hash] = Some(head);
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, &V)> {
        self.slots.iter().flat_map(|slot| {
            let mut chain = Vec::new();
            let mut bucket = slot.as_ref();
            while let Some(current) = bucket {
                chain.push((current.key, &current.value));
                bucket = current.next.as_deref();
            }
            chain
        })
    }

    fn insert_new(&mut self, key: Location, value: V) {
        let hash = key.hash(self.slots.len());
        match &mut self.slots[hash] {
            slot @ None => {
                *slot = Some(Bucket {
                    key,
                    value,
                    next: None,
                });
            }
            Some(head) => {
                let mut cursor = &mut head.next;
                while let Some(bucket) = cursor {
                    cursor = &mut bucket.next;
                }
                *cursor = Some(Box::new(Bucket {
                    key,
                    value,
                    next: None,
                }));
                self.overflow += 1;
            }
        }
    }

    fn resize(&mut self, new_size: usize) {
        tracing::trace!(
            from = self.slots.len(),
            to = new_size,
            "resizing location map"
        );

        let old_slots = std::mem::replace(&mut self.slots, (0..new_size).map(|_| None).collect());
        self.overflow = 0;
        self.len = 0;
        self.resizes += 1;

        for slot in old_slots {
            let mut bucket = slot.map(Box::new);
            while let Some(mut current) = bucket {
                bucket = current.next.take();
                self.insert_new(current.key, current.value);
                self.len += 1;
            }
        }
    }
}
