//! The per-tick message queue.
//!
//! A doubly linked list over an arena of entries, optionally indexed by
//! target and by source location. The push discipline keeps every item of
//! one target contiguous in the list, which lets lookups and delivery walk
//! a single run instead of the whole queue.

use voxide_common::{Endpoint, FieldValue, Location};
use voxide_storage::LocationMap;

/// One queued emission: a message or a structural mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub kind: u32,
    pub tick: u64,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Field ordinal; only meaningful for `SYSTEM_FIELD` entries.
    pub field: u32,
    pub value: FieldValue,
}

impl QueueItem {
    /// Value equality as the scheduler sees it.
    fn matches(&self, other: &QueueItem) -> bool {
        self.kind == other.kind
            && self.source.location == other.source.location
            && self.target.location == other.target.location
            && self.value == other.value
            && self.tick == other.tick
    }
}

#[derive(Debug)]
struct Entry {
    item: QueueItem,
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
struct TargetIndex {
    count: u32,
    head: u32,
}

#[derive(Debug)]
pub struct Queue {
    entries: Vec<Option<Entry>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    targets: Option<LocationMap<TargetIndex>>,
    sources: Option<LocationMap<Vec<u32>>>,
}

impl Queue {
    pub fn new(track_targets: bool, track_sources: bool, map_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            targets: track_targets.then(|| LocationMap::new(map_size.max(1))),
            sources: track_sources.then(|| LocationMap::new(map_size.max(1))),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append an item.
    ///
    /// On a target-indexed queue all items of one target stay contiguous:
    /// the item splices right after the target's current head, or sits at
    /// the list head on a first sighting. Without a target index the queue
    /// keeps plain insertion order.
    pub fn push(&mut self, item: QueueItem) {
        let target = item.target.location;
        let source = item.source.location;
        let id = self.alloc(item);

        if self.targets.is_some() {
            let existing_head = self
                .targets
                .as_ref()
                .and_then(|map| map.get(target))
                .map(|index| index.head);

            match existing_head {
                Some(after) => {
                    let following = self.entry(after).next;
                    self.entry_mut(id).prev = Some(after);
                    self.entry_mut(id).next = following;
                    self.entry_mut(after).next = Some(id);
                    match following {
                        Some(following) => self.entry_mut(following).prev = Some(id),
                        None => self.tail = Some(id),
                    }
                    if let Some(targets) = self.targets.as_mut()
                        && let Some(index) = targets.get_mut(target)
                    {
                        index.count += 1;
                    }
                }
                None => {
                    let head = self.head;
                    self.entry_mut(id).next = head;
                    match head {
                        Some(head) => self.entry_mut(head).prev = Some(id),
                        None => self.tail = Some(id),
                    }
                    self.head = Some(id);
                    if let Some(targets) = self.targets.as_mut() {
                        targets.insert(target, TargetIndex { count: 1, head: id });
                    }
                }
            }
        } else {
            let tail = self.tail;
            self.entry_mut(id).prev = tail;
            match tail {
                Some(tail) => self.entry_mut(tail).next = Some(id),
                None => self.head = Some(id),
            }
            self.tail = Some(id);
        }

        if let Some(sources) = self.sources.as_mut() {
            sources.get_or_insert_with(source, Vec::new).push(id);
        }

        self.len += 1;
    }

    /// Drop every emission of `source`. Used by the scheduler before a node
    /// is re-evaluated.
    pub fn remove_source(&mut self, source: Location) {
        let Some(ids) = self.sources.as_mut().and_then(|map| map.remove(source)) else {
            return;
        };
        for id in ids {
            self.unlink(id, false);
        }
    }

    /// Membership by value equality of (kind, source, target, value, tick).
    pub fn contains(&self, item: &QueueItem) -> bool {
        match &self.targets {
            Some(targets) => {
                let Some(index) = targets.get(item.target.location) else {
                    return false;
                };
                let mut cursor = Some(index.head);
                for _ in 0..index.count {
                    let Some(id) = cursor else { break };
                    let entry = self.entry(id);
                    if entry.item.matches(item) {
                        return true;
                    }
                    cursor = entry.next;
                }
                false
            }
            None => self.iter().any(|candidate| candidate.matches(item)),
        }
    }

    /// The first item for `target` at `tick` and how many items of the
    /// target's run remain from there on.
    pub fn find_by_target_and_tick(&self, target: Location, tick: u64) -> Option<(u32, u32)> {
        let index = self.targets.as_ref()?.get(target)?;
        let mut cursor = Some(index.head);
        for position in 0..index.count {
            let id = cursor?;
            let entry = self.entry(id);
            debug_assert_eq!(entry.item.target.location, target);
            if entry.item.tick == tick {
                return Some((id, index.count - position));
            }
            cursor = entry.next;
        }
        None
    }

    /// Walk list order starting at `start`.
    pub fn items_from(&self, start: u32) -> impl Iterator<Item = &QueueItem> {
        ItemIter {
            queue: self,
            cursor: Some(start),
        }
    }

    /// Walk the whole queue in list order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        ItemIter {
            queue: self,
            cursor: self.head,
        }
    }

    /// Move every item of `from` into this queue, preserving its order.
    /// Returns the number of items moved.
    pub fn merge(&mut self, from: Queue) -> usize {
        let mut merged = 0;
        for item in from.into_items() {
            self.push(item);
            merged += 1;
        }
        merged
    }

    fn into_items(mut self) -> Vec<QueueItem> {
        let mut items = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Some(entry) = self.entries[id as usize].take() else {
                break;
            };
            cursor = entry.next;
            items.push(entry.item);
        }
        items
    }

    fn unlink(&mut self, id: u32, fix_source: bool) {
        let (prev, next, target, source) = {
            let entry = self.entry(id);
            (
                entry.prev,
                entry.next,
                entry.item.target.location,
                entry.item.source.location,
            )
        };

        if let Some(targets) = self.targets.as_mut() {
            let mut drained = false;
            if let Some(index) = targets.get_mut(target) {
                index.count -= 1;
                drained = index.count == 0;
                if index.head == id
                    && !drained
                    && let Some(next) = next
                {
                    // The next entry still shares the target; contiguity
                    // guarantees it.
                    index.head = next;
                }
            }
            if drained {
                targets.remove(target);
            }
        }

        if fix_source
            && let Some(sources) = self.sources.as_mut()
            && let Some(ids) = sources.get_mut(source)
        {
            ids.retain(|&candidate| candidate != id);
        }

        match prev {
            Some(prev) => self.entry_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.entry_mut(next).prev = prev,
            None => self.tail = prev,
        }

        self.entries[id as usize] = None;
        self.free.push(id);
        self.len -= 1;
    }

    fn alloc(&mut self, item: QueueItem) -> u32 {
        let entry = Entry {
            item,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(id) => {
                self.entries[id as usize] = Some(entry);
                id
            }
            None => {
                self.entries.push(Some(entry));
                (self.entries.len() - 1) as u32
            }
        }
    }

    fn entry(&self, id: u32) -> &Entry {
        match &self.entries[id as usize] {
            Some(entry) => entry,
            None => unreachable!("dangling queue id {id}"),
        }
    }

    fn entry_mut(&mut self, id: u32) -> &mut Entry {
        match &mut self.entries[id as usize] {
            Some(entry) => entry,
            None => unreachable!("dangling queue id {id}"),
        }
    }
}

struct ItemIter<'a> {
    queue: &'a Queue,
    cursor: Option<u32>,
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = &'a QueueItem;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let entry = self.queue.entry(id);
        self.cursor = entry.next;
        Some(&entry.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use voxide_common::TypeId;

    fn endpoint(x: i32) -> Endpoint {
        Endpoint {
            location: Location::new(x, 0, 0),
            type_id: TypeId(0),
        }
    }

    fn item(source: i32, target: i32, tick: u64, value: i32) -> QueueItem {
        QueueItem {
            kind: 1,
            tick,
            source: endpoint(source),
            target: endpoint(target),
            field: 0,
            value: FieldValue::Integer(value),
        }
    }

    fn targets_in_order(queue: &Queue) -> Vec<i32> {
        queue.iter().map(|item| item.target.location.x).collect()
    }

    #[test]
    fn push_groups_items_by_target() {
        let mut queue = Queue::new(true, true, 8);
        queue.push(item(0, 1, 0, 1));
        queue.push(item(0, 2, 0, 2));
        queue.push(item(0, 1, 0, 3));
        queue.push(item(0, 3, 0, 4));
        queue.push(item(0, 2, 0, 5));
        queue.push(item(0, 1, 1, 6));

        let order = targets_in_order(&queue);
        // Every target occupies one contiguous run.
        let mut seen = Vec::new();
        for target in &order {
            if seen.last() != Some(target) {
                assert!(!seen.contains(target), "target {target} split: {order:?}");
                seen.push(*target);
            }
        }
        assert_eq!(queue.len(), 6);
    }

    #[test]
    fn find_by_target_and_tick_walks_the_run() {
        let mut queue = Queue::new(true, false, 8);
        queue.push(item(0, 1, 5, 1));
        queue.push(item(0, 1, 0, 2));
        queue.push(item(0, 1, 0, 3));

        let (first, remaining) = queue.find_by_target_and_tick(Location::new(1, 0, 0), 0).unwrap();
        let run: Vec<i32> = queue
            .items_from(first)
            .take_while(|item| item.target.location.x == 1 && item.tick == 0)
            .filter_map(|item| item.value.as_integer())
            .collect();
        assert!(remaining >= run.len() as u32);
        assert_eq!(run.len(), 2);
        assert!(queue
            .find_by_target_and_tick(Location::new(9, 0, 0), 0)
            .is_none());
    }

    #[test]
    fn contains_compares_by_value() {
        let mut queue = Queue::new(true, true, 8);
        queue.push(item(0, 1, 2, 7));
        assert!(queue.contains(&item(0, 1, 2, 7)));
        assert!(!queue.contains(&item(0, 1, 2, 8)));
        assert!(!queue.contains(&item(0, 1, 3, 7)));
        assert!(!queue.contains(&item(4, 1, 2, 7)));
    }

    #[test]
    fn remove_source_revokes_only_that_source() {
        let mut queue = Queue::new(true, true, 8);
        queue.push(item(0, 5, 0, 1));
        queue.push(item(1, 5, 0, 2));
        queue.push(item(0, 6, 0, 3));
        queue.push(item(1, 6, 0, 4));

        queue.remove_source(Location::new(0, 0, 0));

        assert_eq!(queue.len(), 2);
        let values: Vec<i32> = queue
            .iter()
            .filter_map(|item| item.value.as_integer())
            .collect();
        assert!(values.contains(&2) && values.contains(&4));
        // The survivors are still findable through the target index.
        assert!(queue
            .find_by_target_and_tick(Location::new(5, 0, 0), 0)
            .is_some());
        assert!(queue.contains(&item(1, 6, 0, 4)));
    }

    #[test]
    fn remove_source_then_push_same_target_again() {
        let mut queue = Queue::new(true, true, 8);
        queue.push(item(0, 5, 0, 1));
        queue.remove_source(Location::new(0, 0, 0));
        assert!(queue.is_empty());

        queue.push(item(2, 5, 0, 9));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&item(2, 5, 0, 9)));
    }

    #[test]
    fn merge_preserves_order_and_counts() {
        let mut into = Queue::new(true, true, 8);
        into.push(item(0, 1, 0, 1));

        let mut from = Queue::new(false, false, 0);
        from.push(item(2, 3, 0, 2));
        from.push(item(2, 4, 1, 3));
        from.push(item(2, 3, 1, 4));

        assert_eq!(into.merge(from), 3);
        assert_eq!(into.len(), 4);
        assert!(into.contains(&item(2, 3, 1, 4)));

        // Target 3 ends up contiguous in the merged queue.
        let order = targets_in_order(&into);
        let first = order.iter().position(|&target| target == 3).unwrap();
        let last = order.iter().rposition(|&target| target == 3).unwrap();
        assert_eq!(last - first, 1);
    }

    #[test]
    fn untracked_queue_keeps_insertion_order_per_merge() {
        let mut queue = Queue::new(false, false, 0);
        queue.push(item(0, 1, 0, 1));
        queue.push(item(0, 2, 0, 2));
        queue.push(item(0, 3, 0, 3));
        let values: Vec<i32> = queue
            .into_items()
            .into_iter()
            .filter_map(|item| item.value.as_integer())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    proptest! {
        /// P9: items of any one target always occupy a contiguous run.
        #[test]
        fn target_runs_stay_contiguous(
            pushes in prop::collection::vec((0i32..6, 0i32..6, 0u64..3), 0..60)
        ) {
            let mut queue = Queue::new(true, true, 8);
            for (value, (source, target, tick)) in pushes.into_iter().enumerate() {
                queue.push(item(source, target, tick, value as i32));
            }

            let order = targets_in_order(&queue);
            let mut seen = Vec::new();
            for target in &order {
                if seen.last() != Some(target) {
                    prop_assert!(!seen.contains(target), "target {} split: {:?}", target, order);
                    seen.push(*target);
                }
            }
        }
    }
}
