//! Fixed-capacity slot list of one bucket
//!
//! A [`Bucket`] is a mutable view over `capacity` slots of the arena. It is
//! only ever built by [`BucketArena::lock`](crate::arena::BucketArena::lock),
//! so every operation here runs with the bucket's lock held.
//!
//! # Slot Invariants
//!
//! - Occupied slots are contiguous from index 0, so the first empty slot ends
//!   every scan.
//! - Occupied slots hold pairwise content-distinct values.
//!
//! # Recency
//!
//! ```text
//! insert "new":   [a b c d]   ->  [new a b c]       (d evicted)
//! hit at 6:       [a b c d e f g h]  ->  [a b g c d e f h]
//! ```

use crate::PooledStr;

/// Hits beyond this index get promoted
pub const PROMOTE_THRESHOLD: usize = 4;

/// Slots a promoted hit moves toward the front
pub const PROMOTE_DISTANCE: usize = 4;

pub struct Bucket<'a> {
    slots: &'a mut [Option<PooledStr>],
}

impl<'a> Bucket<'a> {
    /// `slots` must already satisfy the slot invariants (all `None` does)
    #[inline]
    pub(crate) fn new(slots: &'a mut [Option<PooledStr>]) -> Self {
        debug_assert!(!slots.is_empty());
        Self { slots }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().position(Option::is_none).unwrap_or(self.slots.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool { self.slots[0].is_none() }

    /// Occupied slots, front to back
    pub fn iter(&self) -> impl Iterator<Item = &PooledStr> + '_ {
        self.slots.iter().map_while(Option::as_ref)
    }

    /// Index of the entry whose content equals `content`
    pub fn find(&self, content: &str) -> Option<usize> {
        for (index, slot) in self.slots.iter().enumerate() {
            let stored = slot.as_ref()?;
            if stored.matches(content) {
                return Some(index);
            }
        }
        None
    }

    /// Look up `content`, promoting the entry on a deep hit
    pub fn try_get(&mut self, content: &str) -> Option<PooledStr> {
        let found = self.find(content)?;
        let index = self.promote(found);
        self.slots[index].clone()
    }

    #[inline]
    pub fn contains(&mut self, content: &str) -> bool { self.try_get(content).is_some() }

    /// Put `value` at the front
    ///
    /// Returns the evicted tail when the bucket was full. An entry with the
    /// same content is replaced in place of an eviction.
    pub fn add(&mut self, value: PooledStr) -> Option<PooledStr> {
        match self.find(value.as_str()) {
            Some(existing) => {
                self.slots[..=existing].rotate_right(1);
                self.slots[0] = Some(value);
                None
            }
            None => self.push_front(value),
        }
    }

    /// Existing entry for `content`, or a new one inserted at the front
    ///
    /// The second element is the tail evicted by the insertion, if any.
    pub fn get_or_add(&mut self, content: &str) -> (PooledStr, Option<PooledStr>) {
        if let Some(existing) = self.try_get(content) {
            return (existing, None);
        }

        let value = PooledStr::new(content);
        let evicted = self.push_front(value.clone());
        (value, evicted)
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.take().is_none() {
                break;
            }
        }
    }

    /// Move the hit at `index` closer to the front, keeping the relative order
    /// of the entries it passes
    fn promote(&mut self, index: usize) -> usize {
        if index <= PROMOTE_THRESHOLD {
            return index;
        }
        let target = index - PROMOTE_DISTANCE;
        self.slots[target..=index].rotate_right(1);
        target
    }

    /// Caller guarantees no entry with the same content exists
    fn push_front(&mut self, value: PooledStr) -> Option<PooledStr> {
        self.slots.rotate_right(1);
        self.slots[0].replace(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(capacity: usize) -> Vec<Option<PooledStr>> { vec![None; capacity] }

    fn contents<'b>(bucket: &'b Bucket<'_>) -> Vec<&'b str> {
        bucket.iter().map(PooledStr::as_str).collect()
    }

    fn fill(bucket: &mut Bucket<'_>, names: &[&str]) {
        for name in names {
            bucket.get_or_add(name);
        }
    }

    #[test]
    fn test_insert_order_is_newest_first() {
        let mut slots = storage(4);
        let mut bucket = Bucket::new(&mut slots);
        assert!(bucket.is_empty());

        fill(&mut bucket, &["aa", "bb", "cc"]);
        assert_eq!(contents(&bucket), ["cc", "bb", "aa"]);
        assert_eq!(bucket.len(), 3);
    }

    #[test]
    fn test_full_bucket_evicts_tail() {
        let mut slots = storage(4);
        let mut bucket = Bucket::new(&mut slots);
        fill(&mut bucket, &["aa", "bb", "cc", "dd"]);

        let (_, evicted) = bucket.get_or_add("ee");
        assert_eq!(evicted.as_deref(), Some("aa"));
        assert_eq!(contents(&bucket), ["ee", "dd", "cc", "bb"]);
        assert_eq!(bucket.find("aa"), None);
    }

    #[test]
    fn test_get_or_add_reuses_entry() {
        let mut slots = storage(4);
        let mut bucket = Bucket::new(&mut slots);

        let (first, _) = bucket.get_or_add("shared");
        let (second, evicted) = bucket.get_or_add("shared");
        assert!(PooledStr::ptr_eq(&first, &second));
        assert!(evicted.is_none());
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn test_deep_hit_moves_four_slots() {
        let mut slots = storage(8);
        let mut bucket = Bucket::new(&mut slots);
        fill(&mut bucket, &["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"]);
        assert_eq!(bucket.find("s0"), Some(7));

        assert!(bucket.try_get("s0").is_some());
        assert_eq!(bucket.find("s0"), Some(3));
        assert_eq!(contents(&bucket), ["s7", "s6", "s5", "s0", "s4", "s3", "s2", "s1"]);
    }

    #[test]
    fn test_shallow_hit_stays() {
        let mut slots = storage(8);
        let mut bucket = Bucket::new(&mut slots);
        fill(&mut bucket, &["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"]);

        // s3 sits at index 4
        assert!(bucket.contains("s3"));
        assert_eq!(bucket.find("s3"), Some(4));
        assert_eq!(contents(&bucket), ["s7", "s6", "s5", "s4", "s3", "s2", "s1", "s0"]);
    }

    #[test]
    fn test_repeated_hits_reach_front() {
        let mut slots = storage(16);
        let mut bucket = Bucket::new(&mut slots);
        let names: Vec<String> = (0..16).map(|i| format!("n{i:02}")).collect();
        for name in &names {
            bucket.get_or_add(name);
        }

        assert_eq!(bucket.find("n00"), Some(15));
        let mut last = 15;
        while last > PROMOTE_THRESHOLD {
            bucket.try_get("n00");
            let now = bucket.find("n00").unwrap();
            assert!(now < last);
            last = now;
        }
        assert_eq!(bucket.len(), 16);
    }

    #[test]
    fn test_add_replaces_equal_content() {
        let mut slots = storage(4);
        let mut bucket = Bucket::new(&mut slots);
        fill(&mut bucket, &["aa", "bb", "cc", "dd"]);

        let fresh = PooledStr::new("bb");
        assert!(bucket.add(fresh.clone()).is_none());
        assert_eq!(contents(&bucket), ["bb", "dd", "cc", "aa"]);
        assert!(PooledStr::ptr_eq(&bucket.try_get("bb").unwrap(), &fresh));
    }

    #[test]
    fn test_add_new_content_evicts() {
        let mut slots = storage(2);
        let mut bucket = Bucket::new(&mut slots);
        assert!(bucket.add(PooledStr::new("aa")).is_none());
        assert!(bucket.add(PooledStr::new("bb")).is_none());
        assert_eq!(bucket.add(PooledStr::new("cc")).as_deref(), Some("aa"));
    }

    #[test]
    fn test_collisions_compare_content() {
        let mut slots = storage(4);
        let mut bucket = Bucket::new(&mut slots);
        let (a, _) = bucket.get_or_add("abcde");
        let (b, _) = bucket.get_or_add("axcye");
        assert_eq!(a, "abcde");
        assert_eq!(b, "axcye");
        assert!(!PooledStr::ptr_eq(&a, &b));
    }

    #[test]
    fn test_miss_does_not_reorder() {
        let mut slots = storage(8);
        let mut bucket = Bucket::new(&mut slots);
        fill(&mut bucket, &["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"]);
        let before: Vec<String> = bucket.iter().map(|s| s.to_string()).collect();

        assert!(bucket.try_get("missing").is_none());
        let after: Vec<String> = bucket.iter().map(|s| s.to_string()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_clear() {
        let mut slots = storage(4);
        let mut bucket = Bucket::new(&mut slots);
        fill(&mut bucket, &["aa", "bb"]);
        bucket.clear();
        assert!(bucket.is_empty());
        assert_eq!(bucket.len(), 0);
        assert_eq!(bucket.find("aa"), None);

        fill(&mut bucket, &["cc"]);
        assert_eq!(contents(&bucket), ["cc"]);
    }

    #[test]
    fn test_evicted_value_stays_usable() {
        let mut slots = storage(1);
        let mut bucket = Bucket::new(&mut slots);
        let (held, _) = bucket.get_or_add("held");
        let (_, evicted) = bucket.get_or_add("next");

        let evicted = evicted.unwrap();
        assert!(PooledStr::ptr_eq(&held, &evicted));
        drop(evicted);
        assert_eq!(held, "held");
        assert_eq!(held.ref_count(), 1);
    }
}
