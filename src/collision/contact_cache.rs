//! Pair cache deciding which contacts are new this step.

use std::collections::HashMap;

/// Order-independent key for a pair of object indices.
pub fn pair_hash(first: u32, second: u32) -> u64 {
    let (low, high) = if first < second {
        (first, second)
    } else {
        (second, first)
    };
    u64::from(high) | (u64::from(low) << 32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CachedContact {
    first: u32,
    second: u32,
    old: bool,
}

/// Remembers which object pairs were touching, so a collision is only
/// reported on the step the contact begins.
#[derive(Debug, Clone, Default)]
pub struct ContactCache {
    entries: HashMap<u64, CachedContact>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, first: u32, second: u32) -> bool {
        self.entries.contains_key(&pair_hash(first, second))
    }

    /// Flags every cached pair as stale; pairs still touching are refreshed
    /// by [`ContactCache::add`] or [`ContactCache::touch`] during the step.
    pub fn mark_contacts_as_old(&mut self) {
        for entry in self.entries.values_mut() {
            entry.old = true;
        }
    }

    /// Records a touching pair. Returns `true` when the pair was not cached.
    pub fn add(&mut self, first: u32, second: u32) -> bool {
        let key = pair_hash(first, second);
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.old = false;
                false
            }
            None => {
                self.entries.insert(
                    key,
                    CachedContact {
                        first,
                        second,
                        old: false,
                    },
                );
                true
            }
        }
    }

    /// Keeps an existing pair alive without testing it. No-op for unknown pairs.
    pub fn touch(&mut self, first: u32, second: u32) {
        if let Some(entry) = self.entries.get_mut(&pair_hash(first, second)) {
            entry.old = false;
        }
    }

    /// Drops every pair not refreshed since the last [`ContactCache::mark_contacts_as_old`].
    pub fn clean_old_contacts(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.old);
        before - self.entries.len()
    }

    /// Forgets every pair involving `index`.
    pub fn remove_object(&mut self, index: u32) {
        self.entries
            .retain(|_, entry| entry.first != index && entry.second != index);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.values().map(|entry| (entry.first, entry.second))
    }
}
