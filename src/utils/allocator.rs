use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Handle to a pooled slot; the generation detects use after the slot is recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ObjectHandle {
    index: u32,
    generation: u32,
}

impl ObjectHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::new(u32::MAX, 0)
    }
}

/// Generational arena that recycles slots while rejecting stale handles.
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> ObjectHandle {
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index as usize];
            self.items[index as usize] = Some(item);
            return ObjectHandle::new(index, generation);
        }

        let index = self.items.len() as u32;
        self.items.push(Some(item));
        self.generations.push(0);
        ObjectHandle::new(index, 0)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&T> {
        if self.is_valid(handle) {
            self.items
                .get(handle.index() as usize)
                .and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut T> {
        if self.is_valid(handle) {
            self.items
                .get_mut(handle.index() as usize)
                .and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    /// Mutable access to two distinct slots at once, returned in argument order.
    pub fn get2_mut(&mut self, a: ObjectHandle, b: ObjectHandle) -> Option<(&mut T, &mut T)> {
        if a.index() == b.index() {
            return None;
        }

        if !self.is_valid(a) || !self.is_valid(b) {
            return None;
        }

        let (first, second, flipped) = if a.index() < b.index() {
            (a, b, false)
        } else {
            (b, a, true)
        };

        let second_index = second.index() as usize;
        if second_index >= self.items.len() {
            return None;
        }

        let (left, right) = self.items.split_at_mut(second_index);
        let first_slot = left
            .get_mut(first.index() as usize)
            .and_then(|slot| slot.as_mut())?;
        let second_slot = right.get_mut(0).and_then(|slot| slot.as_mut())?;

        if flipped {
            Some((second_slot, first_slot))
        } else {
            Some((first_slot, second_slot))
        }
    }

    /// Frees the slot and bumps its generation so outstanding handles go stale.
    pub fn remove(&mut self, handle: ObjectHandle) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }
        let index = handle.index() as usize;
        let item = self.items.get_mut(index).and_then(Option::take)?;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push_back(handle.index());
        Some(item)
    }

    /// Handle of the live item stored at `index`, if any.
    pub fn handle_at(&self, index: u32) -> Option<ObjectHandle> {
        let slot = index as usize;
        match self.items.get(slot) {
            Some(Some(_)) => Some(ObjectHandle::new(index, self.generations[slot])),
            _ => None,
        }
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (ObjectHandle::new(index as u32, self.generations[index]), item))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectHandle, &mut T)> + '_ {
        let generations = &self.generations;
        self.items
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_mut()
                    .map(|item| (ObjectHandle::new(index as u32, generations[index]), item))
            })
    }

    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Number of slots ever allocated, live or free.
    pub fn slot_count(&self) -> usize {
        self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.generations
            .get(handle.index() as usize)
            .copied()
            .map(|gen| gen == handle.generation())
            .unwrap_or(false)
    }
}
