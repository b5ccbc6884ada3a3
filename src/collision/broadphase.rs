use crate::core::mesh::Aabb;

/// One object as seen by the broad phase. `bounds == None` means the object
/// has no broad-phase collider and is paired with everything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadPhaseEntry {
    pub index: u32,
    pub bounds: Option<Aabb>,
}

impl BroadPhaseEntry {
    pub fn new(index: u32, bounds: Option<Aabb>) -> Self {
        Self { index, bounds }
    }
}

/// Sort-and-sweep along the x axis.
///
/// Produces exactly the pairs an all-pairs AABB test would, each as
/// `(low, high)` index order, sorted ascending.
#[derive(Debug, Default)]
pub struct BroadPhase {
    sorted: Vec<(u32, Aabb)>,
    unbounded: Vec<u32>,
    active: Vec<(u32, Aabb)>,
    pairs: Vec<(u32, u32)>,
}

impl BroadPhase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn potential_pairs(&mut self, entries: &[BroadPhaseEntry]) -> &[(u32, u32)] {
        self.sorted.clear();
        self.unbounded.clear();
        self.active.clear();
        self.pairs.clear();

        for entry in entries {
            match entry.bounds {
                Some(bounds) => self.sorted.push((entry.index, bounds)),
                None => self.unbounded.push(entry.index),
            }
        }

        self.sorted
            .sort_by(|a, b| a.1.min.x.total_cmp(&b.1.min.x).then(a.0.cmp(&b.0)));

        for &(index, bounds) in &self.sorted {
            // Nothing later in the sweep starts before `bounds.min.x`.
            self.active.retain(|(_, other)| other.max.x > bounds.min.x);
            for &(other_index, other) in &self.active {
                if bounds.overlaps(&other) {
                    self.pairs.push(ordered(index, other_index));
                }
            }
            self.active.push((index, bounds));
        }

        for (i, &index) in self.unbounded.iter().enumerate() {
            for &other in &self.unbounded[i + 1..] {
                self.pairs.push(ordered(index, other));
            }
            for &(other, _) in &self.sorted {
                self.pairs.push(ordered(index, other));
            }
        }

        self.pairs.sort_unstable();
        self.pairs.dedup();
        &self.pairs
    }
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn cube(index: u32, center: Vec3) -> BroadPhaseEntry {
        BroadPhaseEntry::new(index, Some(Aabb::new(center - Vec3::ONE, center + Vec3::ONE)))
    }

    fn brute_force(entries: &[BroadPhaseEntry]) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                let hit = match (a.bounds, b.bounds) {
                    (Some(x), Some(y)) => x.overlaps(&y),
                    _ => true,
                };
                if hit {
                    pairs.push(ordered(a.index, b.index));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn sweep_matches_all_pairs_test() {
        let mut entries = Vec::new();
        let mut seed = 17u32;
        for index in 0..40 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let x = (seed % 200) as f32 * 0.1;
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let y = (seed % 60) as f32 * 0.1;
            entries.push(cube(index, Vec3::new(x, y, 0.0)));
        }
        entries.push(BroadPhaseEntry::new(40, None));

        let mut broad = BroadPhase::new();
        let expected = brute_force(&entries);
        assert_eq!(broad.potential_pairs(&entries), expected.as_slice());
    }

    #[test]
    fn touching_boxes_are_not_paired() {
        let entries = [cube(0, Vec3::ZERO), cube(1, Vec3::new(2.0, 0.0, 0.0))];
        assert!(BroadPhase::new().potential_pairs(&entries).is_empty());
    }

    #[test]
    fn unbounded_objects_pair_with_everything() {
        let entries = [
            cube(3, Vec3::ZERO),
            BroadPhaseEntry::new(1, None),
            cube(0, Vec3::new(50.0, 0.0, 0.0)),
        ];
        let mut broad = BroadPhase::new();
        assert_eq!(broad.potential_pairs(&entries), &[(0, 1), (1, 3)]);
    }
}
