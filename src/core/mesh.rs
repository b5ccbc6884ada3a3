//! Reduction of triangle-mesh geometry into the inputs colliders consume:
//! a deduplicated point cloud for convex sets and an extent for bounding boxes.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of a vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half extents; zero for empty bounds.
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.max - self.min) * 0.5
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && other.min.cmplt(self.max).all()
    }
}

/// Cooks raw mesh vertices into a collider-ready point cloud.
#[derive(Debug, Clone)]
pub struct PointCloudBuilder {
    vertices: Vec<Vec3>,
}

impl PointCloudBuilder {
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self { vertices }
    }

    /// Collects the vertices referenced by a triangle list, ignoring
    /// out-of-range indices.
    pub fn from_triangles(vertices: &[Vec3], indices: &[[u32; 3]]) -> Self {
        let points = indices
            .iter()
            .flat_map(|tri| tri.iter())
            .filter_map(|&i| vertices.get(i as usize).copied())
            .collect();
        Self::new(points)
    }

    /// Drops every vertex closer than `distance` to an already kept vertex.
    ///
    /// Kept vertices are bucketed on a grid of cell size `distance`, so each
    /// candidate only compares against the 27 surrounding cells.
    pub fn cull(mut self, distance: f32) -> Self {
        if distance <= 0.0 || self.vertices.is_empty() {
            return self;
        }

        let inv = 1.0 / distance;
        let dist_sq = distance * distance;
        let cell_of = |v: Vec3| {
            (
                (v.x * inv).floor() as i32,
                (v.y * inv).floor() as i32,
                (v.z * inv).floor() as i32,
            )
        };

        let mut grid: HashMap<(i32, i32, i32), Vec<usize>> = HashMap::new();
        let mut kept: Vec<Vec3> = Vec::new();

        'vertices: for v in &self.vertices {
            let (cx, cy, cz) = cell_of(*v);
            for x in cx - 1..=cx + 1 {
                for y in cy - 1..=cy + 1 {
                    for z in cz - 1..=cz + 1 {
                        let Some(bucket) = grid.get(&(x, y, z)) else {
                            continue;
                        };
                        if bucket
                            .iter()
                            .any(|&k| (kept[k] - *v).length_squared() < dist_sq)
                        {
                            continue 'vertices;
                        }
                    }
                }
            }
            grid.entry((cx, cy, cz)).or_default().push(kept.len());
            kept.push(*v);
        }

        log::trace!(
            "point cloud culled from {} to {} vertices",
            self.vertices.len(),
            kept.len()
        );
        self.vertices = kept;
        self
    }

    /// Recenters vertices around their centroid.
    pub fn recenter(mut self) -> Self {
        if self.vertices.is_empty() {
            return self;
        }
        let centroid: Vec3 =
            self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32;
        for vertex in &mut self.vertices {
            *vertex -= centroid;
        }
        self
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    pub fn build(self) -> Vec<Vec3> {
        self.vertices
    }
}

/// Convenience wrapper: deduplicates `vertices` at `distance`.
pub fn reduce_point_cloud(vertices: &[Vec3], distance: f32) -> Vec<Vec3> {
    PointCloudBuilder::new(vertices.to_vec())
        .cull(distance)
        .build()
}
