//! Working set of Minkowski-difference support points shared by GJK and EPA.
//!
//! GJK keeps at most four points, newest last. EPA seeds its face list from a
//! four-point tetrahedron and then grows the point list as it expands.

use glam::Vec3;

use crate::{
    config::GJK_EPSILON,
    core::collider::Collider,
    utils::math::{closest_on_segment, closest_on_triangle, distance_to_feature},
};

/// Maximum number of points a GJK simplex may hold.
pub const GJK_CAPACITY: usize = 4;

/// Point of the Minkowski difference `A − B` together with the hull points it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportPoint {
    pub point: Vec3,
    pub a: Vec3,
    pub b: Vec3,
}

impl SupportPoint {
    /// Support of `first − second` in `direction`.
    pub fn of(first: &Collider, second: &Collider, direction: Vec3) -> Self {
        let a = first.support(direction);
        let b = second.support(-direction);
        Self { point: a - b, a, b }
    }
}

/// Triangle of point indices, wound so its normal faces out of the polytope.
pub type Face = [usize; 3];

/// EPA face closest to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestFace {
    pub index: usize,
    pub distance: f32,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct Simplex {
    points: Vec<SupportPoint>,
    faces: Vec<Face>,
}

impl Simplex {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(GJK_CAPACITY),
            faces: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.faces.clear();
    }

    pub fn points(&self) -> &[SupportPoint] {
        &self.points
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn last(&self) -> Option<&SupportPoint> {
        self.points.last()
    }

    pub fn is_tetrahedron(&self) -> bool {
        self.points.len() == GJK_CAPACITY
    }

    /// Adds a GJK point. Refuses once the simplex already holds four points.
    pub fn push(&mut self, point: SupportPoint) -> bool {
        if self.points.len() >= GJK_CAPACITY {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Reports whether the simplex encloses the origin. Otherwise drops the
    /// points that cannot be part of the closest feature and points
    /// `direction` at the origin from what remains.
    pub fn contains_origin(&mut self, direction: &mut Vec3) -> bool {
        match self.points.len() {
            1 => {
                *direction = -self.points[0].point;
                false
            }
            2 => {
                self.line_case(direction);
                false
            }
            3 => {
                self.triangle_case(direction);
                false
            }
            4 => self.tetrahedron_case(direction),
            _ => false,
        }
    }

    fn line_case(&mut self, direction: &mut Vec3) {
        let a = self.points[1].point;
        let b = self.points[0].point;
        let ab = b - a;
        let ao = -a;

        if ab.dot(ao) <= 0.0 {
            self.points.remove(0);
            *direction = ao;
            return;
        }

        let dir = ab.cross(ao).cross(ab);
        if dir.length_squared() < GJK_EPSILON {
            // Origin lies on the segment; any perpendicular will do.
            let axis = if ab.x.abs() < 0.1 { Vec3::X } else { Vec3::Y };
            *direction = ab.cross(axis);
        } else {
            *direction = dir;
        }
    }

    fn triangle_case(&mut self, direction: &mut Vec3) {
        let a = self.points[2].point;
        let b = self.points[1].point;
        let c = self.points[0].point;
        let ab = b - a;
        let ac = c - a;
        let ao = -a;
        let abc = ab.cross(ac);

        if abc.length_squared() < GJK_EPSILON {
            // Collinear points: keep the newest edge and retry.
            self.points.remove(0);
            self.line_case(direction);
            return;
        }

        if abc.cross(ac).dot(ao) > 0.0 {
            if ac.dot(ao) > 0.0 {
                self.points.remove(1);
                *direction = ac.cross(ao).cross(ac);
            } else {
                self.points.remove(0);
                self.line_case(direction);
            }
        } else if ab.cross(abc).dot(ao) > 0.0 {
            self.points.remove(0);
            self.line_case(direction);
        } else if abc.dot(ao) > 0.0 {
            *direction = abc;
        } else {
            self.points.swap(0, 1);
            *direction = -abc;
        }
    }

    fn tetrahedron_case(&mut self, direction: &mut Vec3) -> bool {
        let a = self.points[3].point;
        let ao = -a;
        // Faces through the newest point, each paired with its opposite vertex.
        let faces = [([3, 2, 1], 0), ([3, 1, 0], 2), ([3, 0, 2], 1)];

        for (face, opposite) in faces {
            let normal = self.outward_normal(face, opposite);
            if normal.dot(ao) > 0.0 {
                self.points.remove(opposite);
                *direction = normal;
                return false;
            }
        }
        true
    }

    /// Unnormalized face normal oriented away from the vertex `opposite`.
    fn outward_normal(&self, face: Face, opposite: usize) -> Vec3 {
        let a = self.points[face[0]].point;
        let normal = (self.points[face[1]].point - a).cross(self.points[face[2]].point - a);
        if normal.dot(self.points[opposite].point - a) > 0.0 {
            -normal
        } else {
            normal
        }
    }

    /// Shrinks the simplex to the smallest feature closest to the origin.
    /// Returns that closest point and the barycentric weights of the kept
    /// points (unused trailing weights are zero). A tetrahedron enclosing the
    /// origin is kept whole and reports the origin itself.
    pub fn reduce_toward_origin(&mut self) -> (Vec3, [f32; 4]) {
        match self.points.len() {
            0 => (Vec3::ZERO, [0.0; 4]),
            1 => (self.points[0].point, [1.0, 0.0, 0.0, 0.0]),
            2 => {
                let (closest, t) =
                    closest_on_segment(self.points[0].point, self.points[1].point, Vec3::ZERO);
                let weights = self.retain_weighted(&[(0, 1.0 - t), (1, t)]);
                (closest, weights)
            }
            3 => {
                let (closest, w) = closest_on_triangle(
                    self.points[0].point,
                    self.points[1].point,
                    self.points[2].point,
                    Vec3::ZERO,
                );
                let weights = self.retain_weighted(&[(0, w[0]), (1, w[1]), (2, w[2])]);
                (closest, weights)
            }
            _ => {
                let faces = [([0, 1, 2], 3), ([0, 1, 3], 2), ([0, 2, 3], 1), ([1, 2, 3], 0)];
                let mut best: Option<(Vec3, Face, [f32; 3])> = None;
                for (face, opposite) in faces {
                    let normal = self.outward_normal(face, opposite);
                    if normal.dot(-self.points[face[0]].point) <= 0.0 {
                        continue;
                    }
                    let (closest, w) = closest_on_triangle(
                        self.points[face[0]].point,
                        self.points[face[1]].point,
                        self.points[face[2]].point,
                        Vec3::ZERO,
                    );
                    let better = best
                        .map(|(current, _, _)| closest.length_squared() < current.length_squared())
                        .unwrap_or(true);
                    if better {
                        best = Some((closest, face, w));
                    }
                }

                match best {
                    None => (Vec3::ZERO, [0.25; 4]),
                    Some((closest, face, w)) => {
                        let weights = self.retain_weighted(&[
                            (face[0], w[0]),
                            (face[1], w[1]),
                            (face[2], w[2]),
                        ]);
                        (closest, weights)
                    }
                }
            }
        }
    }

    fn retain_weighted(&mut self, weighted: &[(usize, f32)]) -> [f32; 4] {
        let mut kept = Vec::with_capacity(weighted.len());
        let mut weights = [0.0; 4];
        for &(index, weight) in weighted {
            if weight > 0.0 {
                weights[kept.len()] = weight;
                kept.push(self.points[index]);
            }
        }
        if kept.is_empty() {
            // All weights collapsed; keep the first point so the walk can continue.
            kept.push(self.points[weighted[0].0]);
            weights[0] = 1.0;
        }
        self.points = kept;
        weights
    }

    /// Points on each hull that correspond to the weighted Minkowski point.
    pub fn witness_points(&self, weights: &[f32; 4]) -> (Vec3, Vec3) {
        let mut on_a = Vec3::ZERO;
        let mut on_b = Vec3::ZERO;
        for (point, weight) in self.points.iter().zip(weights.iter()) {
            on_a += point.a * *weight;
            on_b += point.b * *weight;
        }
        (on_a, on_b)
    }

    /// Contact for a simplex that already brackets the origin: of the source
    /// points on either hull, the one lying closest to both source features.
    pub fn bracketed_contact(&self) -> Option<Vec3> {
        let indices: Vec<usize> = if self.points.len() == GJK_CAPACITY {
            let faces = [([0, 1, 2], 3), ([0, 1, 3], 2), ([0, 2, 3], 1), ([1, 2, 3], 0)];
            let (face, _) = faces.into_iter().fold(
                (None::<Face>, f32::INFINITY),
                |(best, best_dist), (face, opposite)| {
                    let normal = self.outward_normal(face, opposite).normalize_or_zero();
                    let dist = self.points[face[0]].point.dot(normal).abs();
                    if normal != Vec3::ZERO && dist < best_dist {
                        (Some(face), dist)
                    } else {
                        (best, best_dist)
                    }
                },
            );
            face.map(|f| f.to_vec()).unwrap_or_else(|| vec![0, 1, 2])
        } else {
            (0..self.points.len()).collect()
        };

        if indices.is_empty() {
            return None;
        }

        let feature_a: Vec<Vec3> = indices.iter().map(|&i| self.points[i].a).collect();
        let feature_b: Vec<Vec3> = indices.iter().map(|&i| self.points[i].b).collect();

        feature_a
            .iter()
            .chain(feature_b.iter())
            .copied()
            .map(|p| {
                let score = distance_to_feature(&feature_a, p) + distance_to_feature(&feature_b, p);
                (p, score)
            })
            .fold(None::<(Vec3, f32)>, |best, candidate| match best {
                Some(current) if current.1 <= candidate.1 => Some(current),
                _ => Some(candidate),
            })
            .map(|(p, _)| p)
    }

    /// Whether a point within `tolerance` of `point` is already present.
    pub fn contains_point(&self, point: Vec3, tolerance: f32) -> bool {
        let tol_sq = tolerance * tolerance;
        self.points
            .iter()
            .any(|p| (p.point - point).length_squared() <= tol_sq)
    }

    /// Rebuilds the EPA face list from the four GJK points, each face wound
    /// away from the opposite vertex. Returns `false` unless the simplex is a
    /// tetrahedron.
    pub fn build_faces(&mut self) -> bool {
        self.faces.clear();
        if self.points.len() != GJK_CAPACITY {
            return false;
        }
        let faces = [([0, 1, 2], 3), ([0, 2, 3], 1), ([0, 3, 1], 2), ([1, 3, 2], 0)];
        for (face, opposite) in faces {
            let a = self.points[face[0]].point;
            let normal = (self.points[face[1]].point - a).cross(self.points[face[2]].point - a);
            if normal.dot(self.points[opposite].point - a) > 0.0 {
                self.faces.push([face[0], face[2], face[1]]);
            } else {
                self.faces.push(face);
            }
        }
        true
    }

    /// Unnormalized outward normal of `face`.
    pub fn face_normal(&self, face: Face) -> Vec3 {
        let a = self.points[face[0]].point;
        (self.points[face[1]].point - a).cross(self.points[face[2]].point - a)
    }

    pub fn closest_face(&self) -> Option<ClosestFace> {
        let mut closest: Option<ClosestFace> = None;
        for (index, face) in self.faces.iter().enumerate() {
            let normal = self.face_normal(*face).normalize_or_zero();
            if normal == Vec3::ZERO {
                continue;
            }
            let distance = self.points[face[0]].point.dot(normal);
            if closest.map(|c| distance < c.distance).unwrap_or(true) {
                closest = Some(ClosestFace {
                    index,
                    distance,
                    normal,
                });
            }
        }
        closest
    }

    /// Adds `support` to the polytope, removing every face it can see and
    /// stitching the horizon to the new point.
    pub fn expand(&mut self, support: SupportPoint) {
        let new_index = self.points.len();
        self.points.push(support);

        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < self.faces.len() {
            let [a, b, c] = self.faces[i];
            let normal = self.face_normal(self.faces[i]);
            if normal.dot(support.point - self.points[a].point) > 0.0 {
                for edge in [(a, b), (b, c), (c, a)] {
                    if let Some(pos) = edges.iter().position(|&(u, v)| (v, u) == edge) {
                        edges.swap_remove(pos);
                    } else {
                        edges.push(edge);
                    }
                }
                self.faces.swap_remove(i);
            } else {
                i += 1;
            }
        }

        for (u, v) in edges {
            self.faces.push([u, v, new_index]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(p: Vec3) -> SupportPoint {
        SupportPoint { point: p, a: p, b: Vec3::ZERO }
    }

    fn tetrahedron() -> Simplex {
        let mut simplex = Simplex::new();
        for p in [
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(0.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ] {
            assert!(simplex.push(point(p)));
        }
        simplex
    }

    #[test]
    fn push_refuses_a_fifth_point() {
        let mut simplex = tetrahedron();
        assert!(!simplex.push(point(Vec3::ONE)));
        assert_eq!(simplex.len(), 4);
    }

    #[test]
    fn tetrahedron_around_origin_contains_it() {
        let mut simplex = tetrahedron();
        let mut direction = Vec3::ZERO;
        assert!(simplex.contains_origin(&mut direction));
    }

    #[test]
    fn tetrahedron_missing_origin_evicts_a_point() {
        let mut simplex = Simplex::new();
        for p in [
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::new(1.0, 2.0, 1.0),
            Vec3::new(1.0, 1.0, 2.0),
        ] {
            simplex.push(point(p));
        }
        let mut direction = Vec3::ZERO;
        assert!(!simplex.contains_origin(&mut direction));
        assert_eq!(simplex.len(), 3);
        assert!(direction.dot(-simplex.last().map(|p| p.point).unwrap_or_default()) > 0.0);
    }

    #[test]
    fn line_case_points_back_at_origin() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(-1.0, 1.0, 0.0)));
        simplex.push(point(Vec3::new(1.0, 1.0, 0.0)));
        let mut direction = Vec3::ZERO;
        assert!(!simplex.contains_origin(&mut direction));
        let dir = direction.normalize();
        assert!((dir - -Vec3::Y).length() < 1e-5, "direction was {direction:?}");
    }

    #[test]
    fn epa_faces_point_away_from_origin() {
        let mut simplex = tetrahedron();
        assert!(simplex.build_faces());
        assert_eq!(simplex.faces().len(), 4);
        for face in simplex.faces() {
            let normal = simplex.face_normal(*face);
            for &i in face {
                assert!(simplex.points()[i].point.dot(normal) >= 0.0);
            }
        }
    }

    #[test]
    fn expanded_faces_stay_outward() {
        let mut simplex = tetrahedron();
        simplex.build_faces();
        simplex.expand(point(Vec3::new(0.0, -3.0, 0.0)));
        assert!(simplex.faces().len() >= 4);
        for face in simplex.faces() {
            let normal = simplex.face_normal(*face);
            assert!(simplex.points()[face[0]].point.dot(normal) >= 0.0);
        }
        let closest = simplex.closest_face().expect("polytope has faces");
        assert!(closest.distance > 0.0);
    }

    #[test]
    fn reduction_keeps_only_the_closest_vertex() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(1.0, 1.0, 1.0)));
        simplex.push(point(Vec3::new(2.0, 2.0, 2.0)));
        let (closest, weights) = simplex.reduce_toward_origin();
        assert_eq!(closest, Vec3::ONE);
        assert_eq!(simplex.len(), 1);
        assert_eq!(weights[0], 1.0);
    }
}
