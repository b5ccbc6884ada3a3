use approx::assert_abs_diff_eq;
use impulse_space::{
    collision::{epa, gjk, ContactCache},
    core::mesh::reduce_point_cloud,
    *,
};

fn unit_cube(offset: Vec3) -> Collider {
    let mut vertices = Vec::new();
    for x in [0.0, 1.0] {
        for y in [0.0, 1.0] {
            for z in [0.0, 1.0] {
                vertices.push(Vec3::new(x, y, z));
            }
        }
    }
    let mut collider = Collider::convex_set(vertices);
    collider.offset(offset, Quat::IDENTITY);
    collider
}

#[test]
fn overlap_flips_at_the_combined_extent() {
    let a = unit_cube(Vec3::ZERO);
    for axis in [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z] {
        assert!(!a.overlap(&unit_cube(axis * 1.01)), "axis {axis:?} at 1.01");
        assert!(a.overlap(&unit_cube(axis * 0.9)), "axis {axis:?} at 0.9");
    }
}

#[test]
fn rotated_convex_sets_use_their_world_pose() {
    let mut a = Collider::from(ConvexSet::cuboid(Vec3::new(2.0, 0.1, 0.1)));
    let b = {
        let mut b = Collider::from(ConvexSet::cuboid(Vec3::splat(0.2)));
        b.offset(Vec3::new(0.0, 1.5, 0.0), Quat::IDENTITY);
        b
    };
    a.offset(Vec3::ZERO, Quat::IDENTITY);
    assert!(!a.overlap(&b));
    a.offset(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
    assert!(a.overlap(&b));
}

#[test]
fn bounding_box_joins_the_narrow_phase_as_a_hull() {
    let mut aabb = Collider::bounding_box(Vec3::splat(0.5));
    aabb.offset(Vec3::new(0.3, 0.0, 0.0), Quat::IDENTITY);
    let cube = unit_cube(Vec3::splat(-0.5));
    assert!(aabb.overlap(&cube));
    let pen = aabb.penetration(&cube).expect("shapes overlap");
    assert_abs_diff_eq!(pen.length(), 0.7, epsilon = 1e-3);
}

#[test]
fn contact_point_of_corner_neighbours() {
    let a = unit_cube(Vec3::ZERO);
    let b = unit_cube(Vec3::splat(1.01));
    let contact = gjk::contact_point(&a, &b).expect("walk converges");
    assert!(contact.abs_diff_eq(Vec3::ONE, 0.01), "contact {contact:?}");
}

#[test]
fn epa_seeded_and_unseeded_agree() {
    let a = unit_cube(Vec3::ZERO);
    let b = unit_cube(Vec3::new(0.1, 0.85, 0.05));
    let seed = gjk::intersect(&a, &b);
    let seeded = epa::penetration(&a, &b, seed).expect("seeded");
    let fresh = epa::penetration(&a, &b, None).expect("fresh");
    assert!(seeded.abs_diff_eq(fresh, 1e-4));
    assert_abs_diff_eq!(seeded.y, 0.15, epsilon = 1e-3);
}

#[test]
fn contact_cache_add_then_clean() {
    let mut cache = ContactCache::new();
    cache.add(4, 9);
    assert!(cache.contains(4, 9));
    assert!(cache.contains(9, 4));
    cache.mark_contacts_as_old();
    cache.clean_old_contacts();
    assert!(!cache.contains(4, 9));
}

#[test]
fn mesh_geometry_builds_colliders() {
    let vertices = [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(0.0, 1.0, -1.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0 + 1e-5),
    ];
    let indices = [[0, 1, 2], [0, 1, 3], [1, 2, 4], [2, 0, 3]];
    let set = ConvexSet::from_mesh(&vertices, &indices, 1e-3);
    assert_eq!(set.vertices().len(), 4);
    assert_eq!(reduce_point_cloud(&vertices, 1e-3).len(), 4);

    let aabb = BoundingBox::from_points(&vertices);
    assert!(aabb.half_extents().abs_diff_eq(Vec3::new(1.0, 1.0, 1.0 + 5e-6), 1e-6));
}
