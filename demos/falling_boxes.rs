use impulse_space::*;

fn main() {
    let mut space = PhysicsSpace::new(SpaceConfig::default().with_step_budget(16.0));

    let ground = space.create_object();
    if let Some(object) = space.object_mut(ground) {
        object.set_static(true);
        object.set_position(Vec3::new(0.0, -0.5, 0.0));
        object.set_narrow_phase(Some(ConvexSet::cuboid(Vec3::new(10.0, 0.5, 10.0)).into()));
    }

    let mut boxes = Vec::new();
    for i in 0..5 {
        let handle = space.create_object();
        if let Some(object) = space.object_mut(handle) {
            object.set_position(Vec3::new(i as f32 * 0.3, 1.0 + i as f32 * 1.5, 0.0));
            object.set_restitution(0.3);
            object.set_damping(0.1, 0.1);
            object.set_narrow_phase(Some(ConvexSet::cuboid(Vec3::splat(0.5)).into()));
            object
                .forces_mut()
                .add("air", FrictionForce::new(0.05));
        }
        boxes.push(handle);
    }

    space.set_event_handler(|event: &Event| {
        if let Some(hit) = event.as_collision() {
            println!(
                "collision {:?} <-> {:?} at {:?}",
                hit.first, hit.second, hit.global_contact
            );
        }
    });

    for _ in 0..120 {
        space.simulate_step(1.0 / 60.0, 4);
    }

    for handle in boxes {
        if let Some(object) = space.object(handle) {
            println!("{handle:?}: position {:?}", object.position());
        }
    }
    println!("{}", space.last_step_stats().summary());
}
