use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use impulse_space::{collision::gjk, *};
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

fn prepare_space(object_count: usize, mode: NarrowPhaseMode) -> PhysicsSpace {
    let mut space = PhysicsSpace::new(SpaceConfig::default().with_narrow_phase(mode));

    let floor = space.create_object();
    if let Some(object) = space.object_mut(floor) {
        object.set_static(true);
        object.set_position(Vec3::new(0.0, -0.5, 0.0));
        object.set_broad_phase(Some(Collider::bounding_box(Vec3::new(50.0, 0.5, 50.0))));
        object.set_narrow_phase(Some(ConvexSet::cuboid(Vec3::new(50.0, 0.5, 50.0)).into()));
    }

    let side = (object_count as f32).cbrt().ceil() as usize;
    for i in 0..object_count {
        let handle = space.create_object();
        if let Some(object) = space.object_mut(handle) {
            let (x, y, z) = (i % side, (i / side) % side, i / (side * side));
            object.set_position(Vec3::new(x as f32 * 1.1, 1.0 + y as f32 * 1.1, z as f32 * 1.1));
            object.set_broad_phase(Some(Collider::bounding_box(Vec3::splat(0.5))));
            object.set_narrow_phase(Some(ConvexSet::cuboid(Vec3::splat(0.5)).into()));
        }
    }
    space
}

fn bench_space_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("space_step");
    for &count in &[64usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("inline", count), &count, |b, &count| {
            let mut space = prepare_space(count, NarrowPhaseMode::Inline);
            b.iter(|| space.simulate_step(black_box(DT), 2))
        });
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, &count| {
            let mut space = prepare_space(count, NarrowPhaseMode::Parallel);
            b.iter(|| space.simulate_step(black_box(DT), 2))
        });
        group.bench_with_input(BenchmarkId::new("workers", count), &count, |b, &count| {
            let mut space = prepare_space(count, NarrowPhaseMode::WorkerPool { workers: 4 });
            b.iter(|| space.simulate_step(black_box(DT), 2))
        });
    }
    group.finish();
}

fn bench_gjk(c: &mut Criterion) {
    let mut a: Collider = ConvexSet::cuboid(Vec3::splat(0.5)).into();
    let mut b: Collider = ConvexSet::cuboid(Vec3::splat(0.5)).into();
    a.offset(Vec3::ZERO, Quat::from_rotation_y(0.3));
    b.offset(Vec3::new(0.8, 0.2, 0.1), Quat::from_rotation_x(0.7));

    c.bench_function("gjk_overlap", |bench| {
        bench.iter(|| gjk::overlap(black_box(&a), black_box(&b)))
    });
    c.bench_function("epa_penetration", |bench| {
        bench.iter(|| black_box(&a).penetration(black_box(&b)))
    });
    c.bench_function("contact_point", |bench| {
        bench.iter(|| black_box(&a).contact_point(black_box(&b)))
    });
}

criterion_group!(benches, bench_space_step, bench_gjk);
criterion_main!(benches);
