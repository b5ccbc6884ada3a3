use std::time::Instant;

use glam::Vec3;
use parking_lot::Mutex;

use crate::{
    collision::{
        broadphase::{BroadPhase, BroadPhaseEntry},
        contact_cache::ContactCache,
        gjk::Intersection,
        simplex::Simplex,
        workers::{NarrowPhaseJob, NarrowPhaseWorkerPool},
    },
    config::{NarrowPhaseMode, PositionCorrection, SleepPolicy, SpaceConfig},
    core::object::PhysicsObject,
    dynamics::{
        forces,
        integrator::Integrator,
        solver::{Constraint, ConstraintSolver, ContactConstraint, SequentialImpulseSolver},
    },
    events::{CollisionEvent, Event, EventHandler},
    utils::{
        allocator::{Arena, ObjectHandle},
        logging::{warn_if_step_budget_exceeded, ScopedTimer},
        math::try_direction,
        profiling::{PhaseTimer, StepStats},
    },
};

/// Owns every physics object and advances them in discrete steps.
///
/// Objects live in an [`Arena`] whose vacated slots are handed out again by
/// [`PhysicsSpace::create_object`], so the object list only grows past its
/// high-water mark.
pub struct PhysicsSpace {
    config: SpaceConfig,
    objects: Arena<PhysicsObject>,
    contacts: ContactCache,
    broad_phase: BroadPhase,
    solver: SequentialImpulseSolver,
    workers: Option<NarrowPhaseWorkerPool>,
    event_handler: Option<Mutex<EventHandler>>,
    constraints: Vec<Constraint>,
    stats: StepStats,
}

impl Default for PhysicsSpace {
    fn default() -> Self {
        Self::new(SpaceConfig::default())
    }
}

impl PhysicsSpace {
    pub fn new(config: SpaceConfig) -> Self {
        let mut space = Self {
            config,
            objects: Arena::new(),
            contacts: ContactCache::new(),
            broad_phase: BroadPhase::new(),
            solver: SequentialImpulseSolver::default(),
            workers: None,
            event_handler: None,
            constraints: Vec::new(),
            stats: StepStats::default(),
        };
        space.set_narrow_phase(config.narrow_phase);
        space
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    pub fn set_position_correction(&mut self, mode: PositionCorrection) {
        self.config.position_correction = mode;
    }

    pub fn set_sleep_policy(&mut self, policy: Option<SleepPolicy>) {
        self.config.sleep = policy;
    }

    /// Switches the narrow-phase strategy, starting or stopping the worker
    /// pool as needed. A pool that fails to start falls back to inline tests.
    pub fn set_narrow_phase(&mut self, mode: NarrowPhaseMode) {
        self.config.narrow_phase = mode;
        let NarrowPhaseMode::WorkerPool { workers } = mode else {
            self.workers = None;
            return;
        };
        if self.workers.as_ref().map(NarrowPhaseWorkerPool::len) == Some(workers.max(1)) {
            return;
        }
        self.workers = match NarrowPhaseWorkerPool::new(workers) {
            Ok(pool) => Some(pool),
            Err(err) => {
                log::warn!("narrow-phase worker pool unavailable, testing inline: {err}");
                None
            }
        };
    }

    /// Whether narrow-phase tests currently run on the worker pool.
    pub fn uses_worker_pool(&self) -> bool {
        self.workers.is_some()
    }

    pub fn solver_mut(&mut self) -> &mut SequentialImpulseSolver {
        &mut self.solver
    }

    pub fn set_event_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.event_handler = Some(Mutex::new(Box::new(handler)));
    }

    pub fn clear_event_handler(&mut self) {
        self.event_handler = None;
    }

    /// Places a default object in a free slot, reusing one vacated by
    /// [`PhysicsSpace::remove_object`] when available.
    pub fn create_object(&mut self) -> ObjectHandle {
        let handle = self.objects.insert(PhysicsObject::new());
        log::debug!("created object {handle:?}");
        handle
    }

    /// Inserts a fully configured object.
    pub fn add_object(&mut self, mut object: PhysicsObject) -> ObjectHandle {
        object.refresh_colliders();
        let handle = self.objects.insert(object);
        log::debug!("added object {handle:?}");
        handle
    }

    /// Frees the object's slot for reuse. Stale handles are ignored.
    pub fn remove_object(&mut self, handle: ObjectHandle) -> bool {
        match self.objects.remove(handle) {
            Some(_) => {
                self.contacts.remove_object(handle.index());
                log::debug!("removed object {handle:?}");
                true
            }
            None => {
                log::debug!("ignoring removal of stale handle {handle:?}");
                false
            }
        }
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&PhysicsObject> {
        self.objects.get(handle)
    }

    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut PhysicsObject> {
        self.objects.get_mut(handle)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &PhysicsObject)> + '_ {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether the two objects were touching at the end of the last step.
    pub fn in_contact(&self, first: ObjectHandle, second: ObjectHandle) -> bool {
        self.objects.contains(first)
            && self.objects.contains(second)
            && self.contacts.contains(first.index(), second.index())
    }

    pub fn last_step_stats(&self) -> &StepStats {
        &self.stats
    }

    /// Advances the simulation by `step_time` seconds split into `sub_steps`.
    pub fn simulate_step(&mut self, step_time: f32, sub_steps: u32) {
        if !(step_time > 0.0) || sub_steps == 0 {
            log::debug!("skipping step: step_time={step_time} sub_steps={sub_steps}");
            return;
        }

        let _timer = ScopedTimer::new("space::simulate_step");
        let started = Instant::now();
        let mut stats = StepStats {
            object_count: self.objects.len(),
            ..StepStats::default()
        };

        self.contacts.mark_contacts_as_old();

        {
            let _phase = PhaseTimer::new(&mut stats.integrator_time);
            let gravity = self.config.gravity;
            for (_, object) in self.objects.iter_mut() {
                if !object.is_dynamic() {
                    continue;
                }
                Integrator::apply_gravity(object, gravity, step_time);
                forces::apply_all(object, step_time);
            }
        }

        let integrator = Integrator::new(step_time, sub_steps);
        for _ in 0..integrator.substeps {
            self.sub_step(&integrator, &mut stats);
        }

        self.contacts.clean_old_contacts();
        for (_, object) in self.objects.iter_mut() {
            object.clear_accumulators();
        }

        if let Some(policy) = self.config.sleep {
            self.update_sleep(policy);
        }

        stats.total_time = started.elapsed();
        if let Some(budget) = self.config.step_budget_ms {
            warn_if_step_budget_exceeded(stats.total_time, budget);
        }
        log::trace!("{}", stats.summary());
        self.stats = stats;
    }

    fn sub_step(&mut self, integrator: &Integrator, stats: &mut StepStats) {
        {
            let _phase = PhaseTimer::new(&mut stats.integrator_time);
            for (_, object) in self.objects.iter_mut() {
                integrator.integrate_position(object);
                object.refresh_colliders();
            }
        }

        let candidates = {
            let _phase = PhaseTimer::new(&mut stats.broad_phase_time);
            self.candidate_pairs()
        };
        stats.candidate_pairs += candidates.len();

        let overlaps = {
            let _phase = PhaseTimer::new(&mut stats.narrow_phase_time);
            self.narrow_phase(&candidates)
        };
        stats.narrow_phase_tests += candidates.len();

        let mut events = Vec::new();
        {
            let _phase = PhaseTimer::new(&mut stats.solver_time);
            self.constraints.clear();
            let mut moved = vec![false; self.objects.slot_count()];

            for (&(h1, h2), hit) in candidates.iter().zip(overlaps) {
                let retest = moved[h1.index() as usize] || moved[h2.index() as usize];
                let Some((a, b)) = self.objects.get2_mut(h1, h2) else {
                    continue;
                };
                let hit = if retest {
                    a.narrow_phase_intersect(b)
                } else {
                    hit
                };
                if !hit.touching {
                    continue;
                }

                let (constraint, correction, global_contact) = resolve_contact(
                    self.config.position_correction,
                    (h1, a),
                    (h2, b),
                    hit.seed,
                );
                self.constraints.push(constraint.into());
                stats.contacts += 1;
                if correction {
                    moved[h1.index() as usize] = true;
                    moved[h2.index() as usize] = true;
                }

                if self.contacts.add(h1.index(), h2.index()) {
                    stats.new_contacts += 1;
                    events.push(Event::Collision(CollisionEvent {
                        first: h1,
                        second: h2,
                        global_contact,
                    }));
                }
            }

            let metrics = self
                .solver
                .solve(&mut self.objects, &self.constraints, integrator.dt);
            stats.impulses_applied += metrics.impulses_applied;
        }

        if let Some(handler) = self.event_handler.as_mut() {
            let handler = handler.get_mut();
            for event in &events {
                handler(event);
            }
        }
    }

    /// Broad-phase pairs worth a narrow-phase test, in index order.
    fn candidate_pairs(&mut self) -> Vec<(ObjectHandle, ObjectHandle)> {
        let entries: Vec<_> = self
            .objects
            .iter()
            .map(|(handle, object)| BroadPhaseEntry::new(handle.index(), object.bounds()))
            .collect();
        let pairs = self.broad_phase.potential_pairs(&entries).to_vec();

        let mut candidates = Vec::with_capacity(pairs.len());
        for (i, j) in pairs {
            let (Some(h1), Some(h2)) = (self.objects.handle_at(i), self.objects.handle_at(j)) else {
                continue;
            };
            let (Some(a), Some(b)) = (self.objects.get(h1), self.objects.get(h2)) else {
                continue;
            };
            if a.is_static() && b.is_static() {
                continue;
            }
            if !a.is_dynamic() && !b.is_dynamic() {
                // Neither can move, so whatever contact they had still holds.
                self.contacts.touch(i, j);
                continue;
            }
            if a.broad_phase_overlap(b) {
                candidates.push((h1, h2));
            }
        }
        candidates
    }

    fn narrow_phase(&self, candidates: &[(ObjectHandle, ObjectHandle)]) -> Vec<Intersection> {
        match self.config.narrow_phase {
            NarrowPhaseMode::Inline => self.narrow_phase_inline(candidates),
            #[cfg(feature = "parallel")]
            NarrowPhaseMode::Parallel => {
                use rayon::prelude::*;
                let objects = &self.objects;
                candidates
                    .par_iter()
                    .map(|&(h1, h2)| narrow_test(objects, h1, h2))
                    .collect()
            }
            #[cfg(not(feature = "parallel"))]
            NarrowPhaseMode::Parallel => {
                log::debug!("parallel feature disabled, testing inline");
                self.narrow_phase_inline(candidates)
            }
            NarrowPhaseMode::WorkerPool { .. } => match &self.workers {
                Some(pool) => self.narrow_phase_pooled(pool, candidates),
                None => self.narrow_phase_inline(candidates),
            },
        }
    }

    fn narrow_phase_inline(
        &self,
        candidates: &[(ObjectHandle, ObjectHandle)],
    ) -> Vec<Intersection> {
        candidates
            .iter()
            .map(|&(h1, h2)| narrow_test(&self.objects, h1, h2))
            .collect()
    }

    fn narrow_phase_pooled(
        &self,
        pool: &NarrowPhaseWorkerPool,
        candidates: &[(ObjectHandle, ObjectHandle)],
    ) -> Vec<Intersection> {
        let mut overlaps = vec![Intersection::default(); candidates.len()];
        let mut jobs = Vec::new();
        let mut slots = Vec::new();

        for (slot, &(h1, h2)) in candidates.iter().enumerate() {
            let (Some(a), Some(b)) = (self.objects.get(h1), self.objects.get(h2)) else {
                continue;
            };
            let (Some(first), Some(second)) = (a.narrow_phase(), b.narrow_phase()) else {
                continue;
            };
            jobs.push(NarrowPhaseJob {
                first: h1.index(),
                second: h2.index(),
                first_collider: first.clone(),
                second_collider: second.clone(),
            });
            slots.push(slot);
        }

        match pool.run_batch(jobs) {
            Ok(results) => {
                for (slot, result) in slots.into_iter().zip(results) {
                    overlaps[slot] = Intersection {
                        touching: result.overlap,
                        seed: result.seed,
                    };
                }
                overlaps
            }
            Err(err) => {
                log::warn!("narrow-phase workers failed, testing inline: {err}");
                self.narrow_phase_inline(candidates)
            }
        }
    }

    fn update_sleep(&mut self, policy: SleepPolicy) {
        for (handle, object) in self.objects.iter_mut() {
            if !object.is_dynamic() {
                continue;
            }
            let quiet = object.velocity().length() < policy.linear_threshold
                && object.angular_velocity().speed().abs() < policy.angular_threshold;
            if !quiet {
                object.quiet_frames = 0;
                continue;
            }
            object.quiet_frames += 1;
            if object.quiet_frames >= policy.frames {
                object.active = false;
                object.set_velocity(Vec3::ZERO);
                object.set_angular_velocity(Default::default());
                log::trace!("object {handle:?} fell asleep");
            }
        }
    }
}

fn narrow_test(
    objects: &Arena<PhysicsObject>,
    h1: ObjectHandle,
    h2: ObjectHandle,
) -> Intersection {
    match (objects.get(h1), objects.get(h2)) {
        (Some(a), Some(b)) => a.narrow_phase_intersect(b),
        _ => Intersection::default(),
    }
}

/// Wakes both objects, removes their penetration and builds the contact
/// constraint. Returns the constraint, whether any object moved, and the
/// world-space contact point.
///
/// A pair whose penetration EPA cannot resolve is treated as just touching.
fn resolve_contact(
    mode: PositionCorrection,
    first: (ObjectHandle, &mut PhysicsObject),
    second: (ObjectHandle, &mut PhysicsObject),
    seed: Option<Simplex>,
) -> (ContactConstraint, bool, Vec3) {
    let (h1, a) = first;
    let (h2, b) = second;

    for object in [&mut *a, &mut *b] {
        if !object.is_static() {
            object.set_active(true);
        }
    }

    let penetration = a.penetration_seeded(b, seed).unwrap_or_else(|| {
        log::trace!("no penetration depth for {h1:?}/{h2:?}, treating as touching");
        Vec3::ZERO
    });
    let contact = a.contact_point(b).unwrap_or_else(|| {
        log::trace!("contact walk failed for {h1:?}/{h2:?}, using midpoint");
        (a.position() + b.position()) * 0.5
    });
    let normal = try_direction(penetration)
        .or_else(|| try_direction(b.position() - a.position()))
        .unwrap_or(Vec3::X);

    let constraint =
        ContactConstraint::new((h1, &*a), (h2, &*b), contact, contact - penetration, normal);

    let moved = penetration != Vec3::ZERO && correct_positions(mode, a, b, penetration);
    (constraint, moved, contact)
}

fn correct_positions(
    mode: PositionCorrection,
    a: &mut PhysicsObject,
    b: &mut PhysicsObject,
    penetration: Vec3,
) -> bool {
    let (share_a, share_b) = match mode {
        PositionCorrection::FirstObject if !a.is_static() => (1.0, 0.0),
        PositionCorrection::FirstObject if !b.is_static() => (0.0, 1.0),
        PositionCorrection::FirstObject => return false,
        PositionCorrection::MassWeighted => {
            let (wa, wb) = (a.correction_weight(), b.correction_weight());
            let total = wa + wb;
            if total <= 0.0 {
                return false;
            }
            (wa / total, wb / total)
        }
    };

    if share_a > 0.0 {
        a.set_position(a.position() - penetration * share_a);
    }
    if share_b > 0.0 {
        b.set_position(b.position() + penetration * share_b);
    }
    true
}
