use std::time::{Duration, Instant};

/// Counters and phase timings gathered during one `simulate_step` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepStats {
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub solver_time: Duration,
    pub integrator_time: Duration,
    pub total_time: Duration,

    pub object_count: usize,
    pub candidate_pairs: usize,
    pub narrow_phase_tests: usize,
    pub contacts: usize,
    pub new_contacts: usize,
    /// Contact impulses the solver applied, summed over iterations and sub-steps.
    pub impulses_applied: usize,
}

impl StepStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One-line summary suitable for a debug log record.
    pub fn summary(&self) -> String {
        format!(
            "objects={} pairs={} tests={} contacts={} new={} impulses={} total={:.3}ms (broad {:.3} / narrow {:.3} / solver {:.3} / integrate {:.3})",
            self.object_count,
            self.candidate_pairs,
            self.narrow_phase_tests,
            self.contacts,
            self.new_contacts,
            self.impulses_applied,
            self.total_time.as_secs_f32() * 1000.0,
            self.broad_phase_time.as_secs_f32() * 1000.0,
            self.narrow_phase_time.as_secs_f32() * 1000.0,
            self.solver_time.as_secs_f32() * 1000.0,
            self.integrator_time.as_secs_f32() * 1000.0,
        )
    }
}

/// Adds the lifetime of the guard to the referenced duration.
pub struct PhaseTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
