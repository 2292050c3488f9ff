//! Per-event sampling decision.

use rand::Rng;

/// Decides whether a captured event is kept
pub trait Sampler: Send + Sync {
    /// `rate` is the keep probability in [0, 1]
    fn keep(&self, rate: f64) -> bool;
}

/// Uniform-random keep/drop: an event is dropped when a draw in [0, 1)
/// exceeds the rate
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn keep(&self, rate: f64) -> bool {
        let draw: f64 = rand::thread_rng().gen();
        draw <= rate
    }
}
