// ============================================
// Experiments (A/B testing)
// ============================================
//
// - assignment: sticky per-user variant assignment (static random split)
// - metrics:    impression / conversion counters per experiment
//
// Both share the per-user `experiments` record in the repository.

pub mod assignment;
pub mod metrics;

pub use assignment::ExperimentAssigner;
pub use metrics::MetricsRecorder;
