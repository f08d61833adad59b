pub mod diversity;
pub mod engine;
pub mod experiments;
pub mod features;
pub mod scoring;
pub mod signals;

pub use diversity::Diversifier;
pub use engine::{EngineSettings, PersonalizationEngine};
pub use experiments::{ExperimentAssigner, MetricsRecorder};
pub use scoring::ScoringEngine;
pub use signals::SignalStore;
