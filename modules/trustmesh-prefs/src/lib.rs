pub mod completeness;
pub mod engine;
pub mod group;

pub use engine::{default_preferences, PreferenceEngine};
pub use group::detect_conflicts;
