pub mod history;
pub mod sequence;

pub use history::History;
pub use sequence::{Sequence, StepEvent, Track, STEPS_PER_PATTERN};
