pub mod detection;
pub mod inspection_state;
pub mod phase;

pub use detection::DetectionBox;
pub use inspection_state::{InspectionState, ItemTag};
pub use phase::PhaseIndex;
