pub mod phase_table;
pub mod engine;

pub use phase_table::{PhaseScript, PhaseTable, ScheduledPhase};
pub use engine::Sequencer;
