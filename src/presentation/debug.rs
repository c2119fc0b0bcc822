use crate::common::{InspectionState, ItemTag, PhaseIndex};

/// Operator overrides issued from the on-screen debug controls.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugCommand {
    NextState,
    PreviousState,
    NextPhase,
    PreviousPhase,
    SetState(InspectionState),
    SetTag(Option<ItemTag>),
    SetPhase(PhaseIndex),
}
