use indexmap::IndexMap;
use std::time::Duration;

use crate::common::{InspectionState, PhaseIndex};

/// A phase assignment applied `delay` after the owning state became active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPhase {
    pub delay: Duration,
    pub phase: PhaseIndex,
}

/// What entering a state does to the phase.
///
/// `initial: None` keeps whatever phase was showing; the delayed advances are
/// all measured from the activation instant, never from one another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseScript {
    pub initial: Option<PhaseIndex>,
    pub advances: Vec<ScheduledPhase>,
}

impl PhaseScript {
    pub fn starting_at(phase: u32) -> Self {
        Self {
            initial: Some(PhaseIndex::new(phase)),
            advances: Vec::new(),
        }
    }

    pub fn then_at(mut self, delay: Duration, phase: u32) -> Self {
        self.advances.push(ScheduledPhase {
            delay,
            phase: PhaseIndex::new(phase),
        });
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseTable {
    scripts: IndexMap<InspectionState, PhaseScript>,
}

impl PhaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, state: InspectionState, script: PhaseScript) -> Self {
        self.scripts.insert(state, script);
        self
    }

    /// Script for `state`; states without an entry keep the current phase
    /// and schedule nothing.
    pub fn script(&self, state: &InspectionState) -> PhaseScript {
        self.scripts.get(state).cloned().unwrap_or_default()
    }

    /// Timeline authored for the inspection line's scenes.
    pub fn kiosk() -> Self {
        Self::new()
            .with_script(InspectionState::State1, PhaseScript::starting_at(0))
            .with_script(InspectionState::State2, PhaseScript::starting_at(1))
            .with_script(InspectionState::State4, PhaseScript::starting_at(2))
            .with_script(
                InspectionState::State4_1,
                PhaseScript::starting_at(3)
                    .then_at(Duration::from_secs(5), 4)
                    .then_at(Duration::from_secs(10), 5)
                    .then_at(Duration::from_secs(15), 6)
                    .then_at(Duration::from_secs(20), 7),
            )
            .with_script(InspectionState::State5, PhaseScript::starting_at(8))
            .with_script(InspectionState::State6, PhaseScript::starting_at(9))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kiosk_table_covers_authored_states() {
        let table = PhaseTable::kiosk();
        assert_eq!(
            table.script(&InspectionState::State4).initial,
            Some(PhaseIndex::new(2))
        );
        let scan = table.script(&InspectionState::State4_1);
        assert_eq!(scan.initial, Some(PhaseIndex::new(3)));
        let delays: Vec<u64> = scan.advances.iter().map(|a| a.delay.as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 15, 20]);
    }

    #[test]
    fn unscripted_states_keep_the_phase() {
        let table = PhaseTable::kiosk();
        for state in [
            InspectionState::State1_1,
            InspectionState::State3,
            InspectionState::State7,
        ] {
            assert_eq!(table.script(&state), PhaseScript::default());
        }
    }

    #[test]
    fn no_script_goes_past_the_authored_range() {
        let table = PhaseTable::kiosk();
        for state in InspectionState::ALL {
            let script = table.script(&state);
            let phases = script
                .initial
                .into_iter()
                .chain(script.advances.iter().map(|a| a.phase));
            for phase in phases {
                assert!(phase <= PhaseIndex::MAX);
            }
        }
    }
}
