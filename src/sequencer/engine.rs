use std::collections::VecDeque;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::common::{InspectionState, PhaseIndex};
use crate::sequencer::phase_table::PhaseTable;

#[derive(Debug)]
struct Activation {
    state: InspectionState,
    /// Absolute deadlines, earliest first.
    pending: VecDeque<(Instant, PhaseIndex)>,
}

/// Turns state activations into a phase timeline.
///
/// The sequencer owns no timers. Callers report activations and the current
/// time, sleep until [`Sequencer::next_deadline`], then [`Sequencer::poll`].
/// Activating a state drops every advance the previous activation still had
/// pending, so a stale deadline can never surface.
#[derive(Debug)]
pub struct Sequencer {
    table: PhaseTable,
    phase: PhaseIndex,
    activation: Option<Activation>,
}

impl Sequencer {
    pub fn new(table: PhaseTable) -> Self {
        Self {
            table,
            phase: PhaseIndex::IDLE,
            activation: None,
        }
    }

    pub fn phase(&self) -> PhaseIndex {
        self.phase
    }

    pub fn active_state(&self) -> Option<InspectionState> {
        self.activation.as_ref().map(|activation| activation.state)
    }

    pub fn pending(&self) -> usize {
        self.activation
            .as_ref()
            .map_or(0, |activation| activation.pending.len())
    }

    /// Enters `state` at `now`, batch-scheduling its whole script, and returns
    /// the phase in effect immediately afterwards.
    pub fn activate(&mut self, state: InspectionState, now: Instant) -> PhaseIndex {
        if let Some(previous) = self.activation.take() {
            if !previous.pending.is_empty() {
                debug!(
                    "Cancelled {} pending advance(s) of {}",
                    previous.pending.len(),
                    previous.state
                );
            }
        }

        let script = self.table.script(&state);
        if let Some(initial) = script.initial {
            self.phase = initial;
        }
        let mut pending: Vec<(Instant, PhaseIndex)> = script
            .advances
            .iter()
            .map(|advance| (now + advance.delay, advance.phase))
            .collect();
        pending.sort_by_key(|(deadline, _)| *deadline);

        info!(
            "Activated {} at phase {} with {} scheduled advance(s)",
            state,
            self.phase,
            pending.len()
        );
        self.activation = Some(Activation {
            state,
            pending: pending.into(),
        });
        self.phase
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.activation
            .as_ref()
            .and_then(|activation| activation.pending.front())
            .map(|(deadline, _)| *deadline)
    }

    /// Applies every advance due by `now`, in deadline order. Returns the
    /// resulting phase if anything was applied.
    pub fn poll(&mut self, now: Instant) -> Option<PhaseIndex> {
        let activation = self.activation.as_mut()?;
        let mut advanced = None;
        while let Some(&(deadline, phase)) = activation.pending.front() {
            if deadline > now {
                break;
            }
            activation.pending.pop_front();
            self.phase = phase;
            advanced = Some(phase);
            debug!("{} advanced to phase {}", activation.state, phase);
        }
        advanced
    }

    /// Manual override. Leaves the schedule alone, so the next due advance
    /// still takes over.
    pub fn set_phase(&mut self, phase: PhaseIndex) {
        self.phase = phase;
    }

    pub fn cancel_pending(&mut self) {
        if let Some(activation) = self.activation.as_mut() {
            activation.pending.clear();
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(PhaseTable::kiosk())
    }
}
