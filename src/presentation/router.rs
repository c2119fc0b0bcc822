use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::common::{DetectionBox, InspectionState, ItemTag, PhaseIndex};
use crate::network::StatePatch;
use crate::presentation::debug::DebugCommand;
use crate::sequencer::Sequencer;

/// Everything the visual layer renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presentation {
    pub tag: Option<ItemTag>,
    pub state: InspectionState,
    pub phase: PhaseIndex,
    pub detections: Vec<DetectionBox>,
}

/// Single writer of the [`Presentation`] tuple.
///
/// Merges stream patches field by field, regenerates the phase schedule on
/// state transitions and applies operator overrides. Readers get snapshots
/// through [`PresentationRouter::subscribe`].
pub struct PresentationRouter {
    current: Presentation,
    sequencer: Sequencer,
    debug_tag: Option<ItemTag>,
    snapshot_tx: watch::Sender<Presentation>,
}

impl PresentationRouter {
    pub fn new(mut sequencer: Sequencer, now: Instant) -> Self {
        let mut current = Presentation::default();
        current.phase = sequencer.activate(current.state, now);
        let (snapshot_tx, _) = watch::channel(current.clone());
        Self {
            current,
            sequencer,
            debug_tag: None,
            snapshot_tx,
        }
    }

    /// Tag assigned whenever the operator steps the state by hand.
    pub fn with_debug_tag(mut self, tag: Option<ItemTag>) -> Self {
        self.debug_tag = tag;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Presentation> {
        self.snapshot_tx.subscribe()
    }

    pub fn current(&self) -> &Presentation {
        &self.current
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sequencer.next_deadline()
    }

    pub fn apply_patch(&mut self, patch: StatePatch, now: Instant) {
        if let Some(tag) = patch.tag {
            if tag != self.current.tag {
                debug!("Tag changed to {:?}", tag);
            }
            self.current.tag = tag;
        }
        if let Some(boxes) = patch.boxes {
            self.current.detections = boxes;
        }
        if let Some(state) = patch.state {
            self.enter_state(state, now);
        }
        self.publish();
    }

    /// Applies scheduled phase advances due by `now`.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.sequencer.poll(now) {
            Some(phase) => {
                self.current.phase = phase;
                self.publish();
                true
            }
            None => false,
        }
    }

    pub fn handle_debug(&mut self, command: DebugCommand, now: Instant) {
        info!("Debug override: {:?}", command);
        match command {
            DebugCommand::NextState => {
                self.assign_debug_tag();
                self.enter_state(self.current.state.next(), now);
            }
            DebugCommand::PreviousState => {
                self.assign_debug_tag();
                self.enter_state(self.current.state.previous(), now);
            }
            DebugCommand::NextPhase => self.set_phase(self.current.phase.next_wrapping()),
            DebugCommand::PreviousPhase => self.set_phase(self.current.phase.previous_wrapping()),
            DebugCommand::SetState(state) => self.enter_state(state, now),
            DebugCommand::SetTag(tag) => self.current.tag = tag,
            DebugCommand::SetPhase(phase) => self.set_phase(phase),
        }
        self.publish();
    }

    /// Event loop: patches, debug commands and phase deadlines, one at a time,
    /// until cancelled.
    pub async fn run(
        mut self,
        mut patch_rx: mpsc::Receiver<StatePatch>,
        mut debug_rx: mpsc::Receiver<DebugCommand>,
        cancel_token: CancellationToken,
    ) {
        info!("Presentation router running");
        let mut patches_open = true;
        let mut debug_open = true;
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                _ = wait_for(deadline) => {
                    self.tick(Instant::now());
                }
                patch = patch_rx.recv(), if patches_open => match patch {
                    Some(patch) => self.apply_patch(patch, Instant::now()),
                    None => {
                        debug!("Patch stream ended");
                        patches_open = false;
                    }
                },
                command = debug_rx.recv(), if debug_open => match command {
                    Some(command) => self.handle_debug(command, Instant::now()),
                    None => debug_open = false,
                },
            }
        }
        self.sequencer.cancel_pending();
        info!("Presentation router stopped");
    }

    fn enter_state(&mut self, state: InspectionState, now: Instant) {
        // The backend rebroadcasts the current state continuously.
        if state == self.current.state && self.sequencer.active_state() == Some(state) {
            return;
        }
        self.current.state = state;
        self.current.phase = self.sequencer.activate(state, now);
    }

    fn set_phase(&mut self, phase: PhaseIndex) {
        self.sequencer.set_phase(phase);
        self.current.phase = phase;
    }

    fn assign_debug_tag(&mut self) {
        if let Some(tag) = &self.debug_tag {
            self.current.tag = Some(tag.clone());
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_if_modified(|snapshot| {
            if *snapshot == self.current {
                return false;
            }
            *snapshot = self.current.clone();
            true
        });
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn router() -> PresentationRouter {
        PresentationRouter::new(Sequencer::default(), Instant::now())
    }

    fn state_patch(state: InspectionState) -> StatePatch {
        StatePatch::default().with_state(state)
    }

    #[test]
    fn starts_idle() {
        let router = router();
        assert_eq!(router.current().state, InspectionState::State1);
        assert_eq!(router.current().phase, PhaseIndex::IDLE);
        assert_eq!(router.current().tag, None);
    }

    #[test]
    fn absent_fields_do_not_overwrite() {
        let mut router = router();
        let now = Instant::now();
        router.apply_patch(
            StatePatch::default()
                .with_tag(Some(ItemTag::new("cookie")))
                .with_boxes(vec![DetectionBox::new(0.0, 0.0, 1.0, 1.0)]),
            now,
        );
        router.apply_patch(state_patch(InspectionState::State2), now);

        let current = router.current();
        assert_eq!(current.tag, Some(ItemTag::new("cookie")));
        assert_eq!(current.detections.len(), 1);
        assert_eq!(current.state, InspectionState::State2);
        assert_eq!(current.phase, PhaseIndex::new(1));
    }

    #[test]
    fn detections_are_replaced_wholesale() {
        let mut router = router();
        let now = Instant::now();
        router.apply_patch(
            StatePatch::default().with_boxes(vec![
                DetectionBox::new(0.0, 0.0, 1.0, 1.0),
                DetectionBox::new(2.0, 2.0, 3.0, 3.0),
            ]),
            now,
        );
        router.apply_patch(StatePatch::default().with_boxes(vec![]), now);
        assert!(router.current().detections.is_empty());
    }

    #[test]
    fn null_tag_clears_for_a_new_cycle() {
        let mut router = router();
        let now = Instant::now();
        router.apply_patch(StatePatch::default().with_tag(Some(ItemTag::new("a"))), now);
        router.apply_patch(StatePatch::default().with_tag(None), now);
        assert_eq!(router.current().tag, None);
    }

    #[test]
    fn repeated_state_does_not_restart_schedule() {
        let mut router = router();
        let t0 = Instant::now();
        router.apply_patch(state_patch(InspectionState::State4_1), t0);
        router.tick(t0 + Duration::from_secs(5));
        assert_eq!(router.current().phase, PhaseIndex::new(4));

        router.apply_patch(state_patch(InspectionState::State4_1), t0 + Duration::from_secs(6));
        assert_eq!(router.current().phase, PhaseIndex::new(4));
        assert_eq!(router.next_deadline(), Some(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn debug_stepping_wraps_and_assigns_tag() {
        let mut router = router().with_debug_tag(Some(ItemTag::new("tag one")));
        let now = Instant::now();
        router.handle_debug(DebugCommand::PreviousState, now);
        assert_eq!(router.current().state, InspectionState::State7);
        assert_eq!(router.current().tag, Some(ItemTag::new("tag one")));

        router.handle_debug(DebugCommand::NextState, now);
        assert_eq!(router.current().state, InspectionState::State1);
        assert_eq!(router.current().phase, PhaseIndex::IDLE);

        router.handle_debug(DebugCommand::PreviousPhase, now);
        assert_eq!(router.current().phase, PhaseIndex::MAX);
        router.handle_debug(DebugCommand::NextPhase, now);
        assert_eq!(router.current().phase, PhaseIndex::IDLE);
    }

    #[test]
    fn stream_overrides_manual_settings() {
        let mut router = router();
        let now = Instant::now();
        router.handle_debug(DebugCommand::SetState(InspectionState::State6), now);
        router.handle_debug(DebugCommand::SetTag(Some(ItemTag::new("manual"))), now);
        assert_eq!(router.current().phase, PhaseIndex::new(9));

        router.apply_patch(
            StatePatch::default()
                .with_state(InspectionState::State2)
                .with_tag(Some(ItemTag::new("live"))),
            now,
        );
        assert_eq!(router.current().state, InspectionState::State2);
        assert_eq!(router.current().phase, PhaseIndex::new(1));
        assert_eq!(router.current().tag, Some(ItemTag::new("live")));
    }

    #[test]
    fn unchanged_snapshots_are_not_republished() {
        let mut router = router();
        let mut snapshots = router.subscribe();
        let now = Instant::now();
        router.apply_patch(state_patch(InspectionState::State1), now);
        assert!(!snapshots.has_changed().unwrap());
        router.apply_patch(state_patch(InspectionState::State2), now);
        assert!(snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update().phase, PhaseIndex::new(1));
    }

    #[tokio::test(start_paused = true)]
    async fn scan_timeline_is_cut_short_by_next_state() {
        let router = router();
        let mut snapshots = router.subscribe();
        let (patch_tx, patch_rx) = mpsc::channel(8);
        let (_debug_tx, debug_rx) = mpsc::channel(8);
        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(router.run(patch_rx, debug_rx, cancel_token.clone()));

        let t0 = Instant::now();
        patch_tx
            .send(state_patch(InspectionState::State4_1))
            .await
            .unwrap();
        tokio::task::yield_now().await;
        assert_eq!(snapshots.borrow_and_update().phase, PhaseIndex::new(3));

        tokio::time::sleep_until(t0 + Duration::from_millis(5_100)).await;
        assert_eq!(snapshots.borrow_and_update().phase, PhaseIndex::new(4));

        tokio::time::sleep_until(t0 + Duration::from_secs(7)).await;
        patch_tx
            .send(state_patch(InspectionState::State5))
            .await
            .unwrap();
        tokio::task::yield_now().await;
        assert_eq!(snapshots.borrow_and_update().phase, PhaseIndex::new(8));

        tokio::time::sleep_until(t0 + Duration::from_secs(25)).await;
        assert!(!snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow().phase, PhaseIndex::new(8));
        assert_eq!(snapshots.borrow().state, InspectionState::State5);

        cancel_token.cancel();
        task.await.unwrap();
    }

    fn any_patch() -> impl Strategy<Value = StatePatch> {
        let tag = prop::option::of(prop::option::of("[a-z]{1,6}".prop_map(ItemTag::new)));
        let state = prop::option::of(prop::sample::select(InspectionState::ALL.to_vec()));
        let boxes = prop::option::of(prop::collection::vec(
            (0.0f32..100.0, 0.0f32..100.0).prop_map(|(x, y)| DetectionBox::new(x, y, x + 1.0, y + 1.0)),
            0..3,
        ));
        (tag, state, boxes).prop_map(|(tag, state, boxes)| StatePatch { tag, state, boxes })
    }

    proptest! {
        #[test]
        fn each_field_holds_its_latest_value(patches in prop::collection::vec(any_patch(), 0..20)) {
            let mut router = router();
            let now = Instant::now();
            let mut tag = None;
            let mut state = InspectionState::State1;
            let mut boxes = Vec::new();
            for patch in patches {
                if let Some(value) = &patch.tag {
                    tag = value.clone();
                }
                if let Some(value) = patch.state {
                    state = value;
                }
                if let Some(value) = &patch.boxes {
                    boxes = value.clone();
                }
                router.apply_patch(patch, now);
            }
            prop_assert_eq!(&router.current().tag, &tag);
            prop_assert_eq!(router.current().state, state);
            prop_assert_eq!(&router.current().detections, &boxes);
        }
    }
}
