use crate::common::{InspectionState, PhaseIndex};
use crate::presentation::router::Presentation;

/// Which way the description connector points from the scanner panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorDirection {
    Down,
    Up,
}

/// Panels visible for one presentation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneLayout {
    pub intro: bool,
    pub loading_prompt: bool,
    pub item_indicator: Option<&'static str>,
    pub camera_feed: bool,
    pub description: Option<ConnectorDirection>,
    pub cloud_upload: bool,
    pub identification: bool,
    pub retrieval: bool,
    pub result_arrows: bool,
}

impl SceneLayout {
    pub const INTRO_TITLE: &'static str = "Incoming Goods Inspection";
    pub const INTRO_SUBTITLE: &'static str =
        "GenAI can bring significant automation in quality checks and report generation";
    pub const LOADING_PROMPT: [&'static str; 2] =
        ["Pick up one of these items", "and put it on the belt"];
}

impl From<&Presentation> for SceneLayout {
    fn from(presentation: &Presentation) -> Self {
        let state = presentation.state;
        let phase = presentation.phase.value();
        Self {
            intro: state == InspectionState::State1,
            loading_prompt: state == InspectionState::State1,
            item_indicator: match state {
                InspectionState::State1_1 => Some("Object Detected"),
                InspectionState::State2 => Some("Transporting to Scanner"),
                _ => None,
            },
            camera_feed: state == InspectionState::State4,
            description: match presentation.phase {
                PhaseIndex::IDLE => None,
                _ if matches!(phase, 1 | 2 | 3 | 8 | 9) => Some(ConnectorDirection::Down),
                _ => Some(ConnectorDirection::Up),
            },
            cloud_upload: phase == 4,
            identification: phase == 5,
            retrieval: phase == 6,
            result_arrows: matches!(state, InspectionState::State6 | InspectionState::State7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(state: InspectionState, phase: u32) -> SceneLayout {
        SceneLayout::from(&Presentation {
            state,
            phase: PhaseIndex::new(phase),
            ..Presentation::default()
        })
    }

    #[test]
    fn idle_line_shows_intro_and_prompt_only() {
        let scene = layout(InspectionState::State1, 0);
        assert!(scene.intro && scene.loading_prompt);
        assert_eq!(scene.description, None);
        assert!(!scene.camera_feed && !scene.result_arrows);
    }

    #[test]
    fn camera_feed_belongs_to_the_scan_state() {
        assert!(layout(InspectionState::State4, 2).camera_feed);
        assert!(!layout(InspectionState::State4_1, 3).camera_feed);
    }

    #[test]
    fn scan_phases_drive_the_side_panels() {
        assert!(layout(InspectionState::State4_1, 4).cloud_upload);
        assert!(layout(InspectionState::State4_1, 5).identification);
        let retrieval = layout(InspectionState::State4_1, 6);
        assert!(retrieval.retrieval);
        assert_eq!(retrieval.description, Some(ConnectorDirection::Up));
        assert_eq!(
            layout(InspectionState::State5, 8).description,
            Some(ConnectorDirection::Down)
        );
    }

    #[test]
    fn indicator_and_arrows_follow_state() {
        assert_eq!(
            layout(InspectionState::State1_1, 0).item_indicator,
            Some("Object Detected")
        );
        assert_eq!(
            layout(InspectionState::State2, 1).item_indicator,
            Some("Transporting to Scanner")
        );
        assert!(layout(InspectionState::State7, 9).result_arrows);
        assert!(!layout(InspectionState::State5, 8).result_arrows);
    }
}
