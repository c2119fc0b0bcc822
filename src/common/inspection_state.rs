use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the inspection line for the item currently on the belt.
///
/// The order of the variants is the order the backend walks through them and
/// the order the debug controls step through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InspectionState {
    #[serde(rename = "state1")]
    State1,
    #[serde(rename = "state1_1")]
    State1_1,
    #[serde(rename = "state2")]
    State2,
    #[serde(rename = "state3")]
    State3,
    #[serde(rename = "state4")]
    State4,
    #[serde(rename = "state4_1")]
    State4_1,
    #[serde(rename = "state5")]
    State5,
    #[serde(rename = "state6")]
    State6,
    #[serde(rename = "state7")]
    State7,
}

impl InspectionState {
    pub const ALL: [InspectionState; 9] = [
        InspectionState::State1,
        InspectionState::State1_1,
        InspectionState::State2,
        InspectionState::State3,
        InspectionState::State4,
        InspectionState::State4_1,
        InspectionState::State5,
        InspectionState::State6,
        InspectionState::State7,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionState::State1 => "state1",
            InspectionState::State1_1 => "state1_1",
            InspectionState::State2 => "state2",
            InspectionState::State3 => "state3",
            InspectionState::State4 => "state4",
            InspectionState::State4_1 => "state4_1",
            InspectionState::State5 => "state5",
            InspectionState::State6 => "state6",
            InspectionState::State7 => "state7",
        }
    }

    pub fn ordinal(&self) -> usize {
        Self::ALL
            .iter()
            .position(|state| state == self)
            .unwrap_or_default()
    }

    /// Next state in line order, wrapping from the last back to the first.
    pub fn next(&self) -> Self {
        Self::ALL[(self.ordinal() + 1) % Self::ALL.len()]
    }

    /// Previous state in line order, wrapping from the first to the last.
    pub fn previous(&self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.ordinal() + len - 1) % len]
    }
}

impl Default for InspectionState {
    fn default() -> Self {
        InspectionState::State1
    }
}

impl fmt::Display for InspectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier of the item on the line. Also the directory name of the
/// item's content in the content store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ItemTag(String);

impl ItemTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_backend() {
        for state in InspectionState::ALL {
            let encoded = serde_json::to_string(&state).unwrap();
            assert_eq!(encoded, format!("\"{}\"", state.as_str()));
            let decoded: InspectionState = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, state);
        }
    }

    #[test]
    fn unknown_state_is_rejected() {
        assert!(serde_json::from_str::<InspectionState>("\"state9\"").is_err());
        assert!(serde_json::from_str::<InspectionState>("\"State1\"").is_err());
    }

    #[test]
    fn stepping_wraps_at_both_ends() {
        assert_eq!(InspectionState::State7.next(), InspectionState::State1);
        assert_eq!(InspectionState::State1.previous(), InspectionState::State7);
        assert_eq!(InspectionState::State4.next(), InspectionState::State4_1);
        assert_eq!(InspectionState::State4_1.previous(), InspectionState::State4);
    }
}
