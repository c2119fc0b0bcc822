use serde::{Deserialize, Deserializer};

use crate::common::{DetectionBox, InspectionState, ItemTag};

/// One backend message, decoded as a partial update.
///
/// Every field is `None` when the message did not carry it. `tag` is doubly
/// optional: `Some(None)` is an explicit clear sent at the start of a new
/// cycle, while `None` leaves the current tag alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatePatch {
    #[serde(default, deserialize_with = "present")]
    pub tag: Option<Option<ItemTag>>,
    #[serde(default)]
    pub state: Option<InspectionState>,
    #[serde(default)]
    pub boxes: Option<Vec<DetectionBox>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.state.is_none() && self.boxes.is_none()
    }

    pub fn with_tag(mut self, tag: Option<ItemTag>) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_state(mut self, state: InspectionState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_boxes(mut self, boxes: Vec<DetectionBox>) -> Self {
        self.boxes = Some(boxes);
        self
    }
}

impl TryFrom<&str> for StatePatch {
    type Error = serde_json::Error;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        serde_json::from_str(text)
    }
}

impl TryFrom<&[u8]> for StatePatch {
    type Error = serde_json::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        serde_json::from_slice(bytes)
    }
}
