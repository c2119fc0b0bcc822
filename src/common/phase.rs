use serde::{Deserialize, Serialize};
use std::fmt;

/// Sub-scene counter within an inspection state's presentation timeline.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct PhaseIndex(u32);

impl PhaseIndex {
    pub const IDLE: PhaseIndex = PhaseIndex(0);
    /// Highest phase any scene is authored for.
    pub const MAX: PhaseIndex = PhaseIndex(9);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_idle(&self) -> bool {
        self.0 == 0
    }

    pub fn next_wrapping(&self) -> Self {
        if self.0 >= Self::MAX.0 {
            Self::IDLE
        } else {
            Self(self.0 + 1)
        }
    }

    pub fn previous_wrapping(&self) -> Self {
        if self.0 == 0 || self.0 > Self::MAX.0 {
            Self::MAX
        } else {
            Self(self.0 - 1)
        }
    }
}

impl fmt::Display for PhaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
