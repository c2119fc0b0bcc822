use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::common::{InspectionState, ItemTag};
use crate::content::store::{tag_path, ContentStore};

pub const ITEM_RESULT_FILE: &str = "ItemResult.txt";

/// Outcome of an inspection, which the result arrows highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemResult {
    Discarded,
    Good,
    Inspection,
}

impl ItemResult {
    pub const ALL: [ItemResult; 3] = [
        ItemResult::Discarded,
        ItemResult::Good,
        ItemResult::Inspection,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ItemResult::Discarded => "Discarded",
            ItemResult::Good => "Good",
            ItemResult::Inspection => "Inspection",
        }
    }

    /// First non-blank line decides; anything unrecognised is no result.
    pub fn parse_report(raw: &str) -> Option<Self> {
        raw.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(|line| line.parse().ok())
    }

    /// Whether the arrows are on screen and the result worth loading.
    pub fn shown_in(state: InspectionState) -> bool {
        matches!(state, InspectionState::State6 | InspectionState::State7)
    }
}

impl FromStr for ItemResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|result| result.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown item result '{}'", s))
    }
}

impl fmt::Display for ItemResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub async fn load_item_result(store: &dyn ContentStore, tag: &ItemTag) -> Option<ItemResult> {
    match store.fetch_text(&tag_path(tag, ITEM_RESULT_FILE)).await {
        Ok(raw) => ItemResult::parse_report(&raw),
        Err(e) => {
            debug!("No item result for {}: {}", tag, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::store::tests::MemoryStore;

    #[test]
    fn first_non_blank_line_is_matched_case_insensitively() {
        assert_eq!(ItemResult::parse_report("\n  GOOD \nDiscarded"), Some(ItemResult::Good));
        assert_eq!(ItemResult::parse_report("inspection"), Some(ItemResult::Inspection));
        assert_eq!(ItemResult::parse_report("discarded\r\n"), Some(ItemResult::Discarded));
    }

    #[test]
    fn unrecognised_reports_yield_nothing() {
        assert_eq!(ItemResult::parse_report(""), None);
        assert_eq!(ItemResult::parse_report("maybe\ngood"), None);
    }

    #[test]
    fn only_result_states_show_arrows() {
        let shown: Vec<_> = InspectionState::ALL
            .into_iter()
            .filter(|state| ItemResult::shown_in(*state))
            .collect();
        assert_eq!(shown, vec![InspectionState::State6, InspectionState::State7]);
    }

    #[tokio::test]
    async fn missing_report_is_no_result() {
        let store = MemoryStore::default().with_file("a/ItemResult.txt", "Good");
        assert_eq!(
            load_item_result(&store, &ItemTag::new("a")).await,
            Some(ItemResult::Good)
        );
        assert_eq!(load_item_result(&store, &ItemTag::new("b")).await, None);
    }
}
