use tracing::debug;

use crate::common::{ItemTag, PhaseIndex};
use crate::content::store::{find_image, tag_path, ContentImage, ContentStore};

pub const DEFAULT_TITLE: &str = "Scanning Item";
pub const NOT_FOUND_BODY: &str = "Description not found.";
pub const NO_TAG_TITLE: &str = "No tag detected.";

/// Text and optional illustration shown next to the scanner for one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub title: String,
    pub body: String,
    pub image: Option<ContentImage>,
}

impl Description {
    pub fn no_tag() -> Self {
        Self {
            title: NO_TAG_TITLE.to_string(),
            body: String::new(),
            image: None,
        }
    }

    /// First line is the title, the rest is the body. Blank parts fall back
    /// to the defaults.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw.lines();
        let title = lines.next().map(str::trim).unwrap_or_default();
        let body = lines.collect::<Vec<_>>().join("\n");
        let body = body.trim();
        Self {
            title: or_default(title, DEFAULT_TITLE),
            body: or_default(body, NOT_FOUND_BODY),
            image: None,
        }
    }

    fn not_found() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: NOT_FOUND_BODY.to_string(),
            image: None,
        }
    }
}

impl Default for Description {
    fn default() -> Self {
        Self::no_tag()
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// `NN`, the phase zero-padded to two digits.
pub fn phase_stem(phase: PhaseIndex) -> String {
    format!("{:02}", phase.value())
}

pub fn description_file(phase: PhaseIndex) -> String {
    format!("{}_description.txt", phase_stem(phase))
}

pub async fn load_description(
    store: &dyn ContentStore,
    tag: Option<&ItemTag>,
    phase: PhaseIndex,
) -> Description {
    let Some(tag) = tag else {
        return Description::no_tag();
    };
    let path = tag_path(tag, &description_file(phase));
    let mut description = match store.fetch_text(&path).await {
        Ok(raw) => Description::parse(&raw),
        Err(e) => {
            debug!("No description for {} phase {}: {}", tag, phase, e);
            Description::not_found()
        }
    };
    description.image = find_image(store, tag, &phase_stem(phase)).await;
    description
}
