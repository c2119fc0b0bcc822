use tracing::{debug, warn};

use crate::common::ItemTag;
use crate::content::store::{tag_path, ContentStore};

pub const MANIFEST_FILE: &str = "RetrievedData.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Model,
    Document,
    Image,
    Table,
}

impl FileKind {
    /// Classifies by extension; unknown extensions count as documents.
    pub fn of(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "stl" | "step" | "stp" | "iges" | "igs" => FileKind::Model,
            "png" | "jpg" | "jpeg" | "webp" | "svg" => FileKind::Image,
            "csv" | "xls" | "xlsx" | "tsv" => FileKind::Table,
            _ => FileKind::Document,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Model => "3D",
            FileKind::Document => "DOC",
            FileKind::Image => "IMG",
            FileKind::Table => "TABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedRow {
    pub name: String,
    pub href: String,
    pub kind: FileKind,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Retrieval {
    /// No tag, nothing to retrieve.
    #[default]
    Idle,
    Loading,
    Ready(Vec<RetrievedRow>),
    /// Manifest unreadable; shown as an error with no rows.
    Error,
}

impl Retrieval {
    pub fn rows(&self) -> &[RetrievedRow] {
        match self {
            Retrieval::Ready(rows) => rows.as_slice(),
            _ => &[],
        }
    }
}

pub fn parse_manifest(store: &dyn ContentStore, tag: &ItemTag, raw: &str) -> Vec<RetrievedRow> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|name| RetrievedRow {
            name: name.to_string(),
            href: store.locate(&tag_path(tag, name)),
            kind: FileKind::of(name),
        })
        .collect()
}

pub async fn load_retrieval(store: &dyn ContentStore, tag: &ItemTag) -> Retrieval {
    match store.fetch_text(&tag_path(tag, MANIFEST_FILE)).await {
        Ok(raw) => {
            let rows = parse_manifest(store, tag, &raw);
            debug!("Manifest for {} lists {} file(s)", tag, rows.len());
            Retrieval::Ready(rows)
        }
        Err(e) => {
            warn!("Could not read {} for {}: {}", MANIFEST_FILE, tag, e);
            Retrieval::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::store::tests::MemoryStore;

    #[test]
    fn kinds_follow_extensions() {
        assert_eq!(FileKind::of("bracket.STEP"), FileKind::Model);
        assert_eq!(FileKind::of("datasheet.pdf"), FileKind::Document);
        assert_eq!(FileKind::of("photo.jpeg"), FileKind::Image);
        assert_eq!(FileKind::of("bom.xlsx"), FileKind::Table);
        assert_eq!(FileKind::of("README"), FileKind::Document);
        assert_eq!(FileKind::of("archive.zip"), FileKind::Document);
    }

    #[tokio::test]
    async fn manifest_rows_link_into_the_tag_folder() {
        let store = MemoryStore::default()
            .with_file("tag one/RetrievedData.txt", "drawing.stl\r\n\n  report.pdf  \n");
        let retrieval = load_retrieval(&store, &ItemTag::new("tag one")).await;
        assert_eq!(
            retrieval,
            Retrieval::Ready(vec![
                RetrievedRow {
                    name: "drawing.stl".to_string(),
                    href: "mem://tag one/drawing.stl".to_string(),
                    kind: FileKind::Model,
                },
                RetrievedRow {
                    name: "report.pdf".to_string(),
                    href: "mem://tag one/report.pdf".to_string(),
                    kind: FileKind::Document,
                },
            ])
        );
    }

    #[tokio::test]
    async fn unreadable_manifest_is_an_error_without_rows() {
        let retrieval = load_retrieval(&MemoryStore::default(), &ItemTag::new("x")).await;
        assert_eq!(retrieval, Retrieval::Error);
        assert!(retrieval.rows().is_empty());
    }

    #[tokio::test]
    async fn empty_manifest_is_ready_with_no_rows() {
        let store = MemoryStore::default().with_file("x/RetrievedData.txt", "\n\n");
        assert_eq!(
            load_retrieval(&store, &ItemTag::new("x")).await,
            Retrieval::Ready(vec![])
        );
    }
}
