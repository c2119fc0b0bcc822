use async_trait::async_trait;
use image::ImageReader;
use std::io::{Cursor, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::ItemTag;
use crate::error::ContentError;

/// Extensions tried, in order, when looking for a phase illustration.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Read-only source of per-tag content: `{tag}/{file}` below some base.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, ContentError>;

    /// Link a viewer would follow to open `path`.
    fn locate(&self, path: &str) -> String;

    async fn fetch_text(&self, path: &str) -> Result<String, ContentError> {
        let bytes = self.fetch_bytes(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

pub fn tag_path(tag: &ItemTag, file: &str) -> String {
    format!("{}/{}", tag.as_str(), file)
}

/// Picks the store implementation from the configured base: an
/// `http(s)://` origin or a local directory.
pub fn open_store(base: &str) -> Arc<dyn ContentStore> {
    if base.starts_with("http://") || base.starts_with("https://") {
        info!("Serving content from {}", base);
        Arc::new(HttpStore::new(base))
    } else {
        info!("Serving content from directory {}", base);
        Arc::new(DirectoryStore::new(base))
    }
}

/// Content folders on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ContentError> {
        let relative = Path::new(path);
        // Tags come off the wire; keep them inside the root.
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if escapes {
            return Err(ContentError::NotFound(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentStore for DirectoryStore {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, ContentError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|source| match source.kind() {
            ErrorKind::NotFound => ContentError::NotFound(path.to_string()),
            _ => ContentError::Read {
                path: full.display().to_string(),
                source,
            },
        })
    }

    fn locate(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }
}

/// Content served over HTTP below a base URL.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContentStore for HttpStore {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, ContentError> {
        let url = self.locate(path);
        let fetch_error = |source| ContentError::Fetch {
            url: url.clone(),
            source,
        };
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(fetch_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound(url.clone()));
        }
        let bytes = response
            .error_for_status()
            .map_err(fetch_error)?
            .bytes()
            .await
            .map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }

    fn locate(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }
}

/// An image that was fetched and confirmed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentImage {
    pub uri: String,
    pub bytes: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

fn inspect_image(uri: &str, bytes: &[u8]) -> Result<(u32, u32), ContentError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok())
        .ok_or_else(|| ContentError::NotAnImage(uri.to_string()))
}

/// First of `{stem}.png`, `.jpg`, `.jpeg`, `.webp` under the tag folder that
/// decodes as an image. Missing files and non-images are skipped alike.
pub async fn find_image(
    store: &dyn ContentStore,
    tag: &ItemTag,
    stem: &str,
) -> Option<ContentImage> {
    for extension in IMAGE_EXTENSIONS {
        let path = tag_path(tag, &format!("{}.{}", stem, extension));
        let uri = store.locate(&path);
        let fetched = match store.fetch_bytes(&path).await {
            Ok(bytes) => inspect_image(&uri, &bytes).map(|size| (bytes, size)),
            Err(e) => Err(e),
        };
        match fetched {
            Ok((bytes, (width, height))) => {
                return Some(ContentImage {
                    uri,
                    bytes: bytes.into(),
                    width,
                    height,
                })
            }
            Err(e) => debug!("Skipping image candidate {}: {}", path, e),
        }
    }
    None
}
