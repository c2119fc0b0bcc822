pub mod description;
pub mod item_result;
pub mod loader;
pub mod retrieved;
pub mod store;

pub use description::Description;
pub use item_result::ItemResult;
pub use loader::{ContentService, ContentView};
pub use retrieved::{FileKind, Retrieval, RetrievedRow};
pub use store::{open_store, ContentImage, ContentStore, DirectoryStore, HttpStore};
