pub mod app;
pub mod common;
pub mod config;
pub mod content;
pub mod coordinator;
pub mod error;
pub mod network;
pub mod overlay;
pub mod presentation;
pub mod sequencer;

pub use error::{AppError, CaptureError, ContentError, StreamError};

pub use coordinator::{Coordinator, CoordinatorBuilder, KioskHandles};
pub use network::StreamClient;
pub use presentation::PresentationRouter;
