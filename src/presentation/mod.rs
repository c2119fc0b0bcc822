pub mod debug;
pub mod router;
pub mod scene;

pub use debug::DebugCommand;
pub use router::{Presentation, PresentationRouter};
pub use scene::{ConnectorDirection, SceneLayout};
