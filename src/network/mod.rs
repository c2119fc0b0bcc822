pub mod connection;
pub mod message;
pub mod stream_client;

pub use connection::{ConnectionMachine, ConnectionState};
pub use message::StatePatch;
pub use stream_client::StreamClient;
