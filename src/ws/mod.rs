pub mod actor;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod rooms;

pub use registry::{ConnectionId, ConnectionSender, PresenceRegistry};
pub use relay::Relay;
pub use rooms::Room;
