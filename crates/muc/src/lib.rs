mod error;
mod manager;
mod room;

pub use error::MucError;
pub use manager::MucManager;
pub use room::{Room, RoomState};
