mod error;
mod session;
mod transport;

pub use error::SessionError;
pub use session::{InboundHandler, Session};
pub use transport::StanzaTransport;
