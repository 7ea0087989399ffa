use jid::FullJid;
use minidom::Element;

use crate::error::SessionError;

/// The surface the session layer requires from the underlying stream
/// implementation. Connection establishment, authentication, TLS, and XML
/// tokenization all live behind this seam; inbound stanzas arrive on the
/// channel handed to [`Session::run`](crate::Session::run), one per stanza
/// in arrival order.
pub trait StanzaTransport: Send + Sync + 'static {
    /// Best-effort write. Failure must propagate as a send error, never a
    /// silent drop.
    async fn send(&self, stanza: Element) -> Result<(), SessionError>;

    /// The connection's authenticated full address.
    fn own_jid(&self) -> FullJid;
}
