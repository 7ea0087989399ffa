pub mod builder;
pub mod parser;

use jid::{BareJid, Jid};
use minidom::Element;

/// Default namespace for top-level client stanzas.
pub const NS_CLIENT: &str = "jabber:client";

/// XEP-0030 item discovery.
pub const NS_DISCO_ITEMS: &str = "http://jabber.org/protocol/disco#items";

/// XEP-0030 feature discovery.
pub const NS_DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";

/// XEP-0045 room join marker.
pub const NS_MUC: &str = "http://jabber.org/protocol/muc";

/// XEP-0045 occupant metadata extension.
pub const NS_MUC_USER: &str = "http://jabber.org/protocol/muc#user";

#[derive(Debug, thiserror::Error)]
pub enum StanzaError {
    #[error("invalid occupant address: {0}")]
    OccupantAddress(#[from] jid::Error),
}

/// The three stanza classes the session layer routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanzaKind {
    Iq,
    Message,
    Presence,
    Other,
}

/// One `<item/>` from a disco#items result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiscoItem {
    pub jid: String,
    pub name: Option<String>,
}

/// Occupant metadata carried by a MUC presence.
///
/// Missing fields come back as empty strings; absence of the extension is
/// expected, not erroneous.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Participant {
    pub affiliation: String,
    pub role: String,
}

pub fn kind(stanza: &Element) -> StanzaKind {
    match stanza.name() {
        "iq" => StanzaKind::Iq,
        "message" => StanzaKind::Message,
        "presence" => StanzaKind::Presence,
        _ => StanzaKind::Other,
    }
}

pub fn id(stanza: &Element) -> Option<&str> {
    stanza.attr("id")
}

pub fn stanza_type(stanza: &Element) -> Option<&str> {
    stanza.attr("type")
}

/// The parsed `from` address, when present and well-formed.
pub fn sender(stanza: &Element) -> Option<Jid> {
    stanza.attr("from").and_then(|raw| raw.parse().ok())
}

pub fn bare_sender(stanza: &Element) -> Option<BareJid> {
    sender(stanza).map(|jid| jid.to_bare())
}
