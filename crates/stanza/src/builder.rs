//! Outbound stanza construction.
//!
//! Every correlated builder mints a fresh uuid so the pending-request table
//! can never see a colliding id.

use jid::{BareJid, FullJid};
use minidom::{Element, Node};
use uuid::Uuid;

use crate::{NS_CLIENT, NS_DISCO_INFO, NS_DISCO_ITEMS, NS_MUC, StanzaError};

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

fn disco_query(to: &BareJid, from: &FullJid, namespace: &str) -> (String, Element) {
    let id = fresh_id();
    let stanza = Element::builder("iq", NS_CLIENT)
        .attr("from", from.to_string())
        .attr("to", to.to_string())
        .attr("id", id.clone())
        .attr("type", "get")
        .append(Element::builder("query", namespace).build())
        .build();
    (id, stanza)
}

/// Item-discovery query (disco#items) addressed to `to`.
pub fn disco_items(to: &BareJid, from: &FullJid) -> (String, Element) {
    disco_query(to, from, NS_DISCO_ITEMS)
}

/// Feature-discovery query (disco#info) addressed to `to`.
pub fn disco_info(to: &BareJid, from: &FullJid) -> (String, Element) {
    disco_query(to, from, NS_DISCO_INFO)
}

/// Join presence addressed to `room/nickname`, carrying the MUC marker.
///
/// Fails only when the nickname is not a valid resource part.
pub fn join_room(
    room: &BareJid,
    from: &FullJid,
    nickname: &str,
) -> Result<(String, Element), StanzaError> {
    let occupant = room.with_resource_str(nickname)?;
    let id = fresh_id();
    let stanza = Element::builder("presence", NS_CLIENT)
        .attr("from", from.to_string())
        .attr("to", occupant.to_string())
        .attr("id", id.clone())
        .attr("type", "get")
        .append(Element::builder("x", NS_MUC).build())
        .build();
    Ok((id, stanza))
}

/// Unavailable presence to the room's bare address. No id correlation is
/// expected for leaves.
pub fn leave_room(room: &BareJid, from: &FullJid) -> Element {
    Element::builder("presence", NS_CLIENT)
        .attr("from", from.to_string())
        .attr("to", room.to_string())
        .attr("type", "unavailable")
        .build()
}

/// Groupchat message with a plain-text body.
pub fn group_message(from: &FullJid, to: &BareJid, body: &str) -> Element {
    Element::builder("message", NS_CLIENT)
        .attr("from", from.to_string())
        .attr("to", to.to_string())
        .attr("id", fresh_id())
        .attr("type", "groupchat")
        .append(
            Element::builder("body", NS_CLIENT)
                .append(Node::Text(body.to_string()))
                .build(),
        )
        .build()
}
