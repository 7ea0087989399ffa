use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use jid::{BareJid, FullJid};
use minidom::Element;
use tracing::debug;

use skua_session::{InboundHandler, Session, StanzaTransport};
use skua_stanza::{Participant, StanzaKind, builder, parser};

use crate::error::MucError;

/// Explicit room membership lifecycle. The protocol itself only ever shows
/// membership through presence side effects; tracking the state directly is
/// what makes re-join and leave behave predictably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    NotJoined,
    Joining,
    Joined,
}

type MessageListener = Box<dyn Fn(&Element) + Send + Sync>;

/// One joined (or joinable) chat room.
///
/// The participant table is fed exclusively by presence stanzas routed here
/// by the session; entries appear when first observed and disappear only on
/// an explicit unavailable presence.
pub struct Room<T: StanzaTransport> {
    session: Arc<Session<T>>,
    address: BareJid,
    nickname: String,
    state: RwLock<RoomState>,
    participants: RwLock<HashMap<FullJid, Participant>>,
    listeners: RwLock<Vec<MessageListener>>,
}

impl<T: StanzaTransport> Room<T> {
    pub(crate) fn new(session: Arc<Session<T>>, address: BareJid, nickname: String) -> Arc<Self> {
        Arc::new(Self {
            session,
            address,
            nickname,
            state: RwLock::new(RoomState::NotJoined),
            participants: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn address(&self) -> &BareJid {
        &self.address
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn state(&self) -> RoomState {
        *self.state.read().unwrap()
    }

    /// Send the join presence to `room/nickname`. No reply is awaited; the
    /// join is acknowledged only by presence observed afterwards.
    pub async fn join(&self) -> Result<(), MucError> {
        let (_, stanza) = builder::join_room(&self.address, &self.session.own_jid(), &self.nickname)?;
        self.session.send(stanza).await?;
        *self.state.write().unwrap() = RoomState::Joining;
        debug!(room = %self.address, nickname = %self.nickname, "join presence sent");
        Ok(())
    }

    /// Send an unavailable presence to the room's bare address. The
    /// participant table empties with the membership; a later re-join
    /// observes occupants from scratch.
    pub async fn leave(&self) -> Result<(), MucError> {
        let stanza = builder::leave_room(&self.address, &self.session.own_jid());
        self.session.send(stanza).await?;
        *self.state.write().unwrap() = RoomState::NotJoined;
        self.participants.write().unwrap().clear();
        debug!(room = %self.address, "leave presence sent");
        Ok(())
    }

    pub async fn send_message(&self, body: &str) -> Result<(), MucError> {
        let stanza = builder::group_message(&self.session.own_jid(), &self.address, body);
        self.session.send(stanza).await?;
        Ok(())
    }

    /// Listeners are permanent for the room's lifetime; there is no removal.
    pub fn add_message_listener(&self, listener: impl Fn(&Element) + Send + Sync + 'static) {
        self.listeners.write().unwrap().push(Box::new(listener));
    }

    /// Snapshot of the current participant table.
    pub fn participants(&self) -> HashMap<FullJid, Participant> {
        self.participants.read().unwrap().clone()
    }
}

impl<T: StanzaTransport> InboundHandler for Room<T> {
    fn on_stanza(&self, stanza: &Element) {
        // Listeners see everything addressed from this room, before any
        // state is touched.
        for listener in self.listeners.read().unwrap().iter() {
            listener(stanza);
        }

        if skua_stanza::kind(stanza) != StanzaKind::Presence {
            return;
        }
        // Occupant presence always carries a resource (the nickname);
        // anything else from the bare room address is not membership.
        let Some(sender) = stanza
            .attr("from")
            .and_then(|raw| raw.parse::<FullJid>().ok())
        else {
            return;
        };

        // Any presence from the room acknowledges an in-flight join.
        {
            let mut state = self.state.write().unwrap();
            if *state == RoomState::Joining {
                *state = RoomState::Joined;
                debug!(room = %self.address, "room joined");
            }
        }

        if skua_stanza::stanza_type(stanza) == Some("unavailable") {
            if self.participants.write().unwrap().remove(&sender).is_some() {
                debug!(room = %self.address, occupant = %sender, "participant left");
            }
            if sender.resource().as_str() == self.nickname {
                *self.state.write().unwrap() = RoomState::NotJoined;
                // Membership ended, so who else was present ends with it.
                self.participants.write().unwrap().clear();
                debug!(room = %self.address, "own unavailable presence, room left");
            }
            return;
        }

        // Insert only on first observation; repeat presence never
        // overwrites the stored affiliation/role.
        self.participants
            .write()
            .unwrap()
            .entry(sender.clone())
            .or_insert_with(|| {
                let participant = parser::participant(stanza);
                debug!(
                    room = %self.address,
                    occupant = %sender,
                    affiliation = %participant.affiliation,
                    role = %participant.role,
                    "participant observed"
                );
                participant
            });
    }
}
