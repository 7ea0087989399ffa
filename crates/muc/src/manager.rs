use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use jid::BareJid;
use minidom::Element;
use tracing::{debug, warn};

use skua_session::{Session, StanzaTransport};
use skua_stanza::{DiscoItem, builder, parser};

use crate::error::MucError;
use crate::room::Room;

/// Feature-var suffix a disco#info result must carry for a service to count
/// as MUC-capable.
const MUC_FEATURE_SUFFIX: &str = "muc";

/// Per-connection room registry and discovery operations.
///
/// One manager per session, constructed explicitly and passed to whoever
/// needs it. Rooms live as long as the manager; leaving a room empties its
/// participant table but never destroys the `Room` itself.
pub struct MucManager<T: StanzaTransport> {
    session: Arc<Session<T>>,
    rooms: RwLock<HashMap<BareJid, Arc<Room<T>>>>,
}

impl<T: StanzaTransport> MucManager<T> {
    pub fn new(session: Arc<Session<T>>) -> Self {
        Self {
            session,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn session(&self) -> &Arc<Session<T>> {
        &self.session
    }

    /// Lookup-or-create, idempotent. The nickname only matters on first
    /// reference; later calls for the same address return the existing room
    /// unchanged. Creation registers the room as the session's handler for
    /// its bare address, so it intercepts everything the room sends us.
    pub fn room(&self, address: BareJid, nickname: &str) -> Arc<Room<T>> {
        if let Some(room) = self.rooms.read().unwrap().get(&address) {
            return room.clone();
        }

        let mut rooms = self.rooms.write().unwrap();
        rooms
            .entry(address.clone())
            .or_insert_with(|| {
                let room = Room::new(self.session.clone(), address.clone(), nickname.to_string());
                self.session.register_handler(address.clone(), room.clone());
                debug!(room = %address, nickname, "room created");
                room
            })
            .clone()
    }

    /// Services advertised by our own domain (disco#items to the domain).
    pub async fn discover_domain_services(&self) -> Result<Vec<DiscoItem>, MucError> {
        let own = self.session.own_jid();
        let domain = BareJid::from_parts(None, own.domain());
        self.disco_items_to(&domain).await
    }

    /// Items hosted by one specific service.
    pub async fn discover_rooms_hosted_by(&self, service: &BareJid) -> Result<Vec<DiscoItem>, MucError> {
        self.disco_items_to(service).await
    }

    /// Fan out over every domain service and flatten what they host.
    ///
    /// Branches run concurrently; results keep the service-list order, and
    /// an unanswered branch contributes nothing without cancelling its
    /// siblings.
    pub async fn discover_all_hosted_items(&self) -> Result<Vec<DiscoItem>, MucError> {
        let services = self.discover_domain_services().await?;
        let addresses = parse_addresses(&services);

        let branches = join_all(
            addresses
                .iter()
                .map(|(_, address)| self.disco_items_to(address)),
        )
        .await;

        let mut all = Vec::new();
        for branch in branches {
            all.extend(branch?);
        }
        Ok(all)
    }

    /// Domain services whose disco#info reports the MUC feature, in
    /// service-list order.
    pub async fn discover_muc_services(&self) -> Result<Vec<String>, MucError> {
        let services = self.discover_domain_services().await?;
        let addresses = parse_addresses(&services);

        let responses = join_all(
            addresses
                .iter()
                .map(|(_, address)| self.disco_info_to(address)),
        )
        .await;

        let mut muc_services = Vec::new();
        for ((jid, _), response) in addresses.iter().zip(responses) {
            if let Some(result) = response? {
                if parser::has_feature(&result, MUC_FEATURE_SUFFIX) {
                    muc_services.push(jid.clone());
                }
            }
        }
        Ok(muc_services)
    }

    async fn disco_items_to(&self, target: &BareJid) -> Result<Vec<DiscoItem>, MucError> {
        let (id, stanza) = builder::disco_items(target, &self.session.own_jid());
        let response = self
            .session
            .request(stanza, &id, self.session.request_timeout())
            .await?;
        Ok(response.map(|result| parser::items(&result)).unwrap_or_default())
    }

    async fn disco_info_to(&self, target: &BareJid) -> Result<Option<Element>, MucError> {
        let (id, stanza) = builder::disco_info(target, &self.session.own_jid());
        Ok(self
            .session
            .request(stanza, &id, self.session.request_timeout())
            .await?)
    }
}

/// Pair each advertised item with its parsed address, dropping entries that
/// are not valid JIDs.
fn parse_addresses(services: &[DiscoItem]) -> Vec<(String, BareJid)> {
    services
        .iter()
        .filter_map(|item| match item.jid.parse::<BareJid>() {
            Ok(address) => Some((item.jid.clone(), address)),
            Err(error) => {
                warn!(jid = %item.jid, %error, "discovery item has an unusable jid");
                None
            }
        })
        .collect()
}
