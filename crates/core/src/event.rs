use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use jid::FullJid;
use minidom::Element;
use tracing::error;

/// The closed set of event classes the session layer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The inbound stream started draining; carries our own full JID.
    Online,
    /// The inbound stream ended.
    Offline,
    /// A stanza that matched no room and no pending request.
    Stanza,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Online(FullJid),
    Offline,
    Stanza(Element),
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::Online(_) => EventKind::Online,
            SessionEvent::Offline => EventKind::Offline,
            SessionEvent::Stanza(_) => EventKind::Stanza,
        }
    }
}

type Subscriber = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Typed publish/subscribe hub with per-kind subscriber lists.
///
/// Invocation order is subscription order. A subscriber that panics is
/// reported and skipped; it stays subscribed and the remaining subscribers
/// still run. Publishing a kind nobody subscribed to is a silent no-op.
#[derive(Default)]
pub struct Dispatcher {
    subscribers: RwLock<HashMap<EventKind, Vec<Subscriber>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) {
        self.subscribers
            .write()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(Arc::new(callback));
    }

    pub fn publish(&self, event: &SessionEvent) {
        // Snapshot so no lock is held while subscribers run; a subscriber
        // may itself call subscribe().
        let snapshot: Vec<Subscriber> = {
            let subscribers = self.subscribers.read().unwrap();
            match subscribers.get(&event.kind()) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for (index, subscriber) in snapshot.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| subscriber(event))).is_err() {
                error!(kind = ?event.kind(), index, "event subscriber panicked");
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .unwrap()
            .get(&kind)
            .map_or(0, Vec::len)
    }
}
