use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jid::{BareJid, FullJid};
use minidom::Element;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use skua_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use skua_core::{Dispatcher, SessionEvent};
use skua_stanza::StanzaKind;

use crate::error::SessionError;
use crate::transport::StanzaTransport;

/// Receives every inbound stanza whose sender bare address matches the
/// handler's registration. Rooms implement this.
pub trait InboundHandler: Send + Sync {
    fn on_stanza(&self, stanza: &Element);
}

/// One outstanding correlated query. Lifetime is bounded by explicit
/// insert/remove; whoever removes the entry owns its completion.
struct PendingRequest {
    created_at: DateTime<Utc>,
    tx: oneshot::Sender<Element>,
}

/// Owner of the single stanza stream.
///
/// Every inbound stanza is routed to exactly one of, in priority order:
/// a registered per-address handler, a pending correlated request matched
/// by id, or the generic event dispatcher.
pub struct Session<T: StanzaTransport> {
    transport: T,
    dispatcher: Dispatcher,
    request_timeout: Duration,
    pending: Mutex<HashMap<String, PendingRequest>>,
    handlers: RwLock<HashMap<BareJid, Arc<dyn InboundHandler>>>,
}

/// Removes the pending entry when the request future goes away for any
/// reason other than a matched response: timeout, send failure, or the
/// caller dropping the future early.
struct PendingGuard<'a, T: StanzaTransport> {
    session: &'a Session<T>,
    id: &'a str,
}

impl<T: StanzaTransport> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        self.session.pending.lock().unwrap().remove(self.id);
    }
}

impl<T: StanzaTransport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self::with_request_timeout(transport, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_request_timeout(transport: T, request_timeout: Duration) -> Self {
        Self {
            transport,
            dispatcher: Dispatcher::new(),
            request_timeout,
            pending: Mutex::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn own_jid(&self) -> FullJid {
        self.transport.own_jid()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Forward a stanza to the transport. No implicit id assignment; the
    /// builder already embedded one where correlation is wanted.
    pub async fn send(&self, stanza: Element) -> Result<(), SessionError> {
        self.transport.send(stanza).await
    }

    /// Send `stanza` and await the response carrying `id`.
    ///
    /// `Ok(None)` means "no answer within `timeout`" and is not a protocol
    /// error; discovery aggregation relies on that. The pending entry is
    /// registered before the send so a fast response can never race past
    /// it, and it is gone by the time this returns, so a late response with
    /// the same id falls through to generic dispatch.
    pub async fn request(
        &self,
        stanza: Element,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<Element>, SessionError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap();
            if pending.contains_key(id) {
                return Err(SessionError::DuplicateRequest(id.to_string()));
            }
            pending.insert(
                id.to_string(),
                PendingRequest {
                    created_at: Utc::now(),
                    tx,
                },
            );
        }
        let guard = PendingGuard { session: self, id };

        self.transport.send(stanza).await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => {
                drop(guard);
                Ok(Some(response))
            }
            Ok(Err(_)) => {
                // Completion sender dropped without a response; treat like
                // an unanswered request.
                warn!(id, "pending request abandoned without a response");
                Ok(None)
            }
            Err(_) => {
                debug!(id, timeout_ms = timeout.as_millis() as u64, "request timed out");
                Ok(None)
            }
        }
    }

    /// Route all future stanzas from `address` to `handler`.
    pub fn register_handler(&self, address: BareJid, handler: Arc<dyn InboundHandler>) {
        let replaced = self
            .handlers
            .write()
            .unwrap()
            .insert(address.clone(), handler);
        if replaced.is_some() {
            warn!(address = %address, "replaced an existing stanza handler");
        } else {
            debug!(address = %address, "registered stanza handler");
        }
    }

    pub fn unregister_handler(&self, address: &BareJid) {
        self.handlers.write().unwrap().remove(address);
    }

    /// Inbound dispatch. Exactly one of the three branches fires; handler
    /// delivery takes precedence over request correlation, so a room
    /// intercepts even an iq whose id happens to match a pending entry.
    pub fn handle_stanza(&self, stanza: Element) {
        if let Some(sender) = skua_stanza::bare_sender(&stanza) {
            let handler = self.handlers.read().unwrap().get(&sender).cloned();
            if let Some(handler) = handler {
                handler.on_stanza(&stanza);
                return;
            }
        }

        if skua_stanza::kind(&stanza) == StanzaKind::Iq {
            // Detach the id; delivering the stanza below gives it away.
            if let Some(id) = skua_stanza::id(&stanza).map(str::to_string) {
                let entry = self.pending.lock().unwrap().remove(&id);
                if let Some(entry) = entry {
                    let waited = Utc::now()
                        .signed_duration_since(entry.created_at)
                        .num_milliseconds();
                    debug!(%id, waited_ms = waited, "resolved pending request");
                    if entry.tx.send(stanza).is_err() {
                        debug!(%id, "requester went away before delivery");
                    }
                    return;
                }
            }
        }

        self.dispatcher.publish(&SessionEvent::Stanza(stanza));
    }

    /// Drain the inbound stream until it ends. One stanza is dispatched at
    /// a time, in arrival order; concurrent `request` callers just wait on
    /// their completions and never block this loop.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<Element>) {
        self.dispatcher
            .publish(&SessionEvent::Online(self.transport.own_jid()));

        while let Some(stanza) = inbound.recv().await {
            self.handle_stanza(stanza);
        }

        debug!("inbound stream ended");
        self.dispatcher.publish(&SessionEvent::Offline);
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
