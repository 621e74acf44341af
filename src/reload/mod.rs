//! Live reload service.
//!
//! ```text
//! watch pass --reload()/error()--> Reloader --[broadcast]--> browser clients
//! ```
//!
//! The [`Reloader`] is an owned handle: whoever needs to trigger a reload gets
//! a clone passed in explicitly.

pub mod message;
mod server;

use std::net::{IpAddr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use message::ReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Handle to the live reload channel.
///
/// Cloning is cheap; clones share the same client list.
#[derive(Clone, Default)]
pub struct Reloader {
    clients: Clients,
    /// Error shown to clients that connect while a pass is failing
    pending_error: Arc<Mutex<Option<ReloadMessage>>>,
    /// Number of reloads broadcast so far
    reloads: Arc<AtomicU64>,
    port: Option<u16>,
}

impl Reloader {
    /// Bind the WebSocket port on `interface` (with retry) and start
    /// accepting clients. The dev server passes its own HTTP interface.
    pub fn start(interface: IpAddr, base_port: u16) -> Result<Self> {
        let mut reloader = Self::default();
        let clients = Arc::clone(&reloader.clients);
        let pending = Arc::clone(&reloader.pending_error);

        let port = server::start_acceptor(interface, base_port, move |stream| {
            add_client(&clients, &pending, stream);
        })?;

        crate::debug!("reload"; "ws://{}", SocketAddr::new(interface, port));
        reloader.port = Some(port);
        Ok(reloader)
    }

    /// A reloader with no listener; broadcasts reach nobody.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Port the WebSocket server is bound to.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Ask every connected client to reload. Clears any error overlay.
    pub fn reload(&self, reason: &str) {
        *self.pending_error.lock() = None;
        let count = self.reloads.fetch_add(1, Ordering::SeqCst) + 1;
        crate::debug!("reload"; "#{} {}", count, reason);
        self.broadcast(&ReloadMessage::reload(reason));
    }

    /// Push an error overlay to every client, and to clients connecting later.
    pub fn error(&self, summary: &str, detail: &str) {
        let msg = ReloadMessage::error(summary, detail);
        *self.pending_error.lock() = Some(msg.clone());
        self.broadcast(&msg);
    }

    /// Number of reloads requested so far.
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn has_error(&self) -> bool {
        self.pending_error.lock().is_some()
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    fn broadcast(&self, msg: &ReloadMessage) {
        let msg = Message::Text(msg.to_json().into());
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("reload"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| match ws.send(msg.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("reload"; "broadcast to {} clients", clients.len());
    }
}

fn add_client(clients: &Clients, pending: &Mutex<Option<ReloadMessage>>, stream: TcpStream) {
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log!("reload"; "handshake failed: {}", e);
            return;
        }
    };

    if let Err(e) = ws.send(Message::Text(ReloadMessage::connected().to_json().into())) {
        crate::debug!("reload"; "failed to send connected message: {}", e);
        return;
    }

    if let Some(err) = pending.lock().as_ref()
        && let Err(e) = ws.send(Message::Text(err.to_json().into()))
    {
        crate::debug!("reload"; "failed to send pending error: {}", e);
        return;
    }

    let mut clients = clients.lock();
    clients.push(ws);
    crate::debug!("reload"; "client registered (total: {})", clients.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_is_idempotent_without_clients() {
        let reloader = Reloader::detached();
        reloader.reload("first");
        reloader.reload("second");
        assert_eq!(reloader.reload_count(), 2);
        assert_eq!(reloader.client_count(), 0);
    }

    #[test]
    fn test_reload_clears_error() {
        let reloader = Reloader::detached();
        reloader.error("styles pass failed", "style.scss:1: expected \";\"");
        assert!(reloader.has_error());

        reloader.reload("styles");
        assert!(!reloader.has_error());
    }

    #[test]
    fn test_clones_share_state() {
        let reloader = Reloader::detached();
        let clone = reloader.clone();
        clone.reload("scripts");
        assert_eq!(reloader.reload_count(), 1);
    }
}
