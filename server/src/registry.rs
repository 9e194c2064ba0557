//! Connected players and the channels their snapshots go out on.
//!
//! The registry belongs to the relay, which is the only place membership and
//! scores change. Each entry pairs a player's public profile with the sender
//! half of that connection's outbound queue.

use log::info;
use shared::{Player, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;

/// Server-assigned identity of one connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered connection
#[derive(Debug)]
pub struct Client {
    pub id: ConnectionId,
    pub player: Player,
    /// Queue drained by the connection's writer task
    pub outbox: mpsc::UnboundedSender<ServerMessage>,
}

/// Every live connection, keyed by its id.
pub struct Registry {
    clients: HashMap<ConnectionId, Client>,
    /// Next id handed out by [`Registry::register`]
    next_id: u64,
}

impl Registry {
    /// Creates an empty registry. Ids start from 1.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_id: 1,
        }
    }

    /// Adds a player and returns the id assigned to its connection.
    pub fn register(
        &mut self,
        player: Player,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        info!(
            "Player {} joined as {} from port {}",
            player.handle, id, player.address
        );
        self.clients.insert(id, Client { id, player, outbox });
        id
    }

    /// Removes a connection. Returns the player if it was registered.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Player> {
        let client = self.clients.remove(id)?;
        info!(
            "Player {} ({}) left with score {}",
            client.player.handle, id, client.player.score
        );
        Some(client.player)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Client> {
        self.clients.get(id)
    }

    /// Adds `delta` to a player's score and returns the new score.
    pub fn adjust_score(&mut self, id: &ConnectionId, delta: i64) -> Option<i64> {
        let client = self.clients.get_mut(id)?;
        client.player.score += delta;
        Some(client.player.score)
    }

    /// Players in join order
    pub fn players(&self) -> Vec<Player> {
        let mut clients: Vec<&Client> = self.clients.values().collect();
        clients.sort_by_key(|client| client.id);
        clients.into_iter().map(|client| client.player.clone()).collect()
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
