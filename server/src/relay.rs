//! The relay: single owner of the game state and the player registry.
//!
//! Sessions never touch shared state. They push events into three channels
//! (join, leave, action) and the relay applies them one at a time, broadcasting
//! a fresh snapshot to every registered connection after each one. Because the
//! relay is the only mutator, no locking is needed around the board.

use crate::game::{GameState, MoveOutcome};
use crate::registry::{ConnectionId, Registry};
use log::{debug, error, info, warn};
use shared::{Player, PositionId, ServerMessage, Status, SET_SIZE};
use tokio::sync::{mpsc, oneshot};

/// Request to register a new connection.
#[derive(Debug)]
pub struct Join {
    pub player: Player,
    pub outbox: mpsc::UnboundedSender<ServerMessage>,
    /// Receives the id assigned to the connection once it is registered.
    pub ack: oneshot::Sender<ConnectionId>,
}

/// Something a registered player did.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Three well-formed position ids, to be checked against the board.
    Move {
        id: ConnectionId,
        positions: [PositionId; SET_SIZE],
    },
    /// A payload that was not a three-id move. Costs a point.
    Malformed { id: ConnectionId },
    Chat { id: ConnectionId, message: String },
}

#[derive(Debug)]
pub enum Event {
    Join(Join),
    Leave(ConnectionId),
    Action(Action),
}

/// Cloneable sending side of the relay's event channels.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    join_tx: mpsc::UnboundedSender<Join>,
    leave_tx: mpsc::UnboundedSender<ConnectionId>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl RelayHandle {
    /// Registers a player and waits until the relay has done so. `None` if the
    /// relay has shut down.
    pub async fn join(
        &self,
        player: Player,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Option<ConnectionId> {
        let (ack, registered) = oneshot::channel();
        if let Err(e) = self.join_tx.send(Join {
            player,
            outbox,
            ack,
        }) {
            error!("Failed to send join to relay: {}", e);
            return None;
        }
        registered.await.ok()
    }

    pub fn leave(&self, id: ConnectionId) {
        if let Err(e) = self.leave_tx.send(id) {
            error!("Failed to send leave for {} to relay: {}", id, e);
        }
    }

    pub fn act(&self, action: Action) {
        if let Err(e) = self.action_tx.send(action) {
            error!("Failed to send action to relay: {}", e);
        }
    }
}

pub struct Relay {
    game: GameState,
    clients: Registry,

    // Event channels
    join_rx: mpsc::UnboundedReceiver<Join>,
    leave_rx: mpsc::UnboundedReceiver<ConnectionId>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl Relay {
    /// Creates a relay around an already dealt game, plus the handle sessions
    /// use to reach it.
    pub fn new(game: GameState) -> (Self, RelayHandle) {
        let (join_tx, join_rx) = mpsc::unbounded_channel();
        let (leave_tx, leave_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let relay = Relay {
            game,
            clients: Registry::new(),
            join_rx,
            leave_rx,
            action_rx,
        };
        let handle = RelayHandle {
            join_tx,
            leave_tx,
            action_tx,
        };
        (relay, handle)
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn clients(&self) -> &Registry {
        &self.clients
    }

    /// Applies events until every handle has been dropped, then returns the
    /// relay so its final state can be inspected.
    pub async fn run(mut self) -> Self {
        info!("Relay started");

        loop {
            let event = tokio::select! {
                Some(join) = self.join_rx.recv() => Event::Join(join),
                Some(id) = self.leave_rx.recv() => Event::Leave(id),
                Some(action) = self.action_rx.recv() => Event::Action(action),
                else => break,
            };
            if let Event::Leave(_) = event {
                self.drain_actions();
            }
            self.apply(event);
        }

        info!("Relay stopped, all event sources closed");
        self
    }

    /// Applies every action already queued. A session sends its last actions
    /// before its leave, so they must land while it is still registered.
    fn drain_actions(&mut self) {
        while let Ok(action) = self.action_rx.try_recv() {
            self.apply(Event::Action(action));
        }
    }

    /// Applies one event and broadcasts the resulting snapshot.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Join(join) => {
                let id = self.clients.register(join.player, join.outbox);
                if join.ack.send(id).is_err() {
                    warn!("Session for {} went away before joining", id);
                    self.clients.remove(&id);
                }
            }
            Event::Leave(id) => {
                if self.clients.remove(&id).is_none() {
                    debug!("Leave for unknown connection {}", id);
                }
            }
            Event::Action(action) => self.handle_action(action),
        }

        self.broadcast(self.snapshot(Status::Alive));
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Move { id, positions } => {
                if !self.clients.contains(&id) {
                    warn!("Ignoring move from unregistered connection {}", id);
                    return;
                }

                let outcome = self.game.submit(&positions);
                let delta = if outcome == MoveOutcome::Rejected { -1 } else { 1 };
                let score = self.clients.adjust_score(&id, delta);
                debug!(
                    "Move {:?} from {}: {:?}, score now {:?}",
                    positions, id, outcome, score
                );

                if outcome == MoveOutcome::GameOver {
                    self.broadcast(self.snapshot(Status::Dead));
                    self.game.restart();
                }
            }
            Action::Malformed { id } => {
                if self.clients.adjust_score(&id, -1).is_none() {
                    warn!("Ignoring malformed move from unregistered connection {}", id);
                }
            }
            Action::Chat { id, message } => {
                let Some(client) = self.clients.get(&id) else {
                    warn!("Ignoring chat from unregistered connection {}", id);
                    return;
                };
                let chat = ServerMessage::Chat {
                    handle: client.player.handle.clone(),
                    message,
                };
                self.broadcast(chat);
            }
        }
    }

    /// Current state as seen by clients.
    pub fn snapshot(&self, status: Status) -> ServerMessage {
        ServerMessage::Frame {
            status,
            players: self.clients.players(),
            tokens: self.game.board().slots().to_vec(),
            last_set: self.game.last_set().map(|set| set.to_vec()),
        }
    }

    /// Queues `message` for every registered connection. A closed queue is
    /// logged and skipped; only a leave event removes a connection.
    fn broadcast(&self, message: ServerMessage) {
        for client in self.clients.clients() {
            if let Err(e) = client.outbox.send(message.clone()) {
                error!("Failed to queue message for {}: {}", client.id, e);
            }
        }
    }
}
