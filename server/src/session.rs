//! Per-connection session handling.
//!
//! A session reads its own connection and nothing else. The first message
//! identifies the player; every later message is turned into an [`Action`] for
//! the relay. Whether a move actually names a set is decided by the relay
//! against its current board, so the session only checks the shape of the
//! payload.

use crate::registry::ConnectionId;
use crate::relay::{Action, RelayHandle};
use futures_util::{Stream, StreamExt};
use log::{info, warn};
use shared::{ClientMessage, Identify, Player, PositionId, ServerMessage, SET_SIZE};
use std::fmt::Display;
use tokio::sync::mpsc;

/// Drives one connection from identification to leave.
///
/// `inbound` yields text payloads in arrival order. An `Err` item means the
/// connection is gone; the end of the stream means it was closed. Both end the
/// session with a leave event.
pub async fn run_session<S, E>(
    mut inbound: S,
    address: u16,
    relay: RelayHandle,
    outbox: mpsc::UnboundedSender<ServerMessage>,
) where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    let Some(handle) = identify(&mut inbound, address).await else {
        return;
    };

    let Some(id) = relay.join(Player::new(handle, address), outbox).await else {
        warn!("Relay unavailable, dropping connection from port {}", address);
        return;
    };

    while let Some(item) = inbound.next().await {
        match item {
            Ok(payload) => relay.act(parse_action(id, &payload)),
            Err(e) => {
                warn!("Read from {} failed: {}", id, e);
                break;
            }
        }
    }

    info!("Connection {} closed", id);
    relay.leave(id);
}

/// Reads the identification message. `None` ends the session without joining.
async fn identify<S, E>(inbound: &mut S, address: u16) -> Option<String>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    match inbound.next().await? {
        Ok(payload) => match serde_json::from_str::<Identify>(&payload) {
            Ok(identify) => Some(identify.handle),
            Err(e) => {
                warn!("Bad identification from port {}: {}", address, e);
                None
            }
        },
        Err(e) => {
            warn!("Read from port {} failed before identification: {}", address, e);
            None
        }
    }
}

/// Classifies one inbound payload. Anything other than chat or exactly three
/// parseable position ids is a malformed move.
pub fn parse_action(id: ConnectionId, payload: &str) -> Action {
    match serde_json::from_str::<ClientMessage>(payload) {
        Ok(ClientMessage::Chat { message }) => Action::Chat { id, message },
        Ok(ClientMessage::Move(entries)) => {
            let positions: Result<Vec<PositionId>, _> =
                entries.iter().map(|entry| entry.position()).collect();
            match positions.map(<[PositionId; SET_SIZE]>::try_from) {
                Ok(Ok(positions)) => Action::Move { id, positions },
                Ok(Err(positions)) => {
                    warn!("{} sent a move with {} ids", id, positions.len());
                    Action::Malformed { id }
                }
                Err(e) => {
                    warn!("{} sent a bad move: {}", id, e);
                    Action::Malformed { id }
                }
            }
        }
        Err(e) => {
            warn!("{} sent an unreadable payload: {}", id, e);
            Action::Malformed { id }
        }
    }
}
