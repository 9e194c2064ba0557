//! # Game Server Library
//!
//! Authoritative server for a real-time triple-matching card game. Players see
//! a board of nine tokens and race to submit three that form a set; valid sets
//! are replaced from the deck and the new board is pushed to everyone.
//!
//! ## Architecture
//!
//! ### Single-Writer Relay
//! One task, the [`relay::Relay`], owns the deck, the board and the player
//! registry. Sessions send it join, leave and action events over unbounded
//! channels; it applies them one at a time and broadcasts a snapshot after each.
//! Nothing else ever mutates game state, so there are no locks around the board.
//!
//! ### Sessions
//! Every websocket connection runs its own [`session::run_session`]. A session
//! reads the identification message, joins, then turns each inbound payload
//! into an action. It checks only that a move carries three position ids; the
//! relay decides whether those ids name a set on the board as it stands when
//! the move is applied.
//!
//! ### Outbound Writes
//! Each connection has a queue drained by its own writer task. Broadcasting is
//! a non-blocking push into every queue, so one slow or broken client cannot
//! hold up the others.
//!
//! ## Module Organization
//!
//! - `deck`: shuffled reserve of tokens, draw and deal
//! - `board`: the nine slots, id resolution and replacement
//! - `game`: setup, move application, replenishment and game over
//! - `registry`: connected players and their outbound queues
//! - `relay`: the event loop that owns `game` and `registry`
//! - `session`: per-connection protocol handling
//! - `transport`: axum routes, websocket upgrade and static files
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use server::game::GameState;
//! use server::relay::Relay;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (relay, handle) = Relay::new(GameState::new(StdRng::from_entropy()));
//!     tokio::spawn(relay.run());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     server::transport::serve(listener, handle, Path::new("./public")).await?;
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod deck;
pub mod error;
pub mod game;
pub mod registry;
pub mod relay;
pub mod session;
pub mod transport;
