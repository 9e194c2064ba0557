//! Integration tests for the networked game server
//!
//! These tests run the relay and the HTTP front on an ephemeral port and talk
//! to them through real websocket connections.

use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::game::GameState;
use server::relay::Relay;
use server::transport;
use shared::{find_solution, validate, Player, PositionId, ServerMessage, Status, Token, BOARD_SIZE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// A static directory unique to one test.
fn static_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("triples-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>triples</h1>").unwrap();
    dir
}

/// Starts a relay and a server on an ephemeral port.
async fn start(name: &str, seed: u64) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (relay, handle) = Relay::new(GameState::new(StdRng::seed_from_u64(seed)));
    let dir = static_dir(name);

    tokio::spawn(relay.run());
    tokio::spawn(async move {
        if let Err(e) = transport::serve(listener, handle, &dir).await {
            panic!("server failed: {}", e);
        }
    });
    addr
}

async fn connect(addr: SocketAddr, handle: &str) -> Socket {
    let (mut socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    let identify = format!(r#"{{"handle":"{}"}}"#, handle);
    socket.send(Message::text(identify)).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, payload: String) {
    socket.send(Message::text(payload)).await.unwrap();
}

async fn next_message(socket: &mut Socket) -> ServerMessage {
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("timed out waiting for the server")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

struct Frame {
    status: Status,
    players: Vec<Player>,
    tokens: Vec<Option<Token>>,
    last_set: Option<Vec<Token>>,
}

async fn next_frame(socket: &mut Socket) -> Frame {
    loop {
        if let ServerMessage::Frame {
            status,
            players,
            tokens,
            last_set,
        } = next_message(socket).await
        {
            return Frame {
                status,
                players,
                tokens,
                last_set,
            };
        }
    }
}

fn refs(tokens: &[Option<Token>]) -> Vec<Option<&Token>> {
    tokens.iter().map(Option::as_ref).collect()
}

fn ids(indices: [usize; 3]) -> String {
    let ids: Vec<String> = indices
        .iter()
        .map(|&i| PositionId::from_index(i).to_string())
        .collect();
    serde_json::to_string(&ids).unwrap()
}

fn score(frame: &Frame, handle: &str) -> i64 {
    frame
        .players
        .iter()
        .find(|p| p.handle == handle)
        .map(|p| p.score)
        .expect("player listed")
}

/// FIRST CONTACT
mod join_tests {
    use super::*;

    /// A new player gets the board straight after identifying
    #[tokio::test]
    async fn test_join_receives_full_board() {
        let addr = start("join", 1).await;
        let mut socket = connect(addr, "ada").await;

        let frame = next_frame(&mut socket).await;
        assert_eq!(frame.status, Status::Alive);
        assert_eq!(frame.players.len(), 1);
        assert_eq!(frame.players[0].handle, "ada");
        assert_eq!(frame.players[0].score, 0);
        assert_eq!(frame.tokens.len(), BOARD_SIZE);
        assert!(frame.tokens.iter().all(Option::is_some));
        assert!(frame.last_set.is_none());
        assert!(find_solution(&refs(&frame.tokens)).is_some());
    }

    /// The legacy `name` key still identifies
    #[tokio::test]
    async fn test_join_with_name_key() {
        let addr = start("name", 2).await;
        let (mut socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        send(&mut socket, r#"{"name":"grace"}"#.to_string()).await;

        let frame = next_frame(&mut socket).await;
        assert_eq!(frame.players[0].handle, "grace");
    }
}

/// MOVES AND SCORING
mod move_tests {
    use super::*;

    /// Submitting a set scores a point and replaces the matched tokens
    #[tokio::test]
    async fn test_valid_move_scores() {
        let addr = start("valid", 3).await;
        let mut socket = connect(addr, "ada").await;
        let before = next_frame(&mut socket).await;

        let found = find_solution(&refs(&before.tokens)).unwrap();
        send(&mut socket, ids(found)).await;

        let after = next_frame(&mut socket).await;
        assert_eq!(score(&after, "ada"), 1);

        let matched = after.last_set.expect("last set reported");
        let expected: Vec<_> = found
            .iter()
            .map(|&i| before.tokens[i].as_ref().unwrap().face())
            .collect();
        let reported: Vec<_> = matched.iter().map(Token::face).collect();
        assert_eq!(reported, expected);
    }

    /// Three tokens that do not form a set cost a point and leave the board alone
    #[tokio::test]
    async fn test_invalid_move_penalised() {
        let addr = start("invalid", 4).await;
        let mut socket = connect(addr, "ada").await;
        let before = next_frame(&mut socket).await;

        let board = refs(&before.tokens);
        let wrong = shared::combinations(BOARD_SIZE)
            .into_iter()
            .find(|&[a, b, c]| !validate(&[board[a], board[b], board[c]]))
            .expect("board has a non-set triple");
        send(&mut socket, ids(wrong)).await;

        let after = next_frame(&mut socket).await;
        assert_eq!(score(&after, "ada"), -1);
        assert_eq!(after.tokens, before.tokens);
    }

    /// Payloads that are not three ids count as bad moves
    #[tokio::test]
    async fn test_malformed_moves_penalised() {
        let addr = start("malformed", 5).await;
        let mut socket = connect(addr, "ada").await;
        next_frame(&mut socket).await;

        send(&mut socket, r#"["0,0","0,1"]"#.to_string()).await;
        assert_eq!(score(&next_frame(&mut socket).await, "ada"), -1);

        send(&mut socket, r#"["0,0","0,0","0,1"]"#.to_string()).await;
        assert_eq!(score(&next_frame(&mut socket).await, "ada"), -2);

        send(&mut socket, "garbage".to_string()).await;
        assert_eq!(score(&next_frame(&mut socket).await, "ada"), -3);
    }
}

/// SEVERAL PLAYERS
mod multiplayer_tests {
    use super::*;

    /// Everyone sees joins, chat and leaves
    #[tokio::test]
    async fn test_players_see_each_other() {
        let addr = start("multi", 6).await;
        let mut ada = connect(addr, "ada").await;
        assert_eq!(next_frame(&mut ada).await.players.len(), 1);

        let mut bob = connect(addr, "bob").await;
        let seen_by_ada = next_frame(&mut ada).await;
        let seen_by_bob = next_frame(&mut bob).await;
        assert_eq!(seen_by_ada.players.len(), 2);
        assert_eq!(seen_by_ada.players, seen_by_bob.players);
        assert_eq!(seen_by_ada.tokens, seen_by_bob.tokens);

        send(&mut bob, r#"{"message":"hello"}"#.to_string()).await;
        for socket in [&mut ada, &mut bob] {
            assert_eq!(
                next_message(socket).await,
                ServerMessage::Chat {
                    handle: "bob".to_string(),
                    message: "hello".to_string()
                }
            );
            next_frame(socket).await;
        }

        bob.close(None).await.unwrap();
        let frame = next_frame(&mut ada).await;
        assert_eq!(frame.players.len(), 1);
        assert_eq!(frame.players[0].handle, "ada");
    }

    /// Only the player who found the set scores
    #[tokio::test]
    async fn test_scores_are_per_player() {
        let addr = start("scores", 7).await;
        let mut ada = connect(addr, "ada").await;
        next_frame(&mut ada).await;
        let mut bob = connect(addr, "bob").await;
        let board = next_frame(&mut bob).await;
        next_frame(&mut ada).await;

        let found = find_solution(&refs(&board.tokens)).unwrap();
        send(&mut bob, ids(found)).await;

        let frame = next_frame(&mut ada).await;
        assert_eq!(score(&frame, "bob"), 1);
        assert_eq!(score(&frame, "ada"), 0);
    }
}

/// STATIC FILES
mod static_tests {
    use super::*;

    /// Plain HTTP requests are served from the static directory
    #[tokio::test]
    async fn test_serves_static_files() {
        let addr = start("static", 8).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        timeout(WAIT, stream.read_to_string(&mut response))
            .await
            .unwrap()
            .unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("<h1>triples</h1>"));
    }

    /// Serving refuses to start without its directory
    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (_relay, handle) = Relay::new(GameState::new(StdRng::seed_from_u64(9)));
        let missing = std::env::temp_dir().join("triples-does-not-exist");

        let result = transport::serve(listener, handle, &missing).await;
        assert!(matches!(
            result,
            Err(server::error::ServerError::MissingDirectory { .. })
        ));
    }
}
