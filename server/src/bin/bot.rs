//! Scripted player. Connects over websocket, identifies, and answers every new
//! board with the first set it can find.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{find_solution, Identify, PositionId, ServerMessage, Status, Token};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Websocket endpoint of the server
    #[clap(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
    /// Handle shown to other players
    #[clap(long, default_value = "bot")]
    handle: String,
    /// Pause before answering a board, in milliseconds
    #[clap(short, long, default_value = "1500")]
    delay_ms: u64,
    /// Stop after this many submitted moves
    #[clap(short, long)]
    moves: Option<u32>,
}

/// Position ids of the first set on the board, if any.
fn pick(tokens: &[Option<Token>]) -> Option<Vec<String>> {
    let refs: Vec<Option<&Token>> = tokens.iter().map(Option::as_ref).collect();
    let found = find_solution(&refs)?;
    Some(
        found
            .iter()
            .map(|&i| {
                tokens[i]
                    .as_ref()
                    .and_then(|token| token.id)
                    .unwrap_or_else(|| PositionId::from_index(i))
                    .to_string()
            })
            .collect(),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (socket, _) = connect_async(args.url.as_str()).await?;
    info!("Connected to {}", args.url);
    let (mut sink, mut stream) = socket.split();

    let identify = serde_json::to_string(&Identify {
        handle: args.handle.clone(),
    })?;
    sink.send(Message::text(identify)).await?;

    let mut submitted = 0u32;
    let mut last_board: Option<Vec<Option<Token>>> = None;

    while let Some(message) = stream.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame = match serde_json::from_str::<ServerMessage>(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Unreadable message from server: {}", e);
                continue;
            }
        };

        match frame {
            ServerMessage::Chat { handle, message } => info!("<{}> {}", handle, message),
            ServerMessage::Frame { status: Status::Dead, .. } => info!("Game over, waiting for the next deal"),
            ServerMessage::Frame { tokens, players, .. } => {
                if last_board.as_ref() == Some(&tokens) {
                    continue;
                }
                if let Some(me) = players.iter().find(|p| p.handle == args.handle) {
                    debug!("Score {}", me.score);
                }

                let Some(ids) = pick(&tokens) else {
                    debug!("No set on this board");
                    continue;
                };
                last_board = Some(tokens);

                sleep(Duration::from_millis(args.delay_ms)).await;
                info!("Submitting {:?}", ids);
                sink.send(Message::text(serde_json::to_string(&ids)?)).await?;

                submitted += 1;
                if args.moves.is_some_and(|limit| submitted >= limit) {
                    info!("Submitted {} moves, leaving", submitted);
                    break;
                }
            }
        }
    }

    sink.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Color, Fill, Shape};

    #[test]
    fn test_pick_uses_placed_ids() {
        let mut tokens: Vec<Option<Token>> = vec![None; 9];
        for (i, count) in [(2, 1), (4, 2), (7, 3)] {
            tokens[i] = Some(
                Token::new(Shape::Circle, Fill::Empty, Color::Red, count)
                    .placed_at(PositionId::from_index(i)),
            );
        }
        assert_eq!(
            pick(&tokens),
            Some(vec!["0,2".to_string(), "1,1".to_string(), "2,1".to_string()])
        );
    }

    #[test]
    fn test_pick_empty_board() {
        assert_eq!(pick(&[None, None, None]), None);
    }
}
