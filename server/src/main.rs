use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::error::ServerError;
use server::game::GameState;
use server::relay::Relay;
use server::transport;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Main-method of the application.
/// Parses command-line arguments, deals the first board, then runs the relay and the HTTP server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Directory of static assets served at the root
        #[clap(short, long, default_value = "./public")]
        directory: PathBuf,
        /// Fixed shuffle seed, for reproducible games
        #[clap(short, long)]
        seed: Option<u64>,
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let rng = match args.seed {
        Some(seed) => {
            info!("Using fixed shuffle seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let (relay, handle) = Relay::new(GameState::new(rng));

    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;

    let relay_handle = tokio::spawn(relay.run());
    let server_handle =
        tokio::spawn(async move { transport::serve(listener, handle, &args.directory).await });

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Server failed: {}", e);
                    return Err(e.into());
                }
                Err(e) => error!("Server task panicked: {}", e),
            }
        }
        result = relay_handle => {
            if let Err(e) = result {
                error!("Relay task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
