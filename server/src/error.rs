use derive_more::{Display, Error};
use std::path::PathBuf;

/// Failures that stop the server from starting or serving.
#[derive(Debug, Display, Error)]
pub enum ServerError {
    #[display("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[display("static directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },
    #[display("server stopped: {source}")]
    Serve { source: std::io::Error },
}
