use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Discogs returned status {status} for page {page}")]
    UpstreamStatus { status: u16, page: u32 },

    #[error("malformed response for page {page} at {path}: {message}")]
    UpstreamSchema {
        page: u32,
        path: String,
        message: String,
    },

    #[error("cannot write to {path:?}: {source}")]
    FilesystemNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("front matter: {0}")]
    Render(String),

    #[error("cannot load dump {path:?}: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn not_writable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FilesystemNotWritable {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Render(e.to_string())
    }
}
